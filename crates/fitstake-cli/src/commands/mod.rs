pub mod challenge;
pub mod checkin;
pub mod config;
pub mod election;
pub mod member;
pub mod payment;
pub mod tick;

use fitstake_core::oracle::{AdvisoryOracle, HttpOracle, NullOracle};
use fitstake_core::Config;

/// The oracle implied by the configuration: HTTP when a key is set,
/// neutral answers otherwise.
pub fn oracle_from(config: &Config) -> Result<Box<dyn AdvisoryOracle>, Box<dyn std::error::Error>> {
    if config.advisory.api_key.is_empty() {
        Ok(Box::new(NullOracle))
    } else {
        Ok(Box::new(HttpOracle::new(config.advisory.clone())?))
    }
}
