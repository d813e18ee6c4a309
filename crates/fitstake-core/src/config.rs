//! TOML-based application configuration.
//!
//! Stores deployment-wide settings:
//! - Check-in cadence (period, window length, reminder lead time)
//! - Lifecycle timeouts (onboarding, election)
//! - Default challenge parameters (stake, discipline threshold, skips)
//! - Advisory oracle endpoint
//!
//! Configuration is stored at `~/.config/fitstake/config.toml`.

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::store::data_dir;

/// Unit of the challenge duration value. Production uses months;
/// minutes exist so a whole challenge can be exercised in a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DurationUnit {
    #[default]
    Months,
    Minutes,
}

impl DurationUnit {
    pub fn label(&self) -> &'static str {
        match self {
            DurationUnit::Months => "months",
            DurationUnit::Minutes => "minutes",
        }
    }
}

/// Check-in cadence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinConfig {
    /// Days between window openings.
    #[serde(default = "default_period_days")]
    pub period_days: i64,
    /// Minutes between window openings; overrides `period_days` when
    /// set. Testing only.
    #[serde(default)]
    pub period_minutes: Option<i64>,
    /// Hours a window stays open.
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    /// Hours before close at which the reminder fires.
    #[serde(default = "default_reminder_lead_hours")]
    pub reminder_lead_hours: i64,
}

/// Lifecycle timeout settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    /// Hours a participant may sit in onboarding before being dropped.
    #[serde(default = "default_onboarding_timeout_hours")]
    pub onboarding_hours: i64,
    /// Hours an election may run before the tick finalizes it.
    #[serde(default = "default_election_timeout_hours")]
    pub election_hours: i64,
}

/// Defaults applied to newly created challenges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeDefaults {
    #[serde(default = "default_duration_value")]
    pub duration_value: i64,
    #[serde(default)]
    pub duration_unit: DurationUnit,
    #[serde(default = "default_stake_amount")]
    pub stake_amount: f64,
    #[serde(default = "default_discipline_threshold")]
    pub discipline_threshold: f64,
    #[serde(default = "default_max_skips")]
    pub max_skips: i64,
}

/// Advisory oracle endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    #[serde(default = "default_advisory_base_url")]
    pub base_url: String,
    /// Empty key disables the HTTP oracle; the neutral fallback is
    /// used instead.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_advisory_model")]
    pub model: String,
    #[serde(default = "default_advisory_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub checkin: CheckinConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub challenge: ChallengeDefaults,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    /// Photo storage root; defaults to `<data_dir>/photos`.
    #[serde(default)]
    pub photos_dir: Option<PathBuf>,
}

fn default_period_days() -> i64 {
    14
}
fn default_window_hours() -> i64 {
    48
}
fn default_reminder_lead_hours() -> i64 {
    12
}
fn default_onboarding_timeout_hours() -> i64 {
    48
}
fn default_election_timeout_hours() -> i64 {
    24
}
fn default_duration_value() -> i64 {
    6
}
fn default_stake_amount() -> f64 {
    1000.0
}
fn default_discipline_threshold() -> f64 {
    0.8
}
fn default_max_skips() -> i64 {
    2
}
fn default_advisory_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_advisory_model() -> String {
    "google/gemini-flash-1.5".into()
}
fn default_advisory_timeout_secs() -> u64 {
    30
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            period_days: default_period_days(),
            period_minutes: None,
            window_hours: default_window_hours(),
            reminder_lead_hours: default_reminder_lead_hours(),
        }
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            onboarding_hours: default_onboarding_timeout_hours(),
            election_hours: default_election_timeout_hours(),
        }
    }
}

impl Default for ChallengeDefaults {
    fn default() -> Self {
        Self {
            duration_value: default_duration_value(),
            duration_unit: DurationUnit::Months,
            stake_amount: default_stake_amount(),
            discipline_threshold: default_discipline_threshold(),
            max_skips: default_max_skips(),
        }
    }
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            base_url: default_advisory_base_url(),
            api_key: String::new(),
            model: default_advisory_model(),
            timeout_secs: default_advisory_timeout_secs(),
        }
    }
}

impl CheckinConfig {
    /// The step between window openings.
    pub fn period(&self) -> Duration {
        match self.period_minutes {
            Some(min) => Duration::minutes(min),
            None => Duration::days(self.period_days),
        }
    }

    /// How long each window stays open once it opens.
    pub fn window_length(&self) -> Duration {
        Duration::hours(self.window_hours)
    }

    pub fn reminder_lead(&self) -> Duration {
        Duration::hours(self.reminder_lead_hours)
    }
}

impl Config {
    fn path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content)?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(Self::path()?, content)?;
        Ok(())
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

/// Add a challenge duration to a start instant.
///
/// Month arithmetic clamps to the last day of a shorter target month,
/// which is what `chrono::Months` does.
pub fn add_duration(start: DateTime<Utc>, value: i64, unit: DurationUnit) -> DateTime<Utc> {
    match unit {
        DurationUnit::Months => start + Months::new(value.max(0) as u32),
        DurationUnit::Minutes => start + Duration::minutes(value),
    }
}
