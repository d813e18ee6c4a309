use chrono::Utc;
use clap::Subcommand;
use fitstake_core::{run_tick, Config, ConsoleNotifier, Store};

#[derive(Subcommand)]
pub enum TickAction {
    /// Run every due transition once and exit
    Once,
    /// Keep ticking at a fixed interval
    Run {
        /// Seconds between ticks
        #[arg(long, default_value = "60")]
        interval: u64,
    },
}

pub fn run(action: TickAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let config = Config::load_or_default();
    let notifier = ConsoleNotifier;

    match action {
        TickAction::Once => {
            let report = run_tick(&store, &notifier, &config, Utc::now());
            println!("{report:?}");
        }
        TickAction::Run { interval } => {
            let interval = std::time::Duration::from_secs(interval.max(1));
            loop {
                let report = run_tick(&store, &notifier, &config, Utc::now());
                if !report.is_quiet() {
                    println!("{report:?}");
                }
                std::thread::sleep(interval);
            }
        }
    }
    Ok(())
}
