use chrono::Utc;
use clap::Subcommand;
use fitstake_core::{Config, ConsoleNotifier, Lifecycle, Store};

#[derive(Subcommand)]
pub enum PaymentAction {
    /// Participant declares the stake as transferred
    Mark {
        #[arg(long)]
        chat: i64,
        #[arg(long)]
        user: i64,
    },
    /// Bank holder confirms receipt of a participant's stake
    Confirm {
        #[arg(long)]
        chat: i64,
        /// Confirming user (must hold the bank)
        #[arg(long)]
        by: i64,
        /// Participant whose payment is confirmed
        #[arg(long)]
        user: i64,
    },
    /// Show a participant's payment
    Status {
        #[arg(long)]
        participant: i64,
    },
}

pub fn run(action: PaymentAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let config = Config::load_or_default();
    let notifier = ConsoleNotifier;
    let lifecycle = Lifecycle::new(&store, &notifier, &config);

    match action {
        PaymentAction::Mark { chat, user } => {
            lifecycle.mark_paid(chat, user, Utc::now())?;
            println!("payment marked");
        }
        PaymentAction::Confirm { chat, by, user } => {
            lifecycle.confirm_payment(chat, by, user, Utc::now())?;
            println!("payment confirmed");
        }
        PaymentAction::Status { participant } => {
            match store.find_payment_by_participant(participant)? {
                Some(payment) => println!("{}", serde_json::to_string_pretty(&payment)?),
                None => println!("no payment for participant {participant}"),
            }
        }
    }
    Ok(())
}
