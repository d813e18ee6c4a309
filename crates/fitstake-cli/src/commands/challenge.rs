use chrono::Utc;
use clap::Subcommand;
use fitstake_core::{Config, ConsoleNotifier, Lifecycle, Store};

#[derive(Subcommand)]
pub enum ChallengeAction {
    /// Create a draft challenge for a chat
    Create {
        /// Chat id the challenge belongs to
        #[arg(long)]
        chat: i64,
        /// Chat title for announcements
        #[arg(long)]
        title: Option<String>,
        /// Creator user id
        #[arg(long)]
        creator: i64,
    },
    /// Call off a challenge that has not started
    Cancel {
        #[arg(long)]
        chat: i64,
    },
    /// Assign the bank holder directly, skipping a vote
    Bank {
        #[arg(long)]
        chat: i64,
        /// User id taking the bank
        #[arg(long)]
        user: i64,
    },
    /// Print the chat's ongoing challenge as JSON
    Status {
        #[arg(long)]
        chat: i64,
    },
    /// Delete ALL stored data
    Reset,
}

pub fn run(action: ChallengeAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let config = Config::load_or_default();
    let notifier = ConsoleNotifier;
    let lifecycle = Lifecycle::new(&store, &notifier, &config);

    match action {
        ChallengeAction::Create {
            chat,
            title,
            creator,
        } => {
            let challenge =
                lifecycle.create_challenge(chat, title.as_deref(), creator, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&challenge)?);
        }
        ChallengeAction::Cancel { chat } => {
            lifecycle.cancel_challenge(chat, Utc::now())?;
            println!("cancelled");
        }
        ChallengeAction::Bank { chat, user } => {
            let challenge = store
                .find_ongoing_by_chat(chat)?
                .ok_or_else(|| format!("no ongoing challenge in chat {chat}"))?;
            lifecycle.assign_bank_holder(challenge.id, user)?;
            println!("bank holder set to {user}");
        }
        ChallengeAction::Status { chat } => match store.find_ongoing_by_chat(chat)? {
            Some(challenge) => {
                println!("{}", serde_json::to_string_pretty(&challenge)?);
                for participant in store.list_participants(challenge.id)? {
                    println!(
                        "  {} [{}] checkins {}/{} skipped {}",
                        participant.display_name(),
                        participant.status.as_str(),
                        participant.completed_checkins,
                        participant.total_checkins,
                        participant.skipped_checkins,
                    );
                }
            }
            None => println!("no ongoing challenge in chat {chat}"),
        },
        ChallengeAction::Reset => {
            store.reset_all()?;
            println!("all data deleted");
        }
    }
    Ok(())
}
