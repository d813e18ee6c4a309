use chrono::Utc;
use clap::Subcommand;
use fitstake_core::{Config, ConsoleNotifier, Lifecycle, Store};

#[derive(Subcommand)]
pub enum ElectionAction {
    /// Open the bank holder vote
    Start {
        #[arg(long)]
        challenge: i64,
        /// User id starting the vote
        #[arg(long)]
        by: i64,
    },
    /// Cast one vote
    Vote {
        #[arg(long)]
        challenge: i64,
        #[arg(long)]
        voter: i64,
        #[arg(long = "for")]
        candidate: i64,
    },
    /// Show the election and its votes
    Status {
        #[arg(long)]
        challenge: i64,
    },
}

pub fn run(action: ElectionAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let config = Config::load_or_default();
    let notifier = ConsoleNotifier;
    let lifecycle = Lifecycle::new(&store, &notifier, &config);

    match action {
        ElectionAction::Start { challenge, by } => {
            let election = lifecycle.start_election(challenge, by, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&election)?);
        }
        ElectionAction::Vote {
            challenge,
            voter,
            candidate,
        } => {
            lifecycle.cast_vote(challenge, voter, candidate, Utc::now())?;
            println!("vote recorded");
        }
        ElectionAction::Status { challenge } => {
            match store.find_election_by_challenge(challenge)? {
                Some(election) => {
                    println!("{}", serde_json::to_string_pretty(&election)?);
                    for vote in store.list_votes(election.id)? {
                        println!("  {} -> {}", vote.voter_id, vote.voted_for_id);
                    }
                }
                None => println!("no election for challenge {challenge}"),
            }
        }
    }
    Ok(())
}
