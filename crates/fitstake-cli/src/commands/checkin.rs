use chrono::Utc;
use clap::Subcommand;
use fitstake_core::photos::{FsPhotoStore, PhotoSlot, PhotoStore};
use fitstake_core::{windows, Config, ConsoleNotifier, Store};

use super::oracle_from;

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Submit a check-in for the currently open window
    Submit {
        #[arg(long)]
        challenge: i64,
        #[arg(long)]
        user: i64,
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        waist: f64,
        /// Photo files, front/left/right/back
        #[arg(long)]
        front: std::path::PathBuf,
        #[arg(long)]
        left: std::path::PathBuf,
        #[arg(long)]
        right: std::path::PathBuf,
        #[arg(long)]
        back: std::path::PathBuf,
    },
    /// Reserve the open window for a direct-chat submission
    Handoff {
        #[arg(long)]
        challenge: i64,
        #[arg(long)]
        user: i64,
    },
    /// List a challenge's windows
    Windows {
        #[arg(long)]
        challenge: i64,
    },
}

pub fn run(action: CheckinAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let config = Config::load_or_default();
    let notifier = ConsoleNotifier;

    match action {
        CheckinAction::Submit {
            challenge,
            user,
            weight,
            waist,
            front,
            left,
            right,
            back,
        } => {
            let participant = store
                .find_participant_by_user(challenge, user)?
                .ok_or_else(|| format!("user {user} is not in challenge {challenge}"))?;
            let photos_root = match &config.photos_dir {
                Some(dir) => dir.clone(),
                None => fitstake_core::store::data_dir()?.join("photos"),
            };
            let photo_store = FsPhotoStore::new(photos_root);
            let mut refs = Vec::with_capacity(4);
            for (path, slot) in [
                (&front, PhotoSlot::Front),
                (&left, PhotoSlot::Left),
                (&right, PhotoSlot::Right),
                (&back, PhotoSlot::Back),
            ] {
                let bytes = std::fs::read(path)?;
                refs.push(photo_store.save(&bytes, participant.id, slot)?);
            }
            let oracle = oracle_from(&config)?;
            let inserted = windows::submit_checkin(
                &store,
                &notifier,
                oracle.as_ref(),
                challenge,
                user,
                weight,
                waist,
                [
                    refs[0].as_str(),
                    refs[1].as_str(),
                    refs[2].as_str(),
                    refs[3].as_str(),
                ],
                Utc::now(),
            )?;
            if inserted {
                println!("check-in recorded");
            } else {
                println!("already checked in for this window");
            }
        }
        CheckinAction::Handoff { challenge, user } => {
            let window = windows::request_checkin_handoff(&store, challenge, user, Utc::now())?;
            println!(
                "window {} reserved, closes {}",
                window.window_number,
                window.closes_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
        CheckinAction::Windows { challenge } => {
            for window in store.list_windows(challenge)? {
                println!(
                    "{:3} [{}] opens {} closes {}",
                    window.window_number,
                    window.status.as_str(),
                    window.opens_at.format("%Y-%m-%d %H:%M"),
                    window.closes_at.format("%Y-%m-%d %H:%M"),
                );
            }
        }
    }
    Ok(())
}
