use chrono::Utc;
use clap::Subcommand;
use fitstake_core::store::OnboardingUpdate;
use fitstake_core::{
    metrics, Config, ConsoleNotifier, DurationUnit, Lifecycle, NotFoundError, Store, Track,
};

use super::oracle_from;

#[derive(Subcommand)]
pub enum MemberAction {
    /// Join the chat's ongoing challenge (or resume onboarding)
    Join {
        #[arg(long)]
        chat: i64,
        #[arg(long)]
        user: i64,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
    },
    /// Record onboarding data for a participant
    Onboard {
        #[arg(long)]
        participant: i64,
        /// "cut" or "bulk"
        #[arg(long)]
        track: Option<String>,
        #[arg(long)]
        weight: Option<f64>,
        #[arg(long)]
        waist: Option<f64>,
        #[arg(long)]
        height: Option<f64>,
        /// Photo references, front/left/right/back
        #[arg(long)]
        photo_front: Option<String>,
        #[arg(long)]
        photo_left: Option<String>,
        #[arg(long)]
        photo_right: Option<String>,
        #[arg(long)]
        photo_back: Option<String>,
    },
    /// Suggest goal targets from the recorded measurements
    Suggest {
        #[arg(long)]
        participant: i64,
    },
    /// Set the participant's goal and run it past the advisor
    Goal {
        #[arg(long)]
        participant: i64,
        #[arg(long)]
        weight: f64,
        #[arg(long)]
        waist: f64,
    },
    /// Pick 2-3 commitments by template id
    Commit {
        #[arg(long)]
        participant: i64,
        /// Template ids
        ids: Vec<i64>,
    },
    /// List the commitment catalog
    Catalog,
    /// Show onboarding progress and the next step
    Progress {
        #[arg(long)]
        participant: i64,
    },
    /// Finish onboarding and move to the payment stage
    Complete {
        #[arg(long)]
        participant: i64,
    },
}

pub fn run(action: MemberAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::open()?;
    let config = Config::load_or_default();
    let notifier = ConsoleNotifier;
    let lifecycle = Lifecycle::new(&store, &notifier, &config);

    match action {
        MemberAction::Join {
            chat,
            user,
            username,
            first_name,
        } => {
            let participant = lifecycle.join(
                chat,
                user,
                username.as_deref(),
                first_name.as_deref(),
                Utc::now(),
            )?;
            println!("{}", serde_json::to_string_pretty(&participant)?);
        }
        MemberAction::Onboard {
            participant,
            track,
            weight,
            waist,
            height,
            photo_front,
            photo_left,
            photo_right,
            photo_back,
        } => {
            let update = OnboardingUpdate {
                track: track.as_deref().map(Track::parse),
                start_weight: weight,
                start_waist: waist,
                height,
                start_photo_front: photo_front,
                start_photo_left: photo_left,
                start_photo_right: photo_right,
                start_photo_back: photo_back,
            };
            let updated = lifecycle.update_onboarding(participant, &update)?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
        MemberAction::Suggest { participant } => {
            let p = store
                .find_participant(participant)?
                .ok_or(NotFoundError::Participant(participant))?;
            let (Some(track), Some(weight), Some(waist), Some(height)) =
                (p.track, p.start_weight, p.start_waist, p.height)
            else {
                return Err("record track, weight, waist, and height first".into());
            };
            let months = match config.challenge.duration_unit {
                DurationUnit::Months => config.challenge.duration_value,
                DurationUnit::Minutes => 1,
            };
            let rec = metrics::recommended_goals(track, weight, waist, height, months);
            let bmi = metrics::bmi(weight, height);
            let whtr = metrics::waist_height_ratio(waist, height);
            println!(
                "now: BMI {:.1} ({}), waist/height {:.2} ({})",
                bmi,
                metrics::bmi_category(bmi),
                whtr,
                metrics::whtr_status(whtr),
            );
            println!(
                "weight target: {:.0} kg ({})",
                rec.target_weight, rec.weight_reason
            );
            println!(
                "waist target:  {:.0} cm ({})",
                rec.target_waist, rec.waist_reason
            );
        }
        MemberAction::Goal {
            participant,
            weight,
            waist,
        } => {
            let oracle = oracle_from(&config)?;
            let validation =
                lifecycle.set_goal(participant, weight, waist, oracle.as_ref(), Utc::now())?;
            println!("{}: {}", validation.result.as_str(), validation.feedback);
        }
        MemberAction::Commit { participant, ids } => {
            lifecycle.choose_commitments(participant, &ids, Utc::now())?;
            println!("{} commitments set", ids.len());
        }
        MemberAction::Catalog => {
            for template in store.list_active_templates()? {
                println!(
                    "{:3}  {:<22} [{}] {}",
                    template.id, template.name, template.category, template.description
                );
            }
        }
        MemberAction::Progress { participant } => {
            let progress = lifecycle.onboarding_progress(participant)?;
            println!("next: {}", progress.next_step().prompt());
        }
        MemberAction::Complete { participant } => {
            let updated = lifecycle.complete_onboarding(participant, Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
    }
    Ok(())
}
