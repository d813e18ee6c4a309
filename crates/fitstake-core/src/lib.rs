//! # Fitstake Core Library
//!
//! Core business logic for fitstake, a group fitness-accountability
//! challenge with real money at stake. It implements a CLI-first
//! philosophy: every operation is available via the standalone CLI
//! binary, with any chat front end being a thin layer over the same
//! core library.
//!
//! ## Architecture
//!
//! - **Lifecycle Manager**: state machines for challenges,
//!   participants, payments, and the bank holder election
//! - **Check-in Scheduler**: pre-scheduled submission windows advanced
//!   through open/remind/close by the tick
//! - **Scoring Engine**: goal-achievement and discipline scores plus
//!   prize distribution at the finale
//! - **Tick Runner**: a single periodic entry point driving every
//!   time-based transition idempotently
//! - **Storage**: SQLite-based entity storage and TOML-based
//!   configuration
//!
//! ## Key Components
//!
//! - [`Lifecycle`]: guarded state transitions
//! - [`Store`]: entity persistence with conditional-update gates
//! - [`Config`]: application configuration management
//! - [`run_tick`]: the time-driven job runner
//! - [`Notifier`] / [`AdvisoryOracle`] / [`PhotoStore`]: collaborator
//!   seams for delivery, goal advice, and photo bytes

pub mod config;
pub mod election;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod model;
pub mod notify;
pub mod onboarding;
pub mod oracle;
pub mod photos;
pub mod scoring;
pub mod store;
pub mod tick;
pub mod windows;

pub use config::{Config, DurationUnit};
pub use election::{select_bank_holder, ElectionResult};
pub use error::{CoreError, DatabaseError, GuardError, NotFoundError, Result};
pub use lifecycle::Lifecycle;
pub use metrics::{recommended_goals, RecommendedGoals};
pub use model::{
    BankHolderElection, BankHolderVote, Challenge, ChallengeStatus, Checkin, CheckinWindow,
    ElectionStatus, Goal, GoalVerdict, Participant, ParticipantStatus, Payment, PaymentStatus,
    Track, WindowStatus,
};
pub use notify::{ConsoleNotifier, DeliveryError, Notifier, Recipient};
pub use onboarding::{OnboardingProgress, OnboardingStep};
pub use oracle::{AdvisoryOracle, CheckinAdvice, GoalValidation, HttpOracle, NullOracle};
pub use photos::{FsPhotoStore, PhotoSlot, PhotoStore};
pub use scoring::{format_personal_summary, format_results, score_challenge, ParticipantScore, ScoreInput};
pub use store::{NewChallenge, OnboardingUpdate, Store};
pub use tick::{run_tick, TickReport};
