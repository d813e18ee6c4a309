//! Core error types for fitstake-core.
//!
//! Guard violations and not-found conditions are the only errors that
//! travel back to the initiating user flow; everything else is either
//! absorbed at the call site (collaborator failures) or treated as a
//! benign no-op (race losers, duplicate inserts).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for fitstake-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A legal-transition guard rejected the request. No state changed.
    #[error("{0}")]
    Guard(#[from] GuardError),

    /// A referenced entity does not exist (stale identifier).
    #[error("{0}")]
    NotFound(#[from] NotFoundError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// A state-machine guard rejected a transition. Nothing was mutated.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum GuardError {
    #[error("chat {chat_id} already has an ongoing challenge")]
    ChallengeExists { chat_id: i64 },

    #[error("challenge has already started")]
    ChallengeAlreadyStarted,

    #[error("challenge is not accepting participants")]
    JoiningClosed,

    #[error("user {user_id} already participates in this challenge")]
    AlreadyJoined { user_id: i64 },

    #[error("onboarding is not complete")]
    OnboardingIncomplete,

    #[error("participant is not awaiting payment")]
    NotAwaitingPayment,

    #[error("payment is not marked as paid")]
    PaymentNotMarked,

    #[error("only the Bank Holder can confirm payments")]
    NotBankHolder,

    #[error("a Bank Holder is already assigned")]
    BankHolderAssigned,

    #[error("an election is already in progress")]
    ElectionExists,

    #[error("election is not in progress")]
    ElectionNotInProgress,

    #[error("user {user_id} is not eligible for this election")]
    NotEligible { user_id: i64 },

    #[error("voter {voter_id} already cast a vote in this election")]
    AlreadyVoted { voter_id: i64 },

    #[error("check-in window is not open")]
    WindowNotOpen,

    #[error("participant is not active")]
    ParticipantNotActive,

    #[error("select between {min} and {max} commitments")]
    CommitmentCount { min: usize, max: usize },
}

/// A referenced entity is missing. Distinct from guard violations so
/// callers can tell a stale id from an illegal transition.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("challenge {0} not found")]
    Challenge(i64),

    #[error("no ongoing challenge in chat {0}")]
    ChallengeForChat(i64),

    #[error("participant {0} not found")]
    Participant(i64),

    #[error("payment for participant {0} not found")]
    Payment(i64),

    #[error("goal for participant {0} not found")]
    Goal(i64),

    #[error("election {0} not found")]
    Election(i64),

    #[error("check-in window {0} not found")]
    Window(i64),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

impl CoreError {
    /// True for errors that should be surfaced to the initiating user
    /// flow (guard violations and stale references).
    pub fn is_user_facing(&self) -> bool {
        matches!(self, CoreError::Guard(_) | CoreError::NotFound(_))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
