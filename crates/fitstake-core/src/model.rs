//! Entity types for the fitstake data model.
//!
//! One `Challenge` per group chat; each challenge owns its
//! `Participant`s, `CheckinWindow`s, and (at most) one
//! `BankHolderElection`. Each participant owns its `Goal`, `Payment`,
//! and `Checkin`s. Status enums are stored as text in SQLite and
//! round-trip through `as_str`/`parse`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    Draft,
    PendingPayments,
    Active,
    Completed,
    Cancelled,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Draft => "draft",
            ChallengeStatus::PendingPayments => "pending_payments",
            ChallengeStatus::Active => "active",
            ChallengeStatus::Completed => "completed",
            ChallengeStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending_payments" => ChallengeStatus::PendingPayments,
            "active" => ChallengeStatus::Active,
            "completed" => ChallengeStatus::Completed,
            "cancelled" => ChallengeStatus::Cancelled,
            _ => ChallengeStatus::Draft,
        }
    }

    /// Completed and cancelled challenges never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ChallengeStatus::Completed | ChallengeStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub creator_id: i64,
    /// Duration in the unit configured for the deployment
    /// (months in production, minutes under test).
    pub duration_value: i64,
    pub stake_amount: f64,
    /// Fraction of check-ins a winner must have completed (0.0-1.0).
    pub discipline_threshold: f64,
    pub max_skips: i64,
    pub bank_holder_id: Option<i64>,
    pub bank_holder_username: Option<String>,
    pub status: ChallengeStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Track {
    /// Weight/waist reduction.
    Cut,
    /// Weight gain; waist is not scored.
    Bulk,
}

impl Track {
    pub fn as_str(&self) -> &'static str {
        match self {
            Track::Cut => "cut",
            Track::Bulk => "bulk",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "bulk" => Track::Bulk,
            _ => Track::Cut,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Joined but has not finished the onboarding flow.
    Onboarding,
    /// Onboarding complete, stake not yet marked as paid.
    PendingPayment,
    /// Marked as paid, waiting for Bank Holder confirmation.
    PaymentMarked,
    /// Payment confirmed, actively participating.
    Active,
    /// Left or timed out before the challenge started.
    Dropped,
    /// Exceeded the allowed number of skipped check-ins.
    Disqualified,
    /// Reached the challenge finale.
    Completed,
}

impl ParticipantStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantStatus::Onboarding => "onboarding",
            ParticipantStatus::PendingPayment => "pending_payment",
            ParticipantStatus::PaymentMarked => "payment_marked",
            ParticipantStatus::Active => "active",
            ParticipantStatus::Dropped => "dropped",
            ParticipantStatus::Disqualified => "disqualified",
            ParticipantStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending_payment" => ParticipantStatus::PendingPayment,
            "payment_marked" => ParticipantStatus::PaymentMarked,
            "active" => ParticipantStatus::Active,
            "dropped" => ParticipantStatus::Dropped,
            "disqualified" => ParticipantStatus::Disqualified,
            "completed" => ParticipantStatus::Completed,
            _ => ParticipantStatus::Onboarding,
        }
    }

    /// Statuses that still block challenge activation: the participant
    /// has not yet produced a confirmed payment and has not exited.
    pub fn blocks_activation(&self) -> bool {
        matches!(
            self,
            ParticipantStatus::Onboarding
                | ParticipantStatus::PendingPayment
                | ParticipantStatus::PaymentMarked
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub id: i64,
    pub challenge_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub track: Option<Track>,
    pub start_weight: Option<f64>,
    pub start_waist: Option<f64>,
    pub height: Option<f64>,
    pub start_photo_front: Option<String>,
    pub start_photo_left: Option<String>,
    pub start_photo_right: Option<String>,
    pub start_photo_back: Option<String>,
    pub total_checkins: i64,
    pub completed_checkins: i64,
    pub skipped_checkins: i64,
    /// Check-in handoff from the group chat: window waiting for this
    /// participant's submission in a direct conversation.
    pub pending_checkin_window_id: Option<i64>,
    pub pending_checkin_requested_at: Option<DateTime<Utc>>,
    pub status: ParticipantStatus,
    pub joined_at: DateTime<Utc>,
    pub onboarding_completed_at: Option<DateTime<Utc>>,
}

impl Participant {
    pub fn display_name(&self) -> String {
        self.first_name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| format!("User {}", self.user_id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalVerdict {
    Realistic,
    TooAggressive,
    TooEasy,
}

impl GoalVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalVerdict::Realistic => "realistic",
            GoalVerdict::TooAggressive => "too_aggressive",
            GoalVerdict::TooEasy => "too_easy",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "too_aggressive" => GoalVerdict::TooAggressive,
            "too_easy" => GoalVerdict::TooEasy,
            _ => GoalVerdict::Realistic,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub participant_id: i64,
    pub target_weight: Option<f64>,
    pub target_waist: Option<f64>,
    pub is_validated: bool,
    pub validation_result: Option<GoalVerdict>,
    pub validation_feedback: Option<String>,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    MarkedPaid,
    Confirmed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::MarkedPaid => "marked_paid",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "marked_paid" => PaymentStatus::MarkedPaid,
            "confirmed" => PaymentStatus::Confirmed,
            "refunded" => PaymentStatus::Refunded,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub participant_id: i64,
    pub status: PaymentStatus,
    pub marked_paid_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    /// Bank Holder user id that attested the transfer.
    pub confirmed_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    Scheduled,
    Open,
    Closed,
}

impl WindowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowStatus::Scheduled => "scheduled",
            WindowStatus::Open => "open",
            WindowStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "open" => WindowStatus::Open,
            "closed" => WindowStatus::Closed,
            _ => WindowStatus::Scheduled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinWindow {
    pub id: i64,
    pub challenge_id: i64,
    /// 1-based sequence number within the challenge.
    pub window_number: i64,
    pub opens_at: DateTime<Utc>,
    pub closes_at: DateTime<Utc>,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub status: WindowStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkin {
    pub id: i64,
    pub participant_id: i64,
    pub window_id: i64,
    pub weight: f64,
    pub waist: f64,
    pub photo_front: String,
    pub photo_left: String,
    pub photo_right: String,
    pub photo_back: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionStatus {
    InProgress,
    Completed,
    Cancelled,
}

impl ElectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionStatus::InProgress => "in_progress",
            ElectionStatus::Completed => "completed",
            ElectionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => ElectionStatus::Completed,
            "cancelled" => ElectionStatus::Cancelled,
            _ => ElectionStatus::InProgress,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankHolderElection {
    pub id: i64,
    pub challenge_id: i64,
    pub initiated_by: i64,
    pub status: ElectionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankHolderVote {
    pub id: i64,
    pub election_id: i64,
    pub voter_id: i64,
    pub voted_for_id: i64,
    pub voted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentTemplate {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// "nutrition", "exercise", or "lifestyle".
    pub category: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantCommitment {
    pub id: i64,
    pub participant_id: i64,
    pub template_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Advisory output stored alongside a check-in. Best-effort: written
/// only when the oracle call succeeded or fell back cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinRecommendation {
    pub id: i64,
    pub checkin_id: i64,
    pub participant_id: i64,
    pub progress_assessment: String,
    pub body_composition_notes: String,
    pub nutrition_advice: String,
    pub training_advice: String,
    pub motivational_message: String,
    /// JSON array of warning strings.
    pub warning_flags: Option<String>,
    pub model: String,
    pub processing_time_ms: Option<i64>,
    pub created_at: DateTime<Utc>,
}
