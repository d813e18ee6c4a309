//! Challenge and participant lifecycle transitions.
//!
//! Every transition lives behind a guard check and, where two callers
//! can race, a conditional store update whose affected-row count
//! decides which caller proceeds with side effects. Notifications are
//! best-effort and never abort a transition that already committed.

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::config::{add_duration, Config};
use crate::election::select_bank_holder;
use crate::error::{GuardError, NotFoundError, Result};
use crate::model::{
    BankHolderElection, Challenge, ChallengeStatus, ElectionStatus, Participant,
    ParticipantStatus, Track,
};
use crate::notify::{notify_best_effort, Notifier, Recipient};
use crate::onboarding::{OnboardingProgress, MAX_COMMITMENTS, MIN_COMMITMENTS};
use crate::oracle::{AdvisoryOracle, GoalParams, GoalValidation};
use crate::scoring::{self, ScoreInput};
use crate::store::{NewChallenge, OnboardingUpdate, Store};
use crate::windows;

/// Shared context for lifecycle operations.
pub struct Lifecycle<'a> {
    pub store: &'a Store,
    pub notifier: &'a dyn Notifier,
    pub config: &'a Config,
}

impl<'a> Lifecycle<'a> {
    pub fn new(store: &'a Store, notifier: &'a dyn Notifier, config: &'a Config) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    fn challenge(&self, id: i64) -> Result<Challenge> {
        Ok(self
            .store
            .find_challenge(id)?
            .ok_or(NotFoundError::Challenge(id))?)
    }

    fn participant_of(&self, challenge_id: i64, user_id: i64) -> Result<Participant> {
        Ok(self
            .store
            .find_participant_by_user(challenge_id, user_id)?
            .ok_or(NotFoundError::Participant(user_id))?)
    }

    /// Participants allowed to vote and be voted for: everyone past
    /// the onboarding stage.
    fn eligible_voters(&self, challenge_id: i64) -> Result<Vec<Participant>> {
        Ok(self
            .store
            .list_participants(challenge_id)?
            .into_iter()
            .filter(|p| p.status != ParticipantStatus::Onboarding)
            .collect())
    }

    // === Challenge creation and joining ===

    /// Create a draft challenge for a chat. At most one non-terminal
    /// challenge per chat.
    pub fn create_challenge(
        &self,
        chat_id: i64,
        chat_title: Option<&str>,
        creator_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Challenge> {
        if self.store.find_ongoing_by_chat(chat_id)?.is_some() {
            return Err(GuardError::ChallengeExists { chat_id }.into());
        }
        let defaults = &self.config.challenge;
        let challenge = self.store.create_challenge(
            &NewChallenge {
                chat_id,
                chat_title: chat_title.map(str::to_string),
                creator_id,
                duration_value: defaults.duration_value,
                stake_amount: defaults.stake_amount,
                discipline_threshold: defaults.discipline_threshold,
                max_skips: defaults.max_skips,
            },
            now,
        )?;
        info!(challenge_id = challenge.id, chat_id, "challenge created");
        notify_best_effort(
            self.notifier,
            Recipient::Chat(chat_id),
            &format!(
                "New challenge! Stake {:.0}, duration {} {}. Join and start onboarding.",
                challenge.stake_amount,
                challenge.duration_value,
                defaults.duration_unit.label(),
            ),
        );
        Ok(challenge)
    }

    /// Join the chat's ongoing challenge, or resume/restart a previous
    /// attempt. A dropped participant rejoining while the challenge
    /// has not started gets their row reset to a clean onboarding
    /// state; an in-progress participant simply resumes.
    pub fn join(
        &self,
        chat_id: i64,
        user_id: i64,
        username: Option<&str>,
        first_name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Participant> {
        let challenge = self
            .store
            .find_ongoing_by_chat(chat_id)?
            .ok_or(NotFoundError::ChallengeForChat(chat_id))?;
        if !matches!(
            challenge.status,
            ChallengeStatus::Draft | ChallengeStatus::PendingPayments
        ) {
            return Err(GuardError::JoiningClosed.into());
        }
        if let Some(existing) = self
            .store
            .find_participant_by_user(challenge.id, user_id)?
        {
            if existing.status == ParticipantStatus::Dropped {
                // Fresh start: wipe the previous attempt's snapshot.
                self.store.delete_goal_by_participant(existing.id)?;
                self.store.delete_participant_commitments(existing.id)?;
                self.store.restart_onboarding(existing.id, now)?;
                info!(participant_id = existing.id, "dropped participant rejoined");
                return Ok(self
                    .store
                    .find_participant(existing.id)?
                    .ok_or(NotFoundError::Participant(user_id))?);
            }
            if existing.status == ParticipantStatus::Onboarding {
                // Resume where they left off.
                return Ok(existing);
            }
            return Err(GuardError::AlreadyJoined { user_id }.into());
        }
        let participant = self
            .store
            .create_participant(challenge.id, user_id, username, first_name, now)?;
        info!(
            participant_id = participant.id,
            challenge_id = challenge.id,
            "participant joined"
        );
        Ok(participant)
    }

    // === Onboarding ===

    /// Record a slice of onboarding data (track, measurements, photo
    /// references). Only participants still in `onboarding` may write.
    pub fn update_onboarding(
        &self,
        participant_id: i64,
        update: &OnboardingUpdate,
    ) -> Result<Participant> {
        let participant = self
            .store
            .find_participant(participant_id)?
            .ok_or(NotFoundError::Participant(participant_id))?;
        if participant.status != ParticipantStatus::Onboarding {
            return Err(GuardError::OnboardingIncomplete.into());
        }
        self.store.set_onboarding_data(participant_id, update)?;
        Ok(self
            .store
            .find_participant(participant_id)?
            .ok_or(NotFoundError::Participant(participant_id))?)
    }

    /// Set or revise the participant's goal and run it past the
    /// advisory oracle. The verdict is stored but never blocks; an
    /// unreachable oracle answers "realistic".
    pub fn set_goal(
        &self,
        participant_id: i64,
        target_weight: f64,
        target_waist: f64,
        oracle: &dyn AdvisoryOracle,
        now: DateTime<Utc>,
    ) -> Result<GoalValidation> {
        let participant = self
            .store
            .find_participant(participant_id)?
            .ok_or(NotFoundError::Participant(participant_id))?;
        if participant.status != ParticipantStatus::Onboarding {
            return Err(GuardError::OnboardingIncomplete.into());
        }
        let goal = match self.store.find_goal_by_participant(participant_id)? {
            Some(goal) => {
                self.store.update_goal_targets(
                    goal.id,
                    Some(target_weight),
                    Some(target_waist),
                    now,
                )?;
                goal
            }
            None => self.store.create_goal(
                participant_id,
                Some(target_weight),
                Some(target_waist),
                now,
            )?,
        };

        let validation = match (participant.start_weight, participant.start_waist) {
            (Some(start_weight), Some(start_waist)) => {
                let duration_days = add_duration(
                    now,
                    self.config.challenge.duration_value,
                    self.config.challenge.duration_unit,
                )
                .signed_duration_since(now)
                .num_days();
                oracle.validate_goal(&GoalParams {
                    track: participant.track.unwrap_or(Track::Cut),
                    start_weight,
                    start_waist,
                    height: participant.height,
                    target_weight,
                    target_waist,
                    duration_days,
                })
            }
            _ => GoalValidation::neutral(),
        };
        self.store
            .update_goal_validation(goal.id, validation.result, &validation.feedback, now)?;
        Ok(validation)
    }

    /// Pick 2-3 commitments from the catalog.
    pub fn choose_commitments(
        &self,
        participant_id: i64,
        template_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<()> {
        if !(MIN_COMMITMENTS..=MAX_COMMITMENTS).contains(&template_ids.len()) {
            return Err(GuardError::CommitmentCount {
                min: MIN_COMMITMENTS,
                max: MAX_COMMITMENTS,
            }
            .into());
        }
        let participant = self
            .store
            .find_participant(participant_id)?
            .ok_or(NotFoundError::Participant(participant_id))?;
        if participant.status != ParticipantStatus::Onboarding {
            return Err(GuardError::OnboardingIncomplete.into());
        }
        self.store
            .set_participant_commitments(participant_id, template_ids, now)?;
        Ok(())
    }

    /// Derive the participant's onboarding progress from stored state.
    pub fn onboarding_progress(&self, participant_id: i64) -> Result<OnboardingProgress> {
        let participant = self
            .store
            .find_participant(participant_id)?
            .ok_or(NotFoundError::Participant(participant_id))?;
        let goal = self.store.find_goal_by_participant(participant_id)?;
        let commitments = self.store.list_participant_commitments(participant_id)?;
        Ok(OnboardingProgress::assess(
            &participant,
            goal.as_ref(),
            commitments.len(),
        ))
    }

    /// Finish onboarding: flip to `pending_payment` and open the
    /// payment record.
    pub fn complete_onboarding(
        &self,
        participant_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Participant> {
        let progress = self.onboarding_progress(participant_id)?;
        if !progress.is_complete() {
            return Err(GuardError::OnboardingIncomplete.into());
        }
        if !self.store.complete_onboarding(participant_id, now)? {
            return Err(GuardError::OnboardingIncomplete.into());
        }
        self.store.get_or_create_payment(participant_id, now)?;
        let participant = self
            .store
            .find_participant(participant_id)?
            .ok_or(NotFoundError::Participant(participant_id))?;
        notify_best_effort(
            self.notifier,
            Recipient::User(participant.user_id),
            "Onboarding complete. Send your stake to the bank holder and mark it paid.",
        );
        Ok(participant)
    }

    // === Payments ===

    /// The participant declares they transferred the stake. May
    /// implicitly start the bank holder election.
    pub fn mark_paid(&self, chat_id: i64, user_id: i64, now: DateTime<Utc>) -> Result<()> {
        let challenge = self
            .store
            .find_ongoing_by_chat(chat_id)?
            .ok_or(NotFoundError::ChallengeForChat(chat_id))?;
        let participant = self.participant_of(challenge.id, user_id)?;
        if participant.status != ParticipantStatus::PendingPayment {
            return Err(GuardError::NotAwaitingPayment.into());
        }
        if !self.store.mark_payment_paid(participant.id, now)? {
            return Err(GuardError::NotAwaitingPayment.into());
        }
        self.store
            .update_participant_status(participant.id, ParticipantStatus::PaymentMarked)?;
        info!(participant_id = participant.id, "payment marked");
        notify_best_effort(
            self.notifier,
            Recipient::Chat(chat_id),
            &format!("{} marked their stake as paid.", participant.display_name()),
        );

        // First marked payment with enough onboarded members and no
        // bank holder yet kicks off the election.
        if challenge.bank_holder_id.is_none()
            && self.store.find_election_by_challenge(challenge.id)?.is_none()
            && self.eligible_voters(challenge.id)?.len() >= 2
        {
            if let Err(err) = self.start_election(challenge.id, user_id, now) {
                warn!("implicit election start failed: {err}");
            }
        }
        Ok(())
    }

    /// Bank holder confirms receipt of one participant's stake. The
    /// confirmed payment and the participant's activation commit
    /// together; if this was the last outstanding payment the whole
    /// challenge activates.
    pub fn confirm_payment(
        &self,
        chat_id: i64,
        confirmer_id: i64,
        user_id: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let challenge = self
            .store
            .find_ongoing_by_chat(chat_id)?
            .ok_or(NotFoundError::ChallengeForChat(chat_id))?;
        if challenge.bank_holder_id != Some(confirmer_id) {
            return Err(GuardError::NotBankHolder.into());
        }
        let participant = self.participant_of(challenge.id, user_id)?;
        if participant.status != ParticipantStatus::PaymentMarked {
            return Err(GuardError::PaymentNotMarked.into());
        }
        if !self
            .store
            .confirm_payment_and_activate(participant.id, confirmer_id, now)?
        {
            // Lost a race with another confirmation of the same row.
            return Err(GuardError::PaymentNotMarked.into());
        }
        info!(participant_id = participant.id, "payment confirmed");
        notify_best_effort(
            self.notifier,
            Recipient::User(user_id),
            "Your payment is confirmed. You're in!",
        );
        self.try_activate(&challenge, now)?;
        Ok(())
    }

    /// Activate the challenge once every participant holds a
    /// confirmed payment. The conditional update makes concurrent
    /// last-payment detections schedule windows exactly once.
    fn try_activate(&self, challenge: &Challenge, now: DateTime<Utc>) -> Result<bool> {
        let participants = self.store.list_participants(challenge.id)?;
        let active: Vec<&Participant> = participants
            .iter()
            .filter(|p| p.status == ParticipantStatus::Active)
            .collect();
        if active.is_empty() || participants.iter().any(|p| p.status.blocks_activation()) {
            return Ok(false);
        }
        let ends_at = add_duration(
            now,
            challenge.duration_value,
            self.config.challenge.duration_unit,
        );
        if !self.store.activate_challenge(challenge.id, now, ends_at)? {
            return Ok(false);
        }
        let count = windows::schedule_windows(self.store, challenge.id, now, ends_at, self.config)?;
        info!(
            challenge_id = challenge.id,
            windows = count,
            "challenge activated"
        );
        notify_best_effort(
            self.notifier,
            Recipient::Chat(challenge.chat_id),
            &format!(
                "All stakes confirmed. The challenge is on! First check-in window opens in {} days.",
                self.config.checkin.period().num_days()
            ),
        );
        Ok(true)
    }

    // === Bank holder election ===

    /// Hand the bank over directly, skipping or concluding a vote.
    pub fn assign_bank_holder(&self, challenge_id: i64, user_id: i64) -> Result<()> {
        let challenge = self.challenge(challenge_id)?;
        if challenge.bank_holder_id.is_some() {
            return Err(GuardError::BankHolderAssigned.into());
        }
        let holder = self.participant_of(challenge_id, user_id)?;
        self.store
            .set_bank_holder(challenge_id, user_id, holder.username.as_deref())?;
        // Draft challenges move on to collecting payments; a challenge
        // already past draft keeps its status.
        self.store.update_challenge_status_if(
            challenge_id,
            ChallengeStatus::Draft,
            ChallengeStatus::PendingPayments,
        )?;
        notify_best_effort(
            self.notifier,
            Recipient::Chat(challenge.chat_id),
            &format!(
                "{} holds the bank. Send your stakes their way.",
                holder.display_name()
            ),
        );
        Ok(())
    }

    /// Open the bank holder vote. One election per challenge.
    pub fn start_election(
        &self,
        challenge_id: i64,
        initiated_by: i64,
        now: DateTime<Utc>,
    ) -> Result<BankHolderElection> {
        let challenge = self.challenge(challenge_id)?;
        if challenge.bank_holder_id.is_some() {
            return Err(GuardError::BankHolderAssigned.into());
        }
        let election = self
            .store
            .create_election(challenge_id, initiated_by, now)?
            .ok_or(GuardError::ElectionExists)?;
        let eligible = self.eligible_voters(challenge_id)?;
        for voter in &eligible {
            notify_best_effort(
                self.notifier,
                Recipient::User(voter.user_id),
                "Bank holder vote is open. Pick who should hold the stakes.",
            );
        }
        info!(election_id = election.id, "election started");
        Ok(election)
    }

    /// Record one vote. The unique index rejects a second vote from
    /// the same voter. When the last eligible voter votes, the
    /// election finalizes.
    pub fn cast_vote(
        &self,
        challenge_id: i64,
        voter_id: i64,
        voted_for_id: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let election = self
            .store
            .find_election_by_challenge(challenge_id)?
            .ok_or(NotFoundError::Election(challenge_id))?;
        if election.status != ElectionStatus::InProgress {
            return Err(GuardError::ElectionNotInProgress.into());
        }
        let eligible = self.eligible_voters(challenge_id)?;
        if !eligible.iter().any(|p| p.user_id == voter_id) {
            return Err(GuardError::NotEligible { user_id: voter_id }.into());
        }
        if !eligible.iter().any(|p| p.user_id == voted_for_id) {
            return Err(GuardError::NotEligible {
                user_id: voted_for_id,
            }
            .into());
        }
        if !self
            .store
            .insert_vote(election.id, voter_id, voted_for_id, now)?
        {
            return Err(GuardError::AlreadyVoted { voter_id }.into());
        }
        let votes = self.store.list_votes(election.id)?;
        if votes.len() >= eligible.len() {
            self.finalize_election(election.id, now)?;
        }
        Ok(())
    }

    /// Close the election and install the winner. Both the all-votes
    /// path and the timeout tick call this; the status flip is the
    /// exclusive gate, so only one caller performs the side effects.
    /// A second call is a benign no-op reporting `None`.
    pub fn finalize_election(
        &self,
        election_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let election = self
            .store
            .find_election(election_id)?
            .ok_or(NotFoundError::Election(election_id))?;
        if !self.store.complete_election_if_in_progress(election.id, now)? {
            return Ok(None);
        }
        let challenge = self.challenge(election.challenge_id)?;
        let eligible = self.eligible_voters(challenge.id)?;
        let votes = self.store.list_votes(election.id)?;
        let Some(result) = select_bank_holder(&eligible, &votes, challenge.creator_id) else {
            warn!(election_id, "election finalized with nobody eligible");
            return Ok(None);
        };
        let winner = eligible
            .iter()
            .find(|p| p.user_id == result.winner_id)
            .map(|p| p.username.clone())
            .unwrap_or(None);
        self.store
            .set_bank_holder(challenge.id, result.winner_id, winner.as_deref())?;
        self.store.update_challenge_status_if(
            challenge.id,
            ChallengeStatus::Draft,
            ChallengeStatus::PendingPayments,
        )?;
        info!(
            election_id,
            winner = result.winner_id,
            votes = result.max_votes,
            "election finalized"
        );
        notify_best_effort(
            self.notifier,
            Recipient::Chat(challenge.chat_id),
            &format!(
                "The vote is in: user {} holds the bank ({} votes). Send your stakes their way.",
                result.winner_id, result.max_votes
            ),
        );
        Ok(Some(result.winner_id))
    }

    /// Call off a challenge that has not started. Any open election
    /// is cancelled with it.
    pub fn cancel_challenge(&self, chat_id: i64, now: DateTime<Utc>) -> Result<()> {
        let challenge = self
            .store
            .find_ongoing_by_chat(chat_id)?
            .ok_or(NotFoundError::ChallengeForChat(chat_id))?;
        let cancelled = self.store.update_challenge_status_if(
            challenge.id,
            ChallengeStatus::Draft,
            ChallengeStatus::Cancelled,
        )? || self.store.update_challenge_status_if(
            challenge.id,
            ChallengeStatus::PendingPayments,
            ChallengeStatus::Cancelled,
        )?;
        if !cancelled {
            return Err(GuardError::ChallengeAlreadyStarted.into());
        }
        if let Some(election) = self.store.find_election_by_challenge(challenge.id)? {
            self.store.cancel_election_if_in_progress(election.id, now)?;
        }
        info!(challenge_id = challenge.id, "challenge cancelled");
        notify_best_effort(
            self.notifier,
            Recipient::Chat(chat_id),
            "The challenge was called off before it started. Marked stakes go back to their payers.",
        );
        Ok(())
    }

    // === Tick-driven timeouts and finales ===

    /// Drop participants stuck in onboarding past the timeout. Only
    /// strictly-`onboarding` rows older than the cutoff move; the scan
    /// is safe to repeat.
    pub fn drop_stale_onboarding(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::hours(self.config.timeouts.onboarding_hours);
        let stale = self.store.list_onboarding_older_than(cutoff)?;
        let mut dropped = 0;
        for participant in stale {
            if self.store.update_participant_status_if(
                participant.id,
                ParticipantStatus::Onboarding,
                ParticipantStatus::Dropped,
            )? {
                dropped += 1;
                info!(participant_id = participant.id, "onboarding timed out");
                notify_best_effort(
                    self.notifier,
                    Recipient::User(participant.user_id),
                    "Your onboarding timed out. Join again if you still want in.",
                );
            }
        }
        Ok(dropped)
    }

    /// Finalize elections that passed the voting deadline.
    pub fn finalize_overdue_elections(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - Duration::hours(self.config.timeouts.election_hours);
        let overdue = self.store.list_elections_in_progress_before(cutoff)?;
        let mut finalized = 0;
        for election in overdue {
            if self.finalize_election(election.id, now)?.is_some() {
                finalized += 1;
            }
        }
        Ok(finalized)
    }

    /// Complete challenges whose end time passed: score everyone who
    /// made it, mark them completed, and announce the standings.
    pub fn finish_due_challenges(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut finished = 0;
        for challenge in self.store.list_active_challenges()? {
            let Some(ends_at) = challenge.ends_at else {
                continue;
            };
            if now < ends_at {
                continue;
            }
            if !self.store.update_challenge_status_if(
                challenge.id,
                ChallengeStatus::Active,
                ChallengeStatus::Completed,
            )? {
                continue;
            }
            finished += 1;

            let survivors =
                self.store
                    .list_participants_by_status(challenge.id, ParticipantStatus::Active)?;
            let mut inputs = Vec::with_capacity(survivors.len());
            for participant in survivors {
                self.store
                    .update_participant_status(participant.id, ParticipantStatus::Completed)?;
                let goal = self.store.find_goal_by_participant(participant.id)?;
                let latest_checkin = self.store.latest_checkin(participant.id)?;
                inputs.push(ScoreInput {
                    participant,
                    goal,
                    latest_checkin,
                });
            }
            let scores = scoring::score_challenge(&challenge, &inputs);
            info!(
                challenge_id = challenge.id,
                scored = scores.len(),
                "challenge finished"
            );
            notify_best_effort(
                self.notifier,
                Recipient::Chat(challenge.chat_id),
                &scoring::format_results(&challenge, &scores),
            );
            for score in &scores {
                notify_best_effort(
                    self.notifier,
                    Recipient::User(score.user_id),
                    &scoring::format_personal_summary(&challenge, score),
                );
            }
        }
        Ok(finished)
    }
}
