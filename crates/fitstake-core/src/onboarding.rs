//! Onboarding progress tracking.
//!
//! A participant walks through track selection, body measurements,
//! four baseline photos, a goal, and a small set of commitments
//! before payment is requested. Progress is derived from the stored
//! row, so an interrupted run resumes at the first missing step.

use crate::model::{Goal, Participant};

/// Minimum and maximum number of commitments a participant picks.
pub const MIN_COMMITMENTS: usize = 2;
pub const MAX_COMMITMENTS: usize = 3;

/// The next thing a participant in `onboarding` has to provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingStep {
    /// Pick cut or bulk.
    Track,
    /// Weight, waist, optional height.
    Measurements,
    /// Front, left, right, back baseline photos.
    Photos,
    /// Target weight and waist.
    Goal,
    /// Choose 2 or 3 commitments from the catalog.
    Commitments,
    /// Everything collected; ready to flip to `pending_payment`.
    Done,
}

impl OnboardingStep {
    pub fn prompt(&self) -> &'static str {
        match self {
            OnboardingStep::Track => "Choose your track: cut or bulk.",
            OnboardingStep::Measurements => "Send your current weight, waist, and height.",
            OnboardingStep::Photos => "Send four baseline photos: front, left, right, back.",
            OnboardingStep::Goal => "Set your target weight and waist.",
            OnboardingStep::Commitments => "Pick 2-3 commitments from the catalog.",
            OnboardingStep::Done => "Onboarding complete. Awaiting payment.",
        }
    }
}

/// Snapshot of how far into onboarding a participant is.
#[derive(Debug, Clone, Copy)]
pub struct OnboardingProgress {
    pub has_track: bool,
    pub has_measurements: bool,
    pub has_photos: bool,
    pub has_goal: bool,
    pub commitments: usize,
}

impl OnboardingProgress {
    pub fn assess(participant: &Participant, goal: Option<&Goal>, commitments: usize) -> Self {
        Self {
            has_track: participant.track.is_some(),
            has_measurements: participant.start_weight.is_some()
                && participant.start_waist.is_some(),
            has_photos: participant.start_photo_front.is_some()
                && participant.start_photo_left.is_some()
                && participant.start_photo_right.is_some()
                && participant.start_photo_back.is_some(),
            has_goal: goal
                .map(|g| g.target_weight.is_some() && g.target_waist.is_some())
                .unwrap_or(false),
            commitments,
        }
    }

    /// The first incomplete step, in collection order.
    pub fn next_step(&self) -> OnboardingStep {
        if !self.has_track {
            OnboardingStep::Track
        } else if !self.has_measurements {
            OnboardingStep::Measurements
        } else if !self.has_photos {
            OnboardingStep::Photos
        } else if !self.has_goal {
            OnboardingStep::Goal
        } else if self.commitments < MIN_COMMITMENTS {
            OnboardingStep::Commitments
        } else {
            OnboardingStep::Done
        }
    }

    pub fn is_complete(&self) -> bool {
        self.next_step() == OnboardingStep::Done
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParticipantStatus, Track};
    use chrono::Utc;

    fn participant() -> Participant {
        Participant {
            id: 1,
            challenge_id: 1,
            user_id: 7,
            username: None,
            first_name: None,
            track: None,
            start_weight: None,
            start_waist: None,
            height: None,
            start_photo_front: None,
            start_photo_left: None,
            start_photo_right: None,
            start_photo_back: None,
            total_checkins: 0,
            completed_checkins: 0,
            skipped_checkins: 0,
            pending_checkin_window_id: None,
            pending_checkin_requested_at: None,
            status: ParticipantStatus::Onboarding,
            joined_at: Utc::now(),
            onboarding_completed_at: None,
        }
    }

    fn goal() -> Goal {
        Goal {
            id: 1,
            participant_id: 1,
            target_weight: Some(90.0),
            target_waist: Some(85.0),
            is_validated: false,
            validation_result: None,
            validation_feedback: None,
            validated_at: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn steps_advance_in_collection_order() {
        let mut p = participant();
        let assess = |p: &Participant, g: Option<&Goal>, c: usize| {
            OnboardingProgress::assess(p, g, c).next_step()
        };

        assert_eq!(assess(&p, None, 0), OnboardingStep::Track);
        p.track = Some(Track::Cut);
        assert_eq!(assess(&p, None, 0), OnboardingStep::Measurements);
        p.start_weight = Some(100.0);
        p.start_waist = Some(95.0);
        assert_eq!(assess(&p, None, 0), OnboardingStep::Photos);
        p.start_photo_front = Some("f".into());
        p.start_photo_left = Some("l".into());
        p.start_photo_right = Some("r".into());
        p.start_photo_back = Some("b".into());
        assert_eq!(assess(&p, None, 0), OnboardingStep::Goal);
        let g = goal();
        assert_eq!(assess(&p, Some(&g), 0), OnboardingStep::Commitments);
        assert_eq!(assess(&p, Some(&g), 1), OnboardingStep::Commitments);
        assert_eq!(assess(&p, Some(&g), 2), OnboardingStep::Done);
        assert!(OnboardingProgress::assess(&p, Some(&g), 2).is_complete());
    }

    #[test]
    fn partial_photos_do_not_count() {
        let mut p = participant();
        p.track = Some(Track::Cut);
        p.start_weight = Some(100.0);
        p.start_waist = Some(95.0);
        p.start_photo_front = Some("f".into());
        p.start_photo_back = Some("b".into());
        let progress = OnboardingProgress::assess(&p, None, 0);
        assert_eq!(progress.next_step(), OnboardingStep::Photos);
    }

    #[test]
    fn goal_without_targets_does_not_count() {
        let mut p = participant();
        p.track = Some(Track::Cut);
        p.start_weight = Some(100.0);
        p.start_waist = Some(95.0);
        p.start_photo_front = Some("f".into());
        p.start_photo_left = Some("l".into());
        p.start_photo_right = Some("r".into());
        p.start_photo_back = Some("b".into());
        let mut g = goal();
        g.target_waist = None;
        let progress = OnboardingProgress::assess(&p, Some(&g), 2);
        assert_eq!(progress.next_step(), OnboardingStep::Goal);
    }
}
