//! Check-in window scheduling and submission.
//!
//! Windows are materialized in bulk at activation and advanced by the
//! tick in strict open, remind, close order. Every phase transition
//! is a conditional status flip, so re-running a phase or overlapping
//! ticks cannot double-apply skip accounting or reminders.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{GuardError, NotFoundError, Result};
use crate::model::{CheckinWindow, ParticipantStatus, WindowStatus};
use crate::notify::{notify_best_effort, Notifier, Recipient};
use crate::oracle::{AdviceParams, AdvisoryOracle};
use crate::store::Store;

/// Create every window for a freshly activated challenge: window n
/// opens at `started_at + n * period` and stays open for the
/// configured length. No window opens past `ends_at`.
pub fn schedule_windows(
    store: &Store,
    challenge_id: i64,
    started_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    config: &Config,
) -> Result<usize> {
    let period = config.checkin.period();
    let length = config.checkin.window_length();
    let mut count = 0;
    let mut number = 1;
    loop {
        let opens_at = started_at + period * number as i32;
        if opens_at > ends_at {
            break;
        }
        store.create_window(challenge_id, number, opens_at, opens_at + length, started_at)?;
        count += 1;
        number += 1;
    }
    Ok(count)
}

/// Open phase: flip due `scheduled` windows to `open` and invite the
/// challenge's active participants to submit.
pub fn open_due_windows(
    store: &Store,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<usize> {
    let mut opened = 0;
    for window in store.windows_due_to_open(now)? {
        if !store.open_window_if_scheduled(window.id)? {
            continue;
        }
        opened += 1;
        info!(window_id = window.id, number = window.window_number, "window opened");
        let participants =
            store.list_participants_by_status(window.challenge_id, ParticipantStatus::Active)?;
        for participant in participants {
            notify_best_effort(
                notifier,
                Recipient::User(participant.user_id),
                &format!(
                    "Check-in window {} is open until {}. Send weight, waist, and four photos.",
                    window.window_number,
                    window.closes_at.format("%Y-%m-%d %H:%M UTC"),
                ),
            );
        }
    }
    Ok(opened)
}

/// Reminder phase: for open windows closing within the lead time,
/// stamp the reminder exactly once and nudge only the participants
/// who have not submitted yet.
pub fn send_due_reminders(
    store: &Store,
    notifier: &dyn Notifier,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<usize> {
    let threshold = now + config.checkin.reminder_lead();
    let mut reminded = 0;
    for window in store.windows_needing_reminder(threshold)? {
        if !store.mark_reminder_sent(window.id, now)? {
            continue;
        }
        reminded += 1;
        let participants =
            store.list_participants_by_status(window.challenge_id, ParticipantStatus::Active)?;
        for participant in participants {
            if store.find_checkin(participant.id, window.id)?.is_some() {
                continue;
            }
            notify_best_effort(
                notifier,
                Recipient::User(participant.user_id),
                &format!(
                    "Last call: check-in window {} closes at {}.",
                    window.window_number,
                    window.closes_at.format("%Y-%m-%d %H:%M UTC"),
                ),
            );
        }
    }
    Ok(reminded)
}

/// Close phase: flip due `open` windows to `closed`, charge a skip to
/// every active participant without a submission, and disqualify
/// anyone past the skip allowance. The status flip gates the
/// accounting, so a lost race never double-charges.
pub fn close_due_windows(
    store: &Store,
    notifier: &dyn Notifier,
    now: DateTime<Utc>,
) -> Result<usize> {
    let mut closed = 0;
    for window in store.windows_due_to_close(now)? {
        if !store.close_window_if_open(window.id)? {
            continue;
        }
        closed += 1;
        info!(window_id = window.id, number = window.window_number, "window closed");
        let Some(challenge) = store.find_challenge(window.challenge_id)? else {
            warn!(window_id = window.id, "window has no challenge");
            continue;
        };
        let participants =
            store.list_participants_by_status(window.challenge_id, ParticipantStatus::Active)?;
        for participant in participants {
            if store.find_checkin(participant.id, window.id)?.is_some() {
                continue;
            }
            let Some(updated) = store.increment_checkins(participant.id, false)? else {
                continue;
            };
            if updated.skipped_checkins > challenge.max_skips {
                if store.update_participant_status_if(
                    participant.id,
                    ParticipantStatus::Active,
                    ParticipantStatus::Disqualified,
                )? {
                    info!(participant_id = participant.id, "participant disqualified");
                    notify_best_effort(
                        notifier,
                        Recipient::User(participant.user_id),
                        "You missed too many check-ins and are out of the challenge.",
                    );
                    notify_best_effort(
                        notifier,
                        Recipient::Chat(challenge.chat_id),
                        &format!(
                            "{} is disqualified after missing too many check-ins.",
                            updated.display_name()
                        ),
                    );
                }
            } else {
                notify_best_effort(
                    notifier,
                    Recipient::User(participant.user_id),
                    &format!(
                        "Window {} closed without your check-in. {} skip(s) left.",
                        window.window_number,
                        challenge.max_skips - updated.skipped_checkins + 1,
                    ),
                );
            }
        }
    }
    Ok(closed)
}

/// Stamp the group-chat handoff: the participant will deliver this
/// window's check-in in a direct conversation.
pub fn request_checkin_handoff(
    store: &Store,
    challenge_id: i64,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<CheckinWindow> {
    let participant = store
        .find_participant_by_user(challenge_id, user_id)?
        .ok_or(NotFoundError::Participant(user_id))?;
    if participant.status != ParticipantStatus::Active {
        return Err(GuardError::ParticipantNotActive.into());
    }
    let window = store
        .find_open_window_for_challenge(challenge_id)?
        .ok_or(GuardError::WindowNotOpen)?;
    store.set_pending_checkin(participant.id, Some((window.id, now)))?;
    Ok(window)
}

/// Accept one check-in. Guards: the window is open and the
/// participant active. A duplicate for the same (participant, window)
/// is a benign no-op reported as `false`, with no counter changes.
/// Advisory feedback is fetched and stored best-effort after the
/// authoritative write.
#[allow(clippy::too_many_arguments)]
pub fn submit_checkin(
    store: &Store,
    notifier: &dyn Notifier,
    oracle: &dyn AdvisoryOracle,
    challenge_id: i64,
    user_id: i64,
    weight: f64,
    waist: f64,
    photos: [&str; 4],
    now: DateTime<Utc>,
) -> Result<bool> {
    let participant = store
        .find_participant_by_user(challenge_id, user_id)?
        .ok_or(NotFoundError::Participant(user_id))?;
    if participant.status != ParticipantStatus::Active {
        return Err(GuardError::ParticipantNotActive.into());
    }
    // Prefer the handed-off window. A handoff left over from a window
    // that has since closed is stale: drop it and take whatever is
    // open now instead of rejecting a valid submission.
    let mut window = None;
    if let Some(id) = participant.pending_checkin_window_id {
        let pending = store.find_window(id)?.ok_or(NotFoundError::Window(id))?;
        if pending.status == WindowStatus::Open {
            window = Some(pending);
        } else {
            store.set_pending_checkin(participant.id, None)?;
        }
    }
    let window = match window {
        Some(window) => window,
        None => store
            .find_open_window_for_challenge(challenge_id)?
            .ok_or(GuardError::WindowNotOpen)?,
    };

    if !store.insert_checkin(participant.id, window.id, weight, waist, photos, now)? {
        // Replayed submission; the first one already counted.
        return Ok(false);
    }
    store.increment_checkins(participant.id, true)?;
    store.set_pending_checkin(participant.id, None)?;
    info!(
        participant_id = participant.id,
        window_id = window.id,
        "check-in recorded"
    );
    notify_best_effort(
        notifier,
        Recipient::User(user_id),
        &format!("Check-in {} recorded. Keep it up!", window.window_number),
    );

    store_advice_best_effort(store, notifier, oracle, &participant, window.id, weight, waist, now);
    Ok(true)
}

#[allow(clippy::too_many_arguments)]
fn store_advice_best_effort(
    store: &Store,
    notifier: &dyn Notifier,
    oracle: &dyn AdvisoryOracle,
    participant: &crate::model::Participant,
    window_id: i64,
    weight: f64,
    waist: f64,
    now: DateTime<Utc>,
) {
    let goal = match store.find_goal_by_participant(participant.id) {
        Ok(goal) => goal,
        Err(err) => {
            warn!("goal lookup for advice failed: {err}");
            return;
        }
    };
    let (Some(track), Some(start_weight), Some(start_waist), Some(goal)) = (
        participant.track,
        participant.start_weight,
        participant.start_waist,
        goal,
    ) else {
        return;
    };
    let (Some(target_weight), Some(target_waist)) = (goal.target_weight, goal.target_waist) else {
        return;
    };
    let started = std::time::Instant::now();
    let Some(advice) = oracle.checkin_advice(&AdviceParams {
        track,
        start_weight,
        start_waist,
        current_weight: weight,
        current_waist: waist,
        target_weight,
        target_waist,
        checkin_number: participant.completed_checkins + 1,
    }) else {
        return;
    };
    let elapsed_ms = started.elapsed().as_millis() as i64;
    let checkin = match store.find_checkin(participant.id, window_id) {
        Ok(Some(checkin)) => checkin,
        Ok(None) => return,
        Err(err) => {
            warn!("checkin lookup for advice failed: {err}");
            return;
        }
    };
    if let Err(err) = store.insert_recommendation(
        checkin.id,
        participant.id,
        &advice,
        oracle.model_name(),
        Some(elapsed_ms),
        now,
    ) {
        warn!("could not store check-in advice: {err}");
        return;
    }
    notify_best_effort(
        notifier,
        Recipient::User(participant.user_id),
        &advice.motivational_message,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DurationUnit;
    use crate::error::CoreError;
    use crate::lifecycle::Lifecycle;
    use crate::model::{ChallengeStatus, Track, WindowStatus};
    use crate::notify::RecordingNotifier;
    use crate::oracle::NullOracle;
    use crate::store::OnboardingUpdate;
    use chrono::Duration;

    struct Fixture {
        store: Store,
        notifier: RecordingNotifier,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            let mut config = Config::default();
            config.challenge.duration_unit = DurationUnit::Months;
            config.challenge.duration_value = 1;
            Self {
                store: Store::open_memory().unwrap(),
                notifier: RecordingNotifier::new(),
                config,
            }
        }

        /// Two-member challenge taken all the way to `active`,
        /// started at `start`. User 1 holds the bank.
        fn activated(&self, start: DateTime<Utc>) -> i64 {
            let lc = Lifecycle::new(&self.store, &self.notifier, &self.config);
            let ch = lc.create_challenge(-1, None, 1, start).unwrap();
            for user in 1..=2 {
                let p = lc.join(-1, user, None, None, start).unwrap();
                lc.update_onboarding(
                    p.id,
                    &OnboardingUpdate {
                        track: Some(Track::Cut),
                        start_weight: Some(100.0),
                        start_waist: Some(95.0),
                        height: Some(180.0),
                        start_photo_front: Some("f".into()),
                        start_photo_left: Some("l".into()),
                        start_photo_right: Some("r".into()),
                        start_photo_back: Some("b".into()),
                    },
                )
                .unwrap();
                lc.set_goal(p.id, 90.0, 88.0, &NullOracle, start).unwrap();
                let templates = self.store.list_active_templates().unwrap();
                let picks: Vec<i64> = templates.iter().take(2).map(|t| t.id).collect();
                lc.choose_commitments(p.id, &picks, start).unwrap();
                lc.complete_onboarding(p.id, start).unwrap();
            }
            lc.assign_bank_holder(ch.id, 1).unwrap();
            lc.mark_paid(-1, 1, start).unwrap();
            lc.mark_paid(-1, 2, start).unwrap();
            lc.confirm_payment(-1, 1, 1, start).unwrap();
            lc.confirm_payment(-1, 1, 2, start).unwrap();
            assert_eq!(
                self.store.find_challenge(ch.id).unwrap().unwrap().status,
                ChallengeStatus::Active
            );
            ch.id
        }

        fn participant_id(&self, challenge_id: i64, user_id: i64) -> i64 {
            self.store
                .find_participant_by_user(challenge_id, user_id)
                .unwrap()
                .unwrap()
                .id
        }
    }

    #[test]
    fn one_month_challenge_yields_two_windows() {
        let fx = Fixture::new();
        let start = Utc::now();
        let ch = fx.activated(start);
        let windows = fx.store.list_windows(ch).unwrap();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].window_number, 1);
        assert_eq!(windows[1].window_number, 2);
        assert_eq!(windows[0].opens_at, start + Duration::days(14));
        assert_eq!(windows[1].opens_at, start + Duration::days(28));
        for w in &windows {
            assert_eq!(w.closes_at, w.opens_at + Duration::hours(48));
            assert_eq!(w.status, WindowStatus::Scheduled);
        }
    }

    #[test]
    fn open_phase_flips_due_windows_and_notifies() {
        let fx = Fixture::new();
        let start = Utc::now() - Duration::days(15);
        let ch = fx.activated(start);

        let now = Utc::now();
        assert_eq!(open_due_windows(&fx.store, &fx.notifier, now).unwrap(), 1);
        let windows = fx.store.list_windows(ch).unwrap();
        assert_eq!(windows[0].status, WindowStatus::Open);
        assert_eq!(windows[1].status, WindowStatus::Scheduled);
        assert!(fx
            .notifier
            .sent_to(Recipient::User(2))
            .iter()
            .any(|m| m.contains("window 1 is open")));

        // Re-run is a no-op.
        assert_eq!(open_due_windows(&fx.store, &fx.notifier, now).unwrap(), 0);
    }

    #[test]
    fn reminder_sent_once_and_only_to_non_submitters() {
        let fx = Fixture::new();
        let start = Utc::now() - Duration::days(15) - Duration::hours(40);
        let ch = fx.activated(start);
        let now = Utc::now();
        open_due_windows(&fx.store, &fx.notifier, now).unwrap();

        // User 1 submits; user 2 does not.
        submit_checkin(
            &fx.store,
            &fx.notifier,
            &NullOracle,
            ch,
            1,
            95.0,
            92.0,
            ["f", "l", "r", "b"],
            now,
        )
        .unwrap();

        // Window closes within the 12h lead.
        assert_eq!(
            send_due_reminders(&fx.store, &fx.notifier, &fx.config, now).unwrap(),
            1
        );
        let reminders_1: Vec<String> = fx
            .notifier
            .sent_to(Recipient::User(1))
            .into_iter()
            .filter(|m| m.contains("Last call"))
            .collect();
        let reminders_2: Vec<String> = fx
            .notifier
            .sent_to(Recipient::User(2))
            .into_iter()
            .filter(|m| m.contains("Last call"))
            .collect();
        assert!(reminders_1.is_empty());
        assert_eq!(reminders_2.len(), 1);

        // Stamped once: a second pass sends nothing.
        assert_eq!(
            send_due_reminders(&fx.store, &fx.notifier, &fx.config, now).unwrap(),
            0
        );
    }

    #[test]
    fn close_phase_charges_skips_idempotently() {
        let fx = Fixture::new();
        let start = Utc::now() - Duration::days(17);
        let ch = fx.activated(start);
        let now = Utc::now();
        open_due_windows(&fx.store, &fx.notifier, now).unwrap();

        assert_eq!(close_due_windows(&fx.store, &fx.notifier, now).unwrap(), 1);
        let p1 = fx
            .store
            .find_participant(fx.participant_id(ch, 1))
            .unwrap()
            .unwrap();
        assert_eq!(p1.skipped_checkins, 1);
        assert_eq!(p1.total_checkins, 1);

        // Closing again must not re-charge anyone.
        assert_eq!(close_due_windows(&fx.store, &fx.notifier, now).unwrap(), 0);
        let p1 = fx
            .store
            .find_participant(fx.participant_id(ch, 1))
            .unwrap()
            .unwrap();
        assert_eq!(p1.skipped_checkins, 1);
    }

    #[test]
    fn too_many_skips_disqualifies() {
        let fx = Fixture::new();
        let start = Utc::now() - Duration::days(17);
        let ch = fx.activated(start);
        let pid = fx.participant_id(ch, 2);
        // Already at the allowance; the next skip goes over.
        fx.store.increment_checkins(pid, false).unwrap();
        fx.store.increment_checkins(pid, false).unwrap();

        let now = Utc::now();
        open_due_windows(&fx.store, &fx.notifier, now).unwrap();
        close_due_windows(&fx.store, &fx.notifier, now).unwrap();

        let p = fx.store.find_participant(pid).unwrap().unwrap();
        assert_eq!(p.status, ParticipantStatus::Disqualified);
        assert_eq!(p.skipped_checkins, 3);
        // User 1 only has one skip; still in.
        let p1 = fx
            .store
            .find_participant(fx.participant_id(ch, 1))
            .unwrap()
            .unwrap();
        assert_eq!(p1.status, ParticipantStatus::Active);
    }

    #[test]
    fn duplicate_submission_is_noop_without_double_count() {
        let fx = Fixture::new();
        let start = Utc::now() - Duration::days(15);
        let ch = fx.activated(start);
        let now = Utc::now();
        open_due_windows(&fx.store, &fx.notifier, now).unwrap();

        let photos = ["f", "l", "r", "b"];
        assert!(submit_checkin(
            &fx.store, &fx.notifier, &NullOracle, ch, 1, 95.0, 92.0, photos, now
        )
        .unwrap());
        assert!(!submit_checkin(
            &fx.store, &fx.notifier, &NullOracle, ch, 1, 94.0, 91.0, photos, now
        )
        .unwrap());

        let p = fx
            .store
            .find_participant(fx.participant_id(ch, 1))
            .unwrap()
            .unwrap();
        assert_eq!(p.completed_checkins, 1);
        assert_eq!(p.total_checkins, 1);
    }

    #[test]
    fn submission_requires_open_window_and_active_participant() {
        let fx = Fixture::new();
        let start = Utc::now();
        let ch = fx.activated(start);

        // No window open yet.
        let err = submit_checkin(
            &fx.store,
            &fx.notifier,
            &NullOracle,
            ch,
            1,
            95.0,
            92.0,
            ["f", "l", "r", "b"],
            start,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Guard(GuardError::WindowNotOpen)));
    }

    #[test]
    fn stale_handoff_does_not_block_the_next_window() {
        let fx = Fixture::new();
        let start = Utc::now() - Duration::days(29);
        let ch = fx.activated(start);
        let pid = fx.participant_id(ch, 2);

        // Window 1: user 2 reserves a handoff but never delivers.
        let t1 = start + Duration::days(14) + Duration::hours(1);
        open_due_windows(&fx.store, &fx.notifier, t1).unwrap();
        let first = request_checkin_handoff(&fx.store, ch, 2, t1).unwrap();
        close_due_windows(&fx.store, &fx.notifier, start + Duration::days(17)).unwrap();

        // Window 2 opens; the leftover pointer still names window 1.
        let now = Utc::now();
        open_due_windows(&fx.store, &fx.notifier, now).unwrap();
        let p = fx.store.find_participant(pid).unwrap().unwrap();
        assert_eq!(p.pending_checkin_window_id, Some(first.id));

        assert!(submit_checkin(
            &fx.store,
            &fx.notifier,
            &NullOracle,
            ch,
            2,
            95.0,
            92.0,
            ["f", "l", "r", "b"],
            now,
        )
        .unwrap());

        let p = fx.store.find_participant(pid).unwrap().unwrap();
        assert!(p.pending_checkin_window_id.is_none());
        assert_eq!(p.completed_checkins, 1);
        let second = fx
            .store
            .find_open_window_for_challenge(ch)
            .unwrap()
            .unwrap();
        assert!(fx.store.find_checkin(pid, second.id).unwrap().is_some());
        assert!(fx.store.find_checkin(pid, first.id).unwrap().is_none());
    }

    #[test]
    fn handoff_is_stamped_and_cleared_on_submission() {
        let fx = Fixture::new();
        let start = Utc::now() - Duration::days(15);
        let ch = fx.activated(start);
        let now = Utc::now();
        open_due_windows(&fx.store, &fx.notifier, now).unwrap();

        let window = request_checkin_handoff(&fx.store, ch, 1, now).unwrap();
        let pid = fx.participant_id(ch, 1);
        let p = fx.store.find_participant(pid).unwrap().unwrap();
        assert_eq!(p.pending_checkin_window_id, Some(window.id));

        submit_checkin(
            &fx.store,
            &fx.notifier,
            &NullOracle,
            ch,
            1,
            95.0,
            92.0,
            ["f", "l", "r", "b"],
            now,
        )
        .unwrap();
        let p = fx.store.find_participant(pid).unwrap().unwrap();
        assert!(p.pending_checkin_window_id.is_none());
    }
}
