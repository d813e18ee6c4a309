//! Challenge scoring and prize distribution.
//!
//! Runs once at challenge finalization, over every participant that
//! reached `active`. Dropped and disqualified participants never
//! enter the scored set, so they carry no weight in the prize pool.

use crate::model::{Challenge, Checkin, Goal, Participant, Track};

/// One scored participant's inputs, assembled by the caller from the
/// store.
#[derive(Debug, Clone)]
pub struct ScoreInput {
    pub participant: Participant,
    pub goal: Option<Goal>,
    pub latest_checkin: Option<Checkin>,
}

/// A scored participant, ranked within the challenge.
#[derive(Debug, Clone)]
pub struct ParticipantScore {
    pub participant_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub goal_achievement: f64,
    pub discipline_score: f64,
    pub total_score: f64,
    pub is_winner: bool,
    /// Winner's prize as a fraction of one stake. Zero when nobody
    /// loses (stakes simply return) and for non-winners.
    pub prize_share: f64,
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Progress toward a reduction or gain target as a 0..100 ratio.
/// A target at or past the starting value is a degenerate goal and
/// contributes nothing.
fn progress_ratio(start: f64, target: f64, current: f64, gaining: bool) -> f64 {
    let (targeted, achieved) = if gaining {
        (target - start, current - start)
    } else {
        (start - target, start - current)
    };
    if targeted <= 0.0 {
        return 0.0;
    }
    clamp_score(achieved / targeted * 100.0)
}

/// Goal achievement in 0..100 from the most recent check-in.
///
/// Cut weighs weight progress 70% and waist progress 30%. Bulk keeps
/// the 70% weight component but fixes the waist component at 100,
/// which mirrors waist being secondary for mass gain. No check-ins
/// means no measurable progress, so 0.
pub fn goal_achievement(input: &ScoreInput) -> f64 {
    let Some(checkin) = &input.latest_checkin else {
        return 0.0;
    };
    let p = &input.participant;
    let (track, goal) = match (p.track, &input.goal) {
        (Some(track), Some(goal)) => (track, goal),
        _ => return 0.0,
    };

    let weight_progress = match (p.start_weight, goal.target_weight) {
        (Some(start), Some(target)) => {
            progress_ratio(start, target, checkin.weight, track == Track::Bulk)
        }
        _ => 0.0,
    };
    let waist_progress = match track {
        Track::Bulk => 100.0,
        Track::Cut => match (p.start_waist, goal.target_waist) {
            (Some(start), Some(target)) => progress_ratio(start, target, checkin.waist, false),
            _ => 0.0,
        },
    };
    clamp_score(0.7 * weight_progress + 0.3 * waist_progress)
}

/// Discipline in 0..100. Vacuously perfect before any window closes.
pub fn discipline_score(participant: &Participant) -> f64 {
    if participant.total_checkins == 0 {
        return 100.0;
    }
    participant.completed_checkins as f64 / participant.total_checkins as f64 * 100.0
}

/// Score every participant, rank by total score descending, and
/// distribute the losers' stakes across the winners.
pub fn score_challenge(challenge: &Challenge, inputs: &[ScoreInput]) -> Vec<ParticipantScore> {
    let mut scores: Vec<ParticipantScore> = inputs
        .iter()
        .map(|input| {
            let goal = goal_achievement(input);
            let discipline = discipline_score(&input.participant);
            let total = 0.7 * goal + 0.3 * discipline;
            let is_winner =
                discipline >= challenge.discipline_threshold * 100.0 && goal >= 80.0;
            ParticipantScore {
                participant_id: input.participant.id,
                user_id: input.participant.user_id,
                display_name: input.participant.display_name(),
                goal_achievement: goal,
                discipline_score: discipline,
                total_score: total,
                is_winner,
                prize_share: 0.0,
            }
        })
        .collect();

    let winners = scores.iter().filter(|s| s.is_winner).count();
    let losers = scores.len() - winners;
    if winners > 0 && losers > 0 {
        let share = losers as f64 / winners as f64;
        for score in scores.iter_mut().filter(|s| s.is_winner) {
            score.prize_share = share;
        }
    }

    scores.sort_by(|a, b| {
        b.total_score
            .partial_cmp(&a.total_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.user_id.cmp(&b.user_id))
    });
    scores
}

/// Render the final standings for the group announcement.
pub fn format_results(challenge: &Challenge, scores: &[ParticipantScore]) -> String {
    let mut out = String::from("Challenge finished! Final standings:\n");
    for (rank, score) in scores.iter().enumerate() {
        let marker = if score.is_winner { "🏆" } else { "  " };
        out.push_str(&format!(
            "{marker} {}. {} — total {:.1} (goal {:.1}, discipline {:.1})\n",
            rank + 1,
            score.display_name,
            score.total_score,
            score.goal_achievement,
            score.discipline_score,
        ));
    }
    let winners: Vec<&ParticipantScore> = scores.iter().filter(|s| s.is_winner).collect();
    if winners.is_empty() {
        out.push_str("No one met the winning criteria. Stakes return to their payers.\n");
    } else if winners.len() == scores.len() {
        out.push_str("Everyone won! All stakes are returned.\n");
    } else {
        let payout = winners[0].prize_share * challenge.stake_amount;
        out.push_str(&format!(
            "Each winner gets their stake back plus {payout:.0} from the pool.\n"
        ));
    }
    out.push_str("The bank holder handles payouts.");
    out
}

/// Render one participant's line for a direct message.
pub fn format_personal_summary(challenge: &Challenge, score: &ParticipantScore) -> String {
    let mut out = format!(
        "Your result: total {:.1} (goal {:.1}, discipline {:.1}). ",
        score.total_score, score.goal_achievement, score.discipline_score,
    );
    if score.is_winner {
        if score.prize_share > 0.0 {
            out.push_str(&format!(
                "You won! Stake back plus {:.0} from the pool.",
                score.prize_share * challenge.stake_amount
            ));
        } else {
            out.push_str("You won! Everyone did, so stakes are simply returned.");
        }
    } else {
        out.push_str("You didn't meet the winning criteria this time.");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChallengeStatus, ParticipantStatus};
    use chrono::Utc;

    fn challenge() -> Challenge {
        Challenge {
            id: 1,
            chat_id: -1,
            chat_title: None,
            creator_id: 1,
            duration_value: 6,
            stake_amount: 1000.0,
            discipline_threshold: 0.8,
            max_skips: 2,
            bank_holder_id: Some(1),
            bank_holder_username: None,
            status: ChallengeStatus::Active,
            created_at: Utc::now(),
            started_at: Some(Utc::now()),
            ends_at: Some(Utc::now()),
        }
    }

    fn input(
        user_id: i64,
        track: Track,
        start: (f64, f64),
        target: (f64, f64),
        latest: Option<(f64, f64)>,
        checkins: (i64, i64),
    ) -> ScoreInput {
        let participant = Participant {
            id: user_id,
            challenge_id: 1,
            user_id,
            username: Some(format!("user{user_id}")),
            first_name: None,
            track: Some(track),
            start_weight: Some(start.0),
            start_waist: Some(start.1),
            height: Some(180.0),
            start_photo_front: None,
            start_photo_left: None,
            start_photo_right: None,
            start_photo_back: None,
            total_checkins: checkins.0,
            completed_checkins: checkins.1,
            skipped_checkins: checkins.0 - checkins.1,
            pending_checkin_window_id: None,
            pending_checkin_requested_at: None,
            status: ParticipantStatus::Active,
            joined_at: Utc::now(),
            onboarding_completed_at: None,
        };
        let goal = Goal {
            id: user_id,
            participant_id: user_id,
            target_weight: Some(target.0),
            target_waist: Some(target.1),
            is_validated: true,
            validation_result: None,
            validation_feedback: None,
            validated_at: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        let latest_checkin = latest.map(|(weight, waist)| Checkin {
            id: user_id,
            participant_id: user_id,
            window_id: 1,
            weight,
            waist,
            photo_front: "f".into(),
            photo_left: "l".into(),
            photo_right: "r".into(),
            photo_back: "b".into(),
            submitted_at: Utc::now(),
        });
        ScoreInput {
            participant,
            goal: Some(goal),
            latest_checkin,
        }
    }

    #[test]
    fn cut_track_partial_progress() {
        // Halfway on weight, no waist movement.
        let input = input(
            1,
            Track::Cut,
            (100.0, 100.0),
            (90.0, 90.0),
            Some((95.0, 100.0)),
            (4, 4),
        );
        let goal = goal_achievement(&input);
        assert!((goal - 35.0).abs() < 1e-9);
    }

    #[test]
    fn bulk_track_waist_not_evaluated() {
        let input = input(
            1,
            Track::Bulk,
            (70.0, 80.0),
            (75.0, 85.0),
            Some((72.5, 80.0)),
            (4, 4),
        );
        // Weight gain halfway: 0.7 * 50 + 0.3 * 100 = 65.
        let goal = goal_achievement(&input);
        assert!((goal - 65.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_goal_scores_zero() {
        // Target above start on a cut: nothing to lose.
        let input = input(
            1,
            Track::Cut,
            (90.0, 90.0),
            (95.0, 80.0),
            Some((85.0, 85.0)),
            (4, 4),
        );
        let goal = goal_achievement(&input);
        // Weight sub-score 0; waist halfway contributes 0.3 * 50.
        assert!((goal - 15.0).abs() < 1e-9);
    }

    #[test]
    fn wrong_direction_floors_at_zero() {
        let input = input(
            1,
            Track::Cut,
            (100.0, 100.0),
            (90.0, 90.0),
            Some((105.0, 108.0)),
            (4, 4),
        );
        assert_eq!(goal_achievement(&input), 0.0);
    }

    #[test]
    fn overshoot_clamps_at_hundred() {
        let input = input(
            1,
            Track::Cut,
            (100.0, 100.0),
            (90.0, 90.0),
            Some((85.0, 85.0)),
            (4, 4),
        );
        assert_eq!(goal_achievement(&input), 100.0);
    }

    #[test]
    fn zero_checkins_scores_zero_goal() {
        let input = input(1, Track::Cut, (100.0, 100.0), (90.0, 90.0), None, (0, 0));
        assert_eq!(goal_achievement(&input), 0.0);
    }

    #[test]
    fn discipline_vacuously_perfect() {
        let input = input(1, Track::Cut, (100.0, 100.0), (90.0, 90.0), None, (0, 0));
        assert_eq!(discipline_score(&input.participant), 100.0);
    }

    #[test]
    fn discipline_ratio() {
        let input = input(1, Track::Cut, (100.0, 100.0), (90.0, 90.0), None, (4, 3));
        assert_eq!(discipline_score(&input.participant), 75.0);
    }

    #[test]
    fn prize_split_across_winners() {
        let ch = challenge();
        let inputs = vec![
            // Full goal, full discipline: winner.
            input(
                1,
                Track::Cut,
                (100.0, 100.0),
                (90.0, 90.0),
                Some((90.0, 90.0)),
                (4, 4),
            ),
            input(
                2,
                Track::Cut,
                (110.0, 105.0),
                (100.0, 95.0),
                Some((100.0, 95.0)),
                (4, 4),
            ),
            // Barely moved: loser.
            input(
                3,
                Track::Cut,
                (100.0, 100.0),
                (90.0, 90.0),
                Some((99.0, 100.0)),
                (4, 4),
            ),
        ];
        let scores = score_challenge(&ch, &inputs);
        let winners: Vec<_> = scores.iter().filter(|s| s.is_winner).collect();
        let losers: Vec<_> = scores.iter().filter(|s| !s.is_winner).collect();
        assert_eq!(winners.len(), 2);
        assert_eq!(losers.len(), 1);
        for w in &winners {
            assert!((w.prize_share - 0.5).abs() < 1e-9);
            assert!((w.prize_share * ch.stake_amount - 500.0).abs() < 1e-9);
        }
        assert_eq!(losers[0].prize_share, 0.0);
    }

    #[test]
    fn all_winners_means_no_redistribution() {
        let ch = challenge();
        let inputs = vec![
            input(
                1,
                Track::Cut,
                (100.0, 100.0),
                (90.0, 90.0),
                Some((90.0, 90.0)),
                (4, 4),
            ),
            input(
                2,
                Track::Cut,
                (110.0, 105.0),
                (100.0, 95.0),
                Some((100.0, 95.0)),
                (4, 4),
            ),
        ];
        let scores = score_challenge(&ch, &inputs);
        assert!(scores.iter().all(|s| s.is_winner));
        assert!(scores.iter().all(|s| s.prize_share == 0.0));
    }

    #[test]
    fn winner_requires_both_thresholds() {
        let ch = challenge();
        // Perfect goal, weak discipline (2/4 = 50 < 80).
        let slacker = input(
            1,
            Track::Cut,
            (100.0, 100.0),
            (90.0, 90.0),
            Some((90.0, 90.0)),
            (4, 2),
        );
        // Perfect discipline, weak goal.
        let drifter = input(
            2,
            Track::Cut,
            (100.0, 100.0),
            (90.0, 90.0),
            Some((98.0, 99.0)),
            (4, 4),
        );
        let scores = score_challenge(&ch, &[slacker, drifter]);
        assert!(scores.iter().all(|s| !s.is_winner));
    }

    #[test]
    fn ranking_is_descending_by_total() {
        let ch = challenge();
        let inputs = vec![
            input(
                1,
                Track::Cut,
                (100.0, 100.0),
                (90.0, 90.0),
                Some((95.0, 100.0)),
                (4, 4),
            ),
            input(
                2,
                Track::Cut,
                (100.0, 100.0),
                (90.0, 90.0),
                Some((90.0, 90.0)),
                (4, 4),
            ),
            input(3, Track::Cut, (100.0, 100.0), (90.0, 90.0), None, (4, 0)),
        ];
        let scores = score_challenge(&ch, &inputs);
        assert_eq!(scores[0].user_id, 2);
        assert_eq!(scores[2].user_id, 3);
        assert!(scores[0].total_score >= scores[1].total_score);
        assert!(scores[1].total_score >= scores[2].total_score);
    }

    #[test]
    fn results_text_names_winners() {
        let ch = challenge();
        let inputs = vec![
            input(
                1,
                Track::Cut,
                (100.0, 100.0),
                (90.0, 90.0),
                Some((90.0, 90.0)),
                (4, 4),
            ),
            input(2, Track::Cut, (100.0, 100.0), (90.0, 90.0), None, (4, 0)),
        ];
        let scores = score_challenge(&ch, &inputs);
        let text = format_results(&ch, &scores);
        assert!(text.contains("user1"));
        assert!(text.contains("1000"));

        let winner = scores.iter().find(|s| s.is_winner).unwrap();
        let loser = scores.iter().find(|s| !s.is_winner).unwrap();
        assert!(format_personal_summary(&ch, winner).contains("You won!"));
        assert!(format_personal_summary(&ch, loser).contains("didn't meet"));
    }
}
