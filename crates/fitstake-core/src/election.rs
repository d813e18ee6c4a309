//! Bank holder selection.
//!
//! Pure tally logic over a fixed ballot set. Persistence and the
//! finalization gate live in the store; this module only decides who
//! wins given the eligible participants and the votes cast.

use std::collections::BTreeMap;

use crate::model::{BankHolderVote, Participant};

/// Outcome of a bank holder election tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElectionResult {
    pub winner_id: i64,
    pub max_votes: usize,
}

/// Pick the bank holder from the votes cast so far.
///
/// Only votes for eligible candidates count. Plurality wins; ties
/// break toward the candidate with the smallest user id. With zero
/// countable votes the fallback id wins if eligible, otherwise the
/// smallest eligible user id. `None` only when nobody is eligible.
pub fn select_bank_holder(
    eligible: &[Participant],
    votes: &[BankHolderVote],
    fallback_id: i64,
) -> Option<ElectionResult> {
    if eligible.is_empty() {
        return None;
    }
    let mut tally: BTreeMap<i64, usize> = eligible.iter().map(|p| (p.user_id, 0)).collect();
    for vote in votes {
        if let Some(count) = tally.get_mut(&vote.voted_for_id) {
            *count += 1;
        }
    }
    // BTreeMap iteration order plus a strict `>` gives the
    // smallest-id tie-break for free.
    let mut winner_id = 0;
    let mut max_votes = 0;
    let mut seen_any = false;
    for (&candidate, &count) in &tally {
        if !seen_any || count > max_votes {
            winner_id = candidate;
            max_votes = count;
            seen_any = true;
        }
    }
    if max_votes == 0 {
        let winner_id = if tally.contains_key(&fallback_id) {
            fallback_id
        } else {
            // BTreeMap keys are sorted, so the first is the smallest.
            *tally.keys().next().expect("eligible set is non-empty")
        };
        return Some(ElectionResult {
            winner_id,
            max_votes: 0,
        });
    }
    Some(ElectionResult {
        winner_id,
        max_votes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParticipantStatus;
    use chrono::Utc;

    fn participant(user_id: i64) -> Participant {
        Participant {
            id: user_id,
            challenge_id: 1,
            user_id,
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
            status: ParticipantStatus::Active,
            joined_at: Utc::now(),
            onboarding_completed_at: None,
        }
    }

    fn vote(voter_id: i64, voted_for_id: i64) -> BankHolderVote {
        BankHolderVote {
            id: voter_id,
            election_id: 1,
            voter_id,
            voted_for_id,
            voted_at: Utc::now(),
        }
    }

    #[test]
    fn plurality_wins_with_count() {
        let eligible = vec![participant(5), participant(3)];
        let votes = vec![vote(3, 5), vote(5, 5)];
        let result = select_bank_holder(&eligible, &votes, 9).unwrap();
        assert_eq!(result.winner_id, 5);
        assert_eq!(result.max_votes, 2);
    }

    #[test]
    fn tie_breaks_toward_smallest_id() {
        let eligible = vec![participant(7), participant(2)];
        let votes = vec![vote(7, 2), vote(2, 7)];
        let result = select_bank_holder(&eligible, &votes, 99).unwrap();
        assert_eq!(result.winner_id, 2);
        assert_eq!(result.max_votes, 1);
    }

    #[test]
    fn zero_votes_prefers_eligible_fallback() {
        let eligible = vec![participant(5), participant(3)];
        let result = select_bank_holder(&eligible, &[], 5).unwrap();
        assert_eq!(result.winner_id, 5);
        assert_eq!(result.max_votes, 0);
    }

    #[test]
    fn zero_votes_without_fallback_picks_smallest_eligible() {
        let eligible = vec![participant(5), participant(3)];
        let result = select_bank_holder(&eligible, &[], 9).unwrap();
        assert_eq!(result.winner_id, 3);
        assert_eq!(result.max_votes, 0);
    }

    #[test]
    fn votes_for_ineligible_users_are_ignored() {
        let eligible = vec![participant(5), participant(3)];
        let votes = vec![vote(3, 42), vote(5, 42), vote(7, 3)];
        let result = select_bank_holder(&eligible, &votes, 9).unwrap();
        assert_eq!(result.winner_id, 3);
        assert_eq!(result.max_votes, 1);
    }

    #[test]
    fn no_eligible_participants_yields_none() {
        assert!(select_bank_holder(&[], &[vote(1, 2)], 9).is_none());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn deterministic_under_vote_permutation(
                picks in proptest::collection::vec(1i64..6, 0..20),
                rotation in 0usize..20,
            ) {
                let eligible: Vec<Participant> = (1..6).map(participant).collect();
                let votes: Vec<BankHolderVote> = picks
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| vote(i as i64 + 100, c))
                    .collect();
                let expected = select_bank_holder(&eligible, &votes, 3);

                let mut shuffled = votes.clone();
                if !shuffled.is_empty() {
                    let len = shuffled.len();
                    shuffled.rotate_left(rotation % len);
                }
                prop_assert_eq!(select_bank_holder(&eligible, &shuffled, 3), expected);
            }

            #[test]
            fn winner_is_eligible_and_maximal(
                picks in proptest::collection::vec(1i64..10, 1..20),
            ) {
                let eligible: Vec<Participant> = (1..6).map(participant).collect();
                let votes: Vec<BankHolderVote> = picks
                    .iter()
                    .enumerate()
                    .map(|(i, &c)| vote(i as i64 + 100, c))
                    .collect();
                let result = select_bank_holder(&eligible, &votes, 3).unwrap();
                prop_assert!((1..6).contains(&result.winner_id));

                let count_for = |c: i64| votes.iter().filter(|v| v.voted_for_id == c).count();
                let max = (1i64..6).map(count_for).max().unwrap();
                prop_assert_eq!(result.max_votes, max);
                if max == 0 {
                    // All ballots went to ineligible users; fallback applies.
                    prop_assert_eq!(result.winner_id, 3);
                } else {
                    for c in 1i64..6 {
                        if count_for(c) == max {
                            prop_assert!(result.winner_id <= c);
                            break;
                        }
                    }
                }
            }
        }
    }
}
