use chrono::{DateTime, FixedOffset};

/// Yes/no ballot counts for a proposal-style voting.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StanceTally {
    pub yes: u64,
    pub no: u64,
}

impl StanceTally {
    pub fn from_stances<I>(stances: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut tally = StanceTally::default();
        for stance in stances {
            if stance {
                tally.yes += 1;
            } else {
                tally.no += 1;
            }
        }
        tally
    }

    pub fn total(self) -> u64 {
        self.yes + self.no
    }

    /// Strict-majority rule: the yes share must exceed the threshold, and a
    /// voting with no ballots never passes. Exactly meeting the threshold
    /// fails (1 of 2 at 0.5 is a failure).
    pub fn passes(self, required_percentage: f64) -> bool {
        assert!(
            (0.0..=1.0).contains(&required_percentage),
            "Required percentage out of range"
        );
        let total = self.total();
        if total == 0 {
            return false;
        }
        (self.yes as f64) / (total as f64) > required_percentage
    }
}

/// One candidate as seen by the ranking step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedCandidate {
    pub id: i64,
    pub discord_id: String,
    pub name: String,
    pub votes: i32,
    pub registered_at: DateTime<FixedOffset>,
}

/// Orders candidates by votes descending; equal counts are broken by
/// earliest registration, then by lowest row id. Deterministic regardless
/// of query order.
pub fn rank_candidates(candidates: &mut [RankedCandidate]) {
    candidates.sort_by(|a, b| {
        b.votes
            .cmp(&a.votes)
            .then_with(|| a.registered_at.cmp(&b.registered_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Top `seats` candidates with at least one vote, in ranked order. A
/// candidate at zero votes is never seated, even with seats to spare.
pub fn select_winners(candidates: &mut [RankedCandidate], seats: usize) -> Vec<RankedCandidate> {
    assert!(seats <= 1_000, "Seat count exceeds defensive bound");
    rank_candidates(candidates);
    candidates
        .iter()
        .filter(|candidate| candidate.votes > 0)
        .take(seats)
        .cloned()
        .collect()
}

/// The single chancellor winner, or `None` when nobody received a vote.
pub fn chancellor_winner(candidates: &mut [RankedCandidate]) -> Option<RankedCandidate> {
    rank_candidates(candidates);
    candidates
        .first()
        .filter(|candidate| candidate.votes > 0)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn candidate(id: i64, votes: i32, registered_minute: u32) -> RankedCandidate {
        let registered_at = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, registered_minute, 0)
            .unwrap()
            .fixed_offset();
        RankedCandidate {
            id,
            discord_id: format!("10000{id}"),
            name: format!("candidate-{id}"),
            votes,
            registered_at,
        }
    }

    #[test]
    fn two_thirds_passes_simple_majority() {
        let tally = StanceTally::from_stances([true, true, false]);
        assert_eq!(tally.yes, 2);
        assert_eq!(tally.no, 1);
        assert!(tally.passes(0.5));
    }

    #[test]
    fn exact_threshold_fails() {
        let tally = StanceTally::from_stances([true, false]);
        assert!(!tally.passes(0.5));
    }

    #[test]
    fn empty_tally_never_passes() {
        let tally = StanceTally::default();
        assert!(!tally.passes(0.0));
        assert!(!tally.passes(0.5));
    }

    #[test]
    fn passing_is_monotonic_in_yes_votes() {
        let no = 4;
        let mut previous = false;
        for yes in 0..12 {
            let tally = StanceTally { yes, no };
            let passed = tally.passes(0.66);
            assert!(passed || !previous, "passing regressed at yes={yes}");
            previous = passed;
        }
        assert!(previous);
    }

    #[test]
    fn winners_exclude_zero_vote_candidates() {
        let mut candidates = vec![
            candidate(1, 5, 0),
            candidate(2, 3, 1),
            candidate(3, 3, 2),
            candidate(4, 0, 3),
        ];
        let winners = select_winners(&mut candidates, 2);
        assert_eq!(winners.len(), 2);
        assert_eq!(winners[0].id, 1);
        // Candidates 2 and 3 are tied; 2 registered first.
        assert_eq!(winners[1].id, 2);

        let winners = select_winners(&mut candidates, 4);
        assert_eq!(winners.len(), 3, "zero-vote candidate must not be seated");
    }

    #[test]
    fn tie_break_is_deterministic_across_nine_candidates() {
        // Three tiers of three, every tier internally tied on votes.
        let mut forward = vec![
            candidate(1, 7, 3),
            candidate(2, 7, 1),
            candidate(3, 7, 2),
            candidate(4, 4, 6),
            candidate(5, 4, 4),
            candidate(6, 4, 5),
            candidate(7, 1, 9),
            candidate(8, 1, 7),
            candidate(9, 1, 8),
        ];
        let mut reversed: Vec<_> = forward.iter().rev().cloned().collect();

        rank_candidates(&mut forward);
        rank_candidates(&mut reversed);

        let forward_ids: Vec<_> = forward.iter().map(|c| c.id).collect();
        let reversed_ids: Vec<_> = reversed.iter().map(|c| c.id).collect();
        assert_eq!(forward_ids, vec![2, 3, 1, 5, 6, 4, 8, 9, 7]);
        assert_eq!(forward_ids, reversed_ids, "ranking depends on input order");
    }

    #[test]
    fn tie_break_falls_back_to_row_id() {
        let mut candidates = vec![candidate(12, 2, 5), candidate(4, 2, 5)];
        rank_candidates(&mut candidates);
        assert_eq!(candidates[0].id, 4);
    }

    #[test]
    fn chancellor_requires_at_least_one_vote() {
        let mut silent = vec![candidate(1, 0, 0), candidate(2, 0, 1)];
        assert!(chancellor_winner(&mut silent).is_none());

        let mut contested = vec![candidate(1, 2, 1), candidate(2, 3, 0)];
        let winner = chancellor_winner(&mut contested).expect("winner exists");
        assert_eq!(winner.id, 2);
    }
}
