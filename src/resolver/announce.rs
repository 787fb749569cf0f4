use crate::gateway::SyncReport;
use crate::models::governance::Announcement;
use crate::tally::{RankedCandidate, StanceTally};

const COLOR_PASSED: u32 = 0x00FF00;
const COLOR_FAILED: u32 = 0xFF0000;
const COLOR_ELECTION: u32 = 0xFFD700;
const MAX_LISTED_CANDIDATES: usize = 10;

/// Result embed for a proposal-style voting.
pub fn proposal_result(
    title: &str,
    description: &str,
    tally: StanceTally,
    required_percentage: f64,
    passed: bool,
    proposer_id: Option<&str>,
) -> Announcement {
    assert!(
        (0.0..=1.0).contains(&required_percentage),
        "Required percentage out of range"
    );

    let verdict = if passed {
        "**PASSED** \u{2705}"
    } else {
        "**FAILED** \u{274c}"
    };
    let result = format!(
        "{verdict}\n\n**Voting Results:**\n\u{2705} For: {}\n\u{274c} Against: {}\n\u{1f4ca} Required: >{:.0}%",
        tally.yes,
        tally.no,
        required_percentage * 100.0
    );

    Announcement {
        title: title.to_string(),
        description: description.to_string(),
        color: if passed { COLOR_PASSED } else { COLOR_FAILED },
        fields: vec![("Result".to_string(), result)],
        footer: proposer_id.map(|id| format!("Proposed by councillor {id}")),
    }
}

/// Result embed for a council election. `winners` are in ranked order.
pub fn election_result(
    title: &str,
    winners: &[RankedCandidate],
    total_votes: u64,
    sync: &SyncReport,
) -> Announcement {
    assert!(
        winners.len() <= 100,
        "Winner list exceeds defensive bound"
    );

    let mut description = String::from("## The votes are in!\n\n");
    if winners.is_empty() {
        description.push_str(
            "No candidate received any votes, so no councillors were seated. \
             The election has failed.",
        );
    } else {
        description.push_str("The following candidates have been elected to the Grand Council:\n\n");
        for (position, winner) in winners.iter().take(MAX_LISTED_CANDIDATES).enumerate() {
            description.push_str(&format!(
                "**{}.** {} - {} votes\n",
                position + 1,
                winner.name,
                winner.votes
            ));
        }
        description.push_str(&format!(
            "\n**Total Votes Cast:** {total_votes}\n**Councillors Elected:** {}",
            winners.len()
        ));
    }

    Announcement {
        title: format!("{title} - Results"),
        description,
        color: if winners.is_empty() {
            COLOR_FAILED
        } else {
            COLOR_ELECTION
        },
        fields: sync_field(sync),
        footer: Some("Democracy in Action".to_string()),
    }
}

/// Result embed for a chancellor election; `None` when nobody voted.
pub fn chancellor_result(
    title: &str,
    winner: Option<&RankedCandidate>,
    sync: &SyncReport,
) -> Announcement {
    let (description, color) = match winner {
        Some(winner) => (
            format!(
                "\u{1f451} **{}** has been elected Chancellor with {} votes!",
                winner.name, winner.votes
            ),
            COLOR_ELECTION,
        ),
        None => (
            "No votes were cast, so no Chancellor was elected. The election has failed."
                .to_string(),
            COLOR_FAILED,
        ),
    };

    Announcement {
        title: format!("{title} - Results"),
        description,
        color,
        fields: sync_field(sync),
        footer: Some("Democracy in Action".to_string()),
    }
}

fn sync_field(sync: &SyncReport) -> Vec<(String, String)> {
    if sync.is_clean() {
        return Vec::new();
    }
    let mut value = String::from("\u{26a0}\u{fe0f} Some role updates could not be applied:\n");
    for note in &sync.skipped {
        value.push_str(&format!("- {note}\n"));
    }
    assert!(value.len() <= 2_048, "Sync warning field exceeds bounds");
    vec![("Role Updates".to_string(), value)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn winner(name: &str, votes: i32) -> RankedCandidate {
        RankedCandidate {
            id: 1,
            discord_id: "100".to_string(),
            name: name.to_string(),
            votes,
            registered_at: Utc
                .with_ymd_and_hms(2026, 3, 1, 0, 0, 0)
                .unwrap()
                .fixed_offset(),
        }
    }

    #[test]
    fn proposal_result_reports_threshold_and_counts() {
        let tally = StanceTally { yes: 2, no: 1 };
        let announcement =
            proposal_result("Road Tax", "Fund the roads", tally, 0.5, true, Some("42"));
        assert_eq!(announcement.color, COLOR_PASSED);
        let (_, result) = &announcement.fields[0];
        assert!(result.contains("PASSED"));
        assert!(result.contains("For: 2"));
        assert!(result.contains("Against: 1"));
        assert!(result.contains(">50%"));
        assert_eq!(
            announcement.footer.as_deref(),
            Some("Proposed by councillor 42")
        );
    }

    #[test]
    fn failed_proposal_uses_failure_color() {
        let tally = StanceTally { yes: 1, no: 1 };
        let announcement = proposal_result("Road Tax", "", tally, 0.5, false, None);
        assert_eq!(announcement.color, COLOR_FAILED);
        assert!(announcement.footer.is_none());
    }

    #[test]
    fn empty_election_announces_failure() {
        let announcement =
            election_result("Council Election", &[], 0, &SyncReport::default());
        assert_eq!(announcement.color, COLOR_FAILED);
        assert!(announcement.description.contains("failed"));
    }

    #[test]
    fn election_lists_winners_in_order() {
        let winners = vec![winner("Alice", 5), winner("Bob", 3)];
        let announcement =
            election_result("Council Election", &winners, 8, &SyncReport::default());
        let alice = announcement.description.find("Alice").unwrap();
        let bob = announcement.description.find("Bob").unwrap();
        assert!(alice < bob);
        assert!(announcement.description.contains("**Total Votes Cast:** 8"));
        assert!(announcement.fields.is_empty());
    }

    #[test]
    fn sync_warnings_become_a_field() {
        let mut sync = SyncReport::default();
        sync.note_skip("<@1> is no longer a member");
        let announcement = chancellor_result("Chancellor Election", Some(&winner("Alice", 4)), &sync);
        assert_eq!(announcement.fields.len(), 1);
        assert!(announcement.fields[0].1.contains("no longer a member"));
    }
}
