use anyhow::{Result, anyhow};

/// Closed set of voting kinds. The storage layer keeps the string form;
/// everything else matches on the variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VotingKind {
    Legislation,
    Amendment,
    Impeachment,
    ConfidenceVote,
    Decree,
    Other,
    Election,
    ChancellorElection,
}

/// Display and threshold constants for one voting kind.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct KindProfile {
    pub label: &'static str,
    pub emoji: &'static str,
    pub color: u32,
    pub voting_days: i64,
    pub required_percentage: f64,
    pub summary: &'static str,
}

impl VotingKind {
    pub const ALL: [VotingKind; 8] = [
        VotingKind::Legislation,
        VotingKind::Amendment,
        VotingKind::Impeachment,
        VotingKind::ConfidenceVote,
        VotingKind::Decree,
        VotingKind::Other,
        VotingKind::Election,
        VotingKind::ChancellorElection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            VotingKind::Legislation => "legislation",
            VotingKind::Amendment => "amendment",
            VotingKind::Impeachment => "impeachment",
            VotingKind::ConfidenceVote => "confidence_vote",
            VotingKind::Decree => "decree",
            VotingKind::Other => "other",
            VotingKind::Election => "election",
            VotingKind::ChancellorElection => "chancellor_election",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        let kind = match normalized.as_str() {
            "legislation" => VotingKind::Legislation,
            "amendment" => VotingKind::Amendment,
            "impeachment" => VotingKind::Impeachment,
            "confidence_vote" => VotingKind::ConfidenceVote,
            "decree" => VotingKind::Decree,
            "other" => VotingKind::Other,
            "election" => VotingKind::Election,
            "chancellor_election" => VotingKind::ChancellorElection,
            other => return Err(anyhow!("Unknown voting kind: {other}")),
        };
        Ok(kind)
    }

    /// Elections resolve by candidate ranking rather than stance percentage.
    pub fn is_election(self) -> bool {
        matches!(self, VotingKind::Election | VotingKind::ChancellorElection)
    }

    pub fn profile(self) -> KindProfile {
        match self {
            VotingKind::Legislation => KindProfile {
                label: "Legislation",
                emoji: "\u{2696}\u{fe0f}",
                color: 0x4169E1,
                voting_days: 1,
                required_percentage: 0.5,
                summary: "Regular legislative proposals",
            },
            VotingKind::Amendment => KindProfile {
                label: "Amendment",
                emoji: "\u{1f535}",
                color: 0x8A2BE2,
                voting_days: 3,
                required_percentage: 0.66,
                summary: "Constitutional amendments requiring supermajority",
            },
            VotingKind::Impeachment => KindProfile {
                label: "Impeachment",
                emoji: "\u{1f4dc}",
                color: 0xFF6347,
                voting_days: 3,
                required_percentage: 0.66,
                summary: "Removal of officials from office",
            },
            VotingKind::ConfidenceVote => KindProfile {
                label: "Confidence Vote",
                emoji: "\u{26a0}\u{fe0f}",
                color: 0xFF4500,
                voting_days: 3,
                required_percentage: 0.66,
                summary: "Vote of confidence in leadership",
            },
            VotingKind::Decree => KindProfile {
                label: "Decree",
                emoji: "\u{1f6d1}",
                color: 0xFFA500,
                voting_days: 1,
                required_percentage: 0.5,
                summary: "Executive orders and decrees",
            },
            VotingKind::Other => KindProfile {
                label: "Other",
                emoji: "\u{1f5f3}\u{fe0f}",
                color: 0x20B2AA,
                voting_days: 3,
                required_percentage: 0.5,
                summary: "Miscellaneous proposals",
            },
            VotingKind::Election => KindProfile {
                label: "Council Election",
                emoji: "\u{1f5f3}\u{fe0f}",
                color: 0x00B0F4,
                voting_days: 3,
                required_percentage: 0.0,
                summary: "Elections for council members",
            },
            VotingKind::ChancellorElection => KindProfile {
                label: "Chancellor Election",
                emoji: "\u{1f451}",
                color: 0xFFD700,
                voting_days: 2,
                required_percentage: 0.0,
                summary: "Elections for chancellor, councillors only",
            },
        }
    }
}

/// Voting lifecycle. The only writers are the election start step
/// (Pending -> Voting), a veto (-> Cancelled), and the resolution job
/// (Voting -> Passed | Failed).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VotingStatus {
    Pending,
    Voting,
    Passed,
    Failed,
    Cancelled,
}

impl VotingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VotingStatus::Pending => "pending",
            VotingStatus::Voting => "voting",
            VotingStatus::Passed => "passed",
            VotingStatus::Failed => "failed",
            VotingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        let status = match value.trim().to_ascii_lowercase().as_str() {
            "pending" => VotingStatus::Pending,
            "voting" => VotingStatus::Voting,
            "passed" => VotingStatus::Passed,
            "failed" => VotingStatus::Failed,
            "cancelled" => VotingStatus::Cancelled,
            other => return Err(anyhow!("Unknown voting status: {other}")),
        };
        Ok(status)
    }

    /// A resolved voting is never revisited.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            VotingStatus::Passed | VotingStatus::Failed | VotingStatus::Cancelled
        )
    }

    pub fn can_transition(self, next: VotingStatus) -> bool {
        match self {
            VotingStatus::Pending => {
                matches!(next, VotingStatus::Voting | VotingStatus::Cancelled)
            }
            VotingStatus::Voting => matches!(
                next,
                VotingStatus::Passed | VotingStatus::Failed | VotingStatus::Cancelled
            ),
            VotingStatus::Passed | VotingStatus::Failed | VotingStatus::Cancelled => false,
        }
    }
}

/// Configurable role slots on a guild record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RoleSlot {
    Councillor,
    Chancellor,
    Minister,
    President,
    VicePresident,
    Judiciary,
    Citizen,
}

impl RoleSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleSlot::Councillor => "councillor",
            RoleSlot::Chancellor => "chancellor",
            RoleSlot::Minister => "minister",
            RoleSlot::President => "president",
            RoleSlot::VicePresident => "vice_president",
            RoleSlot::Judiciary => "judiciary",
            RoleSlot::Citizen => "citizen",
        }
    }
}

/// Configurable channel slots on a guild record.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChannelSlot {
    Voting,
    Announcement,
}

impl ChannelSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelSlot::Voting => "voting",
            ChannelSlot::Announcement => "announcement",
        }
    }
}

/// Audit log categories.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AuditKind {
    Command,
    Vote,
    Election,
    Error,
    Admin,
    ChancellorAction,
}

impl AuditKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditKind::Command => "command",
            AuditKind::Vote => "vote",
            AuditKind::Election => "election",
            AuditKind::Error => "error",
            AuditKind::Admin => "admin",
            AuditKind::ChancellorAction => "chancellor_action",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trip() {
        for kind in VotingKind::ALL {
            assert_eq!(VotingKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(VotingKind::parse("referendum").is_err());
    }

    #[test]
    fn election_kinds_carry_no_threshold() {
        for kind in VotingKind::ALL {
            let profile = kind.profile();
            if kind.is_election() {
                assert_eq!(profile.required_percentage, 0.0);
            } else {
                assert!(profile.required_percentage >= 0.5);
            }
            assert!(profile.voting_days >= 1);
        }
    }

    #[test]
    fn transition_table_is_exhaustive() {
        use VotingStatus::*;
        let all = [Pending, Voting, Passed, Failed, Cancelled];
        let allowed = [
            (Pending, Voting),
            (Pending, Cancelled),
            (Voting, Passed),
            (Voting, Failed),
            (Voting, Cancelled),
        ];
        for from in all {
            for to in all {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition(to),
                    expected,
                    "transition {from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        use VotingStatus::*;
        for terminal in [Passed, Failed, Cancelled] {
            assert!(terminal.is_terminal());
            for to in [Pending, Voting, Passed, Failed, Cancelled] {
                assert!(!terminal.can_transition(to));
            }
        }
    }

    #[test]
    fn status_parse_rejects_unknown() {
        assert_eq!(VotingStatus::parse("VOTING").unwrap(), VotingStatus::Voting);
        assert!(VotingStatus::parse("reopened").is_err());
    }
}
