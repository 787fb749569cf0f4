use serde::{Deserialize, Serialize};

/// A formatted result or notice the gateway turns into a Discord embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<(String, String)>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingStatusView {
    pub voting_id: i64,
    pub title: String,
    pub kind: String,
    pub status: String,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub total_votes: u64,
    pub required_percentage: f64,
    pub voting_end: i64,
    pub result_announced: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotingSummary {
    pub voting_id: i64,
    pub title: String,
    pub kind: String,
    pub status: String,
    pub voting_end: i64,
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateView {
    pub candidate_id: i64,
    pub discord_id: String,
    pub name: String,
    pub vote_count: i32,
    pub elected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedElection {
    pub voting_id: i64,
    pub title: String,
    pub voting_end: i64,
    pub candidates: Vec<CandidateView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouncillorView {
    pub discord_id: String,
    pub name: String,
    pub is_chancellor: bool,
    pub joined_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinistryView {
    pub ministry_id: i64,
    pub name: String,
    pub description: String,
    pub minister_discord_id: Option<String>,
    pub deputy_discord_id: Option<String>,
    pub role_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildOverview {
    pub guild_id: String,
    pub name: String,
    pub enabled: bool,
    pub logging_enabled: bool,
    pub councillor_role_id: Option<String>,
    pub chancellor_role_id: Option<String>,
    pub minister_role_id: Option<String>,
    pub president_role_id: Option<String>,
    pub vice_president_role_id: Option<String>,
    pub judiciary_role_id: Option<String>,
    pub citizen_role_id: Option<String>,
    pub voting_channel_id: Option<String>,
    pub announcement_channel_id: Option<String>,
    pub days_requirement: i32,
    pub max_councillors: i32,
    pub active_councillors: u64,
    pub election_in_progress: bool,
}
