use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Expr, ExprTrait as _};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde_json::json;
use tracing::info;

use crate::entities::{councillor, election_candidate, registered_voter, vote, voting};
use crate::governance::{AuditKind, VotingKind, VotingStatus};
use crate::models::governance::{CandidateView, StartedElection, VotingSummary};
use crate::resolver;
use crate::schedule::{parse_deadline, to_fixed_offset};
use crate::state::AppState;

use super::{ActorContext, OpError, audit, council_id_for, find_voting_by_message};
use crate::ops::permissions::{check_eligibility, require_president};
use crate::ops::proposals::{ensure_open, summary};

/// Announces a council election with a registration window followed by a
/// voting window. The existing-election check and the flag flip run under
/// the council's lock, so two simultaneous announcements cannot both pass.
pub async fn announce_election(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    registration_end: &str,
    voting_end: &str,
    now: DateTime<Utc>,
) -> Result<VotingSummary, OpError> {
    announce(
        state,
        actor,
        guild_id,
        VotingKind::Election,
        "Council Election",
        "Election for new Grand Council members",
        registration_end,
        voting_end,
        now,
    )
    .await
}

pub async fn announce_chancellor_election(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    registration_end: &str,
    voting_end: &str,
    now: DateTime<Utc>,
) -> Result<VotingSummary, OpError> {
    announce(
        state,
        actor,
        guild_id,
        VotingKind::ChancellorElection,
        "Chancellor Election",
        "Election for the Chancellor of the Grand Council",
        registration_end,
        voting_end,
        now,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn announce(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    kind: VotingKind,
    title: &str,
    description: &str,
    registration_end: &str,
    voting_end: &str,
    now: DateTime<Utc>,
) -> Result<VotingSummary, OpError> {
    assert!(kind.is_election(), "Announce only handles election kinds");

    let settings = super::require_enabled_guild(state, guild_id).await?;
    require_president(state, &settings, actor)?;

    let registration_end = parse_deadline(registration_end).ok_or_else(|| {
        OpError::InvalidInput(
            "Invalid registration end. Use: DD.MM.YYYY HH:MM (e.g. 24.12.2026 23:56)".to_string(),
        )
    })?;
    let voting_end = parse_deadline(voting_end).ok_or_else(|| {
        OpError::InvalidInput(
            "Invalid voting end. Use: DD.MM.YYYY HH:MM (e.g. 24.12.2026 23:56)".to_string(),
        )
    })?;
    if registration_end <= now {
        return Err(OpError::InvalidInput(
            "Registration end must be in the future".to_string(),
        ));
    }
    if voting_end <= registration_end {
        return Err(OpError::InvalidInput(
            "Voting end must be after registration end".to_string(),
        ));
    }

    let council_id = council_id_for(guild_id);
    let _guard = state.council_locks.lock(&council_id).await;

    let council = super::load_council(state, guild_id).await?;
    if council.election_in_progress {
        return Err(OpError::AlreadyExists(
            "An election is already in progress".to_string(),
        ));
    }

    let stamp = to_fixed_offset(now);
    let record = voting::ActiveModel {
        council_id: Set(council_id.clone()),
        kind: Set(kind.as_str().to_string()),
        status: Set(VotingStatus::Pending.as_str().to_string()),
        title: Set(title.to_string()),
        description: Set(description.to_string()),
        proposer_id: Set(Some(actor.discord_id.clone())),
        message_id: Set(None),
        voting_start: Set(Some(to_fixed_offset(registration_end))),
        voting_end: Set(to_fixed_offset(voting_end)),
        required_percentage: Set(0.0),
        result_announced: Set(false),
        created_at: Set(stamp),
        updated_at: Set(stamp),
        ..Default::default()
    }
    .insert(&state.database)
    .await?;

    let mut model = council.into_active_model();
    model.election_in_progress = Set(true);
    model.updated_at = Set(stamp);
    model.update(&state.database).await?;

    info!(
        "{} {} announced in guild {guild_id}",
        kind.as_str(),
        record.id
    );
    audit::record(
        state,
        guild_id,
        AuditKind::Election,
        "announce_election",
        Some(&actor.discord_id),
        Some(json!({ "voting_id": record.id, "kind": kind.as_str() })),
    )
    .await;

    Ok(summary(&record))
}

/// Registers the caller to vote in an election during the registration
/// window. Chancellor elections are open to sitting councillors only.
pub async fn register_voter(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    message_id: &str,
    now: DateTime<Utc>,
) -> Result<(), OpError> {
    let settings = super::require_enabled_guild(state, guild_id).await?;
    let record = registration_window(state, guild_id, message_id).await?;
    let kind = VotingKind::parse(&record.kind)?;

    if kind == VotingKind::ChancellorElection {
        require_council_seat(state, guild_id, actor).await?;
    } else {
        check_eligibility(&settings, actor, now)?;
    }

    let already = registered_voter::Entity::find()
        .filter(registered_voter::Column::VotingId.eq(record.id))
        .filter(registered_voter::Column::DiscordId.eq(actor.discord_id.clone()))
        .count(&state.database)
        .await?;
    if already > 0 {
        return Err(OpError::AlreadyExists(
            "You are already registered to vote".to_string(),
        ));
    }

    registered_voter::ActiveModel {
        voting_id: Set(record.id),
        discord_id: Set(actor.discord_id.clone()),
        name: Set(actor.display_name.clone()),
        registered_at: Set(to_fixed_offset(now)),
        has_voted: Set(false),
        ..Default::default()
    }
    .insert(&state.database)
    .await?;

    audit::record(
        state,
        guild_id,
        AuditKind::Election,
        "register_voter",
        Some(&actor.discord_id),
        Some(json!({ "voting_id": record.id })),
    )
    .await;
    Ok(())
}

/// Registers the caller as a candidate. The field is capped at the
/// guild's seat count.
pub async fn register_candidate(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    message_id: &str,
    now: DateTime<Utc>,
) -> Result<(), OpError> {
    let settings = super::require_enabled_guild(state, guild_id).await?;
    let record = registration_window(state, guild_id, message_id).await?;
    let kind = VotingKind::parse(&record.kind)?;

    if kind == VotingKind::ChancellorElection {
        require_council_seat(state, guild_id, actor).await?;
    } else {
        check_eligibility(&settings, actor, now)?;
    }

    let field = election_candidate::Entity::find()
        .filter(election_candidate::Column::VotingId.eq(record.id))
        .all(&state.database)
        .await?;
    let max_candidates = usize::try_from(settings.max_councillors.max(1)).unwrap_or(1);
    if field.len() >= max_candidates {
        return Err(OpError::InvalidInput(format!(
            "Maximum number of candidates ({max_candidates}) reached"
        )));
    }
    if field
        .iter()
        .any(|candidate| candidate.discord_id == actor.discord_id)
    {
        return Err(OpError::AlreadyExists(
            "You are already registered as a candidate".to_string(),
        ));
    }

    election_candidate::ActiveModel {
        voting_id: Set(record.id),
        discord_id: Set(actor.discord_id.clone()),
        name: Set(actor.display_name.clone()),
        registered_at: Set(to_fixed_offset(now)),
        vote_count: Set(0),
        elected: Set(false),
        ..Default::default()
    }
    .insert(&state.database)
    .await?;

    audit::record(
        state,
        guild_id,
        AuditKind::Election,
        "register_candidate",
        Some(&actor.discord_id),
        Some(json!({ "voting_id": record.id })),
    )
    .await;
    Ok(())
}

/// Moves a pending election into its voting phase and binds the ballot
/// message. Requires at least one registered candidate.
pub async fn start_voting(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    kind: VotingKind,
    message_id: Option<&str>,
) -> Result<StartedElection, OpError> {
    if !kind.is_election() {
        return Err(OpError::InvalidInput(
            "Only elections have a separate voting phase".to_string(),
        ));
    }

    let settings = super::require_enabled_guild(state, guild_id).await?;
    require_president(state, &settings, actor)?;

    let record = voting::Entity::find()
        .filter(voting::Column::CouncilId.eq(council_id_for(guild_id)))
        .filter(voting::Column::Kind.eq(kind.as_str()))
        .filter(voting::Column::Status.eq(VotingStatus::Pending.as_str()))
        .one(&state.database)
        .await?
        .ok_or_else(|| OpError::NotFound("No pending election found".to_string()))?;

    let candidates = election_candidate::Entity::find()
        .filter(election_candidate::Column::VotingId.eq(record.id))
        .order_by_asc(election_candidate::Column::RegisteredAt)
        .order_by_asc(election_candidate::Column::Id)
        .all(&state.database)
        .await?;
    if candidates.is_empty() {
        return Err(OpError::InvalidInput(
            "No candidates have registered yet".to_string(),
        ));
    }

    let current = VotingStatus::parse(&record.status)?;
    assert!(
        current.can_transition(VotingStatus::Voting),
        "Pending election cannot enter voting phase"
    );

    let voting_id = record.id;
    let title = record.title.clone();
    let voting_end = record.voting_end.timestamp();

    let mut model = record.into_active_model();
    model.status = Set(VotingStatus::Voting.as_str().to_string());
    if let Some(message_id) = message_id {
        model.message_id = Set(Some(message_id.trim().to_string()));
    }
    model.updated_at = Set(to_fixed_offset(Utc::now()));
    model.update(&state.database).await?;

    info!(
        "Election {voting_id} entered voting phase with {} candidates",
        candidates.len()
    );
    audit::record(
        state,
        guild_id,
        AuditKind::Election,
        "start_voting",
        Some(&actor.discord_id),
        Some(json!({ "voting_id": voting_id, "candidates": candidates.len() })),
    )
    .await;

    Ok(StartedElection {
        voting_id,
        title,
        voting_end,
        candidates: candidates.into_iter().map(candidate_view).collect(),
    })
}

/// Casts a ballot for one candidate. The ballot row, the voter's
/// `has_voted` flag, and the candidate's running count commit together.
pub async fn cast_ballot(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    message_id: &str,
    candidate_id: i64,
    now: DateTime<Utc>,
) -> Result<(), OpError> {
    super::require_enabled_guild(state, guild_id).await?;

    let record = find_voting_by_message(state, guild_id, message_id).await?;
    let kind = VotingKind::parse(&record.kind)?;
    if !kind.is_election() {
        return Err(OpError::InvalidInput(
            "This voting takes for/against ballots".to_string(),
        ));
    }
    ensure_open(&record, now)?;

    let voter = registered_voter::Entity::find()
        .filter(registered_voter::Column::VotingId.eq(record.id))
        .filter(registered_voter::Column::DiscordId.eq(actor.discord_id.clone()))
        .one(&state.database)
        .await?
        .ok_or_else(|| {
            OpError::NotAuthorized(
                "You must register to vote before casting your ballot".to_string(),
            )
        })?;
    if voter.has_voted {
        return Err(OpError::AlreadyExists(
            "You have already voted in this election".to_string(),
        ));
    }

    let candidate = election_candidate::Entity::find_by_id(candidate_id)
        .one(&state.database)
        .await?
        .filter(|candidate| candidate.voting_id == record.id)
        .ok_or_else(|| {
            OpError::NotFound("That candidate is not running in this election".to_string())
        })?;

    let txn = state.database.begin().await.map_err(OpError::Database)?;

    vote::ActiveModel {
        voting_id: Set(record.id),
        voter_id: Set(actor.discord_id.clone()),
        stance: Set(true),
        candidate_id: Set(Some(candidate.id)),
        voted_at: Set(to_fixed_offset(now)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut voted = voter.into_active_model();
    voted.has_voted = Set(true);
    voted.update(&txn).await?;

    election_candidate::Entity::update_many()
        .col_expr(
            election_candidate::Column::VoteCount,
            Expr::col(election_candidate::Column::VoteCount).add(1),
        )
        .filter(election_candidate::Column::Id.eq(candidate.id))
        .exec(&txn)
        .await?;

    txn.commit().await.map_err(OpError::Database)?;

    audit::record(
        state,
        guild_id,
        AuditKind::Vote,
        "cast_election_vote",
        Some(&actor.discord_id),
        Some(json!({ "voting_id": record.id, "candidate_id": candidate.id })),
    )
    .await;
    Ok(())
}

/// Candidates in registration order, for the frontend's ballot buttons.
pub async fn list_candidates(
    state: &AppState,
    guild_id: &str,
    message_id: &str,
) -> Result<Vec<CandidateView>, OpError> {
    let record = find_voting_by_message(state, guild_id, message_id).await?;
    let candidates = election_candidate::Entity::find()
        .filter(election_candidate::Column::VotingId.eq(record.id))
        .order_by_asc(election_candidate::Column::RegisteredAt)
        .order_by_asc(election_candidate::Column::Id)
        .all(&state.database)
        .await?;
    Ok(candidates.into_iter().map(candidate_view).collect())
}

/// Closes an open voting immediately, running the same resolution path
/// the nightly job uses.
pub async fn conclude_voting(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    message_id: &str,
) -> Result<(), OpError> {
    let settings = super::require_enabled_guild(state, guild_id).await?;
    require_president(state, &settings, actor)?;

    let record = find_voting_by_message(state, guild_id, message_id).await?;
    let status = VotingStatus::parse(&record.status)?;
    if status != VotingStatus::Voting {
        return Err(OpError::InvalidInput(format!(
            "Only an open voting can be concluded (status: {})",
            record.status
        )));
    }

    let voting_id = record.id;
    resolver::resolve_voting(&state.database, &state.gateway, record).await?;

    audit::record(
        state,
        guild_id,
        AuditKind::Election,
        "conclude_voting",
        Some(&actor.discord_id),
        Some(json!({ "voting_id": voting_id })),
    )
    .await;
    Ok(())
}

/// Looks the voting up and checks its registration window is still open.
async fn registration_window(
    state: &AppState,
    guild_id: &str,
    message_id: &str,
) -> Result<voting::Model, OpError> {
    let record = find_voting_by_message(state, guild_id, message_id).await?;
    let kind = VotingKind::parse(&record.kind)?;
    if !kind.is_election() {
        return Err(OpError::InvalidInput(
            "Registration only applies to elections".to_string(),
        ));
    }
    let status = VotingStatus::parse(&record.status)?;
    if status != VotingStatus::Pending {
        return Err(OpError::InvalidInput(
            "The registration window for this election has closed".to_string(),
        ));
    }
    Ok(record)
}

async fn require_council_seat(
    state: &AppState,
    guild_id: &str,
    actor: &ActorContext,
) -> Result<(), OpError> {
    let seats = councillor::Entity::find()
        .filter(councillor::Column::CouncilId.eq(council_id_for(guild_id)))
        .filter(councillor::Column::DiscordId.eq(actor.discord_id.clone()))
        .filter(councillor::Column::Active.eq(true))
        .count(&state.database)
        .await?;
    if seats == 0 {
        return Err(OpError::NotAuthorized(
            "Chancellor elections are open to sitting councillors only".to_string(),
        ));
    }
    Ok(())
}

fn candidate_view(candidate: election_candidate::Model) -> CandidateView {
    CandidateView {
        candidate_id: candidate.id,
        discord_id: candidate.discord_id,
        name: candidate.name,
        vote_count: candidate.vote_count,
        elected: candidate.elected,
    }
}
