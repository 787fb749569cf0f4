use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
};
use serde_json::json;
use tracing::info;

use crate::entities::{vote, voting};
use crate::governance::{AuditKind, VotingKind, VotingStatus};
use crate::models::governance::{VotingStatusView, VotingSummary};
use crate::schedule::{to_fixed_offset, voting_end_after};
use crate::state::AppState;
use crate::tally::StanceTally;

use super::{ActorContext, OpError, audit, council_id_for, find_voting_by_message};
use crate::ops::permissions::{require_councillor, require_veto_power};

const MAX_TITLE_LEN: usize = 256;
const MAX_DESCRIPTION_LEN: usize = 4_000;
const MAX_VETO_REASON_LEN: usize = 1_024;

/// Opens a proposal for the council to vote on. The voting window length
/// and pass threshold come from the kind's profile; the status starts at
/// `voting` immediately.
pub async fn create_proposal(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    kind: VotingKind,
    title: &str,
    description: &str,
    message_id: Option<&str>,
    now: DateTime<Utc>,
) -> Result<VotingSummary, OpError> {
    let settings = super::require_enabled_guild(state, guild_id).await?;
    require_councillor(state, &settings, actor)?;

    if kind.is_election() {
        return Err(OpError::InvalidInput(
            "Elections are announced, not proposed".to_string(),
        ));
    }

    let title = title.trim();
    if title.is_empty() || title.len() > MAX_TITLE_LEN {
        return Err(OpError::InvalidInput(format!(
            "Title must be 1-{MAX_TITLE_LEN} characters"
        )));
    }
    let description = description.trim();
    if description.is_empty() || description.len() > MAX_DESCRIPTION_LEN {
        return Err(OpError::InvalidInput(format!(
            "Description must be 1-{MAX_DESCRIPTION_LEN} characters"
        )));
    }

    let profile = kind.profile();
    let voting_end = voting_end_after(now, profile.voting_days);
    let stamp = to_fixed_offset(now);

    let record = voting::ActiveModel {
        council_id: Set(council_id_for(guild_id)),
        kind: Set(kind.as_str().to_string()),
        status: Set(VotingStatus::Voting.as_str().to_string()),
        title: Set(title.to_string()),
        description: Set(description.to_string()),
        proposer_id: Set(Some(actor.discord_id.clone())),
        message_id: Set(message_id.map(|id| id.trim().to_string())),
        voting_start: Set(Some(stamp)),
        voting_end: Set(to_fixed_offset(voting_end)),
        required_percentage: Set(profile.required_percentage),
        result_announced: Set(false),
        created_at: Set(stamp),
        updated_at: Set(stamp),
        ..Default::default()
    }
    .insert(&state.database)
    .await?;

    info!(
        "Proposal voting {} ({}) opened in guild {guild_id}",
        record.id,
        kind.as_str()
    );
    audit::record(
        state,
        guild_id,
        AuditKind::Command,
        "create_proposal",
        Some(&actor.discord_id),
        Some(json!({ "voting_id": record.id, "kind": kind.as_str() })),
    )
    .await;

    Ok(summary(&record))
}

/// Binds a voting to the Discord message that carries its buttons. Used
/// when the frontend posts the message after creating the record.
pub async fn attach_message(
    state: &AppState,
    guild_id: &str,
    voting_id: i64,
    message_id: &str,
) -> Result<(), OpError> {
    let trimmed = message_id.trim();
    if trimmed.is_empty() || trimmed.len() > 32 {
        return Err(OpError::InvalidInput(
            "Message id must be a Discord snowflake".to_string(),
        ));
    }

    let record = voting::Entity::find_by_id(voting_id)
        .one(&state.database)
        .await?
        .ok_or_else(|| OpError::NotFound(format!("Voting {voting_id} not found")))?;
    if record.council_id != council_id_for(guild_id) {
        return Err(OpError::NotFound(format!(
            "Voting {voting_id} does not belong to this server"
        )));
    }

    let mut model = record.into_active_model();
    model.message_id = Set(Some(trimmed.to_string()));
    model.updated_at = Set(to_fixed_offset(Utc::now()));
    model.update(&state.database).await?;
    Ok(())
}

/// Records a councillor's for/against ballot. Re-voting replaces the
/// previous ballot atomically via the (voting, voter) unique key.
pub async fn cast_stance_vote(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    message_id: &str,
    stance: bool,
    now: DateTime<Utc>,
) -> Result<(), OpError> {
    let settings = super::require_enabled_guild(state, guild_id).await?;
    require_councillor(state, &settings, actor)?;

    let record = find_voting_by_message(state, guild_id, message_id).await?;
    let kind = VotingKind::parse(&record.kind)?;
    if kind.is_election() {
        return Err(OpError::InvalidInput(
            "Election ballots are cast per candidate, not for/against".to_string(),
        ));
    }
    ensure_open(&record, now)?;

    let ballot = vote::ActiveModel {
        voting_id: Set(record.id),
        voter_id: Set(actor.discord_id.clone()),
        stance: Set(stance),
        candidate_id: Set(None),
        voted_at: Set(to_fixed_offset(now)),
        ..Default::default()
    };
    vote::Entity::insert(ballot)
        .on_conflict(
            OnConflict::columns([vote::Column::VotingId, vote::Column::VoterId])
                .update_columns([vote::Column::Stance, vote::Column::VotedAt])
                .to_owned(),
        )
        .exec(&state.database)
        .await?;

    audit::record(
        state,
        guild_id,
        AuditKind::Vote,
        "cast_vote",
        Some(&actor.discord_id),
        Some(json!({ "voting_id": record.id, "stance": stance })),
    )
    .await;
    Ok(())
}

/// Live tally for a voting, election or otherwise.
pub async fn voting_status(
    state: &AppState,
    guild_id: &str,
    message_id: &str,
) -> Result<VotingStatusView, OpError> {
    let record = find_voting_by_message(state, guild_id, message_id).await?;

    let ballots = vote::Entity::find()
        .filter(vote::Column::VotingId.eq(record.id))
        .all(&state.database)
        .await?;
    let tally = StanceTally::from_stances(ballots.iter().map(|ballot| ballot.stance));

    Ok(VotingStatusView {
        voting_id: record.id,
        title: record.title,
        kind: record.kind,
        status: record.status,
        yes_votes: tally.yes,
        no_votes: tally.no,
        total_votes: tally.total(),
        required_percentage: record.required_percentage,
        voting_end: record.voting_end.timestamp(),
        result_announced: record.result_announced,
    })
}

/// Executive veto: cancels a pending or open non-election voting.
pub async fn veto(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    message_id: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), OpError> {
    let settings = super::require_enabled_guild(state, guild_id).await?;
    require_veto_power(state, &settings, actor)?;

    let reason = reason.trim();
    if reason.is_empty() || reason.len() > MAX_VETO_REASON_LEN {
        return Err(OpError::InvalidInput(format!(
            "A veto reason of 1-{MAX_VETO_REASON_LEN} characters is required"
        )));
    }

    let record = find_voting_by_message(state, guild_id, message_id).await?;
    let kind = VotingKind::parse(&record.kind)?;
    if kind.is_election() {
        return Err(OpError::InvalidInput(
            "Elections cannot be vetoed".to_string(),
        ));
    }

    let status = VotingStatus::parse(&record.status)?;
    if !status.can_transition(VotingStatus::Cancelled) {
        return Err(OpError::InvalidInput(format!(
            "A {} voting cannot be vetoed",
            record.status
        )));
    }

    let voting_id = record.id;
    let mut model = record.into_active_model();
    model.status = Set(VotingStatus::Cancelled.as_str().to_string());
    model.updated_at = Set(to_fixed_offset(now));
    model.update(&state.database).await?;

    info!("Voting {voting_id} vetoed by {}", actor.discord_id);
    audit::record(
        state,
        guild_id,
        AuditKind::ChancellorAction,
        "veto",
        Some(&actor.discord_id),
        Some(json!({ "voting_id": voting_id, "reason": reason })),
    )
    .await;
    Ok(())
}

pub(crate) fn ensure_open(record: &voting::Model, now: DateTime<Utc>) -> Result<(), OpError> {
    let status = VotingStatus::parse(&record.status)?;
    if status != VotingStatus::Voting {
        return Err(OpError::InvalidInput(format!(
            "This voting is not open (status: {})",
            record.status
        )));
    }
    if record.voting_end <= to_fixed_offset(now) {
        return Err(OpError::InvalidInput(
            "The voting deadline has passed".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn summary(record: &voting::Model) -> VotingSummary {
    VotingSummary {
        voting_id: record.id,
        title: record.title.clone(),
        kind: record.kind.clone(),
        status: record.status.clone(),
        voting_end: record.voting_end.timestamp(),
        message_id: record.message_id.clone(),
    }
}
