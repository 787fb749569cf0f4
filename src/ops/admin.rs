use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use serde_json::json;
use tracing::info;

use crate::entities::{council, councillor, guild};
use crate::governance::{AuditKind, ChannelSlot, RoleSlot};
use crate::models::governance::{CouncillorView, GuildOverview};
use crate::schedule::fixed_now;
use crate::state::AppState;

use super::{ActorContext, OpError, audit, council_id_for, load_council};
use crate::ops::permissions::require_admin;

const MAX_GUILD_NAME_LEN: usize = 256;
const MAX_DAYS_REQUIREMENT: i32 = 3_650;
const MAX_COUNCIL_SEATS: i32 = 100;

/// Adjustable participation requirements.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    DaysRequirement,
    MaxCouncillors,
}

/// Creates the guild and its council. Runs on `/setup` and when the bot
/// joins a server.
pub async fn setup_guild(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    name: &str,
    description: Option<&str>,
) -> Result<GuildOverview, OpError> {
    require_admin(state, actor)?;

    let trimmed_name = name.trim();
    if trimmed_name.is_empty() {
        return Err(OpError::InvalidInput(
            "Guild name cannot be empty".to_string(),
        ));
    }
    assert!(
        trimmed_name.len() <= MAX_GUILD_NAME_LEN,
        "Guild name exceeds column bounds"
    );

    if state.guild_settings(guild_id).await?.is_some() {
        return Err(OpError::AlreadyExists(
            "This server is already set up".to_string(),
        ));
    }

    let now = fixed_now();
    let council_id = council_id_for(guild_id);

    let txn = state.database.begin().await.map_err(OpError::Database)?;

    council::ActiveModel {
        council_id: Set(council_id.clone()),
        guild_id: Set(guild_id.to_string()),
        chancellor_id: Set(None),
        election_in_progress: Set(false),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    guild::ActiveModel {
        guild_id: Set(guild_id.to_string()),
        name: Set(trimmed_name.to_string()),
        description: Set(description
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)),
        enabled: Set(true),
        logging_enabled: Set(true),
        councillor_role_id: Set(None),
        chancellor_role_id: Set(None),
        minister_role_id: Set(None),
        president_role_id: Set(None),
        vice_president_role_id: Set(None),
        judiciary_role_id: Set(None),
        citizen_role_id: Set(None),
        voting_channel_id: Set(None),
        announcement_channel_id: Set(None),
        days_requirement: Set(state.governance.default_days_requirement),
        max_councillors: Set(state.governance.default_max_councillors),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&txn)
    .await?;

    txn.commit().await.map_err(OpError::Database)?;
    info!("Guild {guild_id} set up with council {council_id}");

    audit::record(
        state,
        guild_id,
        AuditKind::Admin,
        "setup_guild",
        Some(&actor.discord_id),
        None,
    )
    .await;

    guild_overview(state, guild_id).await
}

pub async fn set_role(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    slot: RoleSlot,
    role_id: &str,
) -> Result<(), OpError> {
    require_admin(state, actor)?;
    let settings = super::require_enabled_guild(state, guild_id).await?;
    let role_id = validate_snowflake(role_id, "role id")?;

    let mut model = settings.as_ref().clone().into_active_model();
    match slot {
        RoleSlot::Councillor => model.councillor_role_id = Set(Some(role_id.clone())),
        RoleSlot::Chancellor => model.chancellor_role_id = Set(Some(role_id.clone())),
        RoleSlot::Minister => model.minister_role_id = Set(Some(role_id.clone())),
        RoleSlot::President => model.president_role_id = Set(Some(role_id.clone())),
        RoleSlot::VicePresident => model.vice_president_role_id = Set(Some(role_id.clone())),
        RoleSlot::Judiciary => model.judiciary_role_id = Set(Some(role_id.clone())),
        RoleSlot::Citizen => model.citizen_role_id = Set(Some(role_id.clone())),
    }
    model.updated_at = Set(fixed_now());
    model.update(&state.database).await?;
    state.invalidate_guild(guild_id).await;

    audit::record(
        state,
        guild_id,
        AuditKind::Admin,
        "set_role",
        Some(&actor.discord_id),
        Some(json!({ "slot": slot.as_str(), "role_id": role_id })),
    )
    .await;
    Ok(())
}

pub async fn set_channel(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    slot: ChannelSlot,
    channel_id: &str,
) -> Result<(), OpError> {
    require_admin(state, actor)?;
    let settings = super::require_enabled_guild(state, guild_id).await?;
    let channel_id = validate_snowflake(channel_id, "channel id")?;

    let mut model = settings.as_ref().clone().into_active_model();
    match slot {
        ChannelSlot::Voting => model.voting_channel_id = Set(Some(channel_id.clone())),
        ChannelSlot::Announcement => model.announcement_channel_id = Set(Some(channel_id.clone())),
    }
    model.updated_at = Set(fixed_now());
    model.update(&state.database).await?;
    state.invalidate_guild(guild_id).await;

    audit::record(
        state,
        guild_id,
        AuditKind::Admin,
        "set_channel",
        Some(&actor.discord_id),
        Some(json!({ "slot": slot.as_str(), "channel_id": channel_id })),
    )
    .await;
    Ok(())
}

pub async fn set_requirement(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    requirement: Requirement,
    value: i32,
) -> Result<(), OpError> {
    require_admin(state, actor)?;
    let settings = super::require_enabled_guild(state, guild_id).await?;

    let mut model = settings.as_ref().clone().into_active_model();
    match requirement {
        Requirement::DaysRequirement => {
            if !(0..=MAX_DAYS_REQUIREMENT).contains(&value) {
                return Err(OpError::InvalidInput(format!(
                    "Days requirement must be between 0 and {MAX_DAYS_REQUIREMENT}"
                )));
            }
            model.days_requirement = Set(value);
        }
        Requirement::MaxCouncillors => {
            if !(1..=MAX_COUNCIL_SEATS).contains(&value) {
                return Err(OpError::InvalidInput(format!(
                    "Council seat count must be between 1 and {MAX_COUNCIL_SEATS}"
                )));
            }
            model.max_councillors = Set(value);
        }
    }
    model.updated_at = Set(fixed_now());
    model.update(&state.database).await?;
    state.invalidate_guild(guild_id).await;

    audit::record(
        state,
        guild_id,
        AuditKind::Admin,
        "set_requirement",
        Some(&actor.discord_id),
        Some(json!({ "value": value })),
    )
    .await;
    Ok(())
}

/// Enables or disables the bot for a guild without touching its data.
pub async fn toggle_enabled(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    enabled: bool,
) -> Result<(), OpError> {
    require_admin(state, actor)?;
    let settings = state
        .guild_settings(guild_id)
        .await?
        .ok_or_else(|| OpError::NotFound(format!("Guild {guild_id} is not set up")))?;

    let mut model = settings.as_ref().clone().into_active_model();
    model.enabled = Set(enabled);
    model.updated_at = Set(fixed_now());
    model.update(&state.database).await?;
    state.invalidate_guild(guild_id).await;

    audit::record(
        state,
        guild_id,
        AuditKind::Admin,
        if enabled { "enable_bot" } else { "disable_bot" },
        Some(&actor.discord_id),
        None,
    )
    .await;
    Ok(())
}

pub async fn guild_overview(state: &AppState, guild_id: &str) -> Result<GuildOverview, OpError> {
    let settings = state
        .guild_settings(guild_id)
        .await?
        .ok_or_else(|| OpError::NotFound(format!("Guild {guild_id} is not set up")))?;
    let council = load_council(state, guild_id).await?;

    let active_councillors = councillor::Entity::find()
        .filter(councillor::Column::CouncilId.eq(council.council_id.clone()))
        .filter(councillor::Column::Active.eq(true))
        .count(&state.database)
        .await?;

    Ok(GuildOverview {
        guild_id: settings.guild_id.clone(),
        name: settings.name.clone(),
        enabled: settings.enabled,
        logging_enabled: settings.logging_enabled,
        councillor_role_id: settings.councillor_role_id.clone(),
        chancellor_role_id: settings.chancellor_role_id.clone(),
        minister_role_id: settings.minister_role_id.clone(),
        president_role_id: settings.president_role_id.clone(),
        vice_president_role_id: settings.vice_president_role_id.clone(),
        judiciary_role_id: settings.judiciary_role_id.clone(),
        citizen_role_id: settings.citizen_role_id.clone(),
        voting_channel_id: settings.voting_channel_id.clone(),
        announcement_channel_id: settings.announcement_channel_id.clone(),
        days_requirement: settings.days_requirement,
        max_councillors: settings.max_councillors,
        active_councillors,
        election_in_progress: council.election_in_progress,
    })
}

/// Sitting council members, chancellor first.
pub async fn list_councillors(
    state: &AppState,
    guild_id: &str,
) -> Result<Vec<CouncillorView>, OpError> {
    let council_id = council_id_for(guild_id);
    let members = councillor::Entity::find()
        .filter(councillor::Column::CouncilId.eq(council_id))
        .filter(councillor::Column::Active.eq(true))
        .order_by_desc(councillor::Column::IsChancellor)
        .order_by_asc(councillor::Column::JoinedAt)
        .all(&state.database)
        .await?;

    Ok(members
        .into_iter()
        .map(|member| CouncillorView {
            discord_id: member.discord_id,
            name: member.name,
            is_chancellor: member.is_chancellor,
            joined_at: member.joined_at.timestamp(),
        })
        .collect())
}

/// Deletes the guild and council records when the bot is removed. Other
/// governance history is left in place.
pub async fn remove_guild(state: &AppState, guild_id: &str) -> Result<(), OpError> {
    let council_id = council_id_for(guild_id);

    let txn = state.database.begin().await.map_err(OpError::Database)?;
    guild::Entity::delete_by_id(guild_id.to_string())
        .exec(&txn)
        .await?;
    council::Entity::delete_by_id(council_id)
        .exec(&txn)
        .await?;
    txn.commit().await.map_err(OpError::Database)?;

    state.invalidate_guild(guild_id).await;
    info!("Removed guild {guild_id}");
    Ok(())
}

fn validate_snowflake(value: &str, label: &str) -> Result<String, OpError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.len() > 32 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(OpError::InvalidInput(format!(
            "{label} must be a numeric Discord id"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_validation() {
        assert_eq!(
            validate_snowflake(" 1234567890 ", "role id").unwrap(),
            "1234567890"
        );
        assert!(validate_snowflake("", "role id").is_err());
        assert!(validate_snowflake("abc", "role id").is_err());
        assert!(validate_snowflake("12 34", "role id").is_err());
    }
}
