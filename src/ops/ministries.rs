use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder};
use serde_json::json;
use tracing::{info, warn};

use crate::entities::ministry;
use crate::governance::AuditKind;
use crate::models::governance::MinistryView;
use crate::schedule::fixed_now;
use crate::state::AppState;

use super::{ActorContext, OpError, audit, council_id_for};
use crate::ops::permissions::require_chancellor;

const MAX_MINISTRY_NAME_LEN: usize = 128;
const MAX_MINISTRY_DESCRIPTION_LEN: usize = 2_000;

/// Creates a ministry, optionally with a minister already appointed.
pub async fn create_ministry(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    name: &str,
    description: &str,
    minister_discord_id: Option<&str>,
) -> Result<MinistryView, OpError> {
    let settings = super::require_enabled_guild(state, guild_id).await?;
    require_chancellor(state, &settings, actor)?;

    let name = name.trim();
    if name.is_empty() || name.len() > MAX_MINISTRY_NAME_LEN {
        return Err(OpError::InvalidInput(format!(
            "Ministry name must be 1-{MAX_MINISTRY_NAME_LEN} characters"
        )));
    }
    let description = description.trim();
    if description.len() > MAX_MINISTRY_DESCRIPTION_LEN {
        return Err(OpError::InvalidInput(format!(
            "Ministry description must be at most {MAX_MINISTRY_DESCRIPTION_LEN} characters"
        )));
    }

    let council_id = council_id_for(guild_id);
    let existing = ministry::Entity::find()
        .filter(ministry::Column::CouncilId.eq(council_id.clone()))
        .filter(ministry::Column::Active.eq(true))
        .all(&state.database)
        .await?;
    if existing
        .iter()
        .any(|m| m.name.eq_ignore_ascii_case(name))
    {
        return Err(OpError::AlreadyExists(format!(
            "A ministry named {name} already exists"
        )));
    }

    let record = ministry::ActiveModel {
        council_id: Set(council_id),
        name: Set(name.to_string()),
        description: Set(description.to_string()),
        minister_discord_id: Set(minister_discord_id.map(|id| id.trim().to_string())),
        deputy_discord_id: Set(None),
        role_id: Set(None),
        created_by: Set(actor.discord_id.clone()),
        active: Set(true),
        created_at: Set(fixed_now()),
        ..Default::default()
    }
    .insert(&state.database)
    .await?;

    info!("Ministry {} created in guild {guild_id}", record.id);
    audit::record(
        state,
        guild_id,
        AuditKind::ChancellorAction,
        "create_ministry",
        Some(&actor.discord_id),
        Some(json!({ "ministry_id": record.id, "name": record.name })),
    )
    .await;

    Ok(view(record))
}

/// Appoints a minister (and optionally a deputy). When the guild has a
/// minister role configured, the role grant is best-effort; a Discord
/// failure does not undo the appointment.
pub async fn assign_minister(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    ministry_id: i64,
    minister_discord_id: &str,
    deputy_discord_id: Option<&str>,
) -> Result<MinistryView, OpError> {
    let settings = super::require_enabled_guild(state, guild_id).await?;
    require_chancellor(state, &settings, actor)?;

    let record = active_ministry(state, guild_id, ministry_id).await?;

    let minister = minister_discord_id.trim();
    if minister.is_empty() {
        return Err(OpError::InvalidInput(
            "A minister must be specified".to_string(),
        ));
    }

    let mut model = record.into_active_model();
    model.minister_discord_id = Set(Some(minister.to_string()));
    if let Some(deputy) = deputy_discord_id {
        model.deputy_discord_id = Set(Some(deputy.trim().to_string()));
    }
    let updated = model.update(&state.database).await?;

    if let Some(role_id) = settings.minister_role_id.as_ref() {
        if let Err(err) = state
            .gateway
            .grant_role(guild_id, minister, role_id, "Appointed minister")
            .await
        {
            warn!("Minister role grant failed for {minister}: {err:#}");
        }
    }

    audit::record(
        state,
        guild_id,
        AuditKind::ChancellorAction,
        "assign_minister",
        Some(&actor.discord_id),
        Some(json!({ "ministry_id": ministry_id, "minister": minister })),
    )
    .await;

    Ok(view(updated))
}

/// Deactivates a ministry; its history stays queryable.
pub async fn remove_ministry(
    state: &AppState,
    actor: &ActorContext,
    guild_id: &str,
    ministry_id: i64,
) -> Result<(), OpError> {
    let settings = super::require_enabled_guild(state, guild_id).await?;
    require_chancellor(state, &settings, actor)?;

    let record = active_ministry(state, guild_id, ministry_id).await?;
    let mut model = record.into_active_model();
    model.active = Set(false);
    model.update(&state.database).await?;

    info!("Ministry {ministry_id} removed in guild {guild_id}");
    audit::record(
        state,
        guild_id,
        AuditKind::ChancellorAction,
        "remove_ministry",
        Some(&actor.discord_id),
        Some(json!({ "ministry_id": ministry_id })),
    )
    .await;
    Ok(())
}

pub async fn list_ministries(
    state: &AppState,
    guild_id: &str,
) -> Result<Vec<MinistryView>, OpError> {
    let ministries = ministry::Entity::find()
        .filter(ministry::Column::CouncilId.eq(council_id_for(guild_id)))
        .filter(ministry::Column::Active.eq(true))
        .order_by_asc(ministry::Column::Name)
        .all(&state.database)
        .await?;
    Ok(ministries.into_iter().map(view).collect())
}

async fn active_ministry(
    state: &AppState,
    guild_id: &str,
    ministry_id: i64,
) -> Result<ministry::Model, OpError> {
    ministry::Entity::find_by_id(ministry_id)
        .one(&state.database)
        .await?
        .filter(|record| record.council_id == council_id_for(guild_id) && record.active)
        .ok_or_else(|| OpError::NotFound(format!("Ministry {ministry_id} not found")))
}

fn view(record: ministry::Model) -> MinistryView {
    MinistryView {
        ministry_id: record.id,
        name: record.name,
        description: record.description,
        minister_discord_id: record.minister_discord_id,
        deputy_discord_id: record.deputy_discord_id,
        role_id: record.role_id,
    }
}
