use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter};
use thiserror::Error;

use crate::entities::{council, guild, voting};
use crate::state::AppState;

pub mod admin;
pub mod audit;
pub mod elections;
pub mod ministries;
pub mod permissions;
pub mod proposals;

/// Failure taxonomy for command operations. The first four map to
/// user-facing replies; the rest are reported as generic failures and
/// logged with their cause.
#[derive(Debug, Error)]
pub enum OpError {
    #[error("not authorized: {0}")]
    NotAuthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("already exists: {0}")]
    AlreadyExists(String),
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// The caller as seen by the interaction frontend: identity plus the
/// Discord-side facts every authorization check needs. Operations never
/// talk to Discord to authorize.
#[derive(Debug, Clone)]
pub struct ActorContext {
    pub discord_id: String,
    pub display_name: String,
    pub role_ids: Vec<String>,
    /// Caller holds the Discord `administrator` permission.
    pub is_guild_admin: bool,
    pub joined_at: Option<DateTime<Utc>>,
}

/// Councils derive their id from the guild snowflake.
pub fn council_id_for(guild_id: &str) -> String {
    assert!(!guild_id.is_empty(), "Guild id cannot be empty");
    assert!(guild_id.len() <= 32, "Guild id length exceeds bounds");
    format!("{guild_id}_c")
}

/// Loads the guild settings (through the cache) and rejects disabled
/// guilds. Every privileged operation starts here.
pub(crate) async fn require_enabled_guild(
    state: &AppState,
    guild_id: &str,
) -> Result<Arc<guild::Model>, OpError> {
    let settings = state
        .guild_settings(guild_id)
        .await?
        .ok_or_else(|| OpError::NotFound(format!("Guild {guild_id} is not set up")))?;
    if !settings.enabled {
        return Err(OpError::NotAuthorized(
            "The bot is disabled for this server".to_string(),
        ));
    }
    Ok(settings)
}

pub(crate) async fn load_council(
    state: &AppState,
    guild_id: &str,
) -> Result<council::Model, OpError> {
    let council_id = council_id_for(guild_id);
    council::Entity::find_by_id(council_id.clone())
        .one(&state.database)
        .await?
        .ok_or_else(|| OpError::NotFound(format!("Council {council_id} not found")))
}

/// Votings are addressed by their originating Discord message.
pub(crate) async fn find_voting_by_message(
    state: &AppState,
    guild_id: &str,
    message_id: &str,
) -> Result<voting::Model, OpError> {
    let trimmed = message_id.trim();
    if trimmed.is_empty() {
        return Err(OpError::InvalidInput(
            "A voting message id is required".to_string(),
        ));
    }
    assert!(trimmed.len() <= 32, "Message id length exceeds bounds");

    let record = voting::Entity::find()
        .filter(voting::Column::MessageId.eq(trimmed))
        .filter(voting::Column::CouncilId.eq(council_id_for(guild_id)))
        .one(&state.database)
        .await?
        .ok_or_else(|| OpError::NotFound(format!("No voting found for message {trimmed}")))?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn council_id_derivation() {
        assert_eq!(council_id_for("123456789"), "123456789_c");
    }
}
