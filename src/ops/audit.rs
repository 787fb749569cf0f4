use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::Set;
use serde_json::Value;
use tracing::warn;

use crate::entities::audit_log;
use crate::governance::AuditKind;
use crate::schedule::fixed_now;
use crate::state::AppState;

/// Best-effort audit trail. A write failure is logged and swallowed;
/// governance actions never fail because the log did.
pub async fn record(
    state: &AppState,
    guild_id: &str,
    kind: AuditKind,
    action: &str,
    actor_id: Option<&str>,
    details: Option<Value>,
) {
    assert!(!action.is_empty(), "Audit action cannot be empty");
    assert!(action.len() <= 128, "Audit action exceeds column bounds");

    match state.guild_settings(guild_id).await {
        Ok(Some(settings)) if !settings.logging_enabled => return,
        Ok(_) => {}
        Err(err) => {
            warn!("Audit settings lookup failed for guild {guild_id}: {err}");
            return;
        }
    }

    let entry = audit_log::ActiveModel {
        guild_id: Set(guild_id.to_string()),
        kind: Set(kind.as_str().to_string()),
        action: Set(action.to_string()),
        actor_id: Set(actor_id.map(|id| id.to_string())),
        details: Set(details),
        severity: Set("info".to_string()),
        created_at: Set(fixed_now()),
        ..Default::default()
    };

    if let Err(err) = entry.insert(&state.database).await {
        warn!("Audit write failed for guild {guild_id} action {action}: {err}");
    }
}
