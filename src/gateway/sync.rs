use serenity::model::id::RoleId;
use tracing::{debug, warn};

use super::{GatewayClient, parse_snowflake};

/// Outcome of reconciling Discord role membership after a resolution.
/// Skips are warnings, not failures; the resolver surfaces them in the
/// result announcement.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub granted: u32,
    pub revoked: u32,
    pub skipped: Vec<String>,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    pub fn note_skip(&mut self, detail: impl Into<String>) {
        let detail = detail.into();
        assert!(!detail.is_empty(), "Skip note cannot be empty");
        if self.skipped.len() < 50 {
            self.skipped.push(detail);
        }
    }
}

/// Grants `role_id` unless the member already holds it. A member who left
/// the guild is skipped.
pub async fn ensure_member_has_role(
    gateway: &GatewayClient,
    guild_id: &str,
    user_id: &str,
    role_id: &str,
    reason: &str,
    report: &mut SyncReport,
) {
    let Some(member) = fetch_or_skip(gateway, guild_id, user_id, report).await else {
        return;
    };

    let Ok(role) = parse_snowflake(role_id, "role id") else {
        report.note_skip(format!("configured role id {role_id} is malformed"));
        return;
    };

    if member.roles.contains(&RoleId::new(role)) {
        debug!("Member {user_id} already holds role {role_id}");
        return;
    }

    match gateway.grant_role(guild_id, user_id, role_id, reason).await {
        Ok(()) => report.granted += 1,
        Err(err) => {
            warn!("Role grant failed for {user_id}: {err:#}");
            report.note_skip(format!("could not grant role to <@{user_id}>"));
        }
    }
}

/// Revokes `role_id` when the member still holds it.
pub async fn ensure_member_lacks_role(
    gateway: &GatewayClient,
    guild_id: &str,
    user_id: &str,
    role_id: &str,
    reason: &str,
    report: &mut SyncReport,
) {
    let Some(member) = fetch_or_skip(gateway, guild_id, user_id, report).await else {
        return;
    };

    let Ok(role) = parse_snowflake(role_id, "role id") else {
        report.note_skip(format!("configured role id {role_id} is malformed"));
        return;
    };

    if !member.roles.contains(&RoleId::new(role)) {
        debug!("Member {user_id} does not hold role {role_id}");
        return;
    }

    match gateway.revoke_role(guild_id, user_id, role_id, reason).await {
        Ok(()) => report.revoked += 1,
        Err(err) => {
            warn!("Role revoke failed for {user_id}: {err:#}");
            report.note_skip(format!("could not revoke role from <@{user_id}>"));
        }
    }
}

/// Moves a role from the outgoing holders to the incoming ones. With no
/// role configured, every change is recorded as a single skip so the
/// announcement can point at the missing configuration.
pub async fn reassign_role(
    gateway: &GatewayClient,
    guild_id: &str,
    role_id: Option<&str>,
    outgoing: &[String],
    incoming: &[String],
    reason: &str,
) -> SyncReport {
    assert!(
        outgoing.len() <= 1_000,
        "Outgoing member set exceeds defensive bound"
    );
    assert!(
        incoming.len() <= 1_000,
        "Incoming member set exceeds defensive bound"
    );

    let mut report = SyncReport::default();
    let Some(role_id) = role_id else {
        report.note_skip("no role configured for this office; use /set_role");
        return report;
    };

    for user_id in outgoing {
        if incoming.contains(user_id) {
            continue;
        }
        ensure_member_lacks_role(gateway, guild_id, user_id, role_id, reason, &mut report).await;
    }
    for user_id in incoming {
        ensure_member_has_role(gateway, guild_id, user_id, role_id, reason, &mut report).await;
    }
    report
}

async fn fetch_or_skip(
    gateway: &GatewayClient,
    guild_id: &str,
    user_id: &str,
    report: &mut SyncReport,
) -> Option<serenity::model::guild::Member> {
    match gateway.fetch_member(guild_id, user_id).await {
        Ok(Some(member)) => Some(member),
        Ok(None) => {
            warn!("Member {user_id} has left guild {guild_id}; skipping role change");
            report.note_skip(format!("<@{user_id}> is no longer a member"));
            None
        }
        Err(err) => {
            warn!("Member lookup failed for {user_id}: {err:#}");
            report.note_skip(format!("could not look up <@{user_id}>"));
            None
        }
    }
}
