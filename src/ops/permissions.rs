use chrono::{DateTime, Utc};

use crate::entities::guild;
use crate::governance::RoleSlot;
use crate::state::AppState;

use super::{ActorContext, OpError};

/// The configured bot operator passes every check.
pub fn is_bot_admin(state: &AppState, actor: &ActorContext) -> bool {
    actor.discord_id == state.admin_user_id
}

pub fn configured_role(guild: &guild::Model, slot: RoleSlot) -> Option<&String> {
    match slot {
        RoleSlot::Councillor => guild.councillor_role_id.as_ref(),
        RoleSlot::Chancellor => guild.chancellor_role_id.as_ref(),
        RoleSlot::Minister => guild.minister_role_id.as_ref(),
        RoleSlot::President => guild.president_role_id.as_ref(),
        RoleSlot::VicePresident => guild.vice_president_role_id.as_ref(),
        RoleSlot::Judiciary => guild.judiciary_role_id.as_ref(),
        RoleSlot::Citizen => guild.citizen_role_id.as_ref(),
    }
}

/// True when the slot is configured and the caller carries that Discord
/// role. An unconfigured slot never matches.
pub fn holds_role(guild: &guild::Model, actor: &ActorContext, slot: RoleSlot) -> bool {
    assert!(
        actor.role_ids.len() <= 512,
        "Actor role list exceeds defensive bound"
    );
    match configured_role(guild, slot) {
        Some(role_id) => actor.role_ids.iter().any(|held| held == role_id),
        None => false,
    }
}

/// Bot admin or Discord administrator permission.
pub fn require_admin(state: &AppState, actor: &ActorContext) -> Result<(), OpError> {
    if is_bot_admin(state, actor) || actor.is_guild_admin {
        return Ok(());
    }
    Err(OpError::NotAuthorized(
        "You must be an admin to perform this action".to_string(),
    ))
}

pub fn require_councillor(
    state: &AppState,
    guild: &guild::Model,
    actor: &ActorContext,
) -> Result<(), OpError> {
    if is_bot_admin(state, actor) || holds_role(guild, actor, RoleSlot::Councillor) {
        return Ok(());
    }
    Err(OpError::NotAuthorized(
        "You must be a Councillor to perform this action".to_string(),
    ))
}

pub fn require_chancellor(
    state: &AppState,
    guild: &guild::Model,
    actor: &ActorContext,
) -> Result<(), OpError> {
    if is_bot_admin(state, actor) || holds_role(guild, actor, RoleSlot::Chancellor) {
        return Ok(());
    }
    Err(OpError::NotAuthorized(
        "You must be the Chancellor to perform this action".to_string(),
    ))
}

/// President or vice president.
pub fn require_president(
    state: &AppState,
    guild: &guild::Model,
    actor: &ActorContext,
) -> Result<(), OpError> {
    if is_bot_admin(state, actor)
        || holds_role(guild, actor, RoleSlot::President)
        || holds_role(guild, actor, RoleSlot::VicePresident)
    {
        return Ok(());
    }
    Err(OpError::NotAuthorized(
        "You must be a President or Vice President to perform this action".to_string(),
    ))
}

/// Veto power is shared by the executive offices.
pub fn require_veto_power(
    state: &AppState,
    guild: &guild::Model,
    actor: &ActorContext,
) -> Result<(), OpError> {
    if is_bot_admin(state, actor)
        || holds_role(guild, actor, RoleSlot::President)
        || holds_role(guild, actor, RoleSlot::VicePresident)
        || holds_role(guild, actor, RoleSlot::Chancellor)
    {
        return Ok(());
    }
    Err(OpError::NotAuthorized(
        "Only the President, Vice President or Chancellor may veto".to_string(),
    ))
}

/// Election eligibility: minimum membership age, plus the citizen role
/// when one is configured.
pub fn check_eligibility(
    guild: &guild::Model,
    actor: &ActorContext,
    now: DateTime<Utc>,
) -> Result<(), OpError> {
    let days_requirement = i64::from(guild.days_requirement);
    assert!(days_requirement >= 0, "Days requirement cannot be negative");

    let Some(joined_at) = actor.joined_at else {
        return Err(OpError::NotAuthorized(
            "Your guild join date could not be determined".to_string(),
        ));
    };

    let days_in_server = now.signed_duration_since(joined_at).num_days();
    if days_in_server < days_requirement {
        return Err(OpError::NotAuthorized(format!(
            "You must be a member for at least {days_requirement} days. \
             You have been here for {} days",
            days_in_server.max(0)
        )));
    }

    if let Some(citizen_role) = guild.citizen_role_id.as_ref() {
        if !actor.role_ids.iter().any(|held| held == citizen_role) {
            return Err(OpError::NotAuthorized(
                "You must hold the citizen role to participate".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::fixed_now;
    use chrono::Duration;

    fn guild_fixture() -> guild::Model {
        guild::Model {
            guild_id: "9000".to_string(),
            name: "Test Guild".to_string(),
            description: None,
            enabled: true,
            logging_enabled: true,
            councillor_role_id: Some("111".to_string()),
            chancellor_role_id: None,
            minister_role_id: None,
            president_role_id: Some("222".to_string()),
            vice_president_role_id: None,
            judiciary_role_id: None,
            citizen_role_id: Some("333".to_string()),
            voting_channel_id: None,
            announcement_channel_id: None,
            days_requirement: 180,
            max_councillors: 9,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    fn actor(roles: &[&str], joined_days_ago: i64) -> ActorContext {
        ActorContext {
            discord_id: "42".to_string(),
            display_name: "tester".to_string(),
            role_ids: roles.iter().map(|role| role.to_string()).collect(),
            is_guild_admin: false,
            joined_at: Some(Utc::now() - Duration::days(joined_days_ago)),
        }
    }

    #[test]
    fn unconfigured_slot_never_matches() {
        let guild = guild_fixture();
        let actor = actor(&["444"], 365);
        assert!(!holds_role(&guild, &actor, RoleSlot::Chancellor));
        assert!(!holds_role(&guild, &actor, RoleSlot::Councillor));
    }

    #[test]
    fn configured_slot_matches_held_role() {
        let guild = guild_fixture();
        let actor = actor(&["111", "333"], 365);
        assert!(holds_role(&guild, &actor, RoleSlot::Councillor));
        assert!(!holds_role(&guild, &actor, RoleSlot::President));
    }

    #[test]
    fn eligibility_enforces_membership_age() {
        let guild = guild_fixture();
        let now = Utc::now();

        let too_new = actor(&["333"], 10);
        assert!(matches!(
            check_eligibility(&guild, &too_new, now),
            Err(OpError::NotAuthorized(_))
        ));

        let old_enough = actor(&["333"], 200);
        assert!(check_eligibility(&guild, &old_enough, now).is_ok());
    }

    #[test]
    fn eligibility_requires_citizen_role_when_configured() {
        let guild = guild_fixture();
        let now = Utc::now();

        let no_citizen_role = actor(&["111"], 365);
        assert!(check_eligibility(&guild, &no_citizen_role, now).is_err());

        let mut open_guild = guild_fixture();
        open_guild.citizen_role_id = None;
        assert!(check_eligibility(&open_guild, &no_citizen_role, now).is_ok());
    }

    #[test]
    fn unknown_join_date_is_rejected() {
        let guild = guild_fixture();
        let mut unknown = actor(&["333"], 365);
        unknown.joined_at = None;
        assert!(check_eligibility(&guild, &unknown, Utc::now()).is_err());
    }
}
