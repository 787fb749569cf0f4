use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage};
use serenity::http::{Http, HttpError};
use serenity::model::guild::Member;
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};

use crate::models::governance::Announcement;

mod sync;

pub use sync::{SyncReport, ensure_member_has_role, ensure_member_lacks_role, reassign_role};

/// Thin wrapper around the Discord REST API. Interaction handling lives in
/// the frontend process; this client only posts announcements and
/// reconciles role membership.
#[derive(Clone)]
pub struct GatewayClient {
    http: Arc<Http>,
}

impl GatewayClient {
    pub fn new(token: &str) -> Result<Self> {
        assert!(!token.is_empty(), "Discord token must be provided");
        assert!(token.len() < 256, "Discord token length exceeds bounds");
        Ok(Self {
            http: Arc::new(Http::new(token)),
        })
    }

    /// Posts an embed to a channel and returns the new message id.
    pub async fn post_announcement(
        &self,
        channel_id: &str,
        content: Option<&str>,
        announcement: &Announcement,
    ) -> Result<String> {
        let channel = ChannelId::new(parse_snowflake(channel_id, "channel id")?);

        assert!(
            !announcement.title.is_empty(),
            "Announcement title cannot be empty"
        );
        assert!(
            announcement.description.len() <= 4096,
            "Announcement body exceeds embed limit"
        );
        assert!(
            announcement.fields.len() <= 25,
            "Announcement field count exceeds embed limit"
        );

        let mut embed = CreateEmbed::new()
            .title(announcement.title.clone())
            .description(announcement.description.clone())
            .colour(announcement.color);
        for (name, value) in &announcement.fields {
            embed = embed.field(name.clone(), value.clone(), false);
        }
        if let Some(footer) = &announcement.footer {
            embed = embed.footer(CreateEmbedFooter::new(footer.clone()));
        }

        let mut message = CreateMessage::new().embed(embed);
        if let Some(text) = content {
            message = message.content(text);
        }

        let sent = channel
            .send_message(&self.http, message)
            .await
            .with_context(|| format!("Failed to post announcement to channel {channel_id}"))?;
        Ok(sent.id.get().to_string())
    }

    /// Fetches a guild member; `None` when the user is no longer a member.
    pub async fn fetch_member(&self, guild_id: &str, user_id: &str) -> Result<Option<Member>> {
        let guild = GuildId::new(parse_snowflake(guild_id, "guild id")?);
        let user = UserId::new(parse_snowflake(user_id, "user id")?);

        match self.http.get_member(guild, user).await {
            Ok(member) => Ok(Some(member)),
            Err(serenity::Error::Http(HttpError::UnsuccessfulRequest(response)))
                if response.status_code.as_u16() == 404 =>
            {
                Ok(None)
            }
            Err(err) => {
                Err(err).with_context(|| format!("Failed to fetch member {user_id} of {guild_id}"))
            }
        }
    }

    pub async fn grant_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
        reason: &str,
    ) -> Result<()> {
        let guild = GuildId::new(parse_snowflake(guild_id, "guild id")?);
        let user = UserId::new(parse_snowflake(user_id, "user id")?);
        let role = RoleId::new(parse_snowflake(role_id, "role id")?);
        assert!(reason.len() <= 512, "Audit reason exceeds Discord limit");

        self.http
            .add_member_role(guild, user, role, Some(reason))
            .await
            .with_context(|| format!("Failed to grant role {role_id} to {user_id}"))
    }

    pub async fn revoke_role(
        &self,
        guild_id: &str,
        user_id: &str,
        role_id: &str,
        reason: &str,
    ) -> Result<()> {
        let guild = GuildId::new(parse_snowflake(guild_id, "guild id")?);
        let user = UserId::new(parse_snowflake(user_id, "user id")?);
        let role = RoleId::new(parse_snowflake(role_id, "role id")?);
        assert!(reason.len() <= 512, "Audit reason exceeds Discord limit");

        self.http
            .remove_member_role(guild, user, role, Some(reason))
            .await
            .with_context(|| format!("Failed to revoke role {role_id} from {user_id}"))
    }
}

fn parse_snowflake(value: &str, label: &str) -> Result<u64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("{label} cannot be empty"));
    }
    assert!(trimmed.len() <= 32, "Snowflake length exceeds bounds");
    let id = trimmed
        .parse::<u64>()
        .map_err(|err| anyhow!("Failed to parse {label} {trimmed}: {err}"))?;
    if id == 0 {
        return Err(anyhow!("{label} cannot be zero"));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snowflake_parsing() {
        assert_eq!(
            parse_snowflake(" 231105080961531905 ", "user id").unwrap(),
            231105080961531905
        );
        assert!(parse_snowflake("", "user id").is_err());
        assert!(parse_snowflake("0", "user id").is_err());
        assert!(parse_snowflake("not-a-number", "user id").is_err());
    }
}
