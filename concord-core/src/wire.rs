//! Wire payloads whose shape differs from the cached Record.
//!
//! Some remote responses omit the owning guild id or embed a related entity.
//! These payloads are decoded as-is and then split or completed into Records.

use crate::{BanData, MemberData, Optional, RoleData, Snowflake, Timestamp, UserData};
use serde::{Deserialize, Serialize};

/// Guild member as returned by the member routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMemberPayload {
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub user: Optional<UserData>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub roles: Vec<Snowflake>,
    pub joined_at: Timestamp,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub premium_since: Optional<Timestamp>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default, skip_serializing_if = "Optional::is_missing")]
    pub pending: Optional<bool>,
}

impl GuildMemberPayload {
    /// Id of the embedded user, when the payload carries one.
    pub fn user_id(&self) -> Option<Snowflake> {
        self.user.value().map(|u| u.id)
    }

    /// Split into the membership Record and, when embedded, the user Record.
    pub fn into_records(self, guild_id: Snowflake, user_id: Snowflake) -> (MemberData, Option<UserData>) {
        let member = MemberData {
            guild_id,
            user_id,
            nick: self.nick,
            roles: self.roles,
            joined_at: self.joined_at,
            premium_since: self.premium_since,
            deaf: self.deaf,
            mute: self.mute,
            pending: self.pending,
        };
        (member, self.user.into_option())
    }
}

/// Role as returned by the role routes, without its guild id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePayload {
    pub id: Snowflake,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub position: i32,
    pub permissions: String,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

impl RolePayload {
    pub fn into_record(self, guild_id: Snowflake) -> RoleData {
        RoleData {
            id: self.id,
            guild_id,
            name: self.name,
            color: self.color,
            hoist: self.hoist,
            position: self.position,
            permissions: self.permissions,
            managed: self.managed,
            mentionable: self.mentionable,
        }
    }
}

/// Ban as returned by the ban routes: a reason plus the banned user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BanPayload {
    pub reason: Option<String>,
    pub user: UserData,
}

impl BanPayload {
    pub fn into_records(self, guild_id: Snowflake) -> (BanData, UserData) {
        let ban = BanData {
            guild_id,
            user_id: self.user.id,
            reason: self.reason,
        };
        (ban, self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_payload_splits_user() {
        let json = r#"{
            "user": {"id":"8","username":"ferris","discriminator":"0001","avatar":null},
            "nick": "crab",
            "roles": ["3","4"],
            "joined_at": "2020-05-01T00:00:00Z",
            "deaf": false,
            "mute": true
        }"#;
        let payload: GuildMemberPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.user_id(), Some(Snowflake::new(8)));

        let (member, user) = payload.into_records(Snowflake::new(1), Snowflake::new(8));
        assert_eq!(member.guild_id, Snowflake::new(1));
        assert_eq!(member.nick.as_deref(), Some("crab"));
        assert!(member.mute);
        assert_eq!(user.map(|u| u.username), Some("ferris".to_string()));
    }

    #[test]
    fn test_role_payload_gets_guild_id() {
        let json = r#"{"id":"5","name":"mods","permissions":"8"}"#;
        let role = serde_json::from_str::<RolePayload>(json)
            .unwrap()
            .into_record(Snowflake::new(2));
        assert_eq!(role.guild_id, Snowflake::new(2));
        assert_eq!(role.position, 0);
    }

    #[test]
    fn test_ban_payload_keys_by_user() {
        let json = r#"{"reason":null,"user":{"id":"12","username":"x","discriminator":"0002","avatar":null}}"#;
        let (ban, user) = serde_json::from_str::<BanPayload>(json)
            .unwrap()
            .into_records(Snowflake::new(9));
        assert_eq!(ban.user_id, user.id);
        assert_eq!(ban.guild_id, Snowflake::new(9));
        assert_eq!(ban.reason, None);
    }
}
