use super::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Member,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Owner => "OWNER",
            Role::Member => "MEMBER",
        };
        write!(f, "{}", s)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupMember {
    pub user: User,
    pub role: Role,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub joined_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    /// Kept in the order members joined; balance listings follow it.
    pub members: Vec<GroupMember>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

impl Group {
    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user.id == user_id)
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m.user.id == user_id && m.is_owner())
    }

    pub fn roster(&self) -> Vec<User> {
        self.members.iter().map(|m| m.user.clone()).collect()
    }
}
