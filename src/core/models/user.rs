use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        match (self.first_name.trim(), self.last_name.trim()) {
            (first, "") => first.to_string(),
            ("", last) => last.to_string(),
            (first, last) => format!("{} {}", first, last),
        }
    }
}

/// Fields supplied when registering a user; the id and timestamp are assigned by the service.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}
