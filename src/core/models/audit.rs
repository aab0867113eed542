use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppLog {
    pub id: String,
    pub action: String,
    pub user_id: Option<String>,
    #[schema(value_type = Object)]
    pub details: HashMap<String, serde_json::Value>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupAudit {
    pub id: String,
    pub group_id: String,
    pub action: String,
    pub user_id: Option<String>,
    #[schema(value_type = Object)]
    pub details: HashMap<String, serde_json::Value>,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub timestamp: DateTime<Utc>,
}
