use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Settlement payment actually made between two members.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub group_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub amount: Decimal,
    pub note: Option<String>,
    pub created_by: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}
