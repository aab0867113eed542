use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseShare {
    pub user_id: String,
    pub amount: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub amount: Decimal,
    pub paid_by: String,
    pub shares: Vec<ExpenseShare>,
    pub created_by: String,
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Expense {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// How an expense is divided among members.
#[derive(Clone, Debug)]
pub enum SplitType {
    /// Evenly across the listed users (all members when empty).
    Equal(Vec<String>),
    /// Explicit amount per user.
    Custom(Vec<ExpenseShare>),
}
