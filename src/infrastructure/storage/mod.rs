use crate::core::errors::DivvyError;
use crate::core::models::{
    audit::GroupAudit,
    expense::Expense,
    group::{Group, GroupMember},
    payment::Payment,
    user::User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Per-user sums for one group, keyed by user id.
pub type UserSums = HashMap<String, Decimal>;

/// The four ledger aggregates of a group, read from a single snapshot.
#[derive(Clone, Debug, Default)]
pub struct LedgerSums {
    pub paid: UserSums,
    pub owed: UserSums,
    pub sent: UserSums,
    pub received: UserSums,
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Returns `None` when the email is already taken.
    async fn create_user_if_not_exists(&self, user: User) -> Result<Option<User>, DivvyError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DivvyError>;
    async fn save_group(&self, group: Group) -> Result<(), DivvyError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DivvyError>;
    /// Appends `member` to the roster unless already present, as one atomic update.
    async fn add_group_member(&self, group_id: &str, member: GroupMember) -> Result<Group, DivvyError>;
    async fn save_expense(&self, expense: Expense) -> Result<(), DivvyError>;
    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, DivvyError>;
    /// Marks a live expense of `group_id` deleted. Fails if it is already deleted.
    async fn soft_delete_expense(
        &self,
        group_id: &str,
        expense_id: &str,
        deleted_at: DateTime<Utc>,
    ) -> Result<Expense, DivvyError>;
    /// Live (not deleted) expenses, oldest first.
    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, DivvyError>;
    async fn save_payment(&self, payment: Payment) -> Result<(), DivvyError>;
    /// Oldest first.
    async fn get_group_payments(&self, group_id: &str) -> Result<Vec<Payment>, DivvyError>;
    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), DivvyError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, DivvyError>;

    /// Paid, owed, sent and received totals over live expenses and all payments.
    async fn ledger_sums(&self, group_id: &str) -> Result<LedgerSums, DivvyError>;
}

pub mod in_memory;
