use crate::core::errors::DivvyError;
use crate::core::models::{
    audit::GroupAudit,
    expense::Expense,
    group::{Group, GroupMember},
    payment::Payment,
    user::User,
};
use crate::infrastructure::storage::{LedgerSums, Storage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    users_by_email: Arc<RwLock<HashMap<String, String>>>,
    groups: Arc<RwLock<HashMap<String, Group>>>,
    expenses: Arc<RwLock<Vec<Expense>>>,
    payments: Arc<RwLock<Vec<Payment>>>,
    group_audits: Arc<RwLock<HashMap<String, Vec<GroupAudit>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user_if_not_exists(&self, user: User) -> Result<Option<User>, DivvyError> {
        let mut users_by_email = self.users_by_email.write().await;
        let email_key = user.email.to_lowercase();
        if users_by_email.contains_key(&email_key) {
            return Ok(None);
        }
        users_by_email.insert(email_key, user.id.clone());
        let mut users = self.users.write().await;
        users.insert(user.id.clone(), user.clone());
        Ok(Some(user))
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DivvyError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn save_group(&self, group: Group) -> Result<(), DivvyError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DivvyError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn add_group_member(&self, group_id: &str, member: GroupMember) -> Result<Group, DivvyError> {
        let mut groups = self.groups.write().await;
        let group = groups
            .get_mut(group_id)
            .ok_or_else(|| DivvyError::GroupNotFound(group_id.to_string()))?;
        if group.is_member(&member.user.id) {
            return Err(DivvyError::AlreadyGroupMember(member.user.id));
        }
        group.members.push(member);
        Ok(group.clone())
    }

    async fn save_expense(&self, expense: Expense) -> Result<(), DivvyError> {
        let mut expenses = self.expenses.write().await;
        match expenses.iter_mut().find(|e| e.id == expense.id) {
            Some(existing) => *existing = expense,
            None => expenses.push(expense),
        }
        Ok(())
    }

    async fn get_expense(&self, expense_id: &str) -> Result<Option<Expense>, DivvyError> {
        let expenses = self.expenses.read().await;
        Ok(expenses.iter().find(|e| e.id == expense_id).cloned())
    }

    async fn soft_delete_expense(
        &self,
        group_id: &str,
        expense_id: &str,
        deleted_at: DateTime<Utc>,
    ) -> Result<Expense, DivvyError> {
        let mut expenses = self.expenses.write().await;
        let expense = expenses
            .iter_mut()
            .find(|e| e.id == expense_id && e.group_id == group_id)
            .ok_or_else(|| DivvyError::ExpenseNotFound(expense_id.to_string()))?;
        if expense.is_deleted() {
            return Err(DivvyError::ExpenseAlreadyDeleted(expense_id.to_string()));
        }
        expense.deleted_at = Some(deleted_at);
        Ok(expense.clone())
    }

    async fn get_group_expenses(&self, group_id: &str) -> Result<Vec<Expense>, DivvyError> {
        let expenses = self.expenses.read().await;
        Ok(expenses
            .iter()
            .filter(|e| e.group_id == group_id && !e.is_deleted())
            .cloned()
            .collect())
    }

    async fn save_payment(&self, payment: Payment) -> Result<(), DivvyError> {
        let mut payments = self.payments.write().await;
        payments.push(payment);
        Ok(())
    }

    async fn get_group_payments(&self, group_id: &str) -> Result<Vec<Payment>, DivvyError> {
        let payments = self.payments.read().await;
        Ok(payments.iter().filter(|p| p.group_id == group_id).cloned().collect())
    }

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), DivvyError> {
        let mut group_audits = self.group_audits.write().await;
        group_audits.entry(audit.group_id.clone()).or_default().push(audit);
        Ok(())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, DivvyError> {
        let group_audits = self.group_audits.read().await;
        Ok(group_audits.get(group_id).cloned().unwrap_or_default())
    }

    async fn ledger_sums(&self, group_id: &str) -> Result<LedgerSums, DivvyError> {
        // Both guards are held together so a concurrent write can't land between the sums.
        let expenses = self.expenses.read().await;
        let payments = self.payments.read().await;

        let mut sums = LedgerSums::default();
        for expense in expenses.iter().filter(|e| e.group_id == group_id && !e.is_deleted()) {
            *sums.paid.entry(expense.paid_by.clone()).or_default() += expense.amount;
            for share in &expense.shares {
                *sums.owed.entry(share.user_id.clone()).or_default() += share.amount;
            }
        }
        for payment in payments.iter().filter(|p| p.group_id == group_id) {
            *sums.sent.entry(payment.from_user_id.clone()).or_default() += payment.amount;
            *sums.received.entry(payment.to_user_id.clone()).or_default() += payment.amount;
        }
        Ok(sums)
    }
}
