use crate::constants::{
    EXPENSE_ADDED, EXPENSE_DELETED, GROUP_CREATED, MAX_AMOUNT, MAX_DESCRIPTION_LENGTH, MAX_NAME_LENGTH,
    MAX_NOTE_LENGTH, MEMBER_ADDED, MONEY_SCALE, PAYMENT_RECORDED, USER_ADDED,
};
use crate::core::errors::{DivvyError, FieldError};
use crate::core::ledger::{LedgerTotals, MemberBalance, aggregate_balances};
use crate::core::models::{
    audit::{AppLog, GroupAudit},
    expense::{Expense, ExpenseShare, SplitType},
    group::{Group, GroupMember, Role},
    payment::Payment,
    user::{NewUser, User},
};
use crate::core::simplifier::simplify_debts;
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct SuggestionParty {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PaymentSuggestion {
    pub from: SuggestionParty,
    pub to: SuggestionParty,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseHighlight {
    pub id: String,
    pub description: String,
    pub amount: Decimal,
    pub paid_by: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group_id: String,
    pub group_name: String,
    pub member_count: usize,
    pub expense_count: usize,
    pub total_spent: Decimal,
    pub payment_count: usize,
    pub total_settled: Decimal,
    /// Sum of all positive balances: what is still waiting to be paid back.
    pub outstanding: Decimal,
    pub largest_expense: Option<ExpenseHighlight>,
}

pub struct DivvyService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
}

impl<L: LoggingService, S: Storage> DivvyService<L, S> {
    pub fn new(storage: S, logging: L) -> Self {
        DivvyService { storage, logging }
    }

    async fn require_group(&self, group_id: &str) -> Result<Group, DivvyError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| DivvyError::GroupNotFound(group_id.to_string()))
    }

    async fn validate_group_and_owner(&self, group_id: &str, owner_id: &str) -> Result<Group, DivvyError> {
        let group = self.require_group(group_id).await?;
        if !group.is_owner(owner_id) {
            warn!("User {} is not the owner of group {}", owner_id, group_id);
            return Err(DivvyError::NotGroupOwner(owner_id.to_string()));
        }
        Ok(group)
    }

    async fn validate_group_membership(&self, group_id: &str, user_id: &str) -> Result<Group, DivvyError> {
        let group = self.require_group(group_id).await?;
        if !group.is_member(user_id) {
            warn!("User {} is not a member of group {}", user_id, group_id);
            return Err(DivvyError::NotGroupMember(user_id.to_string()));
        }
        Ok(group)
    }

    async fn log_and_audit(
        &self,
        group_id: Option<&str>,
        action: &str,
        log_details: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), DivvyError> {
        self.logging.log_action(action, log_details.clone(), user_id).await?;
        if let Some(gid) = group_id {
            self.storage
                .save_group_audit(GroupAudit {
                    id: Uuid::new_v4().to_string(),
                    group_id: gid.to_string(),
                    action: action.to_string(),
                    user_id: user_id.map(String::from),
                    details: serde_json::from_value(log_details)
                        .map_err(|e| DivvyError::LoggingError(format!("Failed to serialize audit details: {}", e)))?,
                    timestamp: Utc::now(),
                })
                .await?;
        }
        Ok(())
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), DivvyError> {
        if value.trim().is_empty() {
            return Err(DivvyError::InvalidInput(
                field.to_string(),
                FieldError::new(field, format!("Invalid {}", field), format!("{} cannot be empty", field)),
            ));
        }
        self.validate_optional_string_input(field, value, max_length)
    }

    fn validate_optional_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), DivvyError> {
        if value.len() > max_length {
            return Err(DivvyError::InvalidInput(
                field.to_string(),
                FieldError::new(
                    field,
                    format!("{} Too Long", field),
                    format!("{} cannot exceed {} characters", field, max_length),
                ),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(DivvyError::InvalidInput(
                field.to_string(),
                FieldError::new(
                    field,
                    format!("Invalid {}", field),
                    format!("{} contains invalid characters", field),
                ),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: Decimal) -> Result<(), DivvyError> {
        if amount <= Decimal::ZERO {
            return Err(DivvyError::InvalidInput(
                field.to_string(),
                FieldError::new(field, "Invalid Amount", "Amount must be greater than 0"),
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(DivvyError::InvalidInput(
                field.to_string(),
                FieldError::new(field, "Amount Too Large", "Amount cannot exceed 1,000,000"),
            ));
        }
        self.validate_precision(field, amount)
    }

    fn validate_precision(&self, field: &str, amount: Decimal) -> Result<(), DivvyError> {
        if amount.normalize().scale() > MONEY_SCALE {
            return Err(DivvyError::InvalidInput(
                field.to_string(),
                FieldError::new(field, "Invalid Amount", "Amount cannot have more than 2 decimal places"),
            ));
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), DivvyError> {
        if email.is_empty() {
            return Err(DivvyError::MissingEmail);
        }
        if !email.contains('@') || !email.contains('.') || email.len() < 5 {
            return Err(DivvyError::InvalidEmail(email.to_string()));
        }
        Ok(())
    }

    // USERS

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, DivvyError> {
        self.storage.get_user(user_id).await
    }

    pub async fn add_user(&self, new_user: NewUser) -> Result<User, DivvyError> {
        let email = new_user.email.trim().to_string();
        self.validate_email(&email)?;
        self.validate_string_input("firstName", &new_user.first_name, MAX_NAME_LENGTH)?;
        self.validate_optional_string_input("lastName", &new_user.last_name, MAX_NAME_LENGTH)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            email,
            avatar_url: new_user.avatar_url.filter(|url| !url.trim().is_empty()),
            created_at: Utc::now(),
        };

        let created = self
            .storage
            .create_user_if_not_exists(user.clone())
            .await?
            .ok_or_else(|| DivvyError::EmailAlreadyRegistered(user.email.clone()))?;
        info!("Registered user {}", created.id);

        self.log_and_audit(
            None,
            USER_ADDED,
            json!({ "user_id": created.id, "email": created.email }),
            Some(created.id.as_str()),
        )
        .await?;
        Ok(created)
    }

    // GROUPS

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DivvyError> {
        self.storage.get_group(group_id).await
    }

    pub async fn create_group(&self, name: String, members: Vec<User>, created_by: &User) -> Result<Group, DivvyError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;

        let now = Utc::now();
        let mut group_members = vec![GroupMember {
            user: created_by.clone(),
            role: Role::Owner,
            joined_at: now,
        }];
        for user in members {
            if group_members.iter().any(|m| m.user.id == user.id) {
                continue;
            }
            group_members.push(GroupMember {
                user,
                role: Role::Member,
                joined_at: now,
            });
        }

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            members: group_members,
            created_at: now,
        };
        self.storage.save_group(group.clone()).await?;
        info!("Created group {} with {} members", group.id, group.members.len());

        self.log_and_audit(
            Some(&group.id),
            GROUP_CREATED,
            json!({
                "group_id": group.id,
                "name": group.name,
                "member_ids": group.members.iter().map(|m| m.user.id.clone()).collect::<Vec<_>>()
            }),
            Some(created_by.id.as_str()),
        )
        .await?;
        Ok(group)
    }

    pub async fn add_member_to_group(&self, group_id: &str, user: User, added_by: &User) -> Result<Group, DivvyError> {
        self.validate_group_and_owner(group_id, &added_by.id).await?;

        let user_id = user.id.clone();
        let member = GroupMember {
            user,
            role: Role::Member,
            joined_at: Utc::now(),
        };
        let group = self.storage.add_group_member(group_id, member).await?;
        debug!("User {} joined group {}", user_id, group_id);

        self.log_and_audit(
            Some(group_id),
            MEMBER_ADDED,
            json!({ "group_id": group_id, "user_id": user_id }),
            Some(added_by.id.as_str()),
        )
        .await?;
        Ok(group)
    }

    // EXPENSES

    pub async fn add_expense(
        &self,
        group_id: &str,
        description: String,
        amount: Decimal,
        paid_by: &User,
        split: SplitType,
        created_by: &User,
    ) -> Result<Expense, DivvyError> {
        let group = self.validate_group_membership(group_id, &created_by.id).await?;
        if !group.is_member(&paid_by.id) {
            return Err(DivvyError::NotGroupMember(paid_by.id.clone()));
        }
        self.validate_string_input("description", &description, MAX_DESCRIPTION_LENGTH)?;
        self.validate_amount_input("amount", amount)?;

        let shares = match split {
            SplitType::Equal(user_ids) => self.equal_shares(&group, amount, user_ids)?,
            SplitType::Custom(shares) => self.custom_shares(&group, amount, shares)?,
        };

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            description: description.trim().to_string(),
            amount,
            paid_by: paid_by.id.clone(),
            shares,
            created_by: created_by.id.clone(),
            created_at: Utc::now(),
            deleted_at: None,
        };
        self.storage.save_expense(expense.clone()).await?;
        info!("Added expense {} of {} to group {}", expense.id, amount, group_id);

        self.log_and_audit(
            Some(group_id),
            EXPENSE_ADDED,
            json!({
                "expense_id": expense.id,
                "group_id": group_id,
                "description": expense.description,
                "amount": expense.amount,
                "paid_by_id": expense.paid_by
            }),
            Some(created_by.id.as_str()),
        )
        .await?;
        Ok(expense)
    }

    /// Splits `amount` evenly, handing leftover cents one at a time to the
    /// first users in the list so the shares add up exactly.
    fn equal_shares(&self, group: &Group, amount: Decimal, user_ids: Vec<String>) -> Result<Vec<ExpenseShare>, DivvyError> {
        let mut participants: Vec<String> = Vec::new();
        let requested = if user_ids.is_empty() {
            group.members.iter().map(|m| m.user.id.clone()).collect()
        } else {
            user_ids
        };
        for user_id in requested {
            if !group.is_member(&user_id) {
                return Err(DivvyError::InvalidSplitUser(user_id));
            }
            if !participants.contains(&user_id) {
                participants.push(user_id);
            }
        }

        let count = Decimal::from(participants.len());
        let base = (amount / count).round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::ToZero);
        let cent = Decimal::new(1, MONEY_SCALE);
        let mut remainder = amount - base * count;

        Ok(participants
            .into_iter()
            .map(|user_id| {
                let mut share = base;
                if remainder >= cent {
                    share += cent;
                    remainder -= cent;
                }
                ExpenseShare { user_id, amount: share }
            })
            .collect())
    }

    fn custom_shares(&self, group: &Group, amount: Decimal, shares: Vec<ExpenseShare>) -> Result<Vec<ExpenseShare>, DivvyError> {
        for share in &shares {
            if !group.is_member(&share.user_id) {
                return Err(DivvyError::InvalidSplitUser(share.user_id.clone()));
            }
            if share.amount < Decimal::ZERO {
                return Err(DivvyError::InvalidInput(
                    "shares".to_string(),
                    FieldError::new("shares", "Invalid Share", "Share amounts cannot be negative"),
                ));
            }
            self.validate_precision("shares", share.amount)?;
        }

        let share_sum: Decimal = shares.iter().map(|s| s.amount).sum();
        if share_sum != amount {
            warn!("Custom shares sum {} does not match amount {}", share_sum, amount);
            return Err(DivvyError::InvalidSplit);
        }

        // Membership order, so stored shares don't depend on request map order.
        let mut ordered: Vec<ExpenseShare> = Vec::with_capacity(shares.len());
        for member in &group.members {
            let total: Decimal = shares
                .iter()
                .filter(|s| s.user_id == member.user.id)
                .map(|s| s.amount)
                .sum();
            if !total.is_zero() {
                ordered.push(ExpenseShare {
                    user_id: member.user.id.clone(),
                    amount: total,
                });
            }
        }
        Ok(ordered)
    }

    pub async fn list_expenses(&self, group_id: &str, queried_by: &User) -> Result<Vec<Expense>, DivvyError> {
        self.validate_group_membership(group_id, &queried_by.id).await?;
        self.storage.get_group_expenses(group_id).await
    }

    pub async fn delete_expense(&self, group_id: &str, expense_id: &str, deleted_by: &User) -> Result<Expense, DivvyError> {
        let group = self.validate_group_membership(group_id, &deleted_by.id).await?;
        let expense = self
            .storage
            .get_expense(expense_id)
            .await?
            .filter(|e| e.group_id == group_id)
            .ok_or_else(|| DivvyError::ExpenseNotFound(expense_id.to_string()))?;

        if expense.is_deleted() {
            return Err(DivvyError::ExpenseAlreadyDeleted(expense_id.to_string()));
        }
        let allowed = expense.paid_by == deleted_by.id || expense.created_by == deleted_by.id || group.is_owner(&deleted_by.id);
        if !allowed {
            warn!("User {} not permitted to delete expense {}", deleted_by.id, expense_id);
            return Err(DivvyError::ExpenseDeleteForbidden(deleted_by.id.clone()));
        }

        let expense = self.storage.soft_delete_expense(group_id, expense_id, Utc::now()).await?;
        info!("Deleted expense {} from group {}", expense_id, group_id);

        self.log_and_audit(
            Some(group_id),
            EXPENSE_DELETED,
            json!({ "expense_id": expense_id, "group_id": group_id, "amount": expense.amount }),
            Some(deleted_by.id.as_str()),
        )
        .await?;
        Ok(expense)
    }

    // PAYMENTS

    pub async fn record_payment(
        &self,
        group_id: &str,
        from_user: &User,
        to_user: &User,
        amount: Decimal,
        note: Option<String>,
        created_by: &User,
    ) -> Result<Payment, DivvyError> {
        let group = self.validate_group_membership(group_id, &created_by.id).await?;
        if from_user.id == to_user.id {
            return Err(DivvyError::SelfPayment);
        }
        for party in [from_user, to_user] {
            if !group.is_member(&party.id) {
                return Err(DivvyError::NotGroupMember(party.id.clone()));
            }
        }
        self.validate_amount_input("amount", amount)?;
        let note = note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        if let Some(ref n) = note {
            self.validate_optional_string_input("note", n, MAX_NOTE_LENGTH)?;
        }

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            from_user_id: from_user.id.clone(),
            to_user_id: to_user.id.clone(),
            amount,
            note,
            created_by: created_by.id.clone(),
            created_at: Utc::now(),
        };
        self.storage.save_payment(payment.clone()).await?;
        info!(
            "Recorded payment {} of {} from {} to {} in group {}",
            payment.id, amount, from_user.id, to_user.id, group_id
        );

        self.log_and_audit(
            Some(group_id),
            PAYMENT_RECORDED,
            json!({
                "payment_id": payment.id,
                "group_id": group_id,
                "from_user_id": from_user.id,
                "to_user_id": to_user.id,
                "amount": amount
            }),
            Some(created_by.id.as_str()),
        )
        .await?;
        Ok(payment)
    }

    pub async fn list_payments(&self, group_id: &str, queried_by: &User) -> Result<Vec<Payment>, DivvyError> {
        self.validate_group_membership(group_id, &queried_by.id).await?;
        self.storage.get_group_payments(group_id).await
    }

    // BALANCES & STATISTICS

    async fn load_ledger(&self, group_id: &str) -> Result<LedgerTotals, DivvyError> {
        let sums = self.storage.ledger_sums(group_id).await?;
        LedgerTotals::new(sums.paid, sums.owed, sums.sent, sums.received)
            .map_err(|e| DivvyError::CorruptLedger(group_id.to_string(), e.to_string()))
    }

    pub async fn get_group_balances(&self, group_id: &str) -> Result<Vec<MemberBalance>, DivvyError> {
        let group = self.require_group(group_id).await?;
        let totals = self.load_ledger(group_id).await?;
        let balances = aggregate_balances(&group.roster(), &totals);
        debug!("Computed {} balances for group {}", balances.len(), group_id);
        Ok(balances)
    }

    pub async fn get_payment_suggestions(&self, group_id: &str) -> Result<Vec<PaymentSuggestion>, DivvyError> {
        let balances = self.get_group_balances(group_id).await?;
        let suggestions = simplify_debts(balances.iter().map(|b| (b.user.id.as_str(), b.balance)));
        debug!("Suggested {} payments for group {}", suggestions.len(), group_id);

        let names: HashMap<&str, String> = balances
            .iter()
            .map(|b| (b.user.id.as_str(), b.user.display_name()))
            .collect();
        let party = |user_id: &str| {
            names
                .get(user_id)
                .map(|name| SuggestionParty {
                    id: user_id.to_string(),
                    name: name.clone(),
                })
                .ok_or_else(|| DivvyError::InternalServerError(format!("Suggested party {} is not a member", user_id)))
        };
        suggestions
            .into_iter()
            .map(|s| -> Result<PaymentSuggestion, DivvyError> {
                Ok(PaymentSuggestion {
                    from: party(&s.from)?,
                    to: party(&s.to)?,
                    amount: s.amount,
                })
            })
            .collect()
    }

    pub async fn get_group_summary(&self, group_id: &str) -> Result<GroupSummary, DivvyError> {
        let group = self.require_group(group_id).await?;
        let expenses = self.storage.get_group_expenses(group_id).await?;
        let payments = self.storage.get_group_payments(group_id).await?;
        let totals = self.load_ledger(group_id).await?;
        let balances = aggregate_balances(&group.roster(), &totals);

        let largest_expense = expenses
            .iter()
            .max_by(|a, b| a.amount.cmp(&b.amount).then_with(|| b.created_at.cmp(&a.created_at)))
            .map(|e| ExpenseHighlight {
                id: e.id.clone(),
                description: e.description.clone(),
                amount: e.amount,
                paid_by: e.paid_by.clone(),
            });

        Ok(GroupSummary {
            group_id: group.id.clone(),
            group_name: group.name.clone(),
            member_count: group.members.len(),
            expense_count: expenses.len(),
            total_spent: expenses.iter().map(|e| e.amount).sum(),
            payment_count: payments.len(),
            total_settled: payments.iter().map(|p| p.amount).sum(),
            outstanding: balances
                .iter()
                .map(|b| b.balance)
                .filter(|balance| *balance > Decimal::ZERO)
                .sum(),
            largest_expense,
        })
    }

    // AUDIT

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, DivvyError> {
        self.require_group(group_id).await?;
        self.storage.get_group_audits(group_id).await
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, DivvyError> {
        self.logging.get_logs().await
    }
}
