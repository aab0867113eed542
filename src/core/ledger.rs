//! Balance aggregation: folds the four per-member ledger sums of a group into
//! one signed balance per member.

use crate::core::models::user::User;
use crate::core::money::round_money;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

/// Raw accumulations for one member of one group. All four are non-negative.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LedgerContribution {
    pub user_id: String,
    /// Expenses this member paid for.
    pub paid: Decimal,
    /// Expense shares allocated to this member.
    pub owed: Decimal,
    /// Settlement payments this member sent.
    pub sent: Decimal,
    /// Settlement payments this member received.
    pub received: Decimal,
}

impl LedgerContribution {
    /// Positive: the group owes this member. Negative: this member owes the group.
    pub fn balance(&self) -> Decimal {
        round_money((self.paid + self.sent) - (self.received + self.owed))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("negative {category} sum {amount} for user {user_id}")]
pub struct NegativeSum {
    pub category: &'static str,
    pub user_id: String,
    pub amount: Decimal,
}

/// The four aggregate mappings for a group, keyed by user id.
#[derive(Clone, Debug, Default)]
pub struct LedgerTotals {
    paid_by_user: HashMap<String, Decimal>,
    owed_by_user: HashMap<String, Decimal>,
    sent_by_user: HashMap<String, Decimal>,
    received_by_user: HashMap<String, Decimal>,
}

impl LedgerTotals {
    pub fn new(
        paid_by_user: HashMap<String, Decimal>,
        owed_by_user: HashMap<String, Decimal>,
        sent_by_user: HashMap<String, Decimal>,
        received_by_user: HashMap<String, Decimal>,
    ) -> Result<Self, NegativeSum> {
        check_non_negative("paid", &paid_by_user)?;
        check_non_negative("owed", &owed_by_user)?;
        check_non_negative("sent", &sent_by_user)?;
        check_non_negative("received", &received_by_user)?;
        Ok(LedgerTotals {
            paid_by_user,
            owed_by_user,
            sent_by_user,
            received_by_user,
        })
    }

    pub fn contribution(&self, user_id: &str) -> LedgerContribution {
        let lookup = |sums: &HashMap<String, Decimal>| sums.get(user_id).copied().unwrap_or(Decimal::ZERO);
        LedgerContribution {
            user_id: user_id.to_string(),
            paid: lookup(&self.paid_by_user),
            owed: lookup(&self.owed_by_user),
            sent: lookup(&self.sent_by_user),
            received: lookup(&self.received_by_user),
        }
    }
}

fn check_non_negative(category: &'static str, sums: &HashMap<String, Decimal>) -> Result<(), NegativeSum> {
    match sums.iter().find(|(_, amount)| amount.is_sign_negative() && !amount.is_zero()) {
        Some((user_id, amount)) => Err(NegativeSum {
            category,
            user_id: user_id.clone(),
            amount: *amount,
        }),
        None => Ok(()),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemberBalance {
    pub user: User,
    pub contribution: LedgerContribution,
    pub balance: Decimal,
}

/// One entry per roster member, in roster order. Members without any ledger
/// activity get a zero balance.
pub fn aggregate_balances(roster: &[User], totals: &LedgerTotals) -> Vec<MemberBalance> {
    roster
        .iter()
        .map(|user| {
            let contribution = totals.contribution(&user.id);
            MemberBalance {
                balance: contribution.balance(),
                user: user.clone(),
                contribution,
            }
        })
        .collect()
}
