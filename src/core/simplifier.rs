//! Greedy debt netting: matches the largest creditor with the largest debtor
//! until one side runs out.

use crate::core::money::{is_settled, round_money};
use rust_decimal::Decimal;
use serde::Serialize;

/// Advisory transfer: `from` should pay `amount` to `to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SettlementSuggestion {
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

struct Position<'a> {
    user_id: &'a str,
    balance: Decimal,
}

/// Produces settlement suggestions for a set of signed balances.
///
/// Creditors are visited largest first and debtors most negative first, with
/// ties broken by user id so the output is stable for identical input. Any
/// residue left when one side is exhausted (balances that do not net to zero)
/// is dropped without a suggestion.
pub fn simplify_debts<'a, I>(balances: I) -> Vec<SettlementSuggestion>
where
    I: IntoIterator<Item = (&'a str, Decimal)>,
{
    let mut creditors = Vec::new();
    let mut debtors = Vec::new();
    for (user_id, balance) in balances {
        if balance > Decimal::ZERO {
            creditors.push(Position { user_id, balance });
        } else if balance < Decimal::ZERO {
            debtors.push(Position { user_id, balance });
        }
    }

    creditors.sort_by(|a, b| b.balance.cmp(&a.balance).then_with(|| a.user_id.cmp(b.user_id)));
    debtors.sort_by(|a, b| a.balance.cmp(&b.balance).then_with(|| a.user_id.cmp(b.user_id)));

    let mut suggestions = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < creditors.len() && j < debtors.len() {
        let credit_amt = round_money(creditors[i].balance);
        let debt_amt = round_money(debtors[j].balance.abs());
        let transfer = credit_amt.min(debt_amt);

        if transfer > Decimal::ZERO {
            suggestions.push(SettlementSuggestion {
                from: debtors[j].user_id.to_string(),
                to: creditors[i].user_id.to_string(),
                amount: transfer,
            });
        }

        creditors[i].balance -= transfer;
        debtors[j].balance += transfer;

        if is_settled(creditors[i].balance) {
            i += 1;
        }
        if is_settled(debtors[j].balance) {
            j += 1;
        }
    }

    suggestions
}
