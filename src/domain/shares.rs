use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::{Expense, ExpenseId};

/// Paid/owed totals for one participant. Derived on every query, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoommateShare {
    pub name: String,
    /// Sum of amounts this participant paid
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub paid: Decimal,
    /// Sum of per-person shares attributed to this participant
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub owes: Decimal,
    /// `paid - owes`; positive means the group owes this participant
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub balance: Decimal,
}

impl RoommateShare {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            paid: Decimal::ZERO,
            owes: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }
}

/// Name -> share mapping that remembers the order entries were first created in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shares {
    entries: Vec<RoommateShare>,
    index: HashMap<String, usize>,
}

impl Shares {
    fn entry(&mut self, name: &str) -> &mut RoommateShare {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.entries.push(RoommateShare::new(name));
                self.index.insert(name.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx]
    }

    pub fn get(&self, name: &str) -> Option<&RoommateShare> {
        self.index.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &RoommateShare> {
        self.entries.iter()
    }

    /// Display order: descending by `owes`, ties keep creation order.
    pub fn by_owes_desc(&self) -> Vec<&RoommateShare> {
        let mut rows: Vec<&RoommateShare> = self.entries.iter().collect();
        rows.sort_by(|a, b| b.owes.cmp(&a.owes));
        rows
    }

    pub fn total_paid(&self) -> Decimal {
        self.entries.iter().map(|s| s.paid).sum()
    }

    pub fn total_owes(&self) -> Decimal {
        self.entries.iter().map(|s| s.owes).sum()
    }

    /// Paid amounts nobody owes, left over when an expense was split among
    /// more people than the ledger knows about.
    pub fn unattributed(&self) -> Decimal {
        self.total_paid() - self.total_owes()
    }
}

/// Distinct payers in first-seen order. This is the only roster the ledger has.
pub fn participants(expenses: &[Expense]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for expense in expenses {
        if !names.iter().any(|n| n == &expense.paid_by) {
            names.push(expense.paid_by.clone());
        }
    }
    names
}

/// Attribute every expense to participants and compute balances.
///
/// Each expense is credited to its payer. Its per-person share is then owed by
/// the first `split_among` names of the payer roster, which need not include
/// the payer. When `split_among` exceeds the roster size the attribution set is
/// capped; the remainder shows up in [`Shares::unattributed`].
pub fn compute_shares(expenses: &[Expense]) -> Shares {
    let roster = participants(expenses);
    let mut shares = Shares::default();

    for expense in expenses {
        shares.entry(&expense.paid_by).paid += expense.amount;

        let per_person = expense.amount / Decimal::from(expense.split_among);
        let take = (expense.split_among as usize).min(roster.len());
        if take < expense.split_among as usize {
            debug!(
                expense_id = expense.id,
                split_among = expense.split_among,
                known = roster.len(),
                "attribution capped at known participants"
            );
        }

        for name in &roster[..take] {
            shares.entry(name).owes += per_person;
        }
    }

    for share in shares.entries.iter_mut() {
        share.balance = share.paid - share.owes;
    }

    shares
}

/// Sum of all expense amounts; zero for an empty list.
pub fn total_amount(expenses: &[Expense]) -> Decimal {
    expenses.iter().map(|e| e.amount).sum()
}

/// Width of one expense's bar, as a percentage of the largest amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountBar {
    pub expense_id: ExpenseId,
    pub percent: Decimal,
}

/// Proportional bars for every expense, normalized against the maximum amount.
pub fn amount_bars(expenses: &[Expense]) -> Vec<AmountBar> {
    let max = expenses
        .iter()
        .map(|e| e.amount)
        .max()
        .unwrap_or(Decimal::ZERO);

    expenses
        .iter()
        .map(|e| AmountBar {
            expense_id: e.id,
            percent: if max > Decimal::ZERO {
                e.amount / max * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::domain::NewExpense;

    fn make_expense(id: ExpenseId, amount: Decimal, paid_by: &str, split: i64) -> Expense {
        let input = NewExpense::new("item", amount, paid_by, split).unwrap();
        Expense::new(id, input, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
    }

    #[test]
    fn test_participants_first_seen_order() {
        let expenses = vec![
            make_expense(1, dec!(10), "Mike", 1),
            make_expense(2, dec!(10), "Alex", 1),
            make_expense(3, dec!(10), "Mike", 1),
            make_expense(4, dec!(10), "Sarah", 1),
        ];
        assert_eq!(participants(&expenses), vec!["Mike", "Alex", "Sarah"]);
    }

    #[test]
    fn test_compute_shares_empty() {
        let shares = compute_shares(&[]);
        assert!(shares.is_empty());
        assert_eq!(shares.unattributed(), Decimal::ZERO);
    }

    #[test]
    fn test_compute_shares_single_payer() {
        let expenses = vec![make_expense(1, dec!(90), "Alex", 1)];
        let shares = compute_shares(&expenses);

        let alex = shares.get("Alex").unwrap();
        assert_eq!(alex.paid, dec!(90));
        assert_eq!(alex.owes, dec!(90));
        assert_eq!(alex.balance, Decimal::ZERO);
    }

    #[test]
    fn test_attribution_uses_roster_prefix() {
        // Sarah pays, but the first two roster names are Alex and Mike.
        let expenses = vec![
            make_expense(1, dec!(30), "Alex", 1),
            make_expense(2, dec!(20), "Mike", 1),
            make_expense(3, dec!(80), "Sarah", 2),
        ];
        let shares = compute_shares(&expenses);

        // Alex owes 30 + 20 + 40, Mike owes 40
        assert_eq!(shares.get("Alex").unwrap().owes, dec!(90));
        assert_eq!(shares.get("Mike").unwrap().owes, dec!(40));
        let sarah = shares.get("Sarah").unwrap();
        assert_eq!(sarah.paid, dec!(80));
        assert_eq!(sarah.owes, Decimal::ZERO);
        assert_eq!(sarah.balance, dec!(80));
    }

    #[test]
    fn test_attribution_capped_at_roster() {
        let expenses = vec![
            make_expense(1, dec!(1200), "Alex", 3),
            make_expense(2, dec!(150), "Mike", 2),
        ];
        let shares = compute_shares(&expenses);

        let alex = shares.get("Alex").unwrap();
        assert_eq!(alex.paid, dec!(1200));
        assert_eq!(alex.owes, dec!(475));
        assert_eq!(alex.balance, dec!(725));

        let mike = shares.get("Mike").unwrap();
        assert_eq!(mike.paid, dec!(150));
        assert_eq!(mike.owes, dec!(475));
        assert_eq!(mike.balance, dec!(-325));

        assert_eq!(shares.len(), 2);
        assert_eq!(shares.unattributed(), dec!(400));
    }

    #[test]
    fn test_balances_sum_to_unattributed() {
        let expenses = vec![
            make_expense(1, dec!(100), "A", 1),
            make_expense(2, dec!(100), "B", 2),
            make_expense(3, dec!(99.99), "C", 3),
            make_expense(4, dec!(10), "A", 5),
        ];
        let shares = compute_shares(&expenses);
        let total: Decimal = shares.iter().map(|s| s.balance).sum();

        assert_eq!(total, shares.unattributed());
        assert_eq!(shares.unattributed(), dec!(4));
    }

    #[test]
    fn test_by_owes_desc_is_stable() {
        let expenses = vec![
            make_expense(1, dec!(10), "A", 1),
            make_expense(2, dec!(40), "B", 2),
            make_expense(3, dec!(20), "C", 3),
        ];
        // owes: A = 10 + 20 + 20/3, B = 20 + 20/3, C = 20/3
        let shares = compute_shares(&expenses);
        let order: Vec<&str> = shares.by_owes_desc().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);

        // Y and X both owe 10; Y's entry was created first.
        let tied = vec![make_expense(1, dec!(10), "Y", 2), make_expense(2, dec!(10), "X", 2)];
        let shares = compute_shares(&tied);
        let order: Vec<&str> = shares.by_owes_desc().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["Y", "X"]);
    }

    #[test]
    fn test_total_amount() {
        assert_eq!(total_amount(&[]), Decimal::ZERO);
        let expenses = vec![
            make_expense(1, dec!(1200), "Alex", 3),
            make_expense(2, dec!(80.55), "Sarah", 3),
        ];
        assert_eq!(total_amount(&expenses), dec!(1280.55));
    }

    #[test]
    fn test_amount_bars() {
        assert!(amount_bars(&[]).is_empty());

        let expenses = vec![
            make_expense(1, dec!(1200), "Alex", 3),
            make_expense(2, dec!(300), "Mike", 2),
        ];
        let bars = amount_bars(&expenses);
        assert_eq!(bars[0], AmountBar { expense_id: 1, percent: dec!(100) });
        assert_eq!(bars[1], AmountBar { expense_id: 2, percent: dec!(25) });
    }
}
