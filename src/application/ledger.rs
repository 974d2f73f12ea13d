use chrono::{DateTime, Local};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::domain::{
    amount_bars, compute_shares, participants, total_amount, AmountBar, Expense, ExpenseDraft,
    ExpenseId, NewExpense, Shares, ValidationError,
};
use crate::storage::{KeyValueStore, PersistenceError, Repository};

/// The shared expense ledger: an append-only list of expenses plus derived views.
///
/// Every mutation is followed by a synchronous save. A failed save is logged
/// and kept in [`Ledger::last_save_error`]; the in-memory change stands.
pub struct Ledger<S: KeyValueStore> {
    expenses: Vec<Expense>,
    repo: Repository<S>,
    last_id: ExpenseId,
    load_error: Option<PersistenceError>,
    save_error: Option<PersistenceError>,
}

impl<S: KeyValueStore> Ledger<S> {
    /// Open a ledger over `store`, loading whatever was persisted there.
    /// Missing or unreadable state yields an empty ledger.
    pub fn open(store: S) -> Self {
        let repo = Repository::new(store);
        let (expenses, load_error) = match repo.try_load() {
            Ok(expenses) => (expenses, None),
            Err(e) => {
                warn!(error = %e, "error loading stored expenses, starting empty");
                (Vec::new(), Some(e))
            }
        };
        let last_id = expenses.last().map(|e| e.id).unwrap_or(0);
        debug!(count = expenses.len(), "ledger opened");

        Self {
            expenses,
            repo,
            last_id,
            load_error,
            save_error: None,
        }
    }

    // ========================
    // Mutations
    // ========================

    /// Validate and record a new expense, then persist.
    /// On a validation error nothing changes.
    pub fn add_expense(
        &mut self,
        description: &str,
        amount: Decimal,
        paid_by: &str,
        split_among: i64,
    ) -> Result<Expense, ValidationError> {
        let input = NewExpense::new(description, amount, paid_by, split_among)?;
        Ok(self.record_expense(input, Local::now()))
    }

    /// Parse raw form fields and record the expense.
    pub fn add_expense_from_input(
        &mut self,
        draft: &ExpenseDraft,
    ) -> Result<Expense, ValidationError> {
        let input = draft.parse()?;
        Ok(self.record_expense(input, Local::now()))
    }

    /// Record already-validated input as of `now`.
    pub fn record_expense(&mut self, input: NewExpense, now: DateTime<Local>) -> Expense {
        let id = self.next_id(now.timestamp_millis());
        let expense = Expense::new(id, input, now.date_naive());
        self.last_id = id;

        debug!(
            id = expense.id,
            amount = %expense.amount,
            paid_by = %expense.paid_by,
            split_among = expense.split_among,
            "expense added"
        );
        self.expenses.push(expense.clone());
        self.persist();
        expense
    }

    /// Remove every expense. Returns `false` (and touches nothing) when the
    /// ledger is already empty. There is no undo.
    pub fn clear_all(&mut self) -> bool {
        if self.expenses.is_empty() {
            debug!("nothing to clear");
            return false;
        }

        let count = self.expenses.len();
        self.expenses.clear();
        self.persist();
        info!(count, "all expenses cleared");
        true
    }

    // ========================
    // Queries
    // ========================

    pub fn total_amount(&self) -> Decimal {
        total_amount(&self.expenses)
    }

    pub fn expense_count(&self) -> usize {
        self.expenses.len()
    }

    /// Distinct payers in first-seen order.
    pub fn participants(&self) -> Vec<String> {
        participants(&self.expenses)
    }

    /// Per-participant paid/owes/balance, recomputed from scratch.
    pub fn shares(&self) -> Shares {
        compute_shares(&self.expenses)
    }

    /// Expenses in insertion order.
    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn expenses_newest_first(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter().rev()
    }

    pub fn amount_bars(&self) -> Vec<AmountBar> {
        amount_bars(&self.expenses)
    }

    // ========================
    // Persistence
    // ========================

    /// Write the current list to the store and return the stored text.
    pub fn save(&mut self) -> Result<String, PersistenceError> {
        self.repo.save(&self.expenses)
    }

    /// The error that made [`Ledger::open`] fall back to an empty ledger, if any.
    pub fn load_error(&self) -> Option<&PersistenceError> {
        self.load_error.as_ref()
    }

    /// The error from the most recent save, cleared by the next successful one.
    pub fn last_save_error(&self) -> Option<&PersistenceError> {
        self.save_error.as_ref()
    }

    pub fn store(&self) -> &S {
        self.repo.store()
    }

    pub fn into_store(self) -> S {
        self.repo.into_store()
    }

    fn persist(&mut self) {
        match self.save() {
            Ok(_) => self.save_error = None,
            Err(e) => {
                warn!(error = %e, "error saving expenses, in-memory ledger kept");
                self.save_error = Some(e);
            }
        }
    }

    // Strictly increasing even when the clock stalls or steps back.
    fn next_id(&self, now_millis: i64) -> ExpenseId {
        now_millis.max(self.last_id + 1)
    }
}
