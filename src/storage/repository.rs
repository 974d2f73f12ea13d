use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{Expense, ExpenseId, ValidationError};

use super::{KeyValueStore, StoreError};

/// Key the expense list is stored under.
pub const EXPENSES_KEY: &str = "expenses";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to encode expenses: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Failed to decode stored expenses: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Stored expense {id} is invalid: {error}")]
    InvalidRecord { id: ExpenseId, error: ValidationError },

    #[error("Stored expense {id} is out of creation order")]
    OutOfOrder { id: ExpenseId },

    #[error("Stored expense id {id} is out of range")]
    IdOutOfRange { id: ExpenseId },
}

/// Serialize an expense list to its persisted text form: a JSON array of
/// seven-field objects, amounts written with full decimal precision.
pub fn encode_expenses(expenses: &[Expense]) -> Result<String, PersistenceError> {
    serde_json::to_string(expenses).map_err(PersistenceError::Encode)
}

/// Parse and check a persisted expense list.
///
/// Ids must be positive, strictly increasing and leave room for the next id.
pub fn decode_expenses(text: &str) -> Result<Vec<Expense>, PersistenceError> {
    let expenses: Vec<Expense> = serde_json::from_str(text).map_err(PersistenceError::Decode)?;

    let mut last_id: Option<ExpenseId> = None;
    for expense in &expenses {
        if expense.id <= 0 || expense.id == ExpenseId::MAX {
            return Err(PersistenceError::IdOutOfRange { id: expense.id });
        }
        expense
            .check()
            .map_err(|error| PersistenceError::InvalidRecord {
                id: expense.id,
                error,
            })?;
        if last_id.is_some_and(|last| expense.id <= last) {
            return Err(PersistenceError::OutOfOrder { id: expense.id });
        }
        last_id = Some(expense.id);
    }

    Ok(expenses)
}

/// Persists the expense list into a key/value store.
pub struct Repository<S> {
    store: S,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Write the whole list, replacing what was stored. Returns the stored text.
    pub fn save(&mut self, expenses: &[Expense]) -> Result<String, PersistenceError> {
        let text = encode_expenses(expenses)?;
        self.store.set(EXPENSES_KEY, &text)?;
        debug!(count = expenses.len(), bytes = text.len(), "saved expenses");
        Ok(text)
    }

    /// Read the stored list. A missing key is an empty list, not an error.
    pub fn try_load(&self) -> Result<Vec<Expense>, PersistenceError> {
        match self.store.get(EXPENSES_KEY)? {
            Some(text) => decode_expenses(&text),
            None => {
                debug!("no stored expenses, starting empty");
                Ok(Vec::new())
            }
        }
    }

    /// Like [`Repository::try_load`], but falls back to an empty list on any failure.
    pub fn load(&self) -> Vec<Expense> {
        self.try_load().unwrap_or_else(|e| {
            warn!(error = %e, "error loading stored expenses, starting empty");
            Vec::new()
        })
    }
}
