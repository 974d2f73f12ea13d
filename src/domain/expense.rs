use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{parse_amount, round_to_cents, ParseAmountError, MAX_AMOUNT};

/// Creation-ordered identifier (UNIX milliseconds, bumped to stay strictly increasing).
pub type ExpenseId = i64;

/// A shared cost paid by one person and split among a number of people.
/// Expenses are immutable once recorded; the only way to remove one is to clear the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    /// Rounded to cents at creation
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub paid_by: String,
    pub split_among: u32,
    /// `amount / split_among`, never re-rounded
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount_per_person: Decimal,
    /// Display only
    pub date_added: NaiveDate,
}

impl Expense {
    /// Build an expense from validated input. The id must be assigned by the ledger.
    pub fn new(id: ExpenseId, input: NewExpense, date_added: NaiveDate) -> Self {
        let amount_per_person = input.amount / Decimal::from(input.split_among);
        Self {
            id,
            description: input.description,
            amount: input.amount,
            paid_by: input.paid_by,
            split_among: input.split_among,
            amount_per_person,
            date_added,
        }
    }

    /// Re-check the record invariants, e.g. for expenses read back from storage.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::new(ExpenseField::Description, ValidationReason::Empty));
        }
        check_amount(self.amount)?;
        if self.paid_by.trim().is_empty() {
            return Err(ValidationError::new(ExpenseField::PaidBy, ValidationReason::Empty));
        }
        if self.split_among == 0 {
            return Err(ValidationError::new(
                ExpenseField::SplitAmong,
                ValidationReason::NotPositive,
            ));
        }
        Ok(())
    }
}

/// Validated, normalized input for a new expense: trimmed text, amount rounded to cents.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub description: String,
    pub amount: Decimal,
    pub paid_by: String,
    pub split_among: u32,
}

impl NewExpense {
    /// Validate fields in form order; the first invalid field is reported.
    /// The amount is checked after rounding, so anything below half a cent is rejected.
    pub fn new(
        description: &str,
        amount: Decimal,
        paid_by: &str,
        split_among: i64,
    ) -> Result<Self, ValidationError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::new(ExpenseField::Description, ValidationReason::Empty));
        }

        let amount = round_to_cents(amount);
        check_amount(amount)?;

        let paid_by = paid_by.trim();
        if paid_by.is_empty() {
            return Err(ValidationError::new(ExpenseField::PaidBy, ValidationReason::Empty));
        }

        if split_among <= 0 {
            return Err(ValidationError::new(
                ExpenseField::SplitAmong,
                ValidationReason::NotPositive,
            ));
        }
        let split_among = u32::try_from(split_among).map_err(|_| {
            ValidationError::new(ExpenseField::SplitAmong, ValidationReason::OutOfRange)
        })?;

        Ok(Self {
            description: description.to_string(),
            amount,
            paid_by: paid_by.to_string(),
            split_among,
        })
    }
}

/// The four raw, string-typed fields of an expense submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseDraft {
    pub description: String,
    pub amount: String,
    pub paid_by: String,
    pub split_among: String,
}

impl ExpenseDraft {
    pub fn new(
        description: impl Into<String>,
        amount: impl Into<String>,
        paid_by: impl Into<String>,
        split_among: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            amount: amount.into(),
            paid_by: paid_by.into(),
            split_among: split_among.into(),
        }
    }

    /// Parse the numeric fields and validate everything, in form order.
    pub fn parse(&self) -> Result<NewExpense, ValidationError> {
        if self.description.trim().is_empty() {
            return Err(ValidationError::new(ExpenseField::Description, ValidationReason::Empty));
        }

        let amount = parse_amount(&self.amount).map_err(|e| {
            let reason = match e {
                ParseAmountError::Empty => ValidationReason::Empty,
                ParseAmountError::InvalidFormat => ValidationReason::NotANumber,
            };
            ValidationError::new(ExpenseField::Amount, reason)
        })?;

        if self.paid_by.trim().is_empty() {
            return Err(ValidationError::new(ExpenseField::PaidBy, ValidationReason::Empty));
        }

        let split = self.split_among.trim();
        if split.is_empty() {
            return Err(ValidationError::new(ExpenseField::SplitAmong, ValidationReason::Empty));
        }
        // Whole numbers only: "2.5" is not a head count.
        let split_among = i64::from_str(split).map_err(|_| {
            ValidationError::new(ExpenseField::SplitAmong, ValidationReason::NotANumber)
        })?;

        NewExpense::new(&self.description, amount, &self.paid_by, split_among)
    }
}

/// Amounts must be positive and at most [`MAX_AMOUNT`].
fn check_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::new(ExpenseField::Amount, ValidationReason::NotPositive));
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::new(ExpenseField::Amount, ValidationReason::OutOfRange));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpenseField {
    Description,
    Amount,
    PaidBy,
    SplitAmong,
}

impl ExpenseField {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseField::Description => "description",
            ExpenseField::Amount => "amount",
            ExpenseField::PaidBy => "paid by",
            ExpenseField::SplitAmong => "split among",
        }
    }
}

impl fmt::Display for ExpenseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    Empty,
    NotANumber,
    NotPositive,
    OutOfRange,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::Empty => write!(f, "must not be empty"),
            ValidationReason::NotANumber => write!(f, "is not a number"),
            ValidationReason::NotPositive => write!(f, "must be greater than 0"),
            ValidationReason::OutOfRange => write!(f, "is too large"),
        }
    }
}

/// Rejected expense input. Nothing is recorded when this is returned.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: ExpenseField,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: ExpenseField, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}
