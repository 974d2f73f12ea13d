// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use roomsplit::storage::{FileStore, KeyValueStore, MemoryStore, StoreError};
use roomsplit::Ledger;
use rust_decimal_macros::dec;
use tempfile::TempDir;

/// Helper to create a ledger backed by a file store in a temporary directory
pub fn test_ledger() -> Result<(Ledger<FileStore>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let store = FileStore::open(temp_dir.path())?;
    Ok((Ledger::open(store), temp_dir))
}

/// Helper to reopen the ledger stored in `temp_dir`, as a new session would
pub fn reopen(temp_dir: &TempDir) -> Result<Ledger<FileStore>> {
    Ok(Ledger::open(FileStore::open(temp_dir.path())?))
}

/// Helper to create an in-memory ledger
pub fn memory_ledger() -> Ledger<MemoryStore> {
    Ledger::open(MemoryStore::new())
}

/// Store whose writes always fail; reads return whatever it was seeded with
#[derive(Debug, Default)]
pub struct FailingStore {
    pub value: Option<String>,
    pub attempts: usize,
}

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.value.clone())
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
        self.attempts += 1;
        Err(StoreError::Io {
            path: "unwritable".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

/// Test fixture: the household from the sample data
pub struct Household;

impl Household {
    /// Rent, electricity and groceries, each split three ways
    pub fn record_month<S: KeyValueStore>(ledger: &mut Ledger<S>) -> Result<()> {
        ledger.add_expense("Rent", dec!(1200), "Alex", 3)?;
        ledger.add_expense("Electricity Bill", dec!(80), "Sarah", 3)?;
        ledger.add_expense("Groceries", dec!(150), "Mike", 3)?;
        Ok(())
    }
}
