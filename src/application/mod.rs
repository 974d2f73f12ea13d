// Application layer: the ledger ties the domain computations to a store.

mod ledger;

pub use ledger::*;
