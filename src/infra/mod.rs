//! Infrastructure pieces: dispatch queue and result ledger.

pub mod ledger;
pub mod queue;

pub use ledger::ResultLedger;
pub use queue::DispatchQueue;
