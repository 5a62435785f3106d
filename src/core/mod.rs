//! Core ledger functionality
//!
//! Block commitment, account state, hash-chain authentication, reward
//! issuance and deterministic transaction ordering.

pub mod account;
pub mod authenticator;
pub mod hash_chain;
pub mod ledger;
pub mod orderer;
pub mod reward;
pub mod transaction;

pub use account::Account;
pub use authenticator::{AuthOutcome, KeyMaterial};
pub use ledger::{CommitSummary, LedgerEngine};
pub use orderer::TransactionOrderer;
pub use transaction::PendingTransaction;
