//! Data storage and persistence
//!
//! Keyed account records live in sled; the ledger, hash logs, bridge ledger
//! and consensus trackers are plain text because their byte-exact content is
//! what peers hash and compare. Backup snapshots and shard archival complete
//! the layer.

pub mod account_store;
pub mod archive;
pub mod backup;
pub mod ledger_store;

pub use account_store::AccountStore;
pub use archive::ArchiveManager;
pub use backup::BackupManager;
pub use ledger_store::{LastBlockRecord, LedgerStore};
