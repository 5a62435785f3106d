//! # Relay Ledger - My Peer-Coordinated Ledger Node
//!
//! This is my ledger node that rides on top of a chat relay instead of its
//! own P2P network. When I come back to this code, here's what I need to
//! remember:
//!
//! ## What I Built
//! - **Hash-Chain Auth**: Lamport-style one-time proofs, batches of 1000
//! - **Block Commitment**: Miner rewards on a halving schedule, deterministic
//!   transaction ordering, byte-exact ledger entries
//! - **Peer Agreement**: Announcement lines compared across the relay, with
//!   automatic resync when the local chain diverges
//! - **Bridge Ledger**: Wrap transactions that lock coins for another chain
//! - **Shard Archive**: The live ledger rolls over into a fixed shard layout
//!
//! ## How I Organized My Code
//! - `core/`: Block commitment, accounts, authentication, rewards, ordering
//! - `consensus/`: Announcement lines and the peer-agreement resolver
//! - `relay/`: Classification of raw relay lines into events
//! - `node/`: The tick pipeline that drives everything
//! - `storage/`: Account store, ledger files, backups, the shard archive
//! - `config/`: TOML configuration with environment overrides
//! - `utils/`: Hashing, atomic file writes, serialization helpers
//! - `cli/`: Operator commands
//!
//! ## Key Design Decisions I Made
//! - Used Sled for account records but kept the ledger and hash logs as
//!   plain text, because peers hash and compare their exact bytes
//! - Every committed file write is append-only or write-temp-then-rename
//! - All services are constructed and injected; no global state
//! - Relay hiccups are absorbed per tick; storage failures are not

pub mod cli;
pub mod config;
pub mod consensus;
pub mod core;
pub mod error;
pub mod node;
pub mod relay;
pub mod storage;
pub mod utils;

// Re-export commonly used types for convenience
pub use cli::{Command, Opt};
pub use config::Config;
pub use consensus::{Announcement, ConsensusResolver, DivergenceKind, Resolution};
pub use core::{
    Account, AuthOutcome, CommitSummary, KeyMaterial, LedgerEngine, PendingTransaction,
    TransactionOrderer,
};
pub use error::{LedgerError, Result};
pub use node::{TickPipeline, TickReport};
pub use relay::RelayLine;
pub use storage::{AccountStore, ArchiveManager, BackupManager, LedgerStore};
pub use utils::sha256_digest;
