//! Peer agreement over committed blocks
//!
//! Each commit produces an announcement line; peers publish theirs and every
//! node compares its own line against the mailbox of peer lines. Agreement
//! confirms the commit, disagreement triggers a resync that replaces the
//! local trackers with the agreed block and requeues its transactions.

pub mod announcement;
pub mod resolver;

pub use announcement::Announcement;
pub use resolver::{ConsensusResolver, DivergenceKind, Resolution};
