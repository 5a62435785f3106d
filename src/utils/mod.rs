//! Utility functions and helpers
//!
//! Cryptographic digest, atomic file replacement, and serialization helpers
//! used throughout the engine.

pub mod crypto;
pub mod fs;
pub mod serialization;

pub use crypto::sha256_digest;
pub use fs::{append_string, atomic_write, read_to_string_or_empty};
pub use serialization::{deserialize, serialize};
