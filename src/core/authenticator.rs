// One-time hash-chain authentication (Lamport-style). An account pre-commits
// to iterate(seed, 2002) and spends the chain backwards one reveal per
// transaction; verification walks forward from the revealed proof and must
// land exactly on the committed anchor. Chains are cut into batches of 1000
// so a fresh key can be committed before the old chain runs out.

use crate::core::account::Account;
use crate::core::hash_chain::{self, HASH_HEX_LEN};
use crate::error::{LedgerError, Result};
use zeroize::Zeroizing;

/// Transactions per committed key.
pub const BATCH_SIZE: u64 = 1000;

/// Iterations from seed to a batch's committed public key.
pub const KEY_ITERATIONS: u32 = 2002;

/// Iterations from seed to the first revealed proof of a batch.
pub const FIRST_PROOF_ITERATIONS: u32 = 2001;

/// Iterations from seed to a batch transition value.
pub const TRANSITION_ITERATIONS: u32 = 1001;

/// Outcome of a successful proof check. The engine applies the state changes;
/// verification itself never mutates anything.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthOutcome {
    /// New committed anchor to store, when the transaction sits on a batch
    /// boundary and carries the next batch's key.
    pub rotate_anchor_to: Option<String>,
}

/// Verify a revealed proof against the account's committed anchor.
///
/// For the account's first transaction one forward hash must reach the
/// anchor; afterwards the iteration count is `(tx_counter + 1) mod 1000`,
/// with 1001 when that remainder is zero. On failure nothing may be mutated,
/// so this returns the outcome for the caller to apply.
pub fn validate(account: &Account, proof: &str, claimed_next_key: &str) -> Result<AuthOutcome> {
    let counter = account.tx_counter();
    let iterations = if counter == 0 {
        1
    } else {
        let remainder = ((counter + 1) % BATCH_SIZE) as u32;
        if remainder == 0 {
            TRANSITION_ITERATIONS
        } else {
            remainder
        }
    };

    let reached = hash_chain::iterate(proof, iterations);
    if reached != account.anchor() {
        return Err(LedgerError::AuthenticationError(format!(
            "proof for {} does not reach the committed key",
            account.name()
        )));
    }

    // A batch-boundary reveal carries the next committed key; everything else
    // keeps the anchor as-is (the claimed key then equals the stored anchor).
    let rotate_anchor_to = if counter > 0
        && counter % BATCH_SIZE == 0
        && claimed_next_key.len() == HASH_HEX_LEN
        && claimed_next_key != account.anchor()
    {
        Some(claimed_next_key.to_string())
    } else {
        None
    };

    Ok(AuthOutcome { rotate_anchor_to })
}

/// Client side of the scheme: derives proofs and committed keys from the
/// origin block content and the local secret. Only derived hash outputs ever
/// leave the process.
pub struct KeyMaterial {
    seed: Zeroizing<String>,
}

impl KeyMaterial {
    pub fn new(origin_block: &str, secret: &str) -> KeyMaterial {
        KeyMaterial {
            seed: Zeroizing::new(format!("{origin_block}{secret}")),
        }
    }

    fn batch_seed(&self, batch: u64) -> Zeroizing<String> {
        // Batch zero uses the bare seed; the suffix only appears from batch 1
        if batch == 0 {
            Zeroizing::new(self.seed.as_str().to_string())
        } else {
            Zeroizing::new(format!("{}{batch}", self.seed.as_str()))
        }
    }

    /// Committed public key for `batch`.
    pub fn committed_key(&self, batch: u64) -> String {
        hash_chain::iterate(&self.batch_seed(batch), KEY_ITERATIONS)
    }

    /// Transition value revealed when crossing into `batch`.
    pub fn transition(&self, batch: u64) -> String {
        hash_chain::iterate(&self.batch_seed(batch.saturating_sub(1)), TRANSITION_ITERATIONS)
    }

    /// Revealed proof accompanying transaction index `n` (0-based).
    pub fn proof(&self, n: u64) -> String {
        let batch = n / BATCH_SIZE;
        let remainder = n % BATCH_SIZE;

        if n == 0 {
            hash_chain::iterate(&self.seed, FIRST_PROOF_ITERATIONS)
        } else if remainder != 0 {
            let iterations = KEY_ITERATIONS - (remainder as u32 + 1);
            hash_chain::iterate(&self.batch_seed(batch), iterations)
        } else {
            // Batch boundary reveals the new batch's own key material
            hash_chain::iterate(&self.batch_seed(batch), FIRST_PROOF_ITERATIONS)
        }
    }
}
