// The account record every balance-changing operation flows through.
// Balances are arbitrary precision because tier-one rewards are 10^14 base
// units and accumulate without bound.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// One keyed account record. Created on a first mined block or first received
/// transaction, mutated only by the ledger engine, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    name: String,
    wallet: String,
    balance: BigUint,
    tx_counter: u64,
    blocks_mined: u64,
    /// Content of the block that created the account. Immutable seed material
    /// for the owner's hash-chain key derivation.
    origin_block: String,
    /// Committed public-key anchor the next revealed proof must reach.
    anchor: String,
}

impl Account {
    pub fn new(
        name: &str,
        wallet: &str,
        balance: BigUint,
        origin_block: &str,
        anchor: &str,
    ) -> Account {
        Account {
            name: name.to_string(),
            wallet: wallet.to_string(),
            balance,
            tx_counter: 0,
            blocks_mined: 0,
            origin_block: origin_block.to_string(),
            anchor: anchor.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    pub fn balance(&self) -> &BigUint {
        &self.balance
    }

    pub fn tx_counter(&self) -> u64 {
        self.tx_counter
    }

    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined
    }

    pub fn origin_block(&self) -> &str {
        &self.origin_block
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub(crate) fn set_balance(&mut self, balance: BigUint) {
        self.balance = balance;
    }

    pub(crate) fn bump_tx_counter(&mut self) {
        self.tx_counter += 1;
    }

    pub(crate) fn bump_blocks_mined(&mut self) {
        self.blocks_mined += 1;
    }

    pub(crate) fn set_anchor(&mut self, anchor: String) {
        self.anchor = anchor;
    }

    /// Canonical textual form fed into the accounts snapshot hash. Must stay
    /// byte-stable: peers hash the same flattening to agree on state.
    pub fn flatten(&self) -> String {
        format!(
            "{}\n@{}\n{}\n{}\n{}\n{}\n",
            self.name, self.wallet, self.balance, self.tx_counter, self.blocks_mined, self.anchor
        )
    }
}
