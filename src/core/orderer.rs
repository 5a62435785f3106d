// Deterministic transaction ordering. Every node runs exactly this sort over
// its admitted batch, so the committed ledger entries come out byte-identical
// across the network. The comparator chain is a protocol constant.

use crate::core::transaction::PendingTransaction;
use crate::error::{LedgerError, Result};
use num_bigint::BigUint;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Orders a block's admitted transactions and enforces the one-transaction-
/// per-wallet-per-block rule against wallets already committed this block.
#[derive(Debug, Default)]
pub struct TransactionOrderer {
    spent_wallets: HashSet<String>,
}

impl TransactionOrderer {
    pub fn new() -> TransactionOrderer {
        TransactionOrderer {
            spent_wallets: HashSet::new(),
        }
    }

    /// Admit a transaction into the current block batch. A sender wallet may
    /// spend at most once per block.
    pub fn admit(&mut self, tx: &PendingTransaction) -> Result<()> {
        if !self.spent_wallets.insert(tx.sender_wallet().to_string()) {
            return Err(LedgerError::DuplicateWalletInBatch(
                tx.sender_wallet().to_string(),
            ));
        }
        Ok(())
    }

    /// Wallets spent in the current block so far.
    pub fn spent_count(&self) -> usize {
        self.spent_wallets.len()
    }

    /// Forget the current block's wallets; called at the start of each block
    /// cycle.
    pub fn reset(&mut self) {
        self.spent_wallets.clear();
    }
}

/// Total order: gas descending, account name ascending, sender wallet
/// ascending (lexicographic on the numeric string), proof ascending.
pub fn order_transactions(transactions: &mut [PendingTransaction]) {
    transactions.sort_by(compare);
}

fn compare(a: &PendingTransaction, b: &PendingTransaction) -> Ordering {
    gas_of(b)
        .cmp(&gas_of(a))
        .then_with(|| a.sender_name().cmp(b.sender_name()))
        .then_with(|| a.sender_wallet().cmp(b.sender_wallet()))
        .then_with(|| a.proof().cmp(b.proof()))
}

fn gas_of(tx: &PendingTransaction) -> BigUint {
    // Grammar-invalid gas sorts as zero; such transactions are rejected at
    // authentication anyway
    tx.gas_units().unwrap_or_default()
}
