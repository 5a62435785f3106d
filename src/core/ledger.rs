// Block commitment. One commit applies the miner reward, runs every admitted
// transaction through authentication and balance transfer, appends the
// canonical ledger entry and recomputes the snapshot hashes peers vote on.
// State that survives a crash is only ever written through the stores, which
// append or replace atomically.

use crate::core::account::Account;
use crate::core::authenticator;
use crate::core::hash_chain::double_hash;
use crate::core::reward::reward;
use crate::core::transaction::PendingTransaction;
use crate::error::{LedgerError, Result};
use crate::storage::{AccountStore, BackupManager, LastBlockRecord, LedgerStore};
use num_bigint::BigUint;

/// Result of committing one block.
#[derive(Debug, Clone)]
pub struct CommitSummary {
    pub block_number: u64,
    pub committed: usize,
    pub rejected: usize,
    /// Outbound peer announcement for this block.
    pub announcement: String,
    pub consensus_hash: String,
}

/// Owns all committed chain state. Constructed with its stores injected so
/// tests and the operator binary can point it anywhere.
pub struct LedgerEngine {
    accounts: AccountStore,
    ledger: LedgerStore,
    backup: BackupManager,
    last_consensus_hash: String,
}

impl LedgerEngine {
    pub fn new(accounts: AccountStore, ledger: LedgerStore, backup: BackupManager) -> LedgerEngine {
        LedgerEngine {
            accounts,
            ledger,
            backup,
            last_consensus_hash: String::new(),
        }
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn consensus_hash(&self) -> &str {
        &self.last_consensus_hash
    }

    /// Most recent consensus hash, read back from the hash-history log so it
    /// survives a restart.
    pub fn latest_consensus_hash(&self) -> Result<Option<String>> {
        let history = self.ledger.history_content()?;
        Ok(history
            .split_whitespace()
            .last()
            .map(|token| token.trim_start_matches('=').to_string()))
    }

    pub fn last_block_record(&self) -> Result<LastBlockRecord> {
        self.ledger.last_block_record()
    }

    /// Roll committed state back to the pre-commit snapshot.
    pub fn restore_from_backup(&self) -> Result<()> {
        log::warn!("Restoring committed state from the pre-commit snapshot");
        self.backup.restore(&self.accounts, &self.ledger)
    }

    /// Commit a block: snapshot, reward the miner, apply each transaction,
    /// append the ledger entry and recompute the snapshot hashes.
    ///
    /// Individual transactions failing grammar, balance, authentication or
    /// the per-wallet rule are logged and dropped; the block still commits.
    /// Store failures abort the commit.
    pub fn commit_block(
        &mut self,
        block_content: &str,
        miner: &str,
        block_hash: &str,
        transactions: &[PendingTransaction],
    ) -> Result<CommitSummary> {
        self.backup.snapshot(&self.accounts, &self.ledger)?;

        let block_number = parse_block_number(block_content)?;
        let hash = strip_whitespace(block_hash);
        self.issue_reward(block_number, block_content, miner, &hash)?;

        let mut committed_payloads = Vec::new();
        let mut rejected = 0usize;
        for tx in transactions {
            match self.apply_transaction(block_number, tx) {
                Ok(()) => committed_payloads.push(tx.payload().to_string()),
                Err(e) if e.is_transaction_rejection() => {
                    log::warn!("Rejected transaction from {}: {e}", tx.sender_name());
                    rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let mut entry = format!("{block_content} {miner} {hash} ");
        for payload in &committed_payloads {
            entry.push_str(payload);
            entry.push(' ');
        }
        self.ledger.append_entry(&entry)?;

        // History hash covers the log as it stood before this block
        let history_hash = double_hash(&self.ledger.history_content()?);
        let accounts_hash = double_hash(&self.accounts.flatten()?);
        let ledger_hash = double_hash(&self.ledger.ledger_content()?);
        let consensus_hash = double_hash(&format!("{history_hash}{accounts_hash}{ledger_hash}"));
        self.ledger.append_consensus_hash(&consensus_hash)?;
        self.ledger.append_ledger_hash(&ledger_hash)?;

        self.ledger.set_last_block_record(&LastBlockRecord {
            block: block_content.to_string(),
            miner: miner.to_string(),
            hash: hash.clone(),
        })?;

        let mut announcement = format!("{block_content} {miner} {hash}");
        for payload in &committed_payloads {
            announcement.push(' ');
            announcement.push_str(payload);
        }
        announcement.push_str(&format!(" ={consensus_hash}"));

        self.last_consensus_hash = consensus_hash.clone();
        log::info!(
            "Committed block {block_number} by {miner}: {} transactions, {rejected} rejected",
            committed_payloads.len()
        );

        Ok(CommitSummary {
            block_number,
            committed: committed_payloads.len(),
            rejected,
            announcement,
            consensus_hash,
        })
    }

    /// First block mined under a name creates the account: the wallet is the
    /// block number and the block hash becomes the committed key anchor.
    fn issue_reward(
        &self,
        block_number: u64,
        block_content: &str,
        miner: &str,
        hash: &str,
    ) -> Result<()> {
        let amount = reward(block_number);
        match self.accounts.get(miner)? {
            Some(_) => {
                self.accounts.credit(miner, &amount)?;
                self.accounts.record_mined_block(miner)
            }
            None => {
                self.accounts
                    .create(miner, &block_number.to_string(), amount, block_content, hash)?;
                Ok(())
            }
        }
    }

    fn apply_transaction(&self, block_number: u64, tx: &PendingTransaction) -> Result<()> {
        tx.validate_grammar()?;

        let sender = self.resolve_sender(tx)?;
        let total = tx.amount_units()? + tx.gas_units()?;
        // Spend must leave a strictly positive remainder
        if &total >= sender.balance() {
            return Err(LedgerError::InsufficientBalance {
                required: total.to_string(),
                available: sender.balance().to_string(),
            });
        }

        let outcome = authenticator::validate(&sender, tx.proof(), tx.next_key())?;

        self.accounts.debit(sender.name(), &total)?;
        self.accounts.advance_tx_counter(sender.name())?;
        if let Some(new_anchor) = outcome.rotate_anchor_to {
            self.accounts.rotate_anchor(sender.name(), &new_anchor)?;
        }

        if let Some(destination) = tx.bridge_destination() {
            // Wrapped coins leave the chain; the bridge ledger records them
            self.ledger
                .append_bridge_record(tx.amount_str(), destination, block_number)?;
        } else {
            match self.accounts.find_by_wallet(tx.receiver_wallet())? {
                Some(receiver) => self.accounts.credit(receiver.name(), &tx.amount_units()?)?,
                // Wallets only exist through mining; an unknown receiver
                // burns the amount like gas
                None => log::warn!(
                    "No account holds wallet {}; amount burned",
                    tx.receiver_wallet()
                ),
            }
        }
        Ok(())
    }

    fn resolve_sender(&self, tx: &PendingTransaction) -> Result<Account> {
        let sender = self
            .accounts
            .get(tx.sender_name())?
            .ok_or_else(|| {
                LedgerError::AuthenticationError(format!("unknown sender {}", tx.sender_name()))
            })?;
        if sender.wallet() != tx.sender_wallet() {
            return Err(LedgerError::AuthenticationError(format!(
                "wallet {} does not belong to {}",
                tx.sender_wallet(),
                tx.sender_name()
            )));
        }
        Ok(sender)
    }

    /// Total supply currently held by accounts, for the operator snapshot.
    pub fn circulating_supply(&self) -> Result<BigUint> {
        let mut total = BigUint::default();
        for account in self.accounts.export()? {
            total += account.balance().clone();
        }
        Ok(total)
    }
}

pub(crate) fn parse_block_number(block_content: &str) -> Result<u64> {
    let digits = block_content.split('.').next().unwrap_or_default();
    digits
        .parse::<u64>()
        .map_err(|_| LedgerError::Parse(format!("block content has no leading number: {block_content}")))
}

fn strip_whitespace(input: &str) -> String {
    input.chars().filter(|c| !c.is_whitespace()).collect()
}
