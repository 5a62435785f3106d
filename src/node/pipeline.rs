// The per-tick pipeline. Each tick drains the relay inbox, and when a mined
// block arrived it runs the full cycle: admit and order pending
// transactions, commit the block, publish the announcement, reconcile with
// peer votes and roll the ledger into the archive when it outgrows the
// threshold. Relay inbox trouble is absorbed and retried next tick; storage
// and archive failures are not.

use crate::config::Config;
use crate::consensus::{ConsensusResolver, Resolution};
use crate::core::orderer::{order_transactions, TransactionOrderer};
use crate::core::{LedgerEngine, PendingTransaction};
use crate::error::{LedgerError, Result};
use crate::relay::{self, RelayLine};
use crate::storage::{AccountStore, ArchiveManager, BackupManager, LedgerStore};
use crate::utils::{atomic_write, read_to_string_or_empty};
use num_bigint::BigUint;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// What one tick did.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub committed_block: Option<u64>,
    pub admitted: usize,
    pub rejected: usize,
    pub resolution: Option<Resolution>,
    pub archived: bool,
}

/// Owns every service of the node and drives them in a fixed stage order.
pub struct TickPipeline {
    config: Config,
    engine: LedgerEngine,
    resolver: ConsensusResolver,
    orderer: TransactionOrderer,
    archive: ArchiveManager,
    pending: Vec<PendingTransaction>,
}

impl TickPipeline {
    /// Build the pipeline with all stores rooted under the configured data
    /// directory.
    pub fn open(config: Config) -> Result<TickPipeline> {
        let accounts = AccountStore::open(&config.accounts_dir())?;
        let ledger = LedgerStore::open(&config.ledger_dir())?;
        let backup = BackupManager::open(&config.backup_dir())?;
        let archive = ArchiveManager::open(&config.archive_dir())?;
        for path in [config.chat_log(), config.outbound_log()] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        let resolver = ConsensusResolver::new(config.agreement_threshold);

        Ok(TickPipeline {
            config,
            engine: LedgerEngine::new(accounts, ledger, backup),
            resolver,
            orderer: TransactionOrderer::new(),
            archive,
            pending: Vec::new(),
        })
    }

    pub fn engine(&self) -> &LedgerEngine {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Drive ticks forever at the configured interval. Only fatal conditions
    /// return.
    pub fn run(&mut self) -> Result<()> {
        log::info!(
            "Pipeline running, tick interval {}ms",
            self.config.tick_interval_ms
        );
        loop {
            self.tick()?;
            thread::sleep(Duration::from_millis(self.config.tick_interval_ms));
        }
    }

    /// One pipeline pass.
    pub fn tick(&mut self) -> Result<TickReport> {
        let mut report = TickReport::default();

        let (block_content, transactions) = self.drain_chat_log();
        self.pending.extend(transactions);

        let Some(block_content) = block_content else {
            return Ok(report);
        };
        let miner = self.read_inbox_value(&self.config.miner_log());
        let hash = self.read_inbox_value(&self.config.block_hash_log());
        let (Some(miner), Some(hash)) = (miner, hash) else {
            log::warn!("Mined block without miner or hash event; dropping the block event");
            return Ok(report);
        };
        // A relay line can pass the positional checks without carrying a
        // numeric block prefix. Dropping it here, before admission, keeps
        // the queued transactions for the next real block event
        if let Err(e) = crate::core::ledger::parse_block_number(&block_content) {
            log::warn!("Dropping unusable block event: {e}");
            self.clear_inbox_events();
            return Ok(report);
        }

        let batch = self.admit_pending(&mut report);
        let summary = self
            .engine
            .commit_block(&block_content, &miner, &hash, &batch)?;
        report.committed_block = Some(summary.block_number);
        report.rejected += summary.rejected;
        self.clear_inbox_events();

        self.publish(&summary.announcement)?;
        report.resolution = Some(self.reconcile(&summary.announcement)?);
        report.archived = self.roll_over_if_needed()?;
        Ok(report)
    }

    /// Inbox reads that fail are absorbed as `IoUnavailable`: skip the stage
    /// this tick and retry on the next one.
    fn read_inbox(&self, path: &Path) -> Result<String> {
        read_to_string_or_empty(path).map_err(|e| LedgerError::IoUnavailable(e.to_string()))
    }

    /// Read and clear the raw relay log, returning the newest mined-block
    /// content and every parsed transaction line.
    fn drain_chat_log(&self) -> (Option<String>, Vec<PendingTransaction>) {
        let path = self.config.chat_log();
        let raw = match self.read_inbox(&path) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("{e}");
                return (None, Vec::new());
            }
        };
        if !raw.is_empty() {
            if let Err(e) = atomic_write(&path, "") {
                log::warn!("Failed to clear relay log: {e}");
            }
        }

        let mut block = None;
        let mut transactions = Vec::new();
        for line in raw.lines() {
            match relay::classify(line) {
                RelayLine::Block(content) => block = Some(content),
                RelayLine::Transaction {
                    sender_name,
                    payload,
                } => match PendingTransaction::parse(&sender_name, &payload) {
                    Ok(tx) => transactions.push(tx),
                    Err(e) => log::warn!("Unparseable transaction line from {sender_name}: {e}"),
                },
                RelayLine::Chatter => {}
            }
        }
        (block, transactions)
    }

    fn read_inbox_value(&self, path: &Path) -> Option<String> {
        match self.read_inbox(path) {
            Ok(raw) => {
                let value = raw.trim().to_string();
                (!value.is_empty()).then_some(value)
            }
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    fn clear_inbox_events(&self) {
        for path in [self.config.miner_log(), self.config.block_hash_log()] {
            if let Err(e) = atomic_write(&path, "") {
                log::warn!("Failed to clear {}: {e}", path.display());
            }
        }
    }

    /// Admit the queued transactions into one block batch, in deterministic
    /// order, one spend per wallet.
    fn admit_pending(&mut self, report: &mut TickReport) -> Vec<PendingTransaction> {
        self.orderer.reset();
        let mut batch = Vec::new();
        for tx in self.pending.drain(..) {
            if let Err(e) = tx.validate_grammar() {
                log::warn!("Dropping transaction from {}: {e}", tx.sender_name());
                report.rejected += 1;
                continue;
            }
            match self.orderer.admit(&tx) {
                Ok(()) => batch.push(tx),
                Err(e) => {
                    log::warn!("Dropping transaction from {}: {e}", tx.sender_name());
                    report.rejected += 1;
                }
            }
        }
        order_transactions(&mut batch);
        report.admitted = batch.len();
        batch
    }

    fn publish(&self, announcement: &str) -> Result<()> {
        atomic_write(&self.config.outbound_log(), announcement)
    }

    /// Feed peer votes to the resolver and reconcile. A resync requeues the
    /// agreed block's transactions for the next cycle.
    fn reconcile(&mut self, announcement: &str) -> Result<Resolution> {
        let votes_path = self.config.votes_log();
        match self.read_inbox(&votes_path) {
            Ok(raw) => {
                for line in raw.lines() {
                    self.resolver.receive(line);
                }
                if !raw.is_empty() {
                    if let Err(e) = atomic_write(&votes_path, "") {
                        log::warn!("Failed to clear votes log: {e}");
                    }
                }
            }
            Err(e) => log::warn!("{e}"),
        }

        let resolution = self.resolver.resolve(announcement, &mut self.engine)?;
        if let Resolution::Resynced { reprocess, .. } = &resolution {
            for (sender_name, payload) in reprocess {
                match PendingTransaction::parse(sender_name, payload) {
                    Ok(tx) => self.pending.push(tx),
                    Err(e) => log::warn!("Dropping reprocessed payload: {e}"),
                }
            }
        }
        Ok(resolution)
    }

    /// Move the live ledger into the shard archive once it crosses the
    /// rollover threshold. Exhausted archive capacity is fatal.
    fn roll_over_if_needed(&self) -> Result<bool> {
        if self.engine.ledger().ledger_len()? < self.config.rollover_bytes {
            return Ok(false);
        }
        let content = self.engine.ledger().ledger_content()?;
        match self.archive.archive(&content) {
            Ok(_) => {
                self.engine.ledger().truncate_ledger()?;
                Ok(true)
            }
            Err(LedgerError::CapacityExhausted) => {
                log::error!("Archive layout is full; the node cannot continue committing");
                Err(LedgerError::CapacityExhausted)
            }
            Err(e) => Err(e),
        }
    }

    /// Transactions waiting for the next block event.
    pub fn pending(&self) -> &[PendingTransaction] {
        &self.pending
    }

    /// Operator snapshot queries.
    pub fn balance_of(&self, name: &str) -> Result<Option<BigUint>> {
        Ok(self
            .engine
            .accounts()
            .get(name)?
            .map(|account| account.balance().clone()))
    }

    pub fn latest_consensus_hash(&self) -> Result<Option<String>> {
        self.engine.latest_consensus_hash()
    }

    pub fn wallet_of(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .engine
            .accounts()
            .get(name)?
            .map(|account| account.wallet().to_string()))
    }

    pub fn tx_count_of(&self, name: &str) -> Result<Option<u64>> {
        Ok(self
            .engine
            .accounts()
            .get(name)?
            .map(|account| account.tx_counter()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reward::reward;
    use crate::core::KeyMaterial;
    use tempfile::{tempdir, TempDir};

    fn pipeline(rollover_bytes: u64) -> (TempDir, TickPipeline) {
        let dir = tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            rollover_bytes,
            ..Config::default()
        };
        (dir, TickPipeline::open(config).unwrap())
    }

    fn relay_block_line(content: &str) -> String {
        format!("{} ab{}x {}", "x".repeat(41), "MSG", content)
    }

    fn deliver_block(p: &TickPipeline, content: &str, miner: &str, hash: &str) {
        fs::write(p.config.chat_log(), relay_block_line(content)).unwrap();
        fs::write(p.config.miner_log(), miner).unwrap();
        fs::write(p.config.block_hash_log(), hash).unwrap();
    }

    #[test]
    fn test_idle_tick_commits_nothing() {
        let (_dir, mut p) = pipeline(100_000_000);
        let report = p.tick().unwrap();
        assert_eq!(report.committed_block, None);
        assert_eq!(report.admitted, 0);
    }

    #[test]
    fn test_block_event_commits_and_publishes() {
        let (_dir, mut p) = pipeline(100_000_000);
        deliver_block(&p, "1.aa", "alice", "h1");

        let report = p.tick().unwrap();
        assert_eq!(report.committed_block, Some(1));
        assert_eq!(report.resolution, Some(Resolution::NoQuorum));

        let alice = p.engine().accounts().get("alice").unwrap().unwrap();
        assert_eq!(alice.balance(), &reward(1));

        // The announcement went out and the inbox events were cleared
        let published = fs::read_to_string(p.config.outbound_log()).unwrap();
        assert!(published.starts_with("1.aa alice h1 ="));
        assert_eq!(fs::read_to_string(p.config.chat_log()).unwrap(), "");
        assert_eq!(fs::read_to_string(p.config.miner_log()).unwrap(), "");
    }

    #[test]
    fn test_transactions_queue_until_a_block_arrives() {
        let (_dir, mut p) = pipeline(100_000_000);
        let keys = KeyMaterial::new("1.aa", "secret");
        deliver_block(&p, "1.aa", "alice", &keys.committed_key(0));
        p.tick().unwrap();

        // A transaction alone does not commit anything
        let payload = format!("1&100_1,5${}~t%{};", keys.proof(0), keys.committed_key(0));
        fs::write(p.config.chat_log(), format!("<alice> {payload}\n")).unwrap();
        let report = p.tick().unwrap();
        assert_eq!(report.committed_block, None);

        // The next block carries it
        deliver_block(&p, "2.bb", "bob", "h2");
        let report = p.tick().unwrap();
        assert_eq!(report.committed_block, Some(2));
        assert_eq!(report.admitted, 1);
        assert_eq!(report.rejected, 0);

        // Sent to own wallet, so only gas left the balance
        let alice = p.engine().accounts().get("alice").unwrap().unwrap();
        assert_eq!(alice.balance(), &(reward(1) - BigUint::from(5u32)));
    }

    #[test]
    fn test_duplicate_wallet_dropped_at_admission() {
        let (_dir, mut p) = pipeline(100_000_000);
        let keys = KeyMaterial::new("1.aa", "secret");
        deliver_block(&p, "1.aa", "alice", &keys.committed_key(0));
        p.tick().unwrap();

        // Two spends from the same wallet arrive with the next block event
        let payload = format!("1&100_1,5${}~t%{};", keys.proof(0), keys.committed_key(0));
        fs::write(
            p.config.chat_log(),
            format!(
                "<alice> {payload}\n<alice> {payload}\n{}\n",
                relay_block_line("2.bb")
            ),
        )
        .unwrap();
        fs::write(p.config.miner_log(), "bob").unwrap();
        fs::write(p.config.block_hash_log(), "h2").unwrap();

        let report = p.tick().unwrap();
        assert_eq!(report.admitted, 1);
        assert_eq!(report.rejected, 1);
    }

    #[test]
    fn test_block_event_without_numeric_prefix_is_dropped() {
        let (_dir, mut p) = pipeline(100_000_000);

        // Passes the relay position checks ('7' sits in the digit slot)
        // but carries no usable block number
        deliver_block(&p, "7x.data", "alice", "h1");
        let report = p.tick().unwrap();
        assert_eq!(report.committed_block, None);
        assert!(p.engine().accounts().is_empty());

        // The bogus event is gone and the node keeps committing
        deliver_block(&p, "1.aa", "alice", "h1");
        assert_eq!(p.tick().unwrap().committed_block, Some(1));
    }

    #[test]
    fn test_rollover_archives_and_truncates() {
        let (dir, mut p) = pipeline(10);
        deliver_block(&p, "1.aa", "alice", "h1");

        let report = p.tick().unwrap();
        assert!(report.archived);
        assert_eq!(p.engine().ledger().ledger_len().unwrap(), 0);

        let archived = fs::read_to_string(
            dir.path().join("archive").join("shard_01").join("slot_000.txt"),
        )
        .unwrap();
        assert!(archived.contains("1.aa alice h1 "));
    }

    #[test]
    fn test_peer_votes_confirm_commit() {
        let (_dir, mut p) = pipeline(100_000_000);

        // First run a twin pipeline to learn the expected announcement
        let (_twin_dir, mut twin) = pipeline(100_000_000);
        deliver_block(&twin, "1.aa", "alice", "h1");
        twin.tick().unwrap();
        let announcement = fs::read_to_string(twin.config.outbound_log()).unwrap();

        deliver_block(&p, "1.aa", "alice", "h1");
        fs::create_dir_all(p.config.votes_log().parent().unwrap()).unwrap();
        fs::write(
            p.config.votes_log(),
            format!("{announcement}\n{announcement}\n"),
        )
        .unwrap();

        let report = p.tick().unwrap();
        assert_eq!(report.resolution, Some(Resolution::Confirmed));
    }
}
