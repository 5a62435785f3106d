// Mailbox-driven agreement check. After each commit the node compares its
// own announcement against collected peer lines: enough byte-identical
// copies confirm the commit; enough peers agreeing on a different line mean
// the local chain is wrong and must adopt theirs. The mailbox is drained on
// every resolve, matching the tick cadence of the relay.

use crate::consensus::announcement::{is_announcement_line, Announcement};
use crate::core::LedgerEngine;
use crate::error::Result;

/// Why the local chain had to resync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceKind {
    /// The local node committed a corrupted version of the agreed block; its
    /// last commit is rolled back before the agreed block is applied.
    Malformed,
    /// The local node never saw the agreed block; it is applied on top.
    Missed,
}

/// Outcome of one agreement check.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Not enough peers agreed on anything.
    NoQuorum,
    /// Enough peers echoed the local announcement byte for byte.
    Confirmed,
    /// Peers agreed on a different block; local state now follows it. The
    /// transactions embedded in the agreed announcement are handed back as
    /// (sender name, payload) pairs for reprocessing in the next block.
    Resynced {
        kind: DivergenceKind,
        reprocess: Vec<(String, String)>,
    },
}

pub struct ConsensusResolver {
    threshold: usize,
    mailbox: Vec<String>,
}

impl ConsensusResolver {
    pub fn new(threshold: usize) -> ConsensusResolver {
        ConsensusResolver {
            threshold,
            mailbox: Vec::new(),
        }
    }

    /// Collect one inbound peer line. Non-announcement chatter is kept out of
    /// the mailbox here so resolve only counts real votes.
    pub fn receive(&mut self, line: &str) {
        let line = line.trim();
        if !line.is_empty() {
            self.mailbox.push(line.to_string());
        }
    }

    pub fn mailbox_len(&self) -> usize {
        self.mailbox.len()
    }

    /// Compare the local announcement against the mailbox and reconcile.
    /// Drains the mailbox regardless of outcome; stale votes never carry
    /// into the next block cycle.
    pub fn resolve(&mut self, local: &str, engine: &mut LedgerEngine) -> Result<Resolution> {
        let local = local.trim();
        let mailbox = std::mem::take(&mut self.mailbox);

        let matches = mailbox.iter().filter(|line| line.as_str() == local).count();
        if matches >= self.threshold {
            log::debug!("Block confirmed by {matches} peers");
            return Ok(Resolution::Confirmed);
        }

        let others: Vec<&String> = mailbox
            .iter()
            .filter(|line| line.as_str() != local && is_announcement_line(line))
            .collect();
        if others.len() < self.threshold {
            return Ok(Resolution::NoQuorum);
        }
        let agreed = match others.windows(2).find(|pair| pair[0] == pair[1]) {
            Some(pair) => pair[0].as_str(),
            None => return Ok(Resolution::NoQuorum),
        };

        // Chatter can slip through the block-marker filter (any line holding
        // both '.' and '='); a pair of such lines must not take the node
        // down, so an agreed line that is not a usable announcement counts
        // as no agreement at all
        let announcement = match Announcement::parse(agreed) {
            Ok(announcement) => announcement,
            Err(e) => {
                log::warn!("Agreed peer line is not a block announcement: {e}");
                return Ok(Resolution::NoQuorum);
            }
        };
        if let Err(e) = announcement.block_number() {
            log::warn!("Agreed peer line carries an unusable block token: {e}");
            return Ok(Resolution::NoQuorum);
        }
        let last = engine.last_block_record()?;
        let kind = if !last.block.is_empty() && last.block.contains(announcement.block()) {
            DivergenceKind::Malformed
        } else {
            DivergenceKind::Missed
        };
        log::warn!(
            "Chain diverged ({kind:?}); adopting agreed block {}",
            announcement.block()
        );

        if kind == DivergenceKind::Malformed {
            engine.restore_from_backup()?;
        }
        engine.commit_block(
            announcement.block(),
            announcement.miner(),
            announcement.hash(),
            &[],
        )?;

        let reprocess = self.resolve_senders(&announcement, engine)?;
        Ok(Resolution::Resynced { kind, reprocess })
    }

    /// Map each embedded payload back to its sender name via the wallet it
    /// spends from. Payloads spending from unknown wallets are dropped.
    fn resolve_senders(
        &self,
        announcement: &Announcement,
        engine: &LedgerEngine,
    ) -> Result<Vec<(String, String)>> {
        let mut reprocess = Vec::new();
        for payload in announcement.embedded_payloads() {
            let wallet = payload.split('&').next().unwrap_or_default();
            match engine.accounts().find_by_wallet(wallet)? {
                Some(account) => reprocess.push((account.name().to_string(), payload)),
                None => log::warn!("Dropping reprocessed payload from unknown wallet {wallet}"),
            }
        }
        Ok(reprocess)
    }
}
