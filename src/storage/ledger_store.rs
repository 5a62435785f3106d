// Append-only text artifacts of the chain. Their exact bytes matter: the
// ledger, the hash-history log and the flattened accounts feed the snapshot
// hashes every peer recomputes, so all writes here are either pure appends or
// atomic whole-file replacements.

use crate::error::Result;
use crate::utils::{append_string, atomic_write, read_to_string_or_empty};
use std::fs;
use std::path::{Path, PathBuf};

const LEDGER_FILE: &str = "ledger.txt";
const HASH_HISTORY_FILE: &str = "hash_history.log";
const LEDGER_HASHES_FILE: &str = "ledger_hashes.log";
const BRIDGE_FILE: &str = "bridge.log";
const LAST_BLOCK_FILE: &str = "last_block.log";
const LAST_MINER_FILE: &str = "last_miner.log";
const LAST_HASH_FILE: &str = "last_block_hash.log";

/// Tracker triple describing the most recently committed block, read and
/// overwritten as a unit during consensus resync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastBlockRecord {
    pub block: String,
    pub miner: String,
    pub hash: String,
}

/// Owner of the live ledger file, the two hash logs, the bridge ledger and
/// the last-block trackers.
pub struct LedgerStore {
    dir: PathBuf,
}

impl LedgerStore {
    pub fn open(dir: &Path) -> Result<LedgerStore> {
        fs::create_dir_all(dir)?;
        Ok(LedgerStore {
            dir: dir.to_path_buf(),
        })
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    pub fn append_entry(&self, entry: &str) -> Result<()> {
        append_string(&self.path(LEDGER_FILE), entry)
    }

    pub fn ledger_content(&self) -> Result<String> {
        read_to_string_or_empty(&self.path(LEDGER_FILE))
    }

    /// Ledger size in bytes, the archival trigger input.
    pub fn ledger_len(&self) -> Result<u64> {
        match fs::metadata(self.path(LEDGER_FILE)) {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// Reset the live ledger after its content has been archived.
    pub fn truncate_ledger(&self) -> Result<()> {
        atomic_write(&self.path(LEDGER_FILE), "")
    }

    /// Replace the whole ledger, used by backup restore.
    pub fn replace_ledger(&self, content: &str) -> Result<()> {
        atomic_write(&self.path(LEDGER_FILE), content)
    }

    /// Append a consensus hash to the hash-history log. The `=` marker is
    /// what distinguishes block announcements from chatter on the relay, so
    /// it is stored with the hash.
    pub fn append_consensus_hash(&self, consensus_hash: &str) -> Result<()> {
        append_string(&self.path(HASH_HISTORY_FILE), &format!("={consensus_hash} "))
    }

    pub fn history_content(&self) -> Result<String> {
        read_to_string_or_empty(&self.path(HASH_HISTORY_FILE))
    }

    pub fn append_ledger_hash(&self, ledger_hash: &str) -> Result<()> {
        append_string(&self.path(LEDGER_HASHES_FILE), &format!("{ledger_hash} "))
    }

    pub fn ledger_hashes_content(&self) -> Result<String> {
        read_to_string_or_empty(&self.path(LEDGER_HASHES_FILE))
    }

    /// Record a wrap transaction's locked amount and destination address.
    pub fn append_bridge_record(
        &self,
        amount: &str,
        destination: &str,
        block_number: u64,
    ) -> Result<()> {
        append_string(
            &self.path(BRIDGE_FILE),
            &format!("\n{amount} --> {destination} at {block_number}"),
        )
    }

    pub fn bridge_content(&self) -> Result<String> {
        read_to_string_or_empty(&self.path(BRIDGE_FILE))
    }

    pub fn last_block_record(&self) -> Result<LastBlockRecord> {
        Ok(LastBlockRecord {
            block: read_to_string_or_empty(&self.path(LAST_BLOCK_FILE))?,
            miner: read_to_string_or_empty(&self.path(LAST_MINER_FILE))?,
            hash: read_to_string_or_empty(&self.path(LAST_HASH_FILE))?,
        })
    }

    /// Overwrite all three trackers as a unit.
    pub fn set_last_block_record(&self, record: &LastBlockRecord) -> Result<()> {
        atomic_write(&self.path(LAST_BLOCK_FILE), &record.block)?;
        atomic_write(&self.path(LAST_MINER_FILE), &record.miner)?;
        atomic_write(&self.path(LAST_HASH_FILE), &record.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_append_and_read_ledger() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();

        assert_eq!(store.ledger_content().unwrap(), "");
        store.append_entry("1.abc alice hash1 ").unwrap();
        store.append_entry("2.def bob hash2 ").unwrap();
        assert_eq!(
            store.ledger_content().unwrap(),
            "1.abc alice hash1 2.def bob hash2 "
        );
        assert_eq!(store.ledger_len().unwrap(), 34);
    }

    #[test]
    fn test_truncate_resets_ledger() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();
        store.append_entry("1.abc alice hash1 ").unwrap();
        store.truncate_ledger().unwrap();
        assert_eq!(store.ledger_content().unwrap(), "");
        assert_eq!(store.ledger_len().unwrap(), 0);
    }

    #[test]
    fn test_hash_logs_format() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();

        store.append_consensus_hash("aaaa").unwrap();
        store.append_consensus_hash("bbbb").unwrap();
        assert_eq!(store.history_content().unwrap(), "=aaaa =bbbb ");

        store.append_ledger_hash("cccc").unwrap();
        assert_eq!(store.ledger_hashes_content().unwrap(), "cccc ");
    }

    #[test]
    fn test_bridge_record_format() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();

        store.append_bridge_record("250", "SolAddr123", 42).unwrap();
        assert_eq!(
            store.bridge_content().unwrap(),
            "\n250 --> SolAddr123 at 42"
        );
    }

    #[test]
    fn test_last_block_trackers() {
        let dir = tempdir().unwrap();
        let store = LedgerStore::open(dir.path()).unwrap();

        assert_eq!(store.last_block_record().unwrap(), LastBlockRecord::default());

        let record = LastBlockRecord {
            block: "7.deadbeef".to_string(),
            miner: "alice".to_string(),
            hash: "cafe".to_string(),
        };
        store.set_last_block_record(&record).unwrap();
        assert_eq!(store.last_block_record().unwrap(), record);
    }
}
