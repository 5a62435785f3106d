// Pre-commit snapshots of committed state. A snapshot is taken before every
// block commit; when consensus later finds the local chain diverged on a
// malformed block, the snapshot is restored before the agreed block is
// applied.

use crate::core::account::Account;
use crate::error::{LedgerError, Result};
use crate::storage::{AccountStore, LedgerStore};
use crate::utils::{atomic_write, read_to_string_or_empty};
use std::fs;
use std::path::{Path, PathBuf};

const ACCOUNTS_BACKUP: &str = "accounts.json";
const LEDGER_BACKUP: &str = "ledger.bak";

pub struct BackupManager {
    dir: PathBuf,
}

impl BackupManager {
    pub fn open(dir: &Path) -> Result<BackupManager> {
        fs::create_dir_all(dir)?;
        Ok(BackupManager {
            dir: dir.to_path_buf(),
        })
    }

    /// Capture accounts and the live ledger. Each file is replaced
    /// atomically, so a crash mid-snapshot leaves the previous snapshot
    /// intact. Accounts go out as JSON so an operator can inspect a
    /// snapshot directly.
    pub fn snapshot(&self, accounts: &AccountStore, ledger: &LedgerStore) -> Result<()> {
        let records = accounts.export()?;
        let encoded = serde_json::to_string(&records)
            .map_err(|e| LedgerError::Serialization(e.to_string()))?;
        atomic_write(&self.dir.join(ACCOUNTS_BACKUP), &encoded)?;
        atomic_write(&self.dir.join(LEDGER_BACKUP), &ledger.ledger_content()?)
    }

    /// Roll committed state back to the last snapshot. A missing snapshot
    /// restores to empty state.
    pub fn restore(&self, accounts: &AccountStore, ledger: &LedgerStore) -> Result<()> {
        let encoded = read_to_string_or_empty(&self.dir.join(ACCOUNTS_BACKUP))?;
        let records: Vec<Account> = if encoded.is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&encoded)
                .map_err(|e| LedgerError::Serialization(e.to_string()))?
        };
        accounts.import(&records)?;
        ledger.replace_ledger(&read_to_string_or_empty(&self.dir.join(LEDGER_BACKUP))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_and_restore() {
        let dir = tempdir().unwrap();
        let accounts = AccountStore::open(&dir.path().join("accounts")).unwrap();
        let ledger = LedgerStore::open(&dir.path().join("ledger")).unwrap();
        let backup = BackupManager::open(&dir.path().join("backup")).unwrap();

        accounts
            .create("alice", "17", BigUint::from(100u32), "o", "a")
            .unwrap();
        ledger.append_entry("1.abc alice hash1 ").unwrap();
        backup.snapshot(&accounts, &ledger).unwrap();

        // Mutate past the snapshot
        accounts.credit("alice", &BigUint::from(900u32)).unwrap();
        accounts
            .create("bob", "42", BigUint::from(5u32), "o", "b")
            .unwrap();
        ledger.append_entry("2.def bob hash2 ").unwrap();

        backup.restore(&accounts, &ledger).unwrap();

        let alice = accounts.get("alice").unwrap().unwrap();
        assert_eq!(alice.balance(), &BigUint::from(100u32));
        assert!(accounts.get("bob").unwrap().is_none());
        assert_eq!(ledger.ledger_content().unwrap(), "1.abc alice hash1 ");
    }

    #[test]
    fn test_restore_without_snapshot_empties_state() {
        let dir = tempdir().unwrap();
        let accounts = AccountStore::open(&dir.path().join("accounts")).unwrap();
        let ledger = LedgerStore::open(&dir.path().join("ledger")).unwrap();
        let backup = BackupManager::open(&dir.path().join("backup")).unwrap();

        accounts
            .create("alice", "17", BigUint::from(100u32), "o", "a")
            .unwrap();
        backup.restore(&accounts, &ledger).unwrap();
        assert!(accounts.is_empty());
    }
}
