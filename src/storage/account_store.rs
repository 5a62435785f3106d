// Keyed account storage on sled. Every mutation is a keyed record update,
// but the canonical textual flattening is preserved because the accounts
// snapshot hash is computed over it.

use crate::core::account::Account;
use crate::error::{LedgerError, Result};
use crate::utils::{deserialize, serialize};
use num_bigint::BigUint;
use sled::{Db, Tree};
use std::path::Path;

const ACCOUNTS_TREE: &str = "accounts";

/// Exclusive owner of all account records.
pub struct AccountStore {
    #[allow(dead_code)]
    db: Db,
    tree: Tree,
}

impl AccountStore {
    pub fn open(path: &Path) -> Result<AccountStore> {
        let db = sled::open(path)
            .map_err(|e| LedgerError::Storage(format!("Failed to open account store: {e}")))?;
        let tree = db
            .open_tree(ACCOUNTS_TREE)
            .map_err(|e| LedgerError::Storage(format!("Failed to open accounts tree: {e}")))?;
        Ok(AccountStore { db, tree })
    }

    pub fn get(&self, name: &str) -> Result<Option<Account>> {
        match self.tree.get(name.as_bytes())? {
            Some(bytes) => Ok(Some(deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn get_required(&self, name: &str) -> Result<Account> {
        self.get(name)?
            .ok_or_else(|| LedgerError::Account(format!("Unknown account: {name}")))
    }

    fn put(&self, account: &Account) -> Result<()> {
        let bytes = serialize(account)?;
        self.tree.insert(account.name().as_bytes(), bytes)?;
        self.tree.flush()?;
        Ok(())
    }

    /// Create a new account record. Names are unique; creating over an
    /// existing name is a bug in the caller.
    pub fn create(
        &self,
        name: &str,
        wallet: &str,
        initial_balance: BigUint,
        origin_block: &str,
        anchor: &str,
    ) -> Result<Account> {
        if self.tree.contains_key(name.as_bytes())? {
            return Err(LedgerError::Account(format!(
                "Account already exists: {name}"
            )));
        }
        let account = Account::new(name, wallet, initial_balance, origin_block, anchor);
        self.put(&account)?;
        Ok(account)
    }

    pub fn credit(&self, name: &str, amount: &BigUint) -> Result<()> {
        let mut account = self.get_required(name)?;
        account.set_balance(account.balance() + amount);
        self.put(&account)
    }

    /// Debit fails without mutating when the balance is insufficient; the
    /// balance invariant (never negative) is enforced here, not by callers.
    pub fn debit(&self, name: &str, amount: &BigUint) -> Result<()> {
        let mut account = self.get_required(name)?;
        if amount > account.balance() {
            return Err(LedgerError::InsufficientBalance {
                required: amount.to_string(),
                available: account.balance().to_string(),
            });
        }
        account.set_balance(account.balance() - amount);
        self.put(&account)
    }

    pub fn advance_tx_counter(&self, name: &str) -> Result<()> {
        let mut account = self.get_required(name)?;
        account.bump_tx_counter();
        self.put(&account)
    }

    pub fn rotate_anchor(&self, name: &str, new_anchor: &str) -> Result<()> {
        let mut account = self.get_required(name)?;
        account.set_anchor(new_anchor.to_string());
        self.put(&account)
    }

    pub fn record_mined_block(&self, name: &str) -> Result<()> {
        let mut account = self.get_required(name)?;
        account.bump_blocks_mined();
        self.put(&account)
    }

    /// Resolve an account by its wallet address. Linear scan; the store is
    /// small (one record per participant).
    pub fn find_by_wallet(&self, wallet: &str) -> Result<Option<Account>> {
        for entry in self.tree.iter() {
            let (_, bytes) = entry?;
            let account: Account = deserialize(&bytes)?;
            if account.wallet() == wallet {
                return Ok(Some(account));
            }
        }
        Ok(None)
    }

    /// Canonical flattening of the whole store, in key order (sled iterates
    /// sorted), as fed to the accounts snapshot hash.
    pub fn flatten(&self) -> Result<String> {
        let mut out = String::new();
        for entry in self.tree.iter() {
            let (_, bytes) = entry?;
            let account: Account = deserialize(&bytes)?;
            out.push_str(&account.flatten());
        }
        Ok(out)
    }

    /// All records, for backup snapshots.
    pub fn export(&self) -> Result<Vec<Account>> {
        let mut accounts = Vec::new();
        for entry in self.tree.iter() {
            let (_, bytes) = entry?;
            accounts.push(deserialize(&bytes)?);
        }
        Ok(accounts)
    }

    /// Replace the whole store with a snapshot, for restore.
    pub fn import(&self, accounts: &[Account]) -> Result<()> {
        self.tree.clear()?;
        for account in accounts {
            let bytes = serialize(account)?;
            self.tree.insert(account.name().as_bytes(), bytes)?;
        }
        self.tree.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, AccountStore) {
        let dir = tempdir().unwrap();
        let store = AccountStore::open(&dir.path().join("accounts")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_create_and_get() {
        let (_dir, store) = store();
        store
            .create("alice", "17", BigUint::from(100u32), "17.origin", "abcd")
            .unwrap();
        let account = store.get("alice").unwrap().unwrap();
        assert_eq!(account.wallet(), "17");
        assert_eq!(account.balance(), &BigUint::from(100u32));
        assert!(store.get("bob").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_create_fails() {
        let (_dir, store) = store();
        store
            .create("alice", "17", BigUint::from(1u32), "o", "a")
            .unwrap();
        assert!(store
            .create("alice", "18", BigUint::from(2u32), "o", "a")
            .is_err());
    }

    #[test]
    fn test_debit_insufficient_leaves_balance() {
        let (_dir, store) = store();
        store
            .create("alice", "17", BigUint::from(10u32), "o", "a")
            .unwrap();

        let result = store.debit("alice", &BigUint::from(11u32));
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { .. })
        ));
        let account = store.get("alice").unwrap().unwrap();
        assert_eq!(account.balance(), &BigUint::from(10u32));
    }

    #[test]
    fn test_credit_debit_round() {
        let (_dir, store) = store();
        store
            .create("alice", "17", BigUint::from(10u32), "o", "a")
            .unwrap();
        store.credit("alice", &BigUint::from(5u32)).unwrap();
        store.debit("alice", &BigUint::from(12u32)).unwrap();
        let account = store.get("alice").unwrap().unwrap();
        assert_eq!(account.balance(), &BigUint::from(3u32));
    }

    #[test]
    fn test_find_by_wallet() {
        let (_dir, store) = store();
        store
            .create("alice", "17", BigUint::from(1u32), "o", "a")
            .unwrap();
        store
            .create("bob", "42", BigUint::from(1u32), "o", "a")
            .unwrap();
        assert_eq!(
            store.find_by_wallet("42").unwrap().unwrap().name(),
            "bob"
        );
        assert!(store.find_by_wallet("99").unwrap().is_none());
    }

    #[test]
    fn test_flatten_key_order() {
        let (_dir, store) = store();
        store
            .create("zed", "2", BigUint::from(1u32), "o", "z")
            .unwrap();
        store
            .create("amy", "1", BigUint::from(1u32), "o", "a")
            .unwrap();
        let flat = store.flatten().unwrap();
        let amy = flat.find("amy").unwrap();
        let zed = flat.find("zed").unwrap();
        assert!(amy < zed);
    }

    #[test]
    fn test_export_import_round_trip() {
        let (_dir, store) = store();
        store
            .create("alice", "17", BigUint::from(100u32), "o", "a")
            .unwrap();
        let snapshot = store.export().unwrap();

        store.credit("alice", &BigUint::from(50u32)).unwrap();
        store.import(&snapshot).unwrap();

        let account = store.get("alice").unwrap().unwrap();
        assert_eq!(account.balance(), &BigUint::from(100u32));
    }
}
