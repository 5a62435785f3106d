// File helpers shared by the stores. Every committed state transition goes
// through atomic_write (write-temp-then-rename) so a crash mid-commit can
// never leave a half-written ledger behind.

use crate::error::{LedgerError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Replace the contents of `path` atomically: write to a sibling temp file,
/// flush, then rename over the target.
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)
            .map_err(|e| LedgerError::Io(format!("Failed to create {}: {e}", tmp.display())))?;
        file.write_all(contents.as_bytes())
            .map_err(|e| LedgerError::Io(format!("Failed to write {}: {e}", tmp.display())))?;
        file.sync_all()
            .map_err(|e| LedgerError::Io(format!("Failed to sync {}: {e}", tmp.display())))?;
    }
    fs::rename(&tmp, path)
        .map_err(|e| LedgerError::Io(format!("Failed to replace {}: {e}", path.display())))?;
    Ok(())
}

/// Append to a file. Appends are the one place we rely on the OS append mode
/// instead of rewrite-and-rename; the ledger is append-only by contract.
pub fn append_string(path: &Path, contents: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LedgerError::Io(format!("Failed to open {}: {e}", path.display())))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| LedgerError::Io(format!("Failed to append {}: {e}", path.display())))?;
    Ok(())
}

/// Read a file as a string; a missing file reads as empty. Absence of input
/// is "nothing to do this tick", never an error.
pub fn read_to_string_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(LedgerError::Io(format!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_atomic_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.txt");
        atomic_write(&path, "first").unwrap();
        atomic_write(&path, "second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
        // No temp file left behind
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_append_and_missing_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.txt");
        assert_eq!(read_to_string_or_empty(&path).unwrap(), "");
        append_string(&path, "a ").unwrap();
        append_string(&path, "b ").unwrap();
        assert_eq!(read_to_string_or_empty(&path).unwrap(), "a b ");
    }
}
