// Cold storage for ledger content. When the live ledger crosses the rollover
// threshold its content is moved into a fixed layout of shard directories,
// filling each slot file up to the byte cap before moving on. Running out of
// slots is fatal: the node must not keep committing blocks it can no longer
// archive.

use crate::error::{LedgerError, Result};
use crate::utils::append_string;
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed number of shard directories, scanned in order.
pub const SHARD_DIR_COUNT: usize = 12;

/// A slot file at or above this size is full.
pub const SHARD_FILE_CAP: u64 = 100_000_000;

/// Slots enumerated per directory.
pub const SHARD_MAX_FILES: usize = 100;

pub struct ArchiveManager {
    base: PathBuf,
}

impl ArchiveManager {
    pub fn open(base: &Path) -> Result<ArchiveManager> {
        for index in 0..SHARD_DIR_COUNT {
            fs::create_dir_all(base.join(shard_dir_name(index)))?;
        }
        Ok(ArchiveManager {
            base: base.to_path_buf(),
        })
    }

    /// Archive one rollover's worth of ledger content into the first slot
    /// with room. Returns the shard directory and slot file the content
    /// landed in.
    pub fn archive(&self, content: &str) -> Result<(usize, PathBuf)> {
        // Text recovered from damaged relay lines can carry replacement
        // characters; they never belong in archived ledger content
        let cleaned: String = content.chars().filter(|&c| c != '\u{FFFD}').collect();

        for dir_index in 0..SHARD_DIR_COUNT {
            let dir = self.base.join(shard_dir_name(dir_index));
            if let Some(slot) = open_slot(&dir)? {
                append_string(&slot, &cleaned)?;
                log::info!(
                    "Archived {} bytes into {}",
                    cleaned.len(),
                    slot.display()
                );
                return Ok((dir_index, slot));
            }
        }
        Err(LedgerError::CapacityExhausted)
    }
}

fn shard_dir_name(index: usize) -> String {
    format!("shard_{:02}", index + 1)
}

/// First slot file in the directory below the byte cap, in name order. A new
/// slot is created once every existing one is full, until the directory holds
/// its maximum number of slots.
fn open_slot(dir: &Path) -> Result<Option<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    files.truncate(SHARD_MAX_FILES);

    for file in &files {
        if fs::metadata(file)?.len() < SHARD_FILE_CAP {
            return Ok(Some(file.clone()));
        }
    }
    if files.len() < SHARD_MAX_FILES {
        return Ok(Some(dir.join(format!("slot_{:03}.txt", files.len()))));
    }
    Ok(None)
}
