// Block announcement lines as exchanged with peers:
//
//   {block} {miner} {hash} {tx payload...} ={consensus hash}
//
// The block token is the block content ("number.data"), the `=` marker is
// what separates announcements from ordinary relay chatter, and any embedded
// transaction payloads sit between the hash and the marker.

use crate::error::{LedgerError, Result};

/// A parsed peer announcement.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    block: String,
    miner: String,
    hash: String,
    /// Everything after the hash token, holding embedded transaction
    /// payloads and the consensus hash marker.
    remainder: String,
}

impl Announcement {
    pub fn parse(line: &str) -> Result<Announcement> {
        let mut parts = line.trim().splitn(4, ' ');
        let block = parts
            .next()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LedgerError::Parse("announcement has no block token".to_string()))?;
        let miner = parts
            .next()
            .ok_or_else(|| LedgerError::Parse("announcement has no miner token".to_string()))?;
        let hash = parts
            .next()
            .ok_or_else(|| LedgerError::Parse("announcement has no hash token".to_string()))?;
        let remainder = parts.next().unwrap_or_default();

        Ok(Announcement {
            block: block.to_string(),
            miner: miner.to_string(),
            hash: hash.to_string(),
            remainder: remainder.to_string(),
        })
    }

    pub fn block(&self) -> &str {
        &self.block
    }

    pub fn miner(&self) -> &str {
        &self.miner
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn block_number(&self) -> Result<u64> {
        self.block
            .split('.')
            .next()
            .unwrap_or_default()
            .parse::<u64>()
            .map_err(|_| {
                LedgerError::Parse(format!("announcement block token is not numbered: {}", self.block))
            })
    }

    /// Transaction payloads embedded in the announcement. A payload token is
    /// recognized by carrying the full delimiter set of the wire grammar.
    pub fn embedded_payloads(&self) -> Vec<String> {
        self.remainder
            .split(' ')
            .filter(|token| is_payload_token(token))
            .map(|token| token.to_string())
            .collect()
    }
}

/// A line is a block announcement when it carries both a numbered block
/// token and the consensus hash marker.
pub fn is_announcement_line(line: &str) -> bool {
    line.contains('.') && line.contains('=')
}

fn is_payload_token(token: &str) -> bool {
    ['&', '_', ',', '$'].iter().all(|d| token.contains(*d)) && token.contains(';')
}
