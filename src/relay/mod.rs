//! Inbound relay line classification
//!
//! The node reads its events off a chat relay log. Mined-block lines come
//! from an upstream bot whose line layout is fixed, so they are recognized
//! by positional checks; transaction lines are user messages of the form
//! `<name> payload`. Everything else is chatter and ignored.

use crate::core::transaction::MAX_TX_LINE_LEN;

/// Byte positions of the upstream bot's block-line layout. These are
/// conformance constants of the relay format, not tunables.
const BLOCK_LINE_MIN_LEN: usize = 50;
const BLOCK_WS_1: usize = 41;
const BLOCK_UPPER_START: usize = 44;
const BLOCK_UPPER_END: usize = 46;
const BLOCK_WS_2: usize = 48;
const BLOCK_DIGIT: usize = 49;

/// Offset at which the block content ("number.data") begins.
const BLOCK_CONTENT_OFFSET: usize = 49;

#[derive(Debug, Clone, PartialEq)]
pub enum RelayLine {
    /// A mined-block event; carries the block content.
    Block(String),
    /// A user transaction message.
    Transaction { sender_name: String, payload: String },
    /// Anything else on the relay.
    Chatter,
}

/// Classify one raw relay line.
pub fn classify(line: &str) -> RelayLine {
    if let Some(content) = block_content(line) {
        return RelayLine::Block(content.to_string());
    }
    if let Some((sender_name, payload)) = transaction_parts(line) {
        return RelayLine::Transaction {
            sender_name: sender_name.to_string(),
            payload: payload.to_string(),
        };
    }
    RelayLine::Chatter
}

/// Block content of a mined-block line, when the line matches the upstream
/// layout at every checked position.
pub fn block_content(line: &str) -> Option<&str> {
    let bytes = line.as_bytes();
    if bytes.len() < BLOCK_LINE_MIN_LEN || !line.contains('.') {
        return None;
    }
    if !bytes[BLOCK_WS_1].is_ascii_whitespace() || !bytes[BLOCK_WS_2].is_ascii_whitespace() {
        return None;
    }
    if !bytes[BLOCK_UPPER_START..=BLOCK_UPPER_END]
        .iter()
        .all(|b| b.is_ascii_uppercase())
    {
        return None;
    }
    if !bytes[BLOCK_DIGIT].is_ascii_digit() {
        return None;
    }
    line.get(BLOCK_CONTENT_OFFSET..)
}

/// Sender name and payload of a `<name> payload` transaction line. Oversized
/// lines and lines with more than one `>` are dropped before parsing.
pub fn transaction_parts(line: &str) -> Option<(&str, &str)> {
    if line.len() > MAX_TX_LINE_LEN || line.matches('>').count() > 1 {
        return None;
    }
    let rest = line.strip_prefix('<')?;
    let (name, payload) = rest.split_once("> ")?;
    if name.is_empty() || !is_payload_shaped(payload) {
        return None;
    }
    Some((name, payload))
}

fn is_payload_shaped(payload: &str) -> bool {
    ['&', '_', ',', '$', '~', '%', ';']
        .iter()
        .all(|d| payload.contains(*d))
}
