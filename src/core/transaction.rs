// Pending transactions as they arrive off the relay. The delimiter grammar
// is fixed by the external line format:
//
//   <name> wallet&amount_receiver,gas$proof~transition%next_key;
//
// The tokenizer below names the fields instead of slicing at hard-coded
// offsets, but the delimiter set and their order are conformance constants.

use crate::error::{LedgerError, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Reserved receiver wallet for cross-chain wrap transactions.
pub const BRIDGE_WALLET: &str = "21000001";

/// Prefix carried in the transition field of a wrap transaction; the rest of
/// the field is the destination-chain address.
pub const BRIDGE_TAG: &str = "KMC";

/// Inbound transaction lines longer than this are dropped before parsing.
pub const MAX_TX_LINE_LEN: usize = 303;

/// A transaction admitted off the relay, not yet committed to a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTransaction {
    sender_name: String,
    sender_wallet: String,
    amount: String,
    receiver_wallet: String,
    gas: String,
    /// Revealed hash-chain proof.
    proof: String,
    /// Batch transition value, or the bridge tag + destination for wraps.
    transition: String,
    /// Next committed public key claimed by the sender.
    next_key: String,
    /// The exact payload as received; committed verbatim into ledger entries.
    payload: String,
}

impl PendingTransaction {
    /// Parse the delimiter payload (everything after `<name> `).
    pub fn parse(sender_name: &str, payload: &str) -> Result<PendingTransaction> {
        let (sender_wallet, rest) = split_once_at(payload, '&')?;
        let (amount, rest) = split_once_at(rest, '_')?;
        let (receiver_wallet, rest) = split_once_at(rest, ',')?;
        let (gas, rest) = split_once_at(rest, '$')?;
        let (proof, rest) = split_once_at(rest, '~')?;
        let (transition, rest) = split_once_at(rest, '%')?;
        let (next_key, _) = split_once_at(rest, ';')?;

        Ok(PendingTransaction {
            sender_name: sender_name.to_string(),
            sender_wallet: sender_wallet.to_string(),
            amount: amount.to_string(),
            receiver_wallet: receiver_wallet.to_string(),
            gas: gas.to_string(),
            proof: proof.to_string(),
            transition: transition.to_string(),
            next_key: next_key.to_string(),
            payload: payload.to_string(),
        })
    }

    /// Field-grammar validation, independent of the hash-chain proof check.
    /// Wallets, amount and gas must be non-empty pure-digit strings with no
    /// leading zero and a non-zero value.
    pub fn validate_grammar(&self) -> Result<()> {
        for (field, value) in [
            ("sender wallet", &self.sender_wallet),
            ("amount", &self.amount),
            ("receiver wallet", &self.receiver_wallet),
            ("gas", &self.gas),
        ] {
            validate_numeric_field(field, value)?;
        }
        Ok(())
    }

    pub fn sender_name(&self) -> &str {
        &self.sender_name
    }

    pub fn sender_wallet(&self) -> &str {
        &self.sender_wallet
    }

    pub fn receiver_wallet(&self) -> &str {
        &self.receiver_wallet
    }

    pub fn proof(&self) -> &str {
        &self.proof
    }

    pub fn transition(&self) -> &str {
        &self.transition
    }

    pub fn next_key(&self) -> &str {
        &self.next_key
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Amount in base units. Grammar validation must have passed.
    pub fn amount_units(&self) -> Result<BigUint> {
        parse_units("amount", &self.amount)
    }

    /// Gas in base units. Gas is burned, never credited.
    pub fn gas_units(&self) -> Result<BigUint> {
        parse_units("gas", &self.gas)
    }

    /// A wrap transaction locks coins for an external chain instead of
    /// crediting a local receiver.
    pub fn is_wrap(&self) -> bool {
        self.receiver_wallet == BRIDGE_WALLET && self.transition.starts_with(BRIDGE_TAG)
    }

    /// Destination-chain address of a wrap transaction.
    pub fn bridge_destination(&self) -> Option<&str> {
        if self.is_wrap() {
            Some(&self.transition[BRIDGE_TAG.len()..])
        } else {
            None
        }
    }

    /// Raw amount string, used by the bridge ledger record.
    pub fn amount_str(&self) -> &str {
        &self.amount
    }
}

fn split_once_at(input: &str, delimiter: char) -> Result<(&str, &str)> {
    input.split_once(delimiter).ok_or_else(|| {
        LedgerError::Parse(format!("missing '{delimiter}' delimiter in transaction payload"))
    })
}

fn validate_numeric_field(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(LedgerError::MalformedTransaction(format!("{field} is empty")));
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::MalformedTransaction(format!(
            "{field} is not numeric"
        )));
    }
    if value.starts_with('0') {
        // Covers both the literal zero and zero-padded values
        return Err(LedgerError::MalformedTransaction(format!(
            "{field} is zero or has a leading zero"
        )));
    }
    Ok(())
}

fn parse_units(field: &str, value: &str) -> Result<BigUint> {
    BigUint::parse_bytes(value.as_bytes(), 10)
        .ok_or_else(|| LedgerError::MalformedTransaction(format!("{field} is not numeric")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> String {
        "15&250_33,5$aaaa~bbbb%cccc;".to_string()
    }

    #[test]
    fn test_parse_fields() {
        let tx = PendingTransaction::parse("alice", &sample_payload()).unwrap();
        assert_eq!(tx.sender_wallet(), "15");
        assert_eq!(tx.amount_str(), "250");
        assert_eq!(tx.receiver_wallet(), "33");
        assert_eq!(tx.gas_units().unwrap(), BigUint::from(5u32));
        assert_eq!(tx.proof(), "aaaa");
        assert_eq!(tx.transition(), "bbbb");
        assert_eq!(tx.next_key(), "cccc");
        assert_eq!(tx.payload(), sample_payload());
    }

    #[test]
    fn test_parse_missing_delimiter() {
        let result = PendingTransaction::parse("alice", "15&250_33,5$aaaa~bbbb%cccc");
        assert!(matches!(result, Err(LedgerError::Parse(_))));
    }

    #[test]
    fn test_grammar_rejects_zero_and_leading_zero() {
        let zero = PendingTransaction::parse("a", "15&0_33,5$p~t%k;").unwrap();
        assert!(matches!(
            zero.validate_grammar(),
            Err(LedgerError::MalformedTransaction(_))
        ));

        let padded = PendingTransaction::parse("a", "015&250_33,5$p~t%k;").unwrap();
        assert!(matches!(
            padded.validate_grammar(),
            Err(LedgerError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_grammar_rejects_non_numeric() {
        let tx = PendingTransaction::parse("a", "15&2x50_33,5$p~t%k;").unwrap();
        assert!(matches!(
            tx.validate_grammar(),
            Err(LedgerError::MalformedTransaction(_))
        ));
    }

    #[test]
    fn test_wrap_detection() {
        let payload = format!("15&250_{BRIDGE_WALLET},5$p~{BRIDGE_TAG}SolAddr123%k;");
        let tx = PendingTransaction::parse("a", &payload).unwrap();
        assert!(tx.is_wrap());
        assert_eq!(tx.bridge_destination(), Some("SolAddr123"));

        // Same receiver without the tag is a regular transfer
        let plain = PendingTransaction::parse("a", &format!("15&250_{BRIDGE_WALLET},5$p~t%k;"))
            .unwrap();
        assert!(!plain.is_wrap());
    }
}
