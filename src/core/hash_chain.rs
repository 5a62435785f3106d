// Hash-chain primitives - every other component composes these three
// functions. The wire and persistence formats carry hashes as exactly 64
// lowercase hex characters, so the hex rendering here is part of the
// protocol, not a display convenience.

use crate::utils::sha256_digest;
use data_encoding::HEXLOWER;

/// Length of a rendered hash on the wire and in persisted state.
pub const HASH_HEX_LEN: usize = 64;

/// SHA-256 over the UTF-8 bytes of `input`, rendered as 64 lowercase hex
/// characters. HEXLOWER always emits two characters per byte, which gives the
/// zero-left-padded form the wire format requires.
pub fn hash(input: &str) -> String {
    HEXLOWER.encode(&sha256_digest(input.as_bytes()))
}

/// `hash` applied twice. Snapshot hashes over file contents use this form.
pub fn double_hash(input: &str) -> String {
    hash(&hash(input))
}

/// Apply `hash` to `seed` n times sequentially; `iterate(seed, 0) == seed`.
///
/// Only the intermediate string round-trips through hex because each step
/// hashes the hex rendering of the previous step, exactly as committed keys
/// were generated.
pub fn iterate(seed: &str, n: u32) -> String {
    let mut value = seed.to_string();
    for _ in 0..n {
        value = hash(&value);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_hash_empty_string() {
        let digest = hash("");
        assert_eq!(digest, EMPTY_SHA256);
        assert_eq!(digest.len(), HASH_HEX_LEN);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_double_hash_is_hash_of_hash() {
        assert_eq!(double_hash("seed"), hash(&hash("seed")));
    }

    #[test]
    fn test_iterate_zero_is_identity() {
        assert_eq!(iterate("anything", 0), "anything");
    }

    #[test]
    fn test_iterate_composes() {
        assert_eq!(iterate("seed", 3), hash(&hash(&hash("seed"))));
        assert_eq!(iterate(&iterate("seed", 2), 5), iterate("seed", 7));
    }
}
