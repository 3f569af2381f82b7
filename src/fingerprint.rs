//! Source-phrase fingerprints used as table keys.
//!
//! Both functions hash with XXH3-64, whose output does not depend on the
//! host, so keys computed by the builder match keys computed by the decoder.

use xxhash_rust::xxh3::{xxh3_64, Xxh3};

/// Fingerprint of a whitespace-normalized phrase.
///
/// Runs of whitespace collapse to one space and leading/trailing whitespace
/// is ignored, so `"das  haus"` and `"das haus"` share a key.
pub fn fingerprint_phrase(phrase: &str) -> u64 {
    let mut hasher = Xxh3::new();
    for (i, word) in phrase.split_whitespace().enumerate() {
        if i > 0 {
            hasher.update(b" ");
        }
        hasher.update(word.as_bytes());
    }
    hasher.digest()
}

/// Fingerprint of a token-id sequence.
pub fn fingerprint_tokens(tokens: &[u32]) -> u64 {
    let mut hasher = Xxh3::new();
    for t in tokens {
        hasher.update(&t.to_le_bytes());
    }
    hasher.digest()
}

/// Home-slot hash for a key already in fingerprint form.
#[inline]
pub(crate) fn slot_hash(key: u64) -> u64 {
    xxh3_64(&key.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_is_normalized() {
        let k = fingerprint_phrase("das haus");
        assert_eq!(fingerprint_phrase("das  haus"), k);
        assert_eq!(fingerprint_phrase("  das\thaus \n"), k);
        assert_ne!(fingerprint_phrase("dashaus"), k);
        assert_ne!(fingerprint_phrase("das haus ist"), k);
    }

    #[test]
    fn phrase_matches_plain_xxh3_of_normalized_text() {
        assert_eq!(fingerprint_phrase(" a  b "), xxh3_64(b"a b"));
        assert_eq!(fingerprint_phrase(""), xxh3_64(b""));
    }

    #[test]
    fn tokens_are_order_sensitive() {
        assert_eq!(fingerprint_tokens(&[1, 2, 3]), fingerprint_tokens(&[1, 2, 3]));
        assert_ne!(fingerprint_tokens(&[1, 2, 3]), fingerprint_tokens(&[3, 2, 1]));
        assert_ne!(fingerprint_tokens(&[1]), fingerprint_tokens(&[1, 0]));
    }

    #[test]
    fn no_collisions_on_small_vocabulary() {
        let mut seen = std::collections::HashSet::new();
        for a in 0..200u32 {
            for b in 0..200u32 {
                assert!(seen.insert(fingerprint_tokens(&[a, b])));
            }
        }
    }
}
