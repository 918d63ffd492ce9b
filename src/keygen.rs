use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// Keys are drawn from the 32 consecutive byte values starting at `a`.
pub const ALPHABET_START: u8 = b'a';
pub const ALPHABET_SIZE: u8 = 32;

/// A generated key. Only the key bytes are digested, there is no terminator.
#[derive(Clone, PartialEq, Eq)]
pub struct Key(Vec<u8>);

impl Key {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The last alphabet symbol is 0x80, which is not ASCII
        write!(f, "{}", self.0.escape_ascii())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key(\"{}\")", self)
    }
}

/// Per-worker key source. Seeded once from the run seed and the worker rank, so workers draw
/// different streams without sharing any generator state.
pub struct KeyGenerator {
    rng: ChaCha8Rng,
}

impl KeyGenerator {
    pub fn new(seed: u64, rank: usize) -> Self {
        KeyGenerator {
            rng: ChaCha8Rng::seed_from_u64(seed.wrapping_add(rank as u64)),
        }
    }

    pub fn generate(&mut self, length: usize) -> Key {
        let mut key = Key(vec![0; length]);
        self.fill(&mut key);
        key
    }

    /// Regenerates every symbol of `key` in place, keeping its length.
    pub fn fill(&mut self, key: &mut Key) {
        for symbol in key.0.iter_mut() {
            *symbol = ALPHABET_START + self.rng.gen_range(0..ALPHABET_SIZE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_alphabet(symbol: u8) -> bool {
        (ALPHABET_START..ALPHABET_START + ALPHABET_SIZE).contains(&symbol)
    }

    #[test]
    fn keys_have_requested_length_and_alphabet() {
        let mut keys = KeyGenerator::new(7, 0);
        for length in [0, 1, 31, 64] {
            for _ in 0..1000 {
                let key = keys.generate(length);
                assert_eq!(key.as_bytes().len(), length);
                assert!(key.as_bytes().iter().all(|&s| in_alphabet(s)));
            }
        }
    }

    #[test]
    fn whole_alphabet_is_reachable() {
        let mut keys = KeyGenerator::new(11, 3);
        let mut seen = [false; ALPHABET_SIZE as usize];
        let mut key = keys.generate(31);
        for _ in 0..200 {
            keys.fill(&mut key);
            for &s in key.as_bytes() {
                seen[(s - ALPHABET_START) as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn streams_depend_on_seed_and_rank() {
        let a = KeyGenerator::new(42, 0).generate(31);
        let b = KeyGenerator::new(42, 0).generate(31);
        let c = KeyGenerator::new(42, 1).generate(31);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_escapes_non_ascii_symbol() {
        let key = Key(vec![b'a', 0x80, b'z']);
        assert_eq!(key.to_string(), "a\\x80z");
    }
}
