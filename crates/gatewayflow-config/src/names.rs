//! Random resource names
//!
//! Each run provisions into freshly named resources so that concurrent or
//! leftover runs never collide. A fixed seed makes the names reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub struct ResourceNamer {
    rng: StdRng,
}

impl ResourceNamer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// `prefix` followed by random characters, exactly `max_len` long.
    ///
    /// A prefix longer than `max_len` is truncated.
    pub fn random_name(&mut self, prefix: &str, max_len: usize) -> String {
        let mut name: String = prefix.chars().take(max_len).collect();
        while name.chars().count() < max_len {
            let idx = self.rng.gen_range(0..ALPHABET.len());
            name.push(ALPHABET[idx] as char);
        }
        name
    }
}
