//! Pull-request branch names

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PREFIX: &str = "chart-releaser-";
const SUFFIX_LEN: usize = 16;
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generates `chart-releaser-<16 random [a-z0-9]>` branch names
#[derive(Debug, Clone)]
pub struct BranchNamer {
    rng: StdRng,
}

impl Default for BranchNamer {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

impl BranchNamer {
    /// Seeded from the operating system
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic names for a fixed seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_name(&mut self) -> String {
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| ALPHABET[self.rng.random_range(0..ALPHABET.len())] as char)
            .collect();
        format!("{}{}", PREFIX, suffix)
    }
}
