//! Seeds and configuration for rapid bitstreams.

use crate::{error::*, stream::*};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable consulted by [`Config::from_env`].
pub const SEED_ENV_VAR: &str = "RAPID_SEED";

static SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Seed for a random bitstream.
///
/// The same seed always yields the same entropy, so a seed is all that is
/// needed to reproduce a failure found by a random stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed(pub u64);

impl Seed {
    /// Create a new seed value.
    pub fn new(value: u64) -> Self {
        Seed(value)
    }

    /// Get the inner seed value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// Derive a fresh seed from the wall clock plus a process-wide counter,
    /// so calls landing on the same clock tick still get different seeds.
    pub fn random() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let counter = SEED_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
        let seed = Seed(nanos.wrapping_add(counter));
        tracing::debug!(seed = seed.0, counter, "derived random seed");
        seed
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Seed(value)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seed({})", self.0)
    }
}

/// Configuration for building bitstreams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Keep drawn words and group records so the run can be shrunk.
    pub persist: bool,

    /// Seed for random streams; `None` derives a unique one per stream.
    pub seed: Option<Seed>,

    /// Maximum number of attempts a filtering generator makes.
    pub filter_tries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            persist: false,
            seed: None,
            filter_tries: 100,
        }
    }
}

impl Config {
    /// Read overrides from the environment on top of the defaults.
    ///
    /// `RAPID_SEED` pins the seed of every random stream built from this
    /// config, which is how a reported failure is reproduced.
    pub fn from_env() -> Result<Self> {
        let config = Config::default();
        match std::env::var(SEED_ENV_VAR) {
            Ok(raw) => config.with_seed_str(&raw),
            Err(_) => Ok(config),
        }
    }

    /// Create a new config that records entropy for shrinking.
    pub fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Create a new config with a fixed seed.
    pub fn with_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seed = Some(seed.into());
        self
    }

    /// Create a new config with the given filter attempt limit.
    pub fn with_filter_tries(mut self, tries: usize) -> Self {
        self.filter_tries = tries;
        self
    }

    fn with_seed_str(self, raw: &str) -> Result<Self> {
        let value = raw
            .trim()
            .parse::<u64>()
            .map_err(|e| RapidError::InvalidConfig {
                message: format!("{SEED_ENV_VAR}={raw:?} is not a valid seed: {e}"),
            })?;
        Ok(self.with_seed(value))
    }

    /// Build a random bitstream, using the fixed seed if one is set.
    pub fn random_stream(&self) -> RandomBitStream {
        let seed = self.seed.unwrap_or_else(Seed::random);
        RandomBitStream::new(seed, self.persist)
    }

    /// Build a bitstream replaying `buf`.
    pub fn buffered_stream(&self, buf: Vec<u64>) -> BufBitStream {
        BufBitStream::new(buf, self.persist)
    }
}
