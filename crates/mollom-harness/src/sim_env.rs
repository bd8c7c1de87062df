//! Simulated environment.

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use chrono::{DateTime, TimeZone, Utc};
use mollom_core::Environment;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Manual clock plus seeded RNG.
///
/// Clones share both, so a test can hold one handle and advance time under
/// a client holding another. Time only moves when [`SimEnv::advance`] is
/// called.
#[derive(Clone)]
pub struct SimEnv {
    seed: u64,
    clock: Arc<Mutex<DateTime<Utc>>>,
    rng: Arc<Mutex<ChaCha8Rng>>,
}

impl SimEnv {
    /// Start of simulated time: 2012-02-08T00:00:00Z.
    pub const EPOCH_SECS: i64 = 1_328_659_200;

    /// Environment seeded with `seed`, starting at [`Self::EPOCH_SECS`].
    pub fn with_seed(seed: u64) -> Self {
        let start = Utc.timestamp_opt(Self::EPOCH_SECS, 0).single().unwrap_or_default();
        Self {
            seed,
            clock: Arc::new(Mutex::new(start)),
            rng: Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(seed))),
        }
    }

    /// Seed this environment was built with.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
        let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
        *clock = clock.checked_add_signed(by).unwrap_or(*clock);
    }
}

impl Environment for SimEnv {
    fn now(&self) -> DateTime<Utc> {
        *self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        self.rng.lock().unwrap_or_else(PoisonError::into_inner).fill_bytes(buffer);
    }
}

impl std::fmt::Debug for SimEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimEnv").field("seed", &self.seed).field("now", &self.now()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_bytes() {
        let a = SimEnv::with_seed(7);
        let b = SimEnv::with_seed(7);

        assert_eq!(a.random_u64(), b.random_u64());
        assert_ne!(a.random_u64(), SimEnv::with_seed(8).random_u64());
    }

    #[test]
    fn clones_share_the_clock() {
        let env = SimEnv::with_seed(0);
        let start = env.now();

        env.clone().advance(Duration::from_secs(3600));

        assert_eq!((env.now() - start).num_seconds(), 3600);
    }
}
