//! Environment abstraction for deterministic testing.
//!
//! The `Environment` trait decouples signing and cache expiry from system
//! resources (wall clock, randomness). Production uses the OS clock and
//! entropy; the harness uses a manual clock and a seeded RNG so every failure
//! replays exactly.
//!
//! # Invariants
//!
//! - Determinism: given the same seed, `random_bytes()` produces the same
//!   sequence
//! - Isolation: implementations must not share global state

use chrono::{DateTime, Utc};

/// Clock and randomness.
///
/// Wall-clock time is required rather than a monotonic instant: Mollom
/// validates request timestamps against its own clock, and cached server
/// lists outlive the process when stored on disk.
pub trait Environment: Clone + Send + Sync + 'static {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;

    /// Fills the provided buffer with random bytes.
    ///
    /// # Security
    ///
    /// Production implementations MUST use OS entropy (`getrandom`). Nonces
    /// derived from these bytes are what stop request replay.
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }
}
