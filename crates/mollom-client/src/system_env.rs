//! Production Environment implementation using system time and RNG.
//!
//! This module provides `SystemEnv`, the production implementation of the
//! `Environment` trait that uses the system wall clock and OS entropy.

use chrono::{DateTime, Utc};
use mollom_core::Environment;

/// Production environment using system time and cryptographic RNG.
///
/// # Security
///
/// The RNG uses `getrandom` which provides OS-level cryptographic randomness.
/// Request nonces are drawn from it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).unwrap_or_else(|e| {
            // Never expected on supported platforms. Zeros keep the call
            // alive; the server will reject a replayed nonce.
            tracing::error!("getrandom failed: {}", e);
            buffer.fill(0);
        });
    }
}
