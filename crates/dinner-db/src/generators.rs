//! # Injected Sources of Time, Identity and Secrets
//!
//! The repository never calls `Utc::now()` or `Uuid::new_v4()` directly; it
//! asks these traits. Tests swap in deterministic versions.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use rand::RngCore;
use uuid::Uuid;

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of new opaque entity IDs.
pub trait IdGenerator: Send + Sync + fmt::Debug {
    fn new_id(&self) -> String;
}

/// Source of unguessable tokens (invitation tokens).
pub trait SecretGenerator: Send + Sync + fmt::Debug {
    fn generate_secret(&self) -> String;
}

// =============================================================================
// Defaults
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random v4 UUIDs in their hyphenated string form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn new_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Hex-encoded random bytes from the thread-local CSPRNG.
#[derive(Debug, Clone, Copy)]
pub struct RandomSecretGenerator {
    byte_len: usize,
}

/// Bytes of entropy in a default secret.
pub const DEFAULT_SECRET_BYTES: usize = 32;

impl RandomSecretGenerator {
    pub fn new(byte_len: usize) -> Self {
        RandomSecretGenerator { byte_len }
    }
}

impl Default for RandomSecretGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SECRET_BYTES)
    }
}

impl SecretGenerator for RandomSecretGenerator {
    fn generate_secret(&self) -> String {
        let mut bytes = vec![0u8; self.byte_len];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

// =============================================================================
// Deterministic
// =============================================================================

/// Hands out `{prefix}-1`, `{prefix}-2`, ... Useful when a test needs to
/// know an ID before the repository generates it.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        SequentialIdGenerator {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn new_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{n}", self.prefix)
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_ids_are_unique() {
        let ids: HashSet<String> = (0..100).map(|_| UuidGenerator.new_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_secret_is_hex_of_requested_length() {
        let secret = RandomSecretGenerator::default().generate_secret();
        assert_eq!(secret.len(), DEFAULT_SECRET_BYTES * 2);
        assert!(hex::decode(&secret).is_ok());
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIdGenerator::new("step");
        assert_eq!(ids.new_id(), "step-1");
        assert_eq!(ids.new_id(), "step-2");
    }
}
