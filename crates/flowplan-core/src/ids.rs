//! Identifier generation.
//!
//! Planning code never mints identifiers itself; it asks an injected
//! [`IdGenerator`] so tests can use a predictable sequence.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Source of fresh record identifiers.
pub trait IdGenerator: Send + Sync {
    /// A new identifier starting with `prefix` followed by a dash.
    fn next_id(&self, prefix: &str) -> String;
}

/// Monotonic counter: `goal-1`, `ev-2`, `ev-3`, ...
///
/// The counter is shared across prefixes.
#[derive(Debug, Default)]
pub struct SequentialIds {
    counter: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue counting after `last`.
    pub fn starting_after(last: u64) -> Self {
        Self {
            counter: AtomicU64::new(last),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}-{n}")
    }
}

/// Random v4 UUIDs in their simple (dashless) form.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4().simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_ids_count_across_prefixes() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id("goal"), "goal-1");
        assert_eq!(ids.next_id("ev"), "ev-2");
        assert_eq!(ids.next_id("ev"), "ev-3");
    }

    #[test]
    fn sequential_ids_resume() {
        let ids = SequentialIds::starting_after(41);
        assert_eq!(ids.next_id("ev"), "ev-42");
    }

    #[test]
    fn uuid_ids_are_unique_and_dashless_after_prefix() {
        let ids = UuidIds;
        let a = ids.next_id("goal");
        let b = ids.next_id("goal");
        assert_ne!(a, b);
        let suffix = a.strip_prefix("goal-").unwrap();
        assert_eq!(suffix.len(), 32);
        assert!(!suffix.contains('-'));
    }
}
