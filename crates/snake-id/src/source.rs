use std::sync::atomic::{AtomicI64, Ordering};

/// A capability producing the next number for one field of an id.
///
/// Generators pull their timestamp, shard and sequence from three independent
/// sources, so each can be swapped out in configuration or tests. Any
/// `Fn() -> i64` closure is a number source as well.
pub trait NumberSource: Send + Sync {
    fn next_number(&self) -> i64;
}

impl<F> NumberSource for F
where
    F: Fn() -> i64 + Send + Sync,
{
    fn next_number(&self) -> i64 {
        self()
    }
}

/// A source that always returns the same number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedNumber(pub i64);

impl NumberSource for FixedNumber {
    fn next_number(&self) -> i64 {
        self.0
    }
}

/// A concurrency-safe incrementing counter, usable as a sequence source.
///
/// Each call returns the current value and advances it by one. The value
/// wraps around on overflow; generators only keep its low bits anyway.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    counter: AtomicI64,
}

impl AtomicCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a counter starting from a specific value.
    pub fn with_offset(offset: i64) -> Self {
        Self {
            counter: AtomicI64::new(offset),
        }
    }
}

impl NumberSource for AtomicCounter {
    fn next_number(&self) -> i64 {
        self.counter.fetch_add(1, Ordering::Relaxed)
    }
}

/// Keeps the low `width` bits of `i`.
///
/// Used to squeeze an arbitrarily large shard number into the shard field.
/// The truncation is lossy: two machines whose numbers agree on the low bits
/// end up with the same shard id.
pub fn fold(i: i64, width: u32) -> i64 {
    ((i >> width) << width) ^ i
}
