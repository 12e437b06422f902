//! Growth schedule shared by every growable buffer of the core.
//!
//! Buffers keep their own logical capacity so the doubling schedule is exact
//! and observable, independent of the allocator's rounding.

/// Smallest non-zero capacity.
pub(crate) const MIN_CAPACITY: usize = 8;

/// Next capacity for a full buffer: `max(8, 2 × old)`.
pub(crate) const fn grow_capacity(old: usize) -> usize {
    if old < MIN_CAPACITY / 2 {
        MIN_CAPACITY
    } else {
        old * 2
    }
}

/// Makes sure `buf` can hold `capacity` elements without reallocating.
///
/// Allocation failure aborts the process.
pub(crate) fn reserve_to<T>(buf: &mut Vec<T>, capacity: usize) {
    if let Some(additional) = capacity.checked_sub(buf.len()) {
        buf.reserve_exact(additional);
    }
}
