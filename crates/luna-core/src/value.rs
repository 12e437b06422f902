//! Runtime values and the append-only constant pool.

use core::{fmt, iter::Enumerate, slice};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::memory::{grow_capacity, reserve_to};

/// A runtime constant. Numbers only for now.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// 64-bit floating point number.
    Number(f64),
}

impl From<f64> for Value {
    fn from(n: f64) -> Self { Self::Number(n) }
}

/// Shortest decimal that round-trips, `%g` style: plain notation (`1.2`,
/// `3`, `-0.5`) while the decimal exponent stays in `-4..16`, scientific
/// (`1e300`, `1e-7`) outside it.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => {
                let sci = format!("{n:e}");
                match sci.rsplit_once('e').and_then(|(_, exp)| exp.parse::<i32>().ok()) {
                    Some(exp) if !(-4..16).contains(&exp) => f.write_str(&sci),
                    _ => write!(f, "{n}"),
                }
            },
        }
    }
}

/// Constant pool with stable indices (0-based).
///
/// Duplicates are kept; indices only become invalid through [`ValuePool::reset`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValuePool {
    values: Vec<Value>,
    capacity: usize,
}

impl ValuePool {
    /// Create an empty pool (no storage).
    pub const fn new() -> Self { Self { values: Vec::new(), capacity: 0 } }

    /// Number of stored constants.
    pub fn len(&self) -> usize { self.values.len() }

    /// Whether the pool is empty.
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    /// Slots available before the next growth.
    pub const fn capacity(&self) -> usize { self.capacity }

    /// Pushes a value and returns its index.
    pub fn push(&mut self, value: Value) -> usize {
        if self.values.len() + 1 > self.capacity {
            let old = self.capacity;
            self.capacity = grow_capacity(old);
            reserve_to(&mut self.values, self.capacity);
            log::trace!("value pool grown: {old} -> {}", self.capacity);
        }
        let index = self.values.len();
        self.values.push(value);
        index
    }

    /// Lookup a constant by index.
    pub fn get(&self, index: usize) -> Option<&Value> { self.values.get(index) }

    /// Stored constants in insertion order.
    pub fn as_slice(&self) -> &[Value] { &self.values }

    /// Iterate as `(index, &Value)`.
    pub fn iter(&self) -> ValueIter<'_> { ValueIter { inner: self.values.iter().enumerate() } }

    /// Releases the storage and returns to the empty, zero-capacity state.
    pub fn reset(&mut self) {
        self.values = Vec::new();
        self.capacity = 0;
    }
}

/// Iterator returned by [`ValuePool::iter`].
pub struct ValueIter<'a> {
    inner: Enumerate<slice::Iter<'a, Value>>,
}

impl<'a> Iterator for ValueIter<'a> {
    type Item = (usize, &'a Value);

    fn next(&mut self) -> Option<Self::Item> { self.inner.next() }

    fn size_hint(&self) -> (usize, Option<usize>) { self.inner.size_hint() }
}

impl<'a> IntoIterator for &'a ValuePool {
    type Item = (usize, &'a Value);
    type IntoIter = ValueIter<'a>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn display_uses_shortest_round_trip() {
        assert_eq!(Value::Number(1.2).to_string(), "1.2");
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-0.5).to_string(), "-0.5");
        assert_eq!(Value::from(1234.5).to_string(), "1234.5");
        assert_eq!(Value::from(0.0001).to_string(), "0.0001");
    }

    #[test]
    fn display_switches_to_exponent_outside_general_range() {
        assert_eq!(Value::Number(1e300).to_string(), "1e300");
        assert_eq!(Value::Number(1e-7).to_string(), "1e-7");
        assert_eq!(Value::Number(-1.5e-10).to_string(), "-1.5e-10");
        assert_eq!(Value::Number(1e16).to_string(), "1e16");
        assert_eq!(Value::Number(f64::MAX).to_string(), "1.7976931348623157e308");
        assert_eq!(Value::Number(f64::INFINITY).to_string(), "inf");
    }

    #[test]
    fn push_returns_previous_count() {
        let mut pool = ValuePool::new();
        assert_eq!(pool.push(Value::Number(1.0)), 0);
        assert_eq!(pool.push(Value::Number(1.0)), 1);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn push_with_spare_capacity_still_stores() {
        let mut pool = ValuePool::new();
        pool.push(Value::Number(1.0));
        assert_eq!(pool.capacity(), 8);
        // Second push does not grow; it must still land in the pool.
        let ix = pool.push(Value::Number(2.0));
        assert_eq!(pool.capacity(), 8);
        assert_eq!(pool.get(ix), Some(&Value::Number(2.0)));
        assert_eq!(pool.as_slice(), &[Value::Number(1.0), Value::Number(2.0)]);
    }

    #[test]
    fn growth_doubles_after_eight() {
        let mut pool = ValuePool::new();
        assert_eq!(pool.capacity(), 0);
        for i in 0..9 {
            pool.push(Value::Number(f64::from(i)));
        }
        assert_eq!(pool.capacity(), 16);
        assert_eq!(pool.len(), 9);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut pool = ValuePool::new();
        pool.push(Value::Number(4.0));
        pool.reset();
        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), 0);
        pool.reset();
        assert_eq!(pool, ValuePool::new());
    }

    #[test]
    fn iter_yields_indices_in_order() {
        let mut pool = ValuePool::new();
        pool.push(Value::Number(0.25));
        pool.push(Value::Number(0.5));
        let seen: Vec<_> = pool.iter().map(|(i, v)| (i, *v)).collect();
        assert_eq!(seen, vec![(0, Value::Number(0.25)), (1, Value::Number(0.5))]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn value_serializes_as_tagged_number() {
        let json = serde_json::to_string(&Value::Number(1.5)).unwrap();
        assert_eq!(json, r#"{"Number":1.5}"#);
    }

    proptest! {
        #[test]
        fn indices_stay_valid_across_growth(xs in prop::collection::vec(-1.0e9f64..1.0e9, 0..200)) {
            let mut pool = ValuePool::new();
            let ixs: Vec<usize> = xs.iter().map(|&x| pool.push(Value::Number(x))).collect();
            for (ix, x) in ixs.iter().zip(&xs) {
                prop_assert_eq!(pool.get(*ix), Some(&Value::Number(*x)));
            }
            prop_assert!(pool.len() <= pool.capacity());
        }

        #[test]
        fn display_parses_back_to_the_same_number(x in any::<f64>().prop_filter("nan", |x| !x.is_nan())) {
            let text = Value::Number(x).to_string();
            prop_assert_eq!(text.parse::<f64>().ok(), Some(x));
        }
    }
}
