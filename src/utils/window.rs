use std::collections::VecDeque;

/// Fixed-capacity FIFO of scalar values in arrival order.
///
/// Only the owner can push; collaborators receive `&BoundedWindow` and read
/// through [`iter`](Self::iter) or [`tail`](Self::tail).
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl BoundedWindow {
    pub fn new(capacity: usize) -> Self {
        BoundedWindow {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a value, evicting the oldest one when full. Returns the evicted value.
    pub(crate) fn push(&mut self, value: f64) -> Option<f64> {
        if self.capacity == 0 {
            return Some(value);
        }
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    /// Most recently pushed value.
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = f64> + ExactSizeIterator + Clone + '_ {
        self.values.iter().copied()
    }

    /// The last `n` values, oldest first. Shorter when the window holds fewer.
    pub fn tail(&self, n: usize) -> impl Iterator<Item = f64> + Clone + '_ {
        let skip = self.values.len().saturating_sub(n);
        self.values.iter().skip(skip).copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}
