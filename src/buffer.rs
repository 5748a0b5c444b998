//! Bounded FIFO of recent samples.
//!
//! Storage is fixed at `N` slots. A runtime capacity in `1..=N` bounds how
//! many of them are used; pushing into a full buffer evicts the oldest
//! sample first.

use heapless::Deque;

use crate::Data;

#[derive(Debug, Clone)]
pub struct SampleBuffer<const N: usize> {
  samples: Deque<Data, N>,
  capacity: usize,
}

impl<const N: usize> SampleBuffer<N> {
  /// Buffer using all `N` slots.
  pub const fn new() -> Self {
    Self { samples: Deque::new(), capacity: if N == 0 { 1 } else { N } }
  }

  /// Buffer bounded to `capacity`, clamped to `1..=N`.
  pub fn with_capacity(capacity: usize) -> Self {
    Self { samples: Deque::new(), capacity: clamp_capacity::<N>(capacity) }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Change the bound. Existing samples are dropped.
  pub fn set_capacity(&mut self, capacity: usize) {
    self.samples.clear();
    self.capacity = clamp_capacity::<N>(capacity);
  }

  pub fn push(&mut self, d: Data) {
    while self.samples.len() >= self.capacity {
      if self.samples.pop_front().is_none() {
        break;
      }
    }
    // Cannot fail: at least one slot was freed above.
    let _ = self.samples.push_back(d);
  }

  /// Oldest stored sample.
  pub fn oldest(&self) -> Option<&Data> {
    self.samples.front()
  }

  /// Most recent sample.
  pub fn latest(&self) -> Option<&Data> {
    self.samples.back()
  }

  /// Number of stored samples.
  pub fn available(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  pub fn is_full(&self) -> bool {
    self.samples.len() >= self.capacity
  }

  /// Drop the oldest sample, if any.
  pub fn discard(&mut self) {
    self.samples.pop_front();
  }

  /// Drop every sample.
  pub fn flush(&mut self) {
    self.samples.clear();
  }

  /// Samples from oldest to newest.
  pub fn iter(&self) -> impl Iterator<Item = &Data> {
    self.samples.iter()
  }
}

impl<const N: usize> Default for SampleBuffer<N> {
  fn default() -> Self {
    Self::new()
  }
}

fn clamp_capacity<const N: usize>(capacity: usize) -> usize {
  capacity.clamp(1, N.max(1))
}
