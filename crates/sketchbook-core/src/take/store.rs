use crate::take::Take;

use std::{collections::VecDeque, sync::Arc};

use tracing::debug;

/// Default number of takes kept in history.
pub const MAX_TAKES: usize = 10;

/// Bounded, insertion-ordered history of completed takes.
///
/// The last element is the current take. Appending beyond capacity evicts
/// from the front.
#[derive(Debug, Clone)]
pub struct TakeStore {
    takes: VecDeque<Arc<Take>>,
    capacity: usize,
}

impl Default for TakeStore {
    fn default() -> Self {
        Self::new(MAX_TAKES)
    }
}

impl TakeStore {
    /// Create an empty history holding at most `capacity` takes (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            takes: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a take, returning the evicted oldest take if capacity was exceeded.
    pub fn append(&mut self, take: Take) -> Option<Arc<Take>> {
        self.takes.push_back(Arc::new(take));

        if self.takes.len() > self.capacity {
            let evicted = self.takes.pop_front();
            if let Some(ref take) = evicted {
                debug!(take_id = %take.id(), "Evicted oldest take");
            }
            evicted
        } else {
            None
        }
    }

    /// Remove the most recent take. No-op on an empty history.
    pub fn drop_last(&mut self) -> Option<Arc<Take>> {
        self.takes.pop_back()
    }

    /// The most recent take.
    pub fn current(&self) -> Option<&Arc<Take>> {
        self.takes.back()
    }

    /// Number of takes held.
    pub fn len(&self) -> usize {
        self.takes.len()
    }

    /// True when no takes are held.
    pub fn is_empty(&self) -> bool {
        self.takes.is_empty()
    }

    /// Maximum number of takes held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Takes from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Take>> {
        self.takes.iter()
    }
}
