use std::collections::VecDeque;

/// FIFO of dropped file names plus the one currently being uploaded.
///
/// A name is present at most once across the queue and the current slot.
#[derive(Debug, Default)]
pub struct DropQueue {
    pending: VecDeque<String>,
    current: Option<String>,
}

impl DropQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `name` unless it is already queued or in flight.
    pub fn add_to_queue(&mut self, name: &str) -> bool {
        if self.current.as_deref() == Some(name) || self.pending.iter().any(|n| n == name) {
            return false;
        }
        self.pending.push_back(name.to_string());
        true
    }

    pub fn is_handling(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Clears the current slot and moves the head of the queue into it.
    pub fn advance(&mut self) -> Option<String> {
        self.current = self.pending.pop_front();
        self.current.clone()
    }

    /// Clears the current slot without taking a new item.
    pub fn finish(&mut self) {
        self.current = None;
    }
}
