//! Ordered buffer of pending subtitle events.
//!
//! The queue itself performs no reordering; it preserves arrival order and
//! leaves ordering corrections to the arrival-time correction pass. In
//! practice it holds a handful of entries (2-4) between upstream pushes
//! and downstream demand.

use std::collections::VecDeque;

use subfeed_model::SubtitleEvent;

/// FIFO of events awaiting delivery, ordered by arrival.
#[derive(Debug, Default)]
pub struct EventQueue {
    entries: VecDeque<SubtitleEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event in arrival order.
    pub fn enqueue(&mut self, event: SubtitleEvent) {
        self.entries.push_back(event);
    }

    /// The i-th pending event, front first, without removing it.
    pub fn peek(&self, index: usize) -> Option<&SubtitleEvent> {
        self.entries.get(index)
    }

    /// Mutable access to the front entry (repeat counting).
    pub fn front_mut(&mut self) -> Option<&mut SubtitleEvent> {
        self.entries.front_mut()
    }

    /// The most recently enqueued entry.
    pub fn back(&self) -> Option<&SubtitleEvent> {
        self.entries.back()
    }

    /// Mutable access to the most recently enqueued entry (corrections).
    pub fn back_mut(&mut self) -> Option<&mut SubtitleEvent> {
        self.entries.back_mut()
    }

    /// Remove and return the earliest event.
    pub fn take_front(&mut self) -> Option<SubtitleEvent> {
        self.entries.pop_front()
    }

    /// Remove and return the most recently enqueued entry (stale drop).
    pub fn drop_back(&mut self) -> Option<SubtitleEvent> {
        self.entries.pop_back()
    }

    /// Pending event count.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether starts are non-decreasing front to back.
    pub fn is_ordered(&self) -> bool {
        self.entries
            .iter()
            .zip(self.entries.iter().skip(1))
            .all(|(a, b)| a.start_ms <= b.start_ms)
    }
}
