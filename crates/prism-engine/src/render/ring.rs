//! Round-robin ring of per-frame resources.
//!
//! A slot is in flight from [`FrameRing::acquire`] until the submission that
//! used it completes on the GPU (signalled through [`SlotRelease`]), or until
//! the frame is abandoned before submission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Upper bound on frames the CPU may run ahead of the GPU.
pub const MAX_FRAMES_IN_FLIGHT: usize = 3;

struct RingSlot<T> {
    value: T,
    in_flight: Arc<AtomicBool>,
}

pub struct FrameRing<T> {
    slots: Vec<RingSlot<T>>,
    next: usize,
}

/// Marks a slot reusable. Sent to the queue's completion callback.
#[derive(Debug, Clone)]
pub struct SlotRelease(Arc<AtomicBool>);

impl SlotRelease {
    pub fn signal(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<T> FrameRing<T> {
    /// Builds `count` slots (clamped to `1..=MAX_FRAMES_IN_FLIGHT`).
    pub fn from_fn(count: usize, mut make: impl FnMut(usize) -> T) -> Self {
        let count = count.clamp(1, MAX_FRAMES_IN_FLIGHT);
        let slots = (0..count)
            .map(|i| RingSlot {
                value: make(i),
                in_flight: Arc::new(AtomicBool::new(false)),
            })
            .collect();
        Self { slots, next: 0 }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Claims the next slot in order. Returns `None` when that slot is still
    /// in flight; slots are never taken out of order.
    pub fn acquire(&mut self) -> Option<usize> {
        let index = self.next;
        let slot = &self.slots[index];
        if slot.in_flight.load(Ordering::Acquire) {
            return None;
        }
        slot.in_flight.store(true, Ordering::Release);
        self.next = (index + 1) % self.slots.len();
        Some(index)
    }

    /// Returns an acquired slot that was never submitted and makes it the next
    /// one handed out.
    pub fn abandon(&mut self, index: usize) {
        self.slots[index].in_flight.store(false, Ordering::Release);
        self.next = index;
    }

    pub fn release_handle(&self, index: usize) -> SlotRelease {
        SlotRelease(Arc::clone(&self.slots[index].in_flight))
    }

    pub fn in_flight(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.in_flight.load(Ordering::Acquire))
            .count()
    }

    pub fn get(&self, index: usize) -> &T {
        &self.slots[index].value
    }

    pub fn get_mut(&mut self, index: usize) -> &mut T {
        &mut self.slots[index].value
    }
}
