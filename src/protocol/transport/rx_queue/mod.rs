//! Receive path between the CAN interrupt and the listener task.
//!
//! [`RxRing`] is a fixed-capacity FIFO with free-running `u8` head/tail
//! counters: fullness is `head - tail` (mod 256) rather than a pointer
//! comparison, so all `N` slots are usable without a sentinel. The interrupt
//! producer only advances `head`; the consumer task only advances `tail`.
//!
//! [`RxQueue`] wraps the ring in a critical-section mutex so it can sit in a
//! `static` shared by both contexts. Every index update happens inside one
//! short critical section.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::error::invariant_violation;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::is_maintenance;
use crate::protocol::transport::trace::{trace, TraceCode};
use crate::protocol::transport::traits::rx_filter::RxFilter;

//==================================================================================RING
/// Single-producer/single-consumer frame ring of `N` slots.
///
/// `N` must be a power of two no larger than 128.
pub struct RxRing<const N: usize> {
    slots: [CanFrame; N],
    head: u8,
    tail: u8,
}

impl<const N: usize> Default for RxRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RxRing<N> {
    const CAPACITY_OK: () = assert!(
        N.is_power_of_two() && N <= 128,
        "ring capacity must be a power of two <= 128"
    );

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;
        Self {
            slots: [CanFrame::EMPTY; N],
            head: 0,
            tail: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of queued frames.
    pub fn len(&self) -> usize {
        self.head.wrapping_sub(self.tail) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.head == self.tail
    }

    pub fn is_full(&self) -> bool {
        self.len() >= N
    }

    /// Append a frame, handing it back when the ring is full.
    pub fn push(&mut self, frame: CanFrame) -> Result<(), CanFrame> {
        if self.is_full() {
            return Err(frame);
        }
        self.slots[Self::slot(self.head)] = frame;
        self.head = self.head.wrapping_add(1);
        Ok(())
    }

    /// Oldest queued frame, left in place.
    pub fn peek(&self) -> Option<&CanFrame> {
        (!self.is_empty()).then(|| &self.slots[Self::slot(self.tail)])
    }

    /// Release the oldest slot after it has been consumed.
    pub fn advance(&mut self) {
        if self.is_empty() {
            invariant_violation("rx ring tail advanced past head");
        }
        self.tail = self.tail.wrapping_add(1);
    }

    /// Remove and return the oldest frame.
    pub fn pop(&mut self) -> Option<CanFrame> {
        let frame = *self.peek()?;
        self.advance();
        Some(frame)
    }

    /// Drop every queued frame.
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    fn slot(index: u8) -> usize {
        index as usize & (N - 1)
    }
}

//==================================================================================QUEUE
/// What the interrupt handler did with a received frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxOutcome {
    /// Stored for the listener task.
    Queued,
    /// Rejected by the application admission filter.
    Filtered,
    /// Ring full: frame dropped and counted.
    Overflow,
}

struct RxState<const N: usize> {
    ring: RxRing<N>,
    overflows: u32,
}

/// Interrupt-shared receive queue of `N` frames.
pub struct RxQueue<const N: usize> {
    state: Mutex<CriticalSectionRawMutex, RefCell<RxState<N>>>,
}

impl<const N: usize> Default for RxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RxQueue<N> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(RxState {
                ring: RxRing::new(),
                overflows: 0,
            })),
        }
    }

    /// Interrupt-side entry point for a freshly read data frame.
    ///
    /// A full ring drops the frame and bumps the overflow counter without
    /// blocking. Otherwise the frame is queued when it belongs to the
    /// maintenance protocol (never filterable) or the admission filter accepts it.
    pub fn on_receive<F: RxFilter + ?Sized>(&self, frame: CanFrame, filter: &F) -> RxOutcome {
        let outcome = self.state.lock(|state| {
            let mut state = state.borrow_mut();
            if state.ring.is_full() {
                state.overflows = state.overflows.wrapping_add(1);
                return RxOutcome::Overflow;
            }
            if !is_maintenance(frame.id()) && !filter.accept(&frame) {
                return RxOutcome::Filtered;
            }
            // Cannot fail: fullness was checked under the same lock.
            let _ = state.ring.push(frame);
            RxOutcome::Queued
        });

        match outcome {
            RxOutcome::Queued => trace(TraceCode::InterruptQueued),
            RxOutcome::Overflow => trace(TraceCode::InterruptOverflow),
            RxOutcome::Filtered => {}
        }
        outcome
    }

    /// Copy of the oldest frame, left queued until [`release`](Self::release).
    pub fn peek(&self) -> Option<CanFrame> {
        self.state.lock(|state| state.borrow().ring.peek().copied())
    }

    /// Free the oldest slot once its frame has been dispatched.
    pub fn release(&self) {
        self.state.lock(|state| state.borrow_mut().ring.advance());
    }

    /// Remove and return the oldest frame.
    pub fn pop(&self) -> Option<CanFrame> {
        self.state.lock(|state| state.borrow_mut().ring.pop())
    }

    pub fn len(&self) -> usize {
        self.state.lock(|state| state.borrow().ring.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Frames dropped because the ring was full, since start-up.
    pub fn overflow_count(&self) -> u32 {
        self.state.lock(|state| state.borrow().overflows)
    }

    /// Empty the ring (bus reconfiguration only).
    pub fn reset(&self) {
        self.state.lock(|state| state.borrow_mut().ring.clear());
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
