//! Unit tests for the receive ring and the interrupt-shared queue.
use super::*;
use crate::protocol::transport::can_id::{CanId, COMMAND_ID, SCAN_ID};
use crate::protocol::transport::traits::rx_filter::AcceptAll;

fn app_frame(tag: u8) -> CanFrame {
    CanFrame::new(CanId::standard(0x100).unwrap(), &[tag]).unwrap()
}

//==================================================================================RING
#[test]
/// Capacity N is fully usable: N pushes fit, the next is handed back.
fn test_ring_uses_every_slot() {
    let mut ring: RxRing<4> = RxRing::new();
    for tag in 0..4 {
        assert!(ring.push(app_frame(tag)).is_ok());
    }
    assert!(ring.is_full());
    assert_eq!(ring.len(), 4);

    let rejected = ring.push(app_frame(9)).unwrap_err();
    assert_eq!(rejected.payload(), &[9]);
}

#[test]
/// Free-running indices keep working across the u8 wrap.
fn test_ring_index_wraparound() {
    let mut ring: RxRing<8> = RxRing::new();
    for round in 0..300u16 {
        let tag = (round & 0xFF) as u8;
        ring.push(app_frame(tag)).unwrap();
        ring.push(app_frame(tag.wrapping_add(1))).unwrap();
        assert_eq!(ring.len(), 2);
        assert_eq!(ring.pop().unwrap().payload(), &[tag]);
        assert_eq!(ring.pop().unwrap().payload(), &[tag.wrapping_add(1)]);
        assert!(ring.is_empty());
    }
}

#[test]
#[should_panic(expected = "invariant violated")]
/// Advancing an empty ring is a logic bug.
fn test_ring_advance_empty_panics() {
    let mut ring: RxRing<2> = RxRing::new();
    ring.advance();
}

//==================================================================================QUEUE
#[test]
/// N+1 arrivals without draining: exactly one overflow, first N kept in order.
fn test_overflow_drops_newest() {
    let queue: RxQueue<8> = RxQueue::new();
    for tag in 0..8 {
        assert_eq!(queue.on_receive(app_frame(tag), &AcceptAll), RxOutcome::Queued);
    }
    assert_eq!(queue.on_receive(app_frame(8), &AcceptAll), RxOutcome::Overflow);
    assert_eq!(queue.overflow_count(), 1);
    assert_eq!(queue.len(), 8);

    for tag in 0..8 {
        assert_eq!(queue.pop().unwrap().payload(), &[tag]);
    }
    assert!(queue.pop().is_none());
}

#[test]
/// The admission filter never hides maintenance traffic.
fn test_filter_bypassed_for_maintenance_ids() {
    let queue: RxQueue<8> = RxQueue::new();
    let reject_all = |_: &CanFrame| false;

    assert_eq!(queue.on_receive(app_frame(1), &reject_all), RxOutcome::Filtered);
    let scan = CanFrame::new(SCAN_ID, &[0, 0]).unwrap();
    assert_eq!(queue.on_receive(scan, &reject_all), RxOutcome::Queued);
    let command = CanFrame::new(COMMAND_ID, &[0x20, 0x00]).unwrap();
    assert_eq!(queue.on_receive(command, &reject_all), RxOutcome::Queued);

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.overflow_count(), 0);
}

#[test]
/// Peek leaves the frame queued until it is released.
fn test_peek_then_release() {
    let queue: RxQueue<2> = RxQueue::new();
    queue.on_receive(app_frame(7), &AcceptAll);

    assert_eq!(queue.peek().unwrap().payload(), &[7]);
    assert_eq!(queue.len(), 1);
    queue.release();
    assert!(queue.is_empty());
}

#[test]
/// Reset empties the ring but keeps the overflow history.
fn test_reset_keeps_overflow_count() {
    let queue: RxQueue<2> = RxQueue::new();
    for tag in 0..3 {
        queue.on_receive(app_frame(tag), &AcceptAll);
    }
    queue.reset();
    assert!(queue.is_empty());
    assert_eq!(queue.overflow_count(), 1);
    assert_eq!(queue.on_receive(app_frame(5), &AcceptAll), RxOutcome::Queued);
}
