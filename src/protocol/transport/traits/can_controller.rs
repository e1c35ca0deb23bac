//! Seam between the transport and the CAN peripheral driver.
use crate::protocol::transport::bitrate::BitTiming;
use crate::protocol::transport::can_frame::CanFrame;

/// Transmit mailbox selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mailbox {
    /// Any free hardware slot; no ordering across calls.
    Any,
    /// The single dedicated slot. Frames queued here leave in call order.
    Ordered,
}

/// Non-blocking access to the CAN controller.
///
/// Receive is interrupt driven and handled by the HAL, which hands each frame
/// to [`RxQueue::on_receive`](crate::protocol::transport::rx_queue::RxQueue::on_receive).
pub trait CanController {
    type Error: core::fmt::Debug;

    /// Try to load `frame` into `mailbox`.
    ///
    /// Returns `Ok(false)` when the mailbox (or every mailbox, for
    /// [`Mailbox::Any`]) is still busy.
    fn try_transmit(&mut self, mailbox: Mailbox, frame: &CanFrame) -> Result<bool, Self::Error>;

    /// Whether `mailbox` has finished sending its last frame.
    fn is_mailbox_idle(&self, mailbox: Mailbox) -> bool;

    /// Gate the receive interrupt.
    fn set_receive_enabled(&mut self, enabled: bool);

    /// Program the bus timing registers. Called with reception disabled.
    fn apply_timing(&mut self, timing: BitTiming);
}

/// Low-level restart into the resident bootloader.
pub trait BootloaderEntry {
    /// Hand control to the bootloader. On hardware this never returns; host
    /// doubles may record the request and return.
    fn enter_bootloader(&mut self);
}
