//! Outbound side of the transport as seen by frame consumers.
use crate::error::TransmitError;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::trace::TraceCode;

/// The three transmit modes.
///
/// A full hardware queue is retried by spinning; it never surfaces to the
/// caller. Only controller faults are returned.
pub trait Transmit {
    type Error: core::fmt::Debug;

    /// Queue into any free mailbox. No ordering across calls.
    fn send_async(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>>;

    /// Queue into the dedicated mailbox; ordered sends leave in call order.
    fn send_ordered(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>>;

    /// Ordered send, then wait until the frame has left the controller.
    fn send_blocking(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>>;

    /// Record a trace code.
    fn trace(&mut self, code: TraceCode) {
        crate::protocol::transport::trace::trace(code);
    }
}
