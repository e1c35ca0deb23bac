//! Receivers of drained frames.
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::traits::transmit::Transmit;

/// Frame handler invoked from the listener task.
///
/// Handlers run to completion without suspending, so they must not do
/// unbounded work. `tx` is the transport's transmit side.
pub trait CanConsumer {
    fn on_frame<T: Transmit>(&mut self, frame: &CanFrame, tx: &mut T);

    /// Bus activity edge: `true` when the bus went quiet, `false` when traffic resumed.
    fn on_idle_change(&mut self, _is_idle: bool) {}
}
