//! Application-supplied admission filter for the receive interrupt.
use crate::protocol::transport::can_frame::CanFrame;

/// Decides which non-maintenance frames are worth queueing.
///
/// Runs in interrupt context: keep it short and allocation-free. Frames on
/// the maintenance identifier block bypass the filter entirely.
pub trait RxFilter {
    fn accept(&self, frame: &CanFrame) -> bool;
}

/// Default filter: every frame is queued.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl RxFilter for AcceptAll {
    fn accept(&self, _frame: &CanFrame) -> bool {
        true
    }
}

impl<F> RxFilter for F
where
    F: Fn(&CanFrame) -> bool,
{
    fn accept(&self, frame: &CanFrame) -> bool {
        self(frame)
    }
}
