//! Task-side half of the CAN transport.
//!
//! [`CanTransport`] drains the interrupt-filled [`RxQueue`], routes each frame
//! either to the maintenance protocol or to the application, and tracks bus
//! idleness. The transmit side ([`SharedTx`]) is reachable through `&self`, so
//! the listener and any other task can send while both are scheduled.
//!
//! ```text
//! ISR ── RxQueue::on_receive ──► [ring N] ──► drain_pass ─┬─► maintenance consumer
//!                                                          └─► application consumer
//! ```
use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::config::TransportConfig;
use crate::error::{TimerError, TransmitError};
use crate::infra::scheduler::yield_now;
use crate::infra::timer::{Timer, TimerService};
use crate::protocol::transport::bitrate::BitRate;
use crate::protocol::transport::can_frame::CanFrame;
use crate::protocol::transport::can_id::{is_maintenance, TRACE_ID};
use crate::protocol::transport::rx_queue::RxQueue;
use crate::protocol::transport::trace::{trace, TraceCode};
use crate::protocol::transport::traits::{
    can_controller::{CanController, Mailbox},
    consumer::CanConsumer,
    transmit::Transmit,
};

//==================================================================================TX
/// Transmit side of the transport, wrapping the controller driver.
pub struct CanTx<C> {
    controller: C,
    trace_frames: bool,
}

impl<C: CanController> CanTx<C> {
    pub fn new(controller: C, trace_frames: bool) -> Self {
        Self {
            controller,
            trace_frames,
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Retry until the controller takes the frame. Bounded in practice by the
    /// watchdog deadline.
    fn spin_transmit(
        &mut self,
        mailbox: Mailbox,
        frame: &CanFrame,
    ) -> Result<(), TransmitError<C::Error>> {
        loop {
            match self.controller.try_transmit(mailbox, frame) {
                Ok(true) => return Ok(()),
                Ok(false) => core::hint::spin_loop(),
                Err(err) => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("CAN transmit failed: {}", defmt::Debug2Format(&err));
                    return Err(TransmitError::Bus(err));
                }
            }
        }
    }
}

impl<C: CanController> Transmit for CanTx<C> {
    type Error = C::Error;

    fn send_async(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>> {
        self.spin_transmit(Mailbox::Any, frame)
    }

    fn send_ordered(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>> {
        self.spin_transmit(Mailbox::Ordered, frame)
    }

    fn send_blocking(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>> {
        self.send_ordered(frame)?;
        while !self.controller.is_mailbox_idle(Mailbox::Ordered) {
            core::hint::spin_loop();
        }
        Ok(())
    }

    fn trace(&mut self, code: TraceCode) {
        trace(code);
        if !self.trace_frames {
            return;
        }
        if let Ok(frame) = CanFrame::new(TRACE_ID, &[code.as_byte()]) {
            // Trace frames are best effort; a faulted controller already
            // reported itself on the data path.
            let _ = self.spin_transmit(Mailbox::Any, &frame);
        }
    }
}

//==================================================================================SHARED_TX
/// [`CanTx`] behind a critical-section mutex, shared by every sender.
///
/// The lock is held for one send only, never across a dispatch call, so a
/// handler may hold its own `&SharedTx` and still send from `on_frame`.
/// Ordered sends from different callers leave in the order they were made.
pub struct SharedTx<C> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<CanTx<C>>>,
}

impl<C: CanController> SharedTx<C> {
    pub fn new(tx: CanTx<C>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(tx)),
        }
    }

    /// Run `f` with exclusive access to the transmit side.
    pub fn lock<R>(&self, f: impl FnOnce(&mut CanTx<C>) -> R) -> R {
        self.inner.lock(|tx| f(&mut tx.borrow_mut()))
    }
}

impl<C: CanController> Transmit for &SharedTx<C> {
    type Error = C::Error;

    fn send_async(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>> {
        self.lock(|tx| tx.send_async(frame))
    }

    fn send_ordered(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>> {
        self.lock(|tx| tx.send_ordered(frame))
    }

    fn send_blocking(&mut self, frame: &CanFrame) -> Result<(), TransmitError<Self::Error>> {
        self.lock(|tx| tx.send_blocking(frame))
    }

    fn trace(&mut self, code: TraceCode) {
        self.lock(|tx| tx.trace(code))
    }
}

//==================================================================================TRANSPORT
/// Receive dispatch, idle detection and transmit access for one controller.
///
/// * `C` – controller driver.
/// * `N` – receive ring capacity; also the per-pass drain cap.
/// * `TIMERS`, `CALLS` – shape of the timer service owning the idle timer.
///
/// Every method takes `&self`: the listener task and application tasks share
/// one transport.
pub struct CanTransport<'a, C, const N: usize, const TIMERS: usize, const CALLS: usize> {
    tx: SharedTx<C>,
    queue: &'a RxQueue<N>,
    timers: &'a TimerService<TIMERS, CALLS>,
    idle_timer: Timer,
    idle: Cell<bool>,
    config: TransportConfig,
}

impl<'a, C, const N: usize, const TIMERS: usize, const CALLS: usize>
    CanTransport<'a, C, N, TIMERS, CALLS>
where
    C: CanController,
{
    /// Bind the transport to its controller, receive queue and timer service.
    ///
    /// Registers the idle timer and arms it for a full idle window; the bus
    /// starts out "active".
    pub fn new(
        controller: C,
        queue: &'a RxQueue<N>,
        timers: &'a TimerService<TIMERS, CALLS>,
        config: TransportConfig,
    ) -> Result<Self, TimerError> {
        let mut idle_timer = Timer::new();
        timers.register_timer(&mut idle_timer)?;
        timers.reset(&idle_timer, config.idle_timeout_ms);

        let transport = Self {
            tx: SharedTx::new(CanTx::new(controller, config.trace_frames)),
            queue,
            timers,
            idle_timer,
            idle: Cell::new(false),
            config,
        };
        transport.tx().trace(TraceCode::PowerOn);
        Ok(transport)
    }

    /// Reprogram the bus rate. Frames still queued are discarded.
    ///
    /// Call only when no task relies on queued frames surviving the call.
    pub fn reinit(&self, rate: BitRate) {
        #[cfg(feature = "defmt")]
        defmt::info!("CAN reinit at {} kbit/s", rate.kbps());

        self.tx.lock(|tx| {
            let controller = tx.controller_mut();
            controller.set_receive_enabled(false);
            controller.apply_timing(rate.timing());
            self.queue.reset();
            controller.set_receive_enabled(true);
        });
    }

    /// Dispatch up to `N` queued frames, then check for the idle edge.
    ///
    /// Maintenance frames go to `maintenance`, everything else to `app`.
    /// Idle edges are reported to `app` only, once per transition. Returns
    /// the number of frames dispatched.
    pub fn drain_pass<M, A>(&self, maintenance: &mut M, app: &mut A) -> usize
    where
        M: CanConsumer,
        A: CanConsumer,
    {
        let mut tx = self.tx();
        let mut drained = 0;
        while drained < N {
            let Some(frame) = self.queue.peek() else {
                break;
            };
            tx.trace(TraceCode::TaskReceived);

            self.timers
                .reset(&self.idle_timer, self.config.idle_timeout_ms);
            if self.idle.replace(false) {
                #[cfg(feature = "defmt")]
                defmt::info!("CAN bus active");
                app.on_idle_change(false);
            }

            if is_maintenance(frame.id()) {
                tx.trace(TraceCode::MaintenanceRx);
                maintenance.on_frame(&frame, &mut tx);
            } else {
                tx.trace(TraceCode::ApplicationRx);
                app.on_frame(&frame, &mut tx);
            }

            self.queue.release();
            drained += 1;
        }

        if !self.idle.get() && self.timers.expired(&self.idle_timer) {
            self.idle.set(true);
            #[cfg(feature = "defmt")]
            defmt::info!("CAN bus idle");
            app.on_idle_change(true);
        }

        drained
    }

    /// Listener task: one drain pass per scheduler pass, forever.
    pub async fn listen<M, A>(&self, maintenance: &mut M, app: &mut A)
    where
        M: CanConsumer,
        A: CanConsumer,
    {
        loop {
            self.drain_pass(maintenance, app);
            yield_now().await;
        }
    }

    /// Whether the bus is currently reported idle.
    pub fn is_idle(&self) -> bool {
        self.idle.get()
    }

    /// Transmit side, for senders outside a dispatch call.
    pub fn tx(&self) -> &SharedTx<C> {
        &self.tx
    }

    pub fn queue(&self) -> &'a RxQueue<N> {
        self.queue
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}
