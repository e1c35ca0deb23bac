//! Cooperative, single-context task scheduler.
//!
//! Each task is an ordinary Rust future pinned by its owner (on the stack of
//! `main` or in a `static`), so suspension costs no allocation: the compiler
//! turns every `.await` into a saved resume point. One call to
//! [`Scheduler::run_pass`] resumes every live task exactly once, in
//! registration order, and each runs until its next suspension point.
//!
//! Nothing preempts a task. One that never reaches a suspension point stalls
//! the whole main loop, watchdog servicing included.
//!
//! Suspension points:
//! * [`yield_now`] – resume on the next pass;
//! * [`wait_until`] – resume once a condition holds, re-checked every pass;
//! * [`delay_ms`] – reset a [`Timer`] then wait for its expiry.
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures_util::task::noop_waker_ref;

use crate::error::SchedulerError;
use crate::infra::timer::{Timer, TimerService};

//==================================================================================TASK_STATE
/// Lifecycle of a scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TaskState {
    /// Registered but never resumed.
    NotStarted,
    /// Parked at a suspension point.
    Suspended,
    /// Ran to completion; never resumed again.
    Terminated,
}

/// Index of a task inside its scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskId(u8);

impl TaskId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

struct TaskSlot<'a> {
    future: Pin<&'a mut dyn Future<Output = ()>>,
    state: TaskState,
}

//==================================================================================SCHEDULER
/// Fixed-capacity cooperative scheduler holding up to `N` tasks.
pub struct Scheduler<'a, const N: usize> {
    tasks: [Option<TaskSlot<'a>>; N],
}

impl<'a, const N: usize> Default for Scheduler<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> Scheduler<'a, N> {
    const SLOTS_FIT: () = assert!(N <= u8::MAX as usize, "task ids are u8");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SLOTS_FIT;
        Self {
            tasks: core::array::from_fn(|_| None),
        }
    }

    /// Register a pinned task. It first runs on the next [`run_pass`](Self::run_pass).
    ///
    /// ```rust,ignore
    /// let listener = core::pin::pin!(transport.listen(&mut flash, &mut app));
    /// scheduler.spawn(listener)?;
    /// ```
    pub fn spawn(
        &mut self,
        future: Pin<&'a mut dyn Future<Output = ()>>,
    ) -> Result<TaskId, SchedulerError> {
        let index = self
            .tasks
            .iter()
            .position(Option::is_none)
            .ok_or(SchedulerError::NoFreeSlot { capacity: N })?;

        self.tasks[index] = Some(TaskSlot {
            future,
            state: TaskState::NotStarted,
        });
        Ok(TaskId(index as u8))
    }

    /// Resume every live task once. Returns how many tasks are still live.
    pub fn run_pass(&mut self) -> usize {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut live = 0;

        for slot in self.tasks.iter_mut().flatten() {
            if slot.state == TaskState::Terminated {
                continue;
            }
            match slot.future.as_mut().poll(&mut cx) {
                Poll::Ready(()) => {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("task terminated");
                    slot.state = TaskState::Terminated;
                }
                Poll::Pending => {
                    slot.state = TaskState::Suspended;
                    live += 1;
                }
            }
        }
        live
    }

    /// Current state of a task, `None` for an unused id.
    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.tasks
            .get(id.index())
            .and_then(Option::as_ref)
            .map(|slot| slot.state)
    }
}

//==================================================================================SUSPENSION
/// Future returned by [`yield_now`].
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            Poll::Ready(())
        } else {
            self.yielded = true;
            Poll::Pending
        }
    }
}

/// Suspend unconditionally; the task resumes on the next pass.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`wait_until`].
#[must_use = "futures do nothing unless awaited"]
pub struct WaitUntil<F> {
    condition: F,
}

impl<F: FnMut() -> bool + Unpin> Future for WaitUntil<F> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if (self.condition)() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

/// Suspend until `condition` returns `true`.
///
/// The condition is checked immediately; if it already holds the task
/// continues without giving up the pass.
pub fn wait_until<F: FnMut() -> bool + Unpin>(condition: F) -> WaitUntil<F> {
    WaitUntil { condition }
}

/// Reset `timer` to `ms` then suspend until it expires.
pub async fn delay_ms<const TIMERS: usize, const CALLS: usize>(
    timers: &TimerService<TIMERS, CALLS>,
    timer: &Timer,
    ms: u16,
) {
    timers.reset(timer, ms);
    wait_until(|| timers.expired(timer)).await
}
