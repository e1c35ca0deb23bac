//! Tick-driven timers: one-shot countdowns polled from task context and
//! periodic callbacks invoked from the tick interrupt.
//!
//! The tables live behind a critical-section mutex because the tick handler
//! and task code mutate the same countdowns. Every timer is registered once
//! during initialization and lives for the whole run; there is no removal.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::{Duration, Ticker};

use crate::config::TICK_PERIOD_MS;
use crate::error::{invariant_violation, TimerError};

//==================================================================================HANDLES
/// Handle to a one-shot millisecond countdown.
///
/// "Expired" means the countdown reached zero. It stays at zero until reset.
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timer {
    slot: Option<u8>,
}

impl Timer {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Whether the timer already owns a slot in a [`TimerService`].
    pub fn is_registered(&self) -> bool {
        self.slot.is_some()
    }

    fn index(&self) -> usize {
        match self.slot {
            Some(slot) => slot as usize,
            None => invariant_violation("timer used before registration"),
        }
    }
}

/// Handle to a callback run from tick context when its countdown expires.
///
/// A zero period makes it one-shot: after firing it stays idle until reset.
/// The callback runs at interrupt priority and must return quickly.
#[derive(Debug)]
pub struct PeriodicCall {
    callback: fn(),
    delay_ms: u16,
    period_ms: u16,
    slot: Option<u8>,
}

impl PeriodicCall {
    /// Callback firing every `period_ms`, first after one full period.
    pub const fn new(callback: fn(), period_ms: u16) -> Self {
        Self {
            callback,
            delay_ms: period_ms,
            period_ms,
            slot: None,
        }
    }

    /// Callback firing once after `delay_ms` (0 leaves it disarmed).
    pub const fn one_shot(callback: fn(), delay_ms: u16) -> Self {
        Self {
            callback,
            delay_ms,
            period_ms: 0,
            slot: None,
        }
    }

    pub fn period_ms(&self) -> u16 {
        self.period_ms
    }

    pub fn is_registered(&self) -> bool {
        self.slot.is_some()
    }

    fn index(&self) -> usize {
        match self.slot {
            Some(slot) => slot as usize,
            None => invariant_violation("periodic call used before registration"),
        }
    }
}

//==================================================================================TABLES
#[derive(Clone, Copy)]
struct CallSlot {
    callback: fn(),
    remaining: u16,
    period: u16,
}

fn idle_callback() {}

impl CallSlot {
    const IDLE: Self = Self {
        callback: idle_callback,
        remaining: 0,
        period: 0,
    };
}

struct TimerTables<const TIMERS: usize, const CALLS: usize> {
    countdowns: [u16; TIMERS],
    timer_count: usize,
    calls: [CallSlot; CALLS],
    call_count: usize,
}

//==================================================================================SERVICE
/// Fixed-capacity timer service.
///
/// * `TIMERS` – number of one-shot countdowns that can be registered.
/// * `CALLS` – number of periodic callbacks that can be registered.
///
/// Meant to live in a `static`, shared by the tick interrupt and task code.
pub struct TimerService<const TIMERS: usize, const CALLS: usize> {
    tables: Mutex<CriticalSectionRawMutex, RefCell<TimerTables<TIMERS, CALLS>>>,
}

impl<const TIMERS: usize, const CALLS: usize> Default for TimerService<TIMERS, CALLS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const TIMERS: usize, const CALLS: usize> TimerService<TIMERS, CALLS> {
    const SLOTS_FIT: () = assert!(
        TIMERS <= u8::MAX as usize && CALLS <= u8::MAX as usize,
        "timer tables are indexed by u8"
    );

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SLOTS_FIT;
        Self {
            tables: Mutex::new(RefCell::new(TimerTables {
                countdowns: [0; TIMERS],
                timer_count: 0,
                calls: [CallSlot::IDLE; CALLS],
                call_count: 0,
            })),
        }
    }

    /// Register a one-shot timer. Does nothing for an already-registered timer.
    pub fn register_timer(&self, timer: &mut Timer) -> Result<(), TimerError> {
        if timer.is_registered() {
            return Ok(());
        }
        self.tables.lock(|tables| {
            let mut tables = tables.borrow_mut();
            if tables.timer_count >= TIMERS {
                return Err(TimerError::CapacityExceeded { capacity: TIMERS });
            }
            let slot = tables.timer_count;
            tables.countdowns[slot] = 0;
            tables.timer_count += 1;
            timer.slot = Some(slot as u8);
            Ok(())
        })
    }

    /// Register a periodic (or one-shot) callback. Does nothing for an
    /// already-registered callback.
    pub fn register_periodic(&self, call: &mut PeriodicCall) -> Result<(), TimerError> {
        if call.is_registered() {
            return Ok(());
        }
        self.tables.lock(|tables| {
            let mut tables = tables.borrow_mut();
            if tables.call_count >= CALLS {
                return Err(TimerError::CapacityExceeded { capacity: CALLS });
            }
            let slot = tables.call_count;
            tables.calls[slot] = CallSlot {
                callback: call.callback,
                remaining: call.delay_ms,
                period: call.period_ms,
            };
            tables.call_count += 1;
            call.slot = Some(slot as u8);
            Ok(())
        })
    }

    /// Set a timer's countdown. Runs inside a critical section.
    pub fn reset(&self, timer: &Timer, ms: u16) {
        let index = timer.index();
        self.tables
            .lock(|tables| tables.borrow_mut().countdowns[index] = ms);
    }

    /// Re-arm a callback's countdown without touching its period.
    pub fn reset_periodic(&self, call: &PeriodicCall, ms: u16) {
        let index = call.index();
        self.tables
            .lock(|tables| tables.borrow_mut().calls[index].remaining = ms);
    }

    pub fn expired(&self, timer: &Timer) -> bool {
        self.remaining(timer) == 0
    }

    /// Whether the callback is currently disarmed (fired one-shot, or never armed).
    pub fn periodic_expired(&self, call: &PeriodicCall) -> bool {
        let index = call.index();
        self.tables
            .lock(|tables| tables.borrow().calls[index].remaining == 0)
    }

    /// Milliseconds left before the timer expires.
    pub fn remaining(&self, timer: &Timer) -> u16 {
        let index = timer.index();
        self.tables.lock(|tables| tables.borrow().countdowns[index])
    }

    /// Tick handler, called once per [`TICK_PERIOD_MS`] from the timebase interrupt.
    ///
    /// Countdowns stop at zero. Callbacks whose countdown reaches zero on this
    /// tick run after the tables are released, then stay reloaded with their
    /// period (or at zero for one-shots).
    pub fn tick(&self) {
        let mut fired: [Option<fn()>; CALLS] = [None; CALLS];

        self.tables.lock(|tables| {
            let mut tables = tables.borrow_mut();
            let timer_count = tables.timer_count;
            for countdown in tables.countdowns[..timer_count].iter_mut() {
                *countdown = countdown.saturating_sub(1);
            }

            let call_count = tables.call_count;
            for (call, fired) in tables.calls[..call_count].iter_mut().zip(fired.iter_mut()) {
                if call.remaining == 0 {
                    continue;
                }
                call.remaining -= 1;
                if call.remaining == 0 {
                    *fired = Some(call.callback);
                    call.remaining = call.period;
                }
            }
        });

        for callback in fired.iter().flatten() {
            callback();
        }
    }
}

//==================================================================================TICK_SOURCE
/// Drive [`TimerService::tick`] from an `embassy-time` ticker.
///
/// For targets without a dedicated timebase interrupt. Never returns.
pub async fn drive_ticks<const TIMERS: usize, const CALLS: usize>(
    timers: &TimerService<TIMERS, CALLS>,
) {
    let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));
    loop {
        ticker.next().await;
        timers.tick();
    }
}
