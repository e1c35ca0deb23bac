//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (frame construction,
//! parameter storage, timer registration, transmission, etc.).
//!
//! Nothing here crosses a component boundary as a panic: callers observe
//! `Result`s. The single exception is [`invariant_violation`], reserved for
//! logic bugs.
use thiserror_no_std::Error;

//==================================================================================FRAME_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors that can occur while building a CAN frame or identifier.
pub enum FrameError {
    /// Classic CAN carries at most eight payload bytes.
    #[error("Payload too long: {len} bytes")]
    DataTooLong { len: usize },
    /// Identifier does not fit the announced width (11 or 29 bits).
    #[error("Identifier {raw:#X} out of range")]
    IdentifierOutOfRange { raw: u32 },
}

//==================================================================================PARAMETER_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Failures while accessing the persistent parameter region.
pub enum ParameterError {
    /// Access falls outside the backing storage.
    #[error("Parameter access out of range -> address: {address:#X}, len: {len}")]
    OutOfRange { address: u16, len: usize },
    /// The storage device refused or failed the operation.
    #[error("Parameter storage device error")]
    Device,
}

//==================================================================================TIMER_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while registering timers.
pub enum TimerError {
    /// The fixed timer table is full.
    #[error("Timer table full (capacity {capacity})")]
    CapacityExceeded { capacity: usize },
    /// The handle was never registered with this service.
    #[error("Timer not registered")]
    NotRegistered,
}

//==================================================================================SCHEDULER_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised by the cooperative scheduler.
pub enum SchedulerError {
    /// Every task slot is already taken.
    #[error("No free task slot (capacity {capacity})")]
    NoFreeSlot { capacity: usize },
}

//==================================================================================TRANSMIT_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Outcome of a single transmit attempt on the controller.
pub enum TransmitError<E: core::fmt::Debug> {
    /// Every eligible mailbox is busy; the caller may retry.
    #[error("Transmit queue full")]
    QueueFull,
    /// The controller reported a fault.
    #[error("CAN controller error: {0:?}")]
    Bus(E),
}

//==================================================================================BITRATE_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Errors raised while decoding a persisted bitrate code.
pub enum BitRateError {
    /// The code does not map to a supported bus rate.
    #[error("Unsupported bitrate code {code}")]
    Unsupported { code: u8 },
}

//==================================================================================FLASH_ERROR
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
/// Failures while servicing a maintenance request.
///
/// Protocol-level rejections are not errors: they are answered on the bus
/// (or ignored). These are faults of the storage or the controller.
pub enum FlashError<E: core::fmt::Debug> {
    /// Parameter storage failed.
    #[error("Parameter storage: {0:?}")]
    Parameter(#[from] ParameterError),
    /// The response could not be sent.
    #[error("Transmit: {0:?}")]
    Transmit(#[from] TransmitError<E>),
}

//==================================================================================FATAL
/// Report a broken internal invariant and halt.
///
/// Only for conditions that indicate a logic bug. The firmware panic handler
/// stops the core and the external watchdog resets the module.
#[cold]
#[track_caller]
pub fn invariant_violation(what: &'static str) -> ! {
    #[cfg(feature = "defmt")]
    defmt::error!("ABORT: invariant violated: {}", what);

    panic!("invariant violated: {}", what)
}
