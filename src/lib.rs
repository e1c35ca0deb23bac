//! `pdm-core` library: the `no_std` core of a CAN-connected power
//! distribution module. It provides the tick-driven timer service, the
//! cooperative task scheduler, the interrupt-to-task CAN transport and the
//! maintenance/flash protocol used by field tools to discover, select and
//! reconfigure a module.
#![no_std]
//==================================================================================
#[cfg(test)]
extern crate std;
//==================================================================================
/// Compile-time configuration and defaults.
pub mod config;
/// Error types for frame construction, storage, timers, scheduling and
/// transmission, plus the fatal invariant path.
pub mod error;
/// Timer service, cooperative scheduler and persistent parameter access.
pub mod infra;
/// CAN transport and the maintenance protocol.
pub mod protocol;
//==================================================================================
