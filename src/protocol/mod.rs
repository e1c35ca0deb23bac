//! CAN-facing components: the transport (receive queue, dispatch, transmit
//! modes, bus rate) and the maintenance/flash protocol built on top of it.
pub mod flash;
pub mod transport;
