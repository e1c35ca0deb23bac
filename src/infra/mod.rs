//! Execution infrastructure shared by every subsystem: the millisecond timer
//! service, the cooperative task scheduler, and the persistent parameter store.
pub mod parameters;
pub mod scheduler;
pub mod timer;
