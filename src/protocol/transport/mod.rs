//! CAN transport layer: frame and identifier types, the interrupt-fed receive
//! queue, bus rate handling, and the task-side dispatcher with its three
//! transmit modes.
//!
//! ## Transmit modes
//!
//! | mode       | mailbox   | ordering                         | returns when         |
//! |------------|-----------|----------------------------------|----------------------|
//! | `async`    | any free  | none across calls                | accepted by hardware |
//! | `ordered`  | dedicated | call order among ordered sends   | accepted by hardware |
//! | `blocking` | dedicated | call order among ordered sends   | frame left the wire  |
//!
//! Ordered and blocking sends are not ordered against async sends.

pub mod bitrate;
pub mod can_frame;
pub mod can_id;
pub mod can_transport;
pub mod rx_queue;
pub mod trace;
pub mod traits;
