//! One-byte trace codes marking transport and maintenance-protocol events.
//!
//! Codes are always logged at `trace` level. When
//! [`TransportConfig::trace_frames`](crate::config::TransportConfig::trace_frames)
//! is set, the transport also puts each code on the bus as a one-byte frame on
//! [`TRACE_ID`](super::can_id::TRACE_ID) so a bus sniffer can follow the
//! firmware without a debug probe.

/// Event markers. The discriminant is the byte sent in trace frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TraceCode {
    PowerOn = 0xff,

    // Transport
    InterruptQueued = 0xf0,
    InterruptOverflow = 0xf1,
    TaskReceived = 0xf2,
    MaintenanceRx = 0xf3,
    ApplicationRx = 0xf4,

    // Maintenance protocol
    BadMessage = 0xe0,
    Scan = 0xe1,
    EnterProgram = 0xe2,
    Select = 0xe3,
    ReadParameter = 0xe4,
    WriteEnable = 0xe5,
    WriteDisable = 0xe6,
    WriteParameter = 0xe7,
}

impl TraceCode {
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

impl From<TraceCode> for u8 {
    fn from(code: TraceCode) -> Self {
        code.as_byte()
    }
}

/// Log a trace code. Safe to call from interrupt context.
#[inline]
pub fn trace(code: TraceCode) {
    #[cfg(feature = "defmt")]
    defmt::trace!("trace {} ({=u8:#x})", code, code.as_byte());
    #[cfg(not(feature = "defmt"))]
    let _ = code;
}
