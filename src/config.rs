//! Configuration shared by the transport and the maintenance protocol.
//!
//! Everything is plain `Copy` data with `const` defaults so a firmware image
//! can keep its configuration in `static`s without any runtime setup.

/// Period of the hardware timebase interrupt driving [`TimerService::tick`](crate::infra::timer::TimerService::tick) (ms).
pub const TICK_PERIOD_MS: u64 = 1;

/// Default receive ring capacity (frames). Must be a power of two.
pub const DEFAULT_RX_CAPACITY: usize = 8;

//==================================================================================TRANSPORT
/// Tunables for [`CanTransport`](crate::protocol::transport::can_transport::CanTransport).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransportConfig {
    /// Silence window (ms) after which the bus is reported idle.
    pub idle_timeout_ms: u16,
    /// Emit trace codes as one-byte frames on the bus.
    ///
    /// Debug aid only: every trace adds bus traffic.
    pub trace_frames: bool,
}

impl TransportConfig {
    pub const DEFAULT: Self = Self {
        idle_timeout_ms: 2000,
        trace_frames: false,
    };

    /// Override the idle window.
    pub const fn with_idle_timeout_ms(mut self, idle_timeout_ms: u16) -> Self {
        self.idle_timeout_ms = idle_timeout_ms;
        self
    }

    /// Enable or disable trace frames.
    pub const fn with_trace_frames(mut self, enabled: bool) -> Self {
        self.trace_frames = enabled;
        self
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

//==================================================================================PARAMETER_LAYOUT
/// Byte offsets of the fields the maintenance protocol touches inside the
/// parameter region.
///
/// ```text
/// offset   size  field
/// 0x0004   4     serial number
/// 0x0053   2     bootloader version (big endian)
/// 0x005b   2     bitrate pair #1 (check, value)
/// 0x005d   2     bitrate pair #2 (check, value)
/// 0x0200   512   user configuration (writable while unlocked)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParameterLayout {
    pub serial: u16,
    pub bootloader_version: u16,
    pub bitrate_primary: u16,
    pub bitrate_secondary: u16,
    /// First byte of the user range.
    pub user_start: u16,
    /// One past the last byte of the user range.
    pub user_end: u16,
}

impl ParameterLayout {
    pub const DEFAULT: Self = Self {
        serial: 0x04,
        bootloader_version: 0x53,
        bitrate_primary: 0x5b,
        bitrate_secondary: 0x5d,
        user_start: 0x200,
        user_end: 0x400,
    };

    /// Whether `len` bytes starting at `address` lie entirely in the user range.
    pub fn in_user_range(&self, address: u16, len: usize) -> bool {
        let start = address as usize;
        start >= self.user_start as usize && start + len <= self.user_end as usize
    }
}

impl Default for ParameterLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}
