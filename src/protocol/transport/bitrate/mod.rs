//! Supported bus rates, their controller timing, and start-up resolution of
//! the persisted rate.
//!
//! The rate is stored twice as `(check, value)` redundancy pairs so a power
//! loss during a rewrite leaves at least one usable copy:
//!
//! ```text
//! code  rate        BTR0  BTR1
//! 1     1000 kbit   0x00  0x05
//! 2      800 kbit   0x00  0x07
//! 3      500 kbit   0x00  0x1c
//! 4      250 kbit   0x01  0x1c
//! 5      125 kbit   0x03  0x1c
//! ```
use crate::config::ParameterLayout;
use crate::error::{BitRateError, ParameterError};
use crate::infra::parameters::{read_redundant_byte, ParameterStore};

//==================================================================================BITRATE
/// Bus rate, identified by its persisted one-byte code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum BitRate {
    Kbps1000 = 1,
    Kbps800 = 2,
    Kbps500 = 3,
    Kbps250 = 4,
    /// Lowest supported rate, used whenever nothing valid is stored.
    #[default]
    Kbps125 = 5,
}

/// Controller bus timing register pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitTiming {
    pub btr0: u8,
    pub btr1: u8,
}

impl BitRate {
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn kbps(self) -> u16 {
        match self {
            BitRate::Kbps1000 => 1000,
            BitRate::Kbps800 => 800,
            BitRate::Kbps500 => 500,
            BitRate::Kbps250 => 250,
            BitRate::Kbps125 => 125,
        }
    }

    pub const fn timing(self) -> BitTiming {
        let (btr0, btr1) = match self {
            BitRate::Kbps1000 => (0x00, 0x05),
            BitRate::Kbps800 => (0x00, 0x07),
            BitRate::Kbps500 => (0x00, 0x1c),
            BitRate::Kbps250 => (0x01, 0x1c),
            BitRate::Kbps125 => (0x03, 0x1c),
        };
        BitTiming { btr0, btr1 }
    }

    /// Rate for `code`, falling back to the default for unknown codes.
    pub fn from_code_or_default(code: u8) -> Self {
        Self::try_from(code).unwrap_or_default()
    }
}

impl TryFrom<u8> for BitRate {
    type Error = BitRateError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(BitRate::Kbps1000),
            2 => Ok(BitRate::Kbps800),
            3 => Ok(BitRate::Kbps500),
            4 => Ok(BitRate::Kbps250),
            5 => Ok(BitRate::Kbps125),
            code => Err(BitRateError::Unsupported { code }),
        }
    }
}

//==================================================================================RESOLUTION
/// Which copy the resolved rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitRateSource {
    Primary,
    Secondary,
    /// Neither copy was self-consistent.
    Default,
}

/// Result of [`resolve_bitrate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ResolvedBitRate {
    /// Stored code, or the default rate's code.
    pub code: u8,
    pub source: BitRateSource,
}

impl ResolvedBitRate {
    /// Rate to program. Unknown stored codes run at the default rate.
    pub fn rate(&self) -> BitRate {
        BitRate::from_code_or_default(self.code)
    }

    /// Whether start-up had to fall back to the default.
    pub fn is_degraded(&self) -> bool {
        self.source == BitRateSource::Default
    }
}

/// Value of a redundancy pair if it is self-consistent and programmed.
///
/// A zero value counts as unprogrammed even when its check byte matches.
fn programmed_code<S: ParameterStore + ?Sized>(
    store: &S,
    address: u16,
) -> Result<Option<u8>, ParameterError> {
    Ok(read_redundant_byte(store, address)?.filter(|&code| code != 0))
}

/// Pick the bus rate to start with: primary copy, then secondary, then the
/// lowest supported rate.
///
/// Must run before the transport is brought up; its result feeds
/// [`CanTransport::reinit`](crate::protocol::transport::can_transport::CanTransport::reinit).
pub fn resolve_bitrate<S: ParameterStore + ?Sized>(
    store: &S,
    layout: &ParameterLayout,
) -> Result<ResolvedBitRate, ParameterError> {
    let resolved = if let Some(code) = programmed_code(store, layout.bitrate_primary)? {
        ResolvedBitRate {
            code,
            source: BitRateSource::Primary,
        }
    } else if let Some(code) = programmed_code(store, layout.bitrate_secondary)? {
        ResolvedBitRate {
            code,
            source: BitRateSource::Secondary,
        }
    } else {
        ResolvedBitRate {
            code: BitRate::default().code(),
            source: BitRateSource::Default,
        }
    };

    #[cfg(feature = "defmt")]
    {
        if resolved.is_degraded() {
            defmt::warn!("no valid bitrate stored, starting at {} kbit/s", resolved.rate().kbps());
        } else {
            defmt::info!("bitrate code {} from {}", resolved.code, resolved.source);
        }
    }

    Ok(resolved)
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
