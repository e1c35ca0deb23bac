//! Creation and inspection of CAN identifiers in their 32-bit wire shape,
//! plus the identifier block reserved for the maintenance protocol.
//!
//! ```text
//! bit 31      extended flag (29-bit identifier)
//! bits 0..29  identifier (bits 0..11 only when standard)
//! ```
use embedded_can::{ExtendedId, Id, StandardId};

use crate::error::FrameError;

//==================================================================================CAN_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// CAN identifier with an explicit extended flag in bit 31.
///
/// The width always matches the flag: a standard id never exceeds 11 bits.
pub struct CanId(u32);

impl CanId {
    /// Set in the wire value for a 29-bit identifier.
    pub const EXTENDED_FLAG: u32 = 0x8000_0000;
    /// Largest 29-bit identifier.
    pub const EXTENDED_MAX: u32 = 0x1FFF_FFFF;
    /// Largest 11-bit identifier.
    pub const STANDARD_MAX: u16 = 0x7FF;

    /// Builds a 29-bit identifier. `None` when `raw` does not fit.
    pub const fn extended(raw: u32) -> Option<Self> {
        if raw > Self::EXTENDED_MAX {
            return None;
        }
        Some(Self(raw | Self::EXTENDED_FLAG))
    }

    /// Builds an 11-bit identifier. `None` when `raw` does not fit.
    pub const fn standard(raw: u16) -> Option<Self> {
        if raw > Self::STANDARD_MAX {
            return None;
        }
        Some(Self(raw as u32))
    }

    /// Decodes a wire value, checking width against the extended flag.
    pub fn from_wire(wire: u32) -> Result<Self, FrameError> {
        let id = if wire & Self::EXTENDED_FLAG != 0 {
            Self::extended(wire & !Self::EXTENDED_FLAG)
        } else {
            u16::try_from(wire).ok().and_then(Self::standard)
        };
        id.ok_or(FrameError::IdentifierOutOfRange { raw: wire })
    }

    /// Wire value including the extended flag.
    pub const fn to_wire(self) -> u32 {
        self.0
    }

    pub const fn is_extended(self) -> bool {
        self.0 & Self::EXTENDED_FLAG != 0
    }

    /// Identifier bits without the extended flag.
    pub const fn raw(self) -> u32 {
        self.0 & !Self::EXTENDED_FLAG
    }

    /// Low four bits, used to multiplex maintenance commands.
    pub const fn low_nibble(self) -> u8 {
        (self.0 & 0x0F) as u8
    }

    /// Whether this is an extended identifier with every `mask` bit set.
    pub const fn matches_mask(self, mask: u32) -> bool {
        self.is_extended() && self.raw() & mask == mask
    }
}

impl From<Id> for CanId {
    fn from(id: Id) -> Self {
        match id {
            Id::Standard(id) => Self(id.as_raw() as u32),
            Id::Extended(id) => Self(id.as_raw() | Self::EXTENDED_FLAG),
        }
    }
}

impl From<ExtendedId> for CanId {
    fn from(id: ExtendedId) -> Self {
        Id::Extended(id).into()
    }
}

impl From<StandardId> for CanId {
    fn from(id: StandardId) -> Self {
        Id::Standard(id).into()
    }
}

impl From<CanId> for Id {
    fn from(id: CanId) -> Self {
        // Constructors keep the width consistent with the flag.
        if id.is_extended() {
            match ExtendedId::new(id.raw()) {
                Some(ext) => Id::Extended(ext),
                None => Id::Extended(ExtendedId::MAX),
            }
        } else {
            match StandardId::new(id.raw() as u16) {
                Some(std) => Id::Standard(std),
                None => Id::Standard(StandardId::MAX),
            }
        }
    }
}

//==================================================================================MAINTENANCE_IDS
/// Every identifier with these bits set belongs to the maintenance protocol.
///
/// Such frames always pass the receive admission filter.
pub const MAINTENANCE_ID_MASK: u32 = 0x1FFF_FFF0;

const fn maintenance_id(raw: u32) -> CanId {
    match CanId::extended(raw) {
        Some(id) => id,
        None => panic!("maintenance ids are 29-bit"),
    }
}

/// Scan broadcast and scan responses share this identifier.
pub const SCAN_ID: CanId = maintenance_id(0x1FFF_FFF0);
/// Inbound select/program/read/write-enable/write-disable requests.
pub const COMMAND_ID: CanId = maintenance_id(0x1FFF_FFF1);
/// Acknowledgements for every request.
pub const RESPONSE_ID: CanId = maintenance_id(0x1FFF_FFF2);
/// Parameter read results.
pub const PARAM_READ_ID: CanId = maintenance_id(0x1FFF_FFF4);
/// Parameter write requests.
pub const PARAM_WRITE_ID: CanId = maintenance_id(0x1FFF_FFF5);

/// Standard identifier carrying one-byte trace codes.
pub const TRACE_ID: CanId = match CanId::standard(0x00F) {
    Some(id) => id,
    None => panic!("trace id is 11-bit"),
};

/// Whether a frame identifier addresses the maintenance protocol.
pub const fn is_maintenance(id: CanId) -> bool {
    id.matches_mask(MAINTENANCE_ID_MASK)
}
