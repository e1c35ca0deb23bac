//! Persistent, byte-addressable parameter region (module identity, bus rate,
//! user configuration).
//!
//! Reads and writes are synchronous, one byte at a time, and only ever issued
//! from task context. The field offsets used by the maintenance protocol are
//! described by [`ParameterLayout`].
//!
//! # Redundancy pairs
//!
//! Values that must survive a power loss mid-write are stored as a
//! `(check, value)` byte pair where `check == !value`:
//!
//! ```text
//! addr + 0   check   (bitwise complement of value)
//! addr + 1   value
//! ```
use crate::config::ParameterLayout;
use crate::error::ParameterError;

//==================================================================================STORE_TRAIT
/// Byte-level access to the parameter region.
///
/// Implementations back onto EEPROM/flash emulation; only the two byte
/// primitives are required.
pub trait ParameterStore {
    /// Read the byte stored at `address`.
    fn read_byte(&self, address: u16) -> Result<u8, ParameterError>;

    /// Persist `value` at `address`.
    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), ParameterError>;

    /// Fill `out` with the bytes starting at `address`.
    fn read_bytes(&self, address: u16, out: &mut [u8]) -> Result<(), ParameterError> {
        let len = out.len();
        for (offset, byte) in out.iter_mut().enumerate() {
            *byte = self.read_byte(offset_address(address, offset, len)?)?;
        }
        Ok(())
    }

    /// Persist `data` starting at `address`, byte by byte.
    fn write_bytes(&mut self, address: u16, data: &[u8]) -> Result<(), ParameterError> {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(offset_address(address, offset, data.len())?, *byte)?;
        }
        Ok(())
    }

    /// Whether the stored bytes at `address` equal `reference`.
    fn matches(&self, address: u16, reference: &[u8]) -> Result<bool, ParameterError> {
        for (offset, expected) in reference.iter().enumerate() {
            if self.read_byte(offset_address(address, offset, reference.len())?)? != *expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn offset_address(address: u16, offset: usize, len: usize) -> Result<u16, ParameterError> {
    u16::try_from(offset)
        .ok()
        .and_then(|offset| address.checked_add(offset))
        .ok_or(ParameterError::OutOfRange { address, len })
}

//==================================================================================REDUNDANCY
/// Whether `check` is the bitwise complement of `value`.
pub fn is_complement_pair(check: u8, value: u8) -> bool {
    check ^ value == 0xFF
}

/// Read a redundancy pair and return its value if the pair is self-consistent.
pub fn read_redundant_byte<S: ParameterStore + ?Sized>(
    store: &S,
    address: u16,
) -> Result<Option<u8>, ParameterError> {
    let mut pair = [0u8; 2];
    store.read_bytes(address, &mut pair)?;
    let [check, value] = pair;
    Ok(is_complement_pair(check, value).then_some(value))
}

//==================================================================================IDENTITY
/// Serial number length in bytes.
pub const SERIAL_LEN: usize = 4;

/// Identity fields read once from the parameter region at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModuleIdentity {
    pub serial: [u8; SERIAL_LEN],
    pub bootloader_version: u16,
}

impl ModuleIdentity {
    /// Load the identity fields described by `layout`.
    pub fn load<S: ParameterStore + ?Sized>(
        store: &S,
        layout: &ParameterLayout,
    ) -> Result<Self, ParameterError> {
        let mut serial = [0u8; SERIAL_LEN];
        store.read_bytes(layout.serial, &mut serial)?;

        let mut version = [0u8; 2];
        store.read_bytes(layout.bootloader_version, &mut version)?;

        Ok(Self {
            serial,
            bootloader_version: u16::from_be_bytes(version),
        })
    }

    /// Low byte of the bootloader version, as reported in scan responses.
    pub fn version_low_byte(&self) -> u8 {
        (self.bootloader_version & 0xFF) as u8
    }
}

//==================================================================================MEMORY_STORE
/// RAM-backed store of `N` bytes, erased to `0xFF`.
///
/// Used for host-side simulation and as the reference implementation in tests.
#[derive(Debug, Clone)]
pub struct MemoryParameterStore<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> Default for MemoryParameterStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryParameterStore<N> {
    const FITS_ADDRESS_SPACE: () = assert!(N <= u16::MAX as usize + 1, "addresses are u16");

    /// Erased store (every byte `0xFF`).
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_ADDRESS_SPACE;
        Self { bytes: [0xFF; N] }
    }

    /// Raw view of the whole region.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const N: usize> ParameterStore for MemoryParameterStore<N> {
    fn read_byte(&self, address: u16) -> Result<u8, ParameterError> {
        self.bytes
            .get(address as usize)
            .copied()
            .ok_or(ParameterError::OutOfRange { address, len: 1 })
    }

    fn write_byte(&mut self, address: u16, value: u8) -> Result<(), ParameterError> {
        let slot = self
            .bytes
            .get_mut(address as usize)
            .ok_or(ParameterError::OutOfRange { address, len: 1 })?;
        *slot = value;
        Ok(())
    }

    fn read_bytes(&self, address: u16, out: &mut [u8]) -> Result<(), ParameterError> {
        let start = address as usize;
        let source = self
            .bytes
            .get(start..start + out.len())
            .ok_or(ParameterError::OutOfRange {
                address,
                len: out.len(),
            })?;
        out.copy_from_slice(source);
        Ok(())
    }

    fn write_bytes(&mut self, address: u16, data: &[u8]) -> Result<(), ParameterError> {
        let start = address as usize;
        let target = self
            .bytes
            .get_mut(start..start + data.len())
            .ok_or(ParameterError::OutOfRange {
                address,
                len: data.len(),
            })?;
        target.copy_from_slice(data);
        Ok(())
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
