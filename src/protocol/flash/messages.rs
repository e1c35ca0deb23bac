//! Byte layouts of maintenance-protocol payloads.
//!
//! Requests on [`COMMAND_ID`](crate::protocol::transport::can_id::COMMAND_ID):
//!
//! ```text
//! request               response (id)
//! 00 00                 00 s0 s1 s2 s3 00 00 vv   scan        (SCAN_ID)
//! 20 10 s0 s1 s2 s3     21 10 s0 s1 s2 s3 00 00   select      (RESPONSE_ID)
//! 20 00                 2f ff s0 s1 s2 s3 00 00   program     (RESPONSE_ID)
//! 20 03 aa aa ll        dd ..                     read ll     (PARAM_READ_ID)
//! 20 11 f3 33 af        21 11 01 00 00            unlock      (RESPONSE_ID)
//! 20 02                 20 f0 02 00 00            lock        (RESPONSE_ID)
//! ```
//!
//! Requests on [`PARAM_WRITE_ID`](crate::protocol::transport::can_id::PARAM_WRITE_ID):
//!
//! ```text
//! aa aa dd ..           20 e8 00 00 00            written     (RESPONSE_ID)
//!                       20 e8 0f 00 00            rejected    (RESPONSE_ID)
//! ```
//!
//! `s0..s3` serial number, `vv` bootloader version low byte, `aa aa` big-endian
//! parameter address, `ll` read length (1..=8), `dd` data bytes.
use crate::infra::parameters::{ModuleIdentity, SERIAL_LEN};

//==================================================================================REQUESTS
pub const SCAN: [u8; 2] = [0x00, 0x00];
pub const SELECT: [u8; 2] = [0x20, 0x10];
pub const ENTER_PROGRAM: [u8; 2] = [0x20, 0x00];
pub const READ_PARAMETER: [u8; 2] = [0x20, 0x03];
/// Fixed unlock sequence. Not a secret.
pub const WRITE_ENABLE: [u8; 5] = [0x20, 0x11, 0xf3, 0x33, 0xaf];
pub const WRITE_DISABLE: [u8; 2] = [0x20, 0x02];

/// Longest read a single response frame can carry.
pub const MAX_READ_LEN: u8 = 8;

/// Decoded read-parameter request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReadRequest {
    pub address: u16,
    pub len: u8,
}

impl ReadRequest {
    /// `None` when the payload is short or the length is outside `1..=8`.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        let &[_, _, hi, lo, len, ..] = payload else {
            return None;
        };
        (1..=MAX_READ_LEN).contains(&len).then_some(Self {
            address: u16::from_be_bytes([hi, lo]),
            len,
        })
    }
}

/// Decoded write-parameter request, borrowing its data bytes from the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRequest<'a> {
    pub address: u16,
    pub data: &'a [u8],
}

impl<'a> WriteRequest<'a> {
    /// `None` unless at least one data byte follows the address.
    pub fn parse(payload: &'a [u8]) -> Option<Self> {
        match payload {
            [hi, lo, data @ ..] if !data.is_empty() => Some(Self {
                address: u16::from_be_bytes([*hi, *lo]),
                data,
            }),
            _ => None,
        }
    }
}

/// Serial carried by a select request.
pub fn select_target(payload: &[u8]) -> Option<[u8; SERIAL_LEN]> {
    payload.get(2..2 + SERIAL_LEN)?.try_into().ok()
}

//==================================================================================RESPONSES
pub const WRITE_ENABLE_ACK: [u8; 5] = [0x21, 0x11, 0x01, 0x00, 0x00];
pub const WRITE_DISABLE_ACK: [u8; 5] = [0x20, 0xf0, 0x02, 0x00, 0x00];
pub const WRITE_OK: [u8; 5] = [0x20, 0xe8, 0x00, 0x00, 0x00];
/// Generic failure; the finer-grained codes of the field tool are not used.
pub const WRITE_FAILED: [u8; 5] = [0x20, 0xe8, 0x0f, 0x00, 0x00];

pub fn scan_response(identity: &ModuleIdentity) -> [u8; 8] {
    let mut data = [0u8; 8];
    data[1..5].copy_from_slice(&identity.serial);
    data[7] = identity.version_low_byte();
    data
}

pub fn select_ack(identity: &ModuleIdentity) -> [u8; 8] {
    let mut data = [0x21, 0x10, 0, 0, 0, 0, 0, 0];
    data[2..6].copy_from_slice(&identity.serial);
    data
}

pub fn will_reset(identity: &ModuleIdentity) -> [u8; 8] {
    let mut data = [0x2f, 0xff, 0, 0, 0, 0, 0, 0];
    data[2..6].copy_from_slice(&identity.serial);
    data
}

//==================================================================================TESTS
#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: ModuleIdentity = ModuleIdentity {
        serial: [0x12, 0x34, 0x56, 0x78],
        bootloader_version: 0x0203,
    };

    #[test]
    fn test_response_layouts() {
        assert_eq!(
            scan_response(&IDENTITY),
            [0x00, 0x12, 0x34, 0x56, 0x78, 0x00, 0x00, 0x03]
        );
        assert_eq!(
            select_ack(&IDENTITY),
            [0x21, 0x10, 0x12, 0x34, 0x56, 0x78, 0x00, 0x00]
        );
        assert_eq!(
            will_reset(&IDENTITY),
            [0x2f, 0xff, 0x12, 0x34, 0x56, 0x78, 0x00, 0x00]
        );
    }

    #[test]
    /// Addresses are big endian; lengths outside 1..=8 are refused.
    fn test_parse_read_request() {
        assert_eq!(
            ReadRequest::parse(&[0x20, 0x03, 0x02, 0x10, 4]),
            Some(ReadRequest { address: 0x0210, len: 4 })
        );
        assert_eq!(ReadRequest::parse(&[0x20, 0x03, 0x02, 0x10, 0]), None);
        assert_eq!(ReadRequest::parse(&[0x20, 0x03, 0x02, 0x10, 9]), None);
        assert_eq!(ReadRequest::parse(&[0x20, 0x03, 0x02]), None);
    }

    #[test]
    fn test_parse_write_request() {
        let request = WriteRequest::parse(&[0x00, 0x5b, 0xfb, 0x04]).unwrap();
        assert_eq!(request.address, 0x005b);
        assert_eq!(request.data, &[0xfb, 0x04]);
        assert!(WriteRequest::parse(&[0x02, 0x00]).is_none());
    }

    #[test]
    fn test_select_target() {
        assert_eq!(
            select_target(&[0x20, 0x10, 1, 2, 3, 4]),
            Some([1, 2, 3, 4])
        );
        assert_eq!(select_target(&[0x20, 0x10, 1, 2, 3]), None);
    }
}
