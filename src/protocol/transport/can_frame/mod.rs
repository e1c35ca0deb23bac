//! In-memory representation of a classic CAN data frame.
use crate::error::FrameError;
use crate::protocol::transport::can_id::CanId;

/// Classic CAN payload capacity.
pub const MAX_DLC: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Data frame as read from or written to the bus.
///
/// Frames are transient: produced by the receive interrupt, consumed by one
/// dispatch call, then discarded.
pub struct CanFrame {
    id: CanId,
    data: [u8; MAX_DLC],
    len: u8,
}

impl CanFrame {
    /// Zero-length placeholder used to initialise fixed buffers.
    pub const EMPTY: Self = Self {
        id: match CanId::standard(0) {
            Some(id) => id,
            None => panic!("0 is a valid standard id"),
        },
        data: [0; MAX_DLC],
        len: 0,
    };

    /// Builds a frame, rejecting payloads longer than eight bytes.
    pub fn new(id: impl Into<CanId>, payload: &[u8]) -> Result<Self, FrameError> {
        if payload.len() > MAX_DLC {
            return Err(FrameError::DataTooLong { len: payload.len() });
        }
        let mut data = [0u8; MAX_DLC];
        data[..payload.len()].copy_from_slice(payload);
        Ok(Self {
            id: id.into(),
            data,
            len: payload.len() as u8,
        })
    }

    pub fn id(&self) -> CanId {
        self.id
    }

    /// Data length code (0..=8).
    pub fn dlc(&self) -> usize {
        self.len as usize
    }

    /// Valid payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }
}

impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<embedded_can::Id>, data: &[u8]) -> Option<Self> {
        CanFrame::new(CanId::from(id.into()), data).ok()
    }

    /// Remote frames are never queued or sent by this firmware.
    fn new_remote(_id: impl Into<embedded_can::Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        self.id.is_extended()
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> embedded_can::Id {
        self.id.into()
    }

    fn dlc(&self) -> usize {
        self.len as usize
    }

    fn data(&self) -> &[u8] {
        self.payload()
    }
}

//==================================================================================TESTS
#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::transport::can_id::COMMAND_ID;
    use embedded_can::Frame;

    #[test]
    /// Payload and length are kept together; padding stays zeroed.
    fn test_new_frame() {
        let frame = CanFrame::new(COMMAND_ID, &[0x20, 0x10]).unwrap();
        assert_eq!(frame.dlc(), 2);
        assert_eq!(frame.payload(), &[0x20, 0x10]);
        assert_eq!(frame.id(), COMMAND_ID);
    }

    #[test]
    /// Nine bytes is not a classic CAN frame.
    fn test_payload_too_long() {
        assert_eq!(
            CanFrame::new(COMMAND_ID, &[0; 9]),
            Err(FrameError::DataTooLong { len: 9 })
        );
    }

    #[test]
    /// HAL frames can be built through the `embedded_can::Frame` trait.
    fn test_embedded_can_frame() {
        let id = embedded_can::ExtendedId::new(0x1FFF_FFF0).unwrap();
        let frame = <CanFrame as Frame>::new(id, &[0, 0]).unwrap();
        assert!(frame.is_extended());
        assert!(!frame.is_remote_frame());
        assert_eq!(Frame::dlc(&frame), 2);
        assert!(<CanFrame as Frame>::new_remote(id, 0).is_none());
    }
}
