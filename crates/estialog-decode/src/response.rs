use crate::frame::{data_type, frame_len, frame_type, Frame, FrameError};

const ACK_CODE_OFFSET: usize = 11;
const RES_DATA_EMPTY_OFFSET: usize = 13;
const RES_DATA_VALUE_OFFSET: usize = 15;
const RES_DATA_FLAG_EMPTY: u16 = 0x00a2;

/// Master's acknowledgement of a command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Data type of the acknowledged command.
    pub frame_code: u16,
}

impl Ack {
    pub fn decode(frame: &Frame<'_>) -> Result<Self, FrameError> {
        frame.expect(frame_len::ACK, frame_type::ACK, data_type::ACK)?;
        Ok(Self {
            frame_code: frame.read_u16(ACK_CODE_OFFSET),
        })
    }
}

/// Answer to a sensor data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataResponse {
    pub value: i16,
}

impl DataResponse {
    pub fn decode(frame: &Frame<'_>) -> Result<Self, FrameError> {
        frame.expect(frame_len::RES_DATA, frame_type::RES_DATA, data_type::DATA_RESPONSE)?;
        if frame.read_u16(RES_DATA_EMPTY_OFFSET) == RES_DATA_FLAG_EMPTY {
            return Err(FrameError::EmptyData);
        }
        Ok(Self {
            value: frame.read_u16(RES_DATA_VALUE_OFFSET) as i16,
        })
    }
}
