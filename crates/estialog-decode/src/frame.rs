use std::fmt;
use thiserror::Error;

/// First two bytes of every frame.
pub const FRAME_BEGIN: u16 = 0xa000;

pub const TYPE_OFFSET: usize = 2;
pub const DATA_LEN_OFFSET: usize = 3;
pub const DATA_HEADER_OFFSET: usize = 4;
pub const SRC_OFFSET: usize = 5;
pub const DST_OFFSET: usize = 7;
pub const DATA_TYPE_OFFSET: usize = 9;
pub const DATA_OFFSET: usize = 11;

pub const HEAD_LEN: usize = 4;
pub const CRC_LEN: usize = 2;
pub const HEAD_AND_CRC_LEN: usize = HEAD_LEN + CRC_LEN;
/// Data header (header byte, source, destination, data type) counted in the data length.
pub const DATA_HEADER_LEN: usize = 7;
pub const MIN_LEN: usize = HEAD_LEN + DATA_HEADER_LEN + CRC_LEN;
pub const MAX_LEN: usize = 45;

pub mod frame_type {
    pub const CTRL: u8 = 0x10;
    pub const CMD: u8 = 0x11;
    pub const REQ_DATA: u8 = 0x17;
    pub const ACK: u8 = 0x18;
    pub const RES_DATA: u8 = 0x1a;
    pub const UPDATE: u8 = 0x1c;
    pub const STATUS2: u8 = 0x55;
    pub const STATUS: u8 = 0x58;
}

pub mod address {
    pub const MASTER: u16 = 0x0800;
    pub const REMOTE: u16 = 0x0040;
    pub const BROADCAST: u16 = 0x00fe;
}

pub mod data_type {
    pub const HEARTBEAT: u16 = 0x008a;
    pub const STATUS: u16 = 0x03c6;
    pub const SHORT_STATUS: u16 = 0x002b;
    pub const MODE_CHANGE: u16 = 0x03c4;
    pub const OPERATION_MODE: u16 = 0x03c0;
    pub const OPERATION_SWITCH: u16 = 0x0041;
    pub const TEMPERATURE_CHANGE: u16 = 0x03c1;
    pub const SPECIAL_CMD: u16 = 0x0015;
    pub const DATA_REQUEST: u16 = 0x0080;
    pub const DATA_RESPONSE: u16 = 0x00ef;
    pub const ACK: u16 = 0x00a1;
}

/// Frame lengths of the fixed-size frames, CRC included.
pub mod frame_len {
    pub const HEARTBEAT: usize = 13;
    pub const ACK: usize = 15;
    pub const STATUS2: usize = 15;
    pub const SHORT_STATUS: usize = 17;
    pub const RES_DATA: usize = 19;
    pub const REQ_DATA: usize = 21;
    pub const UPDATE: usize = 21;
    pub const STATUS: usize = 31;
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    #[error("frame too long: {0} bytes")]
    TooLong(usize),

    #[error("bad frame begin: {0:#06x}")]
    BadBegin(u16),

    #[error("data length {declared} does not match frame of {actual} bytes")]
    DataLength { declared: u8, actual: usize },

    #[error("crc mismatch: stored {stored:#06x}, computed {computed:#06x}")]
    Crc { stored: u16, computed: u16 },

    #[error("unexpected frame type {found:#04x}, expected {expected:#04x}")]
    FrameType { expected: u8, found: u8 },

    #[error("unexpected data type {found:#06x}, expected {expected:#06x}")]
    DataType { expected: u16, found: u16 },

    #[error("unexpected frame length {found}, expected {expected}")]
    Length { expected: usize, found: usize },

    #[error("data response carries no value")]
    EmptyData,

    #[error("invalid hex dump: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// CRC-16/MCRF4XX: reflected polynomial 0x1021, init 0xffff, no final xor.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xffff;
    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            crc = if crc & 1 != 0 { (crc >> 1) ^ 0x8408 } else { crc >> 1 };
        }
    }
    crc
}

/// Big-endian read that tolerates short buffers: past the end yields 0 and
/// the last byte alone yields that byte.
pub fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    match bytes.len() {
        len if offset >= len => 0,
        len if offset == len - 1 => bytes[offset] as u16,
        _ => u16::from_be_bytes([bytes[offset], bytes[offset + 1]]),
    }
}

/// Returns `false` when the field does not fit.
pub fn write_u16(bytes: &mut [u8], offset: usize, value: u16) -> bool {
    if offset + 1 >= bytes.len() {
        return false;
    }
    bytes[offset..offset + 2].copy_from_slice(&value.to_be_bytes());
    true
}

/// Whether the trailing two bytes hold the CRC of everything before them.
pub fn crc_matches(bytes: &[u8]) -> bool {
    bytes.len() >= CRC_LEN && stored_crc(bytes) == crc16(&bytes[..bytes.len() - CRC_LEN])
}

fn stored_crc(bytes: &[u8]) -> u16 {
    read_u16(bytes, bytes.len().saturating_sub(CRC_LEN))
}

/// Lower-case, space separated: `a0 00 18 09`.
pub fn to_hex(bytes: &[u8]) -> String {
    let encoded = hex::encode(bytes);
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, pair) in encoded.as_bytes().chunks(2).enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.extend(pair.iter().map(|&c| c as char));
    }
    out
}

/// Parses a hex dump, ignoring whitespace.
pub fn from_hex(dump: &str) -> Result<Vec<u8>, FrameError> {
    let compact: String = dump.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(hex::decode(compact)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Heartbeat,
    Status,
    StatusUpdate,
    ShortStatus,
    RemoteStatus,
    Ack,
    DataRequest,
    DataResponse,
    Other,
}

impl FrameKind {
    /// Recognizes a frame by its length, type, data length and data type.
    /// Does not look at the CRC.
    pub fn classify(bytes: &[u8]) -> FrameKind {
        let shapes = [
            (FrameKind::Heartbeat, frame_len::HEARTBEAT, frame_type::CTRL, data_type::HEARTBEAT),
            (FrameKind::Status, frame_len::STATUS, frame_type::STATUS, data_type::STATUS),
            (FrameKind::StatusUpdate, frame_len::UPDATE, frame_type::UPDATE, data_type::STATUS),
            (FrameKind::ShortStatus, frame_len::SHORT_STATUS, frame_type::STATUS, data_type::SHORT_STATUS),
            (FrameKind::RemoteStatus, frame_len::STATUS2, frame_type::STATUS2, data_type::STATUS),
            (FrameKind::Ack, frame_len::ACK, frame_type::ACK, data_type::ACK),
            (FrameKind::DataRequest, frame_len::REQ_DATA, frame_type::REQ_DATA, data_type::DATA_REQUEST),
            (FrameKind::DataResponse, frame_len::RES_DATA, frame_type::RES_DATA, data_type::DATA_RESPONSE),
        ];
        shapes
            .into_iter()
            .find(|&(_, len, ty, dt)| {
                bytes.len() == len
                    && bytes[TYPE_OFFSET] == ty
                    && bytes[DATA_LEN_OFFSET] as usize == len - HEAD_AND_CRC_LEN
                    && read_u16(bytes, DATA_TYPE_OFFSET) == dt
            })
            .map_or(FrameKind::Other, |(kind, ..)| kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FrameKind::Heartbeat => "heartbeat",
            FrameKind::Status => "status",
            FrameKind::StatusUpdate => "status update",
            FrameKind::ShortStatus => "short status",
            FrameKind::RemoteStatus => "remote status",
            FrameKind::Ack => "ack",
            FrameKind::DataRequest => "data request",
            FrameKind::DataResponse => "data response",
            FrameKind::Other => "other",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated view over one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    bytes: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Checks length bounds, begin marker, declared data length and CRC.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, FrameError> {
        if bytes.len() < MIN_LEN {
            return Err(FrameError::TooShort(bytes.len()));
        }
        if bytes.len() > MAX_LEN {
            return Err(FrameError::TooLong(bytes.len()));
        }
        let begin = read_u16(bytes, 0);
        if begin != FRAME_BEGIN {
            return Err(FrameError::BadBegin(begin));
        }
        let declared = bytes[DATA_LEN_OFFSET];
        if declared as usize + HEAD_AND_CRC_LEN != bytes.len() {
            return Err(FrameError::DataLength {
                declared,
                actual: bytes.len(),
            });
        }
        let computed = crc16(&bytes[..bytes.len() - CRC_LEN]);
        let stored = stored_crc(bytes);
        if stored != computed {
            return Err(FrameError::Crc { stored, computed });
        }
        Ok(Self { bytes })
    }

    /// Assembles a frame around `payload` and appends its CRC.
    pub fn build(frame_type: u8, src: u16, dst: u16, data_type: u16, payload: &[u8]) -> Vec<u8> {
        let len = DATA_OFFSET + payload.len() + CRC_LEN;
        let mut bytes = Vec::with_capacity(len);
        bytes.extend_from_slice(&FRAME_BEGIN.to_be_bytes());
        bytes.push(frame_type);
        bytes.push((len - HEAD_AND_CRC_LEN) as u8);
        bytes.push(0x00);
        bytes.extend_from_slice(&src.to_be_bytes());
        bytes.extend_from_slice(&dst.to_be_bytes());
        bytes.extend_from_slice(&data_type.to_be_bytes());
        bytes.extend_from_slice(payload);
        let crc = crc16(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());
        bytes
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn frame_type(&self) -> u8 {
        self.bytes[TYPE_OFFSET]
    }

    pub fn data_len(&self) -> u8 {
        self.bytes[DATA_LEN_OFFSET]
    }

    pub fn src(&self) -> u16 {
        read_u16(self.bytes, SRC_OFFSET)
    }

    pub fn dst(&self) -> u16 {
        read_u16(self.bytes, DST_OFFSET)
    }

    pub fn data_type(&self) -> u16 {
        read_u16(self.bytes, DATA_TYPE_OFFSET)
    }

    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[DATA_OFFSET..self.bytes.len() - CRC_LEN]
    }

    pub fn crc(&self) -> u16 {
        stored_crc(self.bytes)
    }

    pub fn byte(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    pub fn read_u16(&self, offset: usize) -> u16 {
        read_u16(self.bytes, offset)
    }

    pub fn kind(&self) -> FrameKind {
        FrameKind::classify(self.bytes)
    }

    /// Checks the frame is exactly `len` bytes of the given type and data type.
    pub fn expect(&self, len: usize, frame_type: u8, data_type: u16) -> Result<(), FrameError> {
        if self.len() != len {
            return Err(FrameError::Length {
                expected: len,
                found: self.len(),
            });
        }
        if self.frame_type() != frame_type {
            return Err(FrameError::FrameType {
                expected: frame_type,
                found: self.frame_type(),
            });
        }
        if self.data_type() != data_type {
            return Err(FrameError::DataType {
                expected: data_type,
                found: self.data_type(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Frame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_hex(self.bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Captured from a live bus.
    const OPERATION_MODE_COOLING: &str = "a0 00 11 08 00 00 40 08 00 03 c0 05 b1 7c";
    const AUTO_MODE_ON: &str = "a0 00 11 0b 00 00 40 08 00 03 c4 01 00 00 00 de df";
    const ACK_SWITCH: &str = "a0 00 18 09 00 08 00 08 00 00 a1 00 41 c1 95";
    const FORCE_DEFROST_ON: &str = "a0 00 11 0a 00 00 40 08 00 00 15 00 46 01 e7 25";

    #[test]
    fn crc_matches_captured_frames() {
        for dump in [OPERATION_MODE_COOLING, AUTO_MODE_ON, ACK_SWITCH, FORCE_DEFROST_ON] {
            let bytes = from_hex(dump).unwrap();
            assert!(crc_matches(&bytes), "{dump}");
            assert!(Frame::parse(&bytes).is_ok(), "{dump}");
        }
    }

    #[test]
    fn crc_of_nothing_is_init_value() {
        assert_eq!(crc16(&[]), 0xffff);
    }

    #[test]
    fn header_fields() {
        let bytes = from_hex(OPERATION_MODE_COOLING).unwrap();
        let frame = Frame::parse(&bytes).unwrap();
        assert_eq!(frame.frame_type(), frame_type::CMD);
        assert_eq!(frame.data_len(), 0x08);
        assert_eq!(frame.src(), address::REMOTE);
        assert_eq!(frame.dst(), address::MASTER);
        assert_eq!(frame.data_type(), data_type::OPERATION_MODE);
        assert_eq!(frame.payload(), &[0x05]);
        assert_eq!(frame.crc(), 0xb17c);
        assert_eq!(frame.kind(), FrameKind::Other);
    }

    #[test]
    fn build_reproduces_captured_frame() {
        let built = Frame::build(
            frame_type::CMD,
            address::REMOTE,
            address::MASTER,
            data_type::SPECIAL_CMD,
            &[0x00, 0x46, 0x01],
        );
        assert_eq!(to_hex(&built), FORCE_DEFROST_ON);
    }

    #[test]
    fn parse_reports_first_problem() {
        assert_eq!(Frame::parse(&[0xa0, 0x00]), Err(FrameError::TooShort(2)));
        assert_eq!(Frame::parse(&[0u8; 46]), Err(FrameError::TooLong(46)));

        let mut bytes = from_hex(ACK_SWITCH).unwrap();
        bytes[0] = 0xa1;
        assert_eq!(Frame::parse(&bytes), Err(FrameError::BadBegin(0xa100)));

        let mut bytes = from_hex(ACK_SWITCH).unwrap();
        bytes[DATA_LEN_OFFSET] = 0x0a;
        assert_eq!(
            Frame::parse(&bytes),
            Err(FrameError::DataLength { declared: 0x0a, actual: 15 })
        );

        let mut bytes = from_hex(ACK_SWITCH).unwrap();
        bytes[12] = 0x42;
        assert!(matches!(Frame::parse(&bytes), Err(FrameError::Crc { stored: 0xc195, .. })));
    }

    #[test]
    fn read_u16_edges() {
        let bytes = [0x12, 0x34, 0x56];
        assert_eq!(read_u16(&bytes, 0), 0x1234);
        assert_eq!(read_u16(&bytes, 2), 0x56);
        assert_eq!(read_u16(&bytes, 3), 0);
        assert_eq!(read_u16(&[], 0), 0);
    }

    #[test]
    fn write_u16_refuses_overflow() {
        let mut bytes = [0u8; 3];
        assert!(write_u16(&mut bytes, 1, 0xa000));
        assert_eq!(bytes, [0x00, 0xa0, 0x00]);
        assert!(!write_u16(&mut bytes, 2, 0xffff));
    }

    #[test]
    fn classifies_known_shapes() {
        let heartbeat = Frame::build(frame_type::CTRL, address::MASTER, address::BROADCAST, data_type::HEARTBEAT, &[]);
        assert_eq!(heartbeat.len(), frame_len::HEARTBEAT);
        assert_eq!(FrameKind::classify(&heartbeat), FrameKind::Heartbeat);

        let ack = from_hex(ACK_SWITCH).unwrap();
        assert_eq!(FrameKind::classify(&ack), FrameKind::Ack);

        let status = Frame::build(frame_type::STATUS, address::MASTER, address::BROADCAST, data_type::STATUS, &[0; 18]);
        assert_eq!(FrameKind::classify(&status), FrameKind::Status);

        let update = Frame::build(frame_type::UPDATE, address::MASTER, address::BROADCAST, data_type::STATUS, &[0; 8]);
        assert_eq!(FrameKind::classify(&update), FrameKind::StatusUpdate);

        assert_eq!(FrameKind::classify(&[0xa0, 0x00, 0x18]), FrameKind::Other);
    }

    #[test]
    fn hex_round_trip_keeps_spacing() {
        let bytes = from_hex("A0 00\n18 09").unwrap();
        assert_eq!(bytes, vec![0xa0, 0x00, 0x18, 0x09]);
        assert_eq!(to_hex(&bytes), "a0 00 18 09");
        assert_eq!(to_hex(&[]), "");
        assert!(matches!(from_hex("a0 0"), Err(FrameError::Hex(_))));
    }

    #[test]
    fn hex_errors_compare_by_value() {
        assert_eq!(
            from_hex("a0 zz"),
            Err(FrameError::Hex(hex::FromHexError::InvalidHexCharacter { c: 'z', index: 2 }))
        );
        assert_ne!(FrameError::from(hex::FromHexError::OddLength), FrameError::EmptyData);
    }
}
