use crate::frame::{
    address, crc16, data_type, frame_type, read_u16, write_u16, CRC_LEN, DATA_HEADER_OFFSET, DATA_LEN_OFFSET,
    DATA_TYPE_OFFSET, DST_OFFSET, FRAME_BEGIN, HEAD_AND_CRC_LEN, MAX_LEN, MIN_LEN, SRC_OFFSET, TYPE_OFFSET,
};

/// Header of a frame the master or remote sends regularly.
#[derive(Debug, Clone, Copy)]
struct KnownFrame {
    frame_type: u8,
    data_len: u8,
    src: u16,
    dst: u16,
    data_type: u16,
}

impl KnownFrame {
    const fn new(frame_type: u8, data_len: u8, src: u16, dst: u16, data_type: u16) -> Self {
        Self { frame_type, data_len, src, dst, data_type }
    }

    fn len(&self) -> usize {
        self.data_len as usize + HEAD_AND_CRC_LEN
    }
}

const KNOWN_FRAMES: [KnownFrame; 8] = [
    KnownFrame::new(frame_type::CTRL, 0x07, address::MASTER, address::BROADCAST, data_type::HEARTBEAT),
    KnownFrame::new(frame_type::STATUS2, 0x09, address::REMOTE, address::MASTER, data_type::STATUS),
    KnownFrame::new(frame_type::STATUS, 0x19, address::MASTER, address::BROADCAST, data_type::STATUS),
    KnownFrame::new(frame_type::STATUS, 0x0b, address::MASTER, address::BROADCAST, data_type::SHORT_STATUS),
    KnownFrame::new(frame_type::UPDATE, 0x0f, address::MASTER, address::BROADCAST, data_type::STATUS),
    KnownFrame::new(frame_type::RES_DATA, 0x0d, address::MASTER, address::REMOTE, data_type::DATA_RESPONSE),
    KnownFrame::new(frame_type::ACK, 0x09, address::MASTER, address::MASTER, data_type::ACK),
    KnownFrame::new(frame_type::ACK, 0x09, address::MASTER, address::REMOTE, data_type::ACK),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixOutcome {
    /// CRC already matched; the frame is untouched.
    Valid,
    /// The frame was rewritten and now matches its CRC.
    Repaired,
    /// No repair produced a matching CRC; the frame is untouched.
    Unrecoverable,
}

impl FixOutcome {
    pub fn is_usable(&self) -> bool {
        !matches!(self, FixOutcome::Unrecoverable)
    }
}

/// Repairs frames corrupted by collisions on the shared bus.
///
/// The trailing CRC is trusted: a guess is kept only when the rewritten
/// frame matches it. Guesses accumulate, each step building on the previous.
#[derive(Debug)]
pub struct FrameFixer {
    scratch: Vec<u8>,
    crc: u16,
}

impl Default for FrameFixer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameFixer {
    pub fn new() -> Self {
        Self {
            scratch: Vec::with_capacity(MAX_LEN),
            crc: 0,
        }
    }

    pub fn fix(&mut self, frame: &mut Vec<u8>) -> FixOutcome {
        if frame.len() < MIN_LEN - 2 {
            return FixOutcome::Unrecoverable;
        }
        self.crc = read_u16(frame, frame.len() - CRC_LEN);
        if self.crc_ok(frame) {
            return FixOutcome::Valid;
        }

        self.scratch.clear();
        self.scratch.extend_from_slice(frame);

        let repaired = self.add_missing_begin()
            || (self.scratch.len() >= MIN_LEN
                && (self.fix_data_len()
                    || self.fix_static_bytes()
                    || self.fix_known_fields()));

        if repaired {
            std::mem::swap(frame, &mut self.scratch);
            FixOutcome::Repaired
        } else {
            FixOutcome::Unrecoverable
        }
    }

    fn crc_ok(&self, bytes: &[u8]) -> bool {
        self.crc == crc16(&bytes[..bytes.len() - CRC_LEN])
    }

    // The first one or two bytes of a frame get lost when the receiver starts
    // mid-transmission.
    fn add_missing_begin(&mut self) -> bool {
        if read_u16(&self.scratch, 0) == FRAME_BEGIN {
            return false;
        }
        let [begin_hi, begin_lo] = FRAME_BEGIN.to_be_bytes();
        for known in &KNOWN_FRAMES {
            let first = self.scratch[0];
            if first == begin_lo && self.scratch.len() == known.len() - 1 {
                self.scratch.insert(0, begin_hi);
                return self.crc_ok(&self.scratch);
            }
            if first == known.frame_type && self.scratch.len() == known.len() - 2 {
                self.scratch.splice(0..0, [begin_hi, begin_lo]);
                return self.crc_ok(&self.scratch);
            }
        }
        false
    }

    fn fix_data_len(&mut self) -> bool {
        let actual = self.scratch.len() - HEAD_AND_CRC_LEN;
        if self.scratch[DATA_LEN_OFFSET] as usize == actual {
            return false;
        }
        self.scratch[DATA_LEN_OFFSET] = actual as u8;
        self.crc_ok(&self.scratch)
    }

    fn fix_static_bytes(&mut self) -> bool {
        write_u16(&mut self.scratch, 0, FRAME_BEGIN);
        self.scratch[DATA_HEADER_OFFSET] = 0x00;
        self.crc_ok(&self.scratch)
    }

    fn fix_known_fields(&mut self) -> bool {
        for known in &KNOWN_FRAMES {
            if self.scratch[DATA_LEN_OFFSET] != known.data_len {
                continue;
            }
            if self.fix_frame_type(known) || self.fix_data_header(known) {
                return true;
            }
        }
        false
    }

    fn fix_frame_type(&mut self, known: &KnownFrame) -> bool {
        if self.scratch[TYPE_OFFSET] == known.frame_type {
            return false;
        }
        self.scratch[TYPE_OFFSET] = known.frame_type;
        self.crc_ok(&self.scratch)
    }

    fn fix_data_header(&mut self, known: &KnownFrame) -> bool {
        write_u16(&mut self.scratch, SRC_OFFSET, known.src);
        write_u16(&mut self.scratch, DST_OFFSET, known.dst);
        write_u16(&mut self.scratch, DATA_TYPE_OFFSET, known.data_type);
        self.crc_ok(&self.scratch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{from_hex, Frame};

    const ACK: &str = "a0 00 18 09 00 08 00 08 00 00 a1 00 41 c1 95";

    fn ack() -> Vec<u8> {
        from_hex(ACK).unwrap()
    }

    #[test]
    fn valid_frame_is_left_alone() {
        let mut frame = ack();
        assert_eq!(FrameFixer::new().fix(&mut frame), FixOutcome::Valid);
        assert_eq!(frame, ack());
    }

    #[test]
    fn restores_lost_begin_bytes() {
        let mut fixer = FrameFixer::new();

        let mut one_lost = ack()[1..].to_vec();
        assert_eq!(fixer.fix(&mut one_lost), FixOutcome::Repaired);
        assert_eq!(one_lost, ack());

        let mut two_lost = ack()[2..].to_vec();
        assert_eq!(fixer.fix(&mut two_lost), FixOutcome::Repaired);
        assert_eq!(two_lost, ack());
    }

    #[test]
    fn restores_data_length() {
        let mut frame = ack();
        frame[DATA_LEN_OFFSET] = 0x0b;
        assert_eq!(FrameFixer::new().fix(&mut frame), FixOutcome::Repaired);
        assert!(Frame::parse(&frame).is_ok());
    }

    #[test]
    fn restores_begin_marker() {
        let mut frame = ack();
        frame[0] = 0x20;
        assert_eq!(FrameFixer::new().fix(&mut frame), FixOutcome::Repaired);
        assert_eq!(frame, ack());
    }

    #[test]
    fn restores_frame_type_from_known_shapes() {
        let mut frame = ack();
        frame[TYPE_OFFSET] = 0x10;
        assert_eq!(FrameFixer::new().fix(&mut frame), FixOutcome::Repaired);
        assert_eq!(frame, ack());
    }

    #[test]
    fn payload_damage_is_unrecoverable() {
        let mut frame = ack();
        frame[11] = 0x55;
        let before = frame.clone();
        assert_eq!(FrameFixer::new().fix(&mut frame), FixOutcome::Unrecoverable);
        assert_eq!(frame, before);
    }

    #[test]
    fn fragments_are_unrecoverable() {
        let mut frame = vec![0xa0, 0x00, 0x18];
        assert_eq!(FrameFixer::new().fix(&mut frame), FixOutcome::Unrecoverable);
        assert!(!FixOutcome::Unrecoverable.is_usable());
    }
}
