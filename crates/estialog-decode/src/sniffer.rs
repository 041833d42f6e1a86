use crate::frame::{crc_matches, read_u16, DATA_LEN_OFFSET, FRAME_BEGIN, HEAD_AND_CRC_LEN, HEAD_LEN, MAX_LEN, MIN_LEN};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Silence after which a partial frame is handed out as is. The longest
/// valid frame takes 189 ms at 2400 baud.
pub const READ_TIMEOUT: Duration = Duration::from_millis(190);

/// Pending frames are capped below this count; the oldest go first.
pub const FRAMES_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnifferState {
    Idle,
    /// A frame is being received.
    Busy,
    FramePending,
}

/// Splits the raw bus byte stream into frames.
///
/// The length declared in a frame's header is only a hint: a frame is handed
/// out as soon as it reaches that length with a matching CRC. Otherwise it
/// ends at the next begin marker, at the maximum frame size, or when the bus
/// stays silent for [`READ_TIMEOUT`]. A begin marker inside the declared
/// length is taken as payload until the frame outgrows that length; then the
/// frame is cut at the first such marker. Frames are handed out unchecked;
/// damaged ones are for [`FrameFixer`](crate::FrameFixer) to deal with.
#[derive(Debug, Default)]
pub struct Sniffer {
    current: Vec<u8>,
    frames: VecDeque<Vec<u8>>,
    last_rx: Option<Instant>,
    overflowed: u64,
}

impl Sniffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8], now: Instant) {
        if bytes.is_empty() {
            return;
        }
        self.last_rx = Some(now);
        for &byte in bytes {
            self.current.push(byte);

            if let Some(at) = self.split_point() {
                let frame: Vec<u8> = self.current.drain(..at).collect();
                self.emit(frame);
            }

            let len = self.current.len();
            let complete = len >= MAX_LEN
                || self
                    .expected_len()
                    .is_some_and(|expected| len == expected && crc_matches(&self.current));
            if complete {
                let frame = std::mem::take(&mut self.current);
                self.emit(frame);
            }
        }
    }

    /// Hands out a partial frame once the bus has been quiet long enough.
    /// Returns whether it did.
    pub fn poll(&mut self, now: Instant) -> bool {
        let timed_out = self
            .last_rx
            .is_some_and(|last| now.saturating_duration_since(last) >= READ_TIMEOUT);
        if self.current.is_empty() || !timed_out {
            return false;
        }
        let frame = std::mem::take(&mut self.current);
        self.emit(frame);
        true
    }

    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.frames.len()
    }

    /// Frames discarded because nobody collected them in time.
    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }

    pub fn state(&self) -> SnifferState {
        if !self.frames.is_empty() {
            SnifferState::FramePending
        } else if !self.current.is_empty() {
            SnifferState::Busy
        } else {
            SnifferState::Idle
        }
    }

    fn expected_len(&self) -> Option<usize> {
        if self.current.len() < HEAD_LEN || read_u16(&self.current, 0) != FRAME_BEGIN {
            return None;
        }
        let len = self.current[DATA_LEN_OFFSET] as usize + HEAD_AND_CRC_LEN;
        (MIN_LEN..=MAX_LEN).contains(&len).then_some(len)
    }

    // Where the current frame should be cut, if a frame boundary just showed up.
    fn split_point(&self) -> Option<usize> {
        let len = self.current.len();
        let expected = self.expected_len();

        if len > 2 && read_u16(&self.current, len - 2) == FRAME_BEGIN {
            let at = len - 2;
            if !expected.is_some_and(|expected| at < expected) {
                return Some(at);
            }
        }

        // One byte past the declared length: the header lied, so a begin
        // marker taken as payload was the real boundary.
        match expected {
            Some(expected) if len == expected + 1 => {
                (1..len - 1).find(|&idx| read_u16(&self.current, idx) == FRAME_BEGIN)
            }
            _ => None,
        }
    }

    fn emit(&mut self, frame: Vec<u8>) {
        if frame.is_empty() {
            return;
        }
        self.frames.push_back(frame);
        while self.frames.len() >= FRAMES_LIMIT {
            self.frames.pop_front();
            self.overflowed += 1;
        }
    }
}
