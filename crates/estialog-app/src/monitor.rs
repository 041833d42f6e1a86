use estialog_core::{Level, LogRecord, LogRegistry};
use estialog_decode::{
    to_hex, Ack, DataPoint, DataRequest, DataResponse, FixOutcome, Frame, FrameError, FrameFixer, FrameKind, Sniffer,
    StatusData,
};
use std::sync::Arc;
use std::time::Instant;

pub const TAG: &str = "estia";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub frames: u64,
    pub repaired: u64,
    pub unrecoverable: u64,
    pub overflowed: u64,
}

/// Turns raw bus bytes into log records.
pub struct Monitor {
    registry: Arc<LogRegistry>,
    sniffer: Sniffer,
    fixer: FrameFixer,
    stats: MonitorStats,
    /// Code of the last data request seen; the next response answers it.
    last_request: Option<u8>,
}

impl Monitor {
    pub fn new(registry: Arc<LogRegistry>) -> Self {
        Self {
            registry,
            sniffer: Sniffer::new(),
            fixer: FrameFixer::new(),
            stats: MonitorStats::default(),
            last_request: None,
        }
    }

    pub fn feed(&mut self, bytes: &[u8], now: Instant) {
        self.sniffer.push(bytes, now);
        self.drain();
    }

    pub fn poll(&mut self, now: Instant) {
        if self.sniffer.poll(now) {
            self.drain();
        }
    }

    pub fn stats(&self) -> MonitorStats {
        MonitorStats {
            overflowed: self.sniffer.overflowed(),
            ..self.stats
        }
    }

    fn drain(&mut self) {
        if self.sniffer.pending() == 0 {
            return;
        }
        while let Some(frame) = self.sniffer.next_frame() {
            self.handle(frame);
        }
        self.registry.flush();
    }

    fn handle(&mut self, mut raw: Vec<u8>) {
        match self.fixer.fix(&mut raw) {
            FixOutcome::Valid => {}
            FixOutcome::Repaired => {
                self.stats.repaired += 1;
                self.emit(Level::Warn, "frame repaired");
            }
            FixOutcome::Unrecoverable => {
                self.stats.unrecoverable += 1;
                self.emit(Level::Warn, &format!("bad frame {}", to_hex(&raw)));
                return;
            }
        }

        let frame = match Frame::parse(&raw) {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.unrecoverable += 1;
                self.emit(Level::Warn, &format!("bad frame {}: {e}", to_hex(&raw)));
                return;
            }
        };
        self.stats.frames += 1;
        self.emit(Level::Info, &format!("{} {}", frame.kind(), to_hex(&raw)));

        if let Some(detail) = self.describe(&frame) {
            self.emit(Level::Debug, &detail);
        }
    }

    fn emit(&self, level: Level, message: &str) {
        self.registry.dispatch(&LogRecord::new(level, TAG, message));
    }

    fn describe(&mut self, frame: &Frame<'_>) -> Option<String> {
        match frame.kind() {
            FrameKind::Status | FrameKind::StatusUpdate => {
                let status = StatusData::decode(frame).ok()?;
                let json = serde_json::to_string(&status).ok()?;
                Some(format!("status {} {json}", status.operation_mode_name()))
            }
            FrameKind::Ack => {
                let ack = Ack::decode(frame).ok()?;
                Some(format!("frame 0x{:04x} acked", ack.frame_code))
            }
            FrameKind::DataRequest => {
                let request = DataRequest::decode(frame).ok()?;
                self.last_request = Some(request.code);
                Some(format!("data request {}", data_point_name(request.code)))
            }
            FrameKind::DataResponse => {
                let code = self.last_request.take();
                let name = code.map_or_else(|| "value".to_string(), data_point_name);
                match DataResponse::decode(frame) {
                    Ok(response) => Some(match code.and_then(DataPoint::by_code) {
                        Some(point) => format!("data {name} {}", point.scale(response.value)),
                        None => format!("data {name} {}", response.value),
                    }),
                    Err(FrameError::EmptyData) => Some(format!("data {name} empty")),
                    Err(_) => None,
                }
            }
            _ => None,
        }
    }
}

fn data_point_name(code: u8) -> String {
    match DataPoint::by_code(code) {
        Some(point) => point.name.to_string(),
        None => format!("0x{code:02x}"),
    }
}
