//! Toshiba Estia heat pump bus frames: layout, CRC, decoding, repair and stream splitting.
pub mod fixer;
pub mod frame;
pub mod request;
pub mod response;
pub mod sniffer;
pub mod status;

pub use fixer::{FixOutcome, FrameFixer};
pub use frame::{crc16, from_hex, read_u16, to_hex, Frame, FrameError, FrameKind};
pub use request::{DataPoint, DataRequest, DATA_POINTS};
pub use response::{Ack, DataResponse};
pub use sniffer::{Sniffer, SnifferState, FRAMES_LIMIT, READ_TIMEOUT};
pub use status::StatusData;
