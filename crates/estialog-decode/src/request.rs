use crate::frame::{address, data_type, frame_len, frame_type, Frame, FrameError, DATA_OFFSET};

const REQ_DATA_BASE: [u8; 8] = [0x00, 0xef, 0x00, 0x2c, 0x08, 0x00, 0x00, 0x00];
const REQ_DATA_CODE_OFFSET: usize = 17;

/// A value the master reports on request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub name: &'static str,
    pub code: u8,
    /// Applied to the raw response value.
    pub multiplier: f32,
}

impl DataPoint {
    const fn new(name: &'static str, code: u8, multiplier: f32) -> Self {
        Self { name, code, multiplier }
    }

    pub fn by_code(code: u8) -> Option<&'static DataPoint> {
        DATA_POINTS.iter().find(|point| point.code == code)
    }

    pub fn by_name(name: &str) -> Option<&'static DataPoint> {
        DATA_POINTS.iter().find(|point| point.name == name)
    }

    pub fn scale(&self, raw: i16) -> f32 {
        raw as f32 * self.multiplier
    }
}

pub static DATA_POINTS: [DataPoint; 33] = [
    // hydro unit
    DataPoint::new("tc", 0x04, 1.0),
    DataPoint::new("twi", 0x06, 1.0),
    DataPoint::new("two", 0x07, 1.0),
    DataPoint::new("tho", 0x08, 1.0),
    DataPoint::new("tfi", 0x09, 1.0),
    DataPoint::new("ttw", 0x0a, 1.0),
    DataPoint::new("mix", 0x0b, 1.0),
    DataPoint::new("lps", 0x0e, 10.0),
    DataPoint::new("sw_ver", 0x0f, 1.0),
    DataPoint::new("ctrl_hw_temp", 0x10, 1.0),
    DataPoint::new("ctrl_zone1_temp", 0x11, 1.0),
    DataPoint::new("ctrl_zone2_temp", 0x12, 1.0),
    DataPoint::new("wf", 0xc0, 0.1),
    // outdoor unit
    DataPoint::new("te", 0x60, 1.0),
    DataPoint::new("to", 0x61, 1.0),
    DataPoint::new("td", 0x62, 1.0),
    DataPoint::new("ts", 0x63, 1.0),
    DataPoint::new("ths", 0x65, 1.0),
    DataPoint::new("ct", 0x6a, 10.0),
    DataPoint::new("tl", 0x6d, 1.0),
    DataPoint::new("cmp", 0x70, 1.0),
    DataPoint::new("fan1", 0x72, 1.0),
    DataPoint::new("fan2", 0x73, 1.0),
    DataPoint::new("pmv", 0x74, 10.0),
    DataPoint::new("hps", 0x7a, 10.0),
    // service counters
    DataPoint::new("hp_on_time", 0xf0, 100.0),
    DataPoint::new("hw_cmp_on_time", 0xf1, 100.0),
    DataPoint::new("cool_cmp_on_time", 0xf2, 100.0),
    DataPoint::new("heat_cmp_on_time", 0xf3, 100.0),
    DataPoint::new("pump1_on_time", 0xf4, 100.0),
    DataPoint::new("hw_e_heater_on_time", 0xf5, 100.0),
    DataPoint::new("backup_heater_on_time", 0xf6, 100.0),
    DataPoint::new("boost_heater_on_time", 0xf7, 100.0),
];

/// The remote controller asking the master for one data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRequest {
    pub code: u8,
}

impl DataRequest {
    pub fn decode(frame: &Frame<'_>) -> Result<Self, FrameError> {
        frame.expect(frame_len::REQ_DATA, frame_type::REQ_DATA, data_type::DATA_REQUEST)?;
        Ok(Self {
            code: frame.byte(REQ_DATA_CODE_OFFSET),
        })
    }

    pub fn build(code: u8) -> Vec<u8> {
        let mut payload = REQ_DATA_BASE;
        payload[REQ_DATA_CODE_OFFSET - DATA_OFFSET] = code;
        Frame::build(frame_type::REQ_DATA, address::REMOTE, address::MASTER, data_type::DATA_REQUEST, &payload)
    }

    pub fn data_point(&self) -> Option<&'static DataPoint> {
        DataPoint::by_code(self.code)
    }
}
