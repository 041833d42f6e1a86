use crate::frame::{data_type, frame_len, frame_type, Frame, FrameError};
use serde::Serialize;

pub const OPERATION_MODE_COOLING: u8 = 0x05;
pub const OPERATION_MODE_HEATING: u8 = 0x06;

/// Heat pump state broadcast by the master every 30 s (long frame) and on
/// every change (update frame).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusData {
    pub operation_mode: u8,
    pub extended_data: bool,
    pub cooling: bool,
    pub heating: bool,
    pub hot_water: bool,
    pub auto_mode: bool,
    pub quiet_mode: bool,
    pub night_mode: bool,
    pub backup_heater: bool,
    pub cooling_cmp: bool,
    pub heating_cmp: bool,
    pub hot_water_heater: bool,
    pub hot_water_cmp: bool,
    pub pump1: bool,
    pub hot_water_target: i16,
    pub zone1_target: i16,
    pub zone2_target: i16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hot_water_target2: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone1_target2: Option<i16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone2_target2: Option<i16>,
    pub defrost_in_progress: bool,
    pub night_mode_active: bool,
}

fn bit(byte: u8, mask: u8) -> bool {
    byte & mask == mask
}

// Temperatures travel as (t + 16) * 2.
fn temperature(raw: u8) -> i16 {
    raw as i16 / 2 - 16
}

impl StatusData {
    pub fn decode(frame: &Frame<'_>) -> Result<Self, FrameError> {
        let extended = frame.len() == frame_len::STATUS;
        if extended {
            frame.expect(frame_len::STATUS, frame_type::STATUS, data_type::STATUS)?;
        } else {
            frame.expect(frame_len::UPDATE, frame_type::UPDATE, data_type::STATUS)?;
        }

        let mode = frame.byte(11);
        let flags = frame.byte(12);
        let outputs = frame.byte(13);
        let operation_mode = (mode & 0xe0) >> 5;
        let compressor = bit(outputs, 0x02);
        // the activity byte sits after the second set of targets in the long frame
        let activity = frame.byte(if extended { 21 } else { 17 });

        Ok(Self {
            operation_mode,
            extended_data: extended,
            cooling: bit(mode, 0xa1),
            heating: bit(mode, 0xc1),
            hot_water: bit(mode, 0x02),
            auto_mode: bit(flags, 0x04),
            quiet_mode: bit(flags, 0x10),
            night_mode: bit(flags, 0x20),
            backup_heater: bit(outputs, 0x01),
            cooling_cmp: compressor && operation_mode == OPERATION_MODE_COOLING,
            heating_cmp: compressor && operation_mode == OPERATION_MODE_HEATING,
            hot_water_heater: bit(outputs, 0x04),
            hot_water_cmp: bit(outputs, 0x08),
            pump1: bit(outputs, 0x10),
            hot_water_target: temperature(frame.byte(14)),
            zone1_target: temperature(frame.byte(15)),
            zone2_target: temperature(frame.byte(16)),
            hot_water_target2: extended.then(|| temperature(frame.byte(17))),
            zone1_target2: extended.then(|| temperature(frame.byte(18))),
            zone2_target2: extended.then(|| temperature(frame.byte(19))),
            defrost_in_progress: bit(activity, 0x02),
            night_mode_active: bit(activity, 0x10),
        })
    }

    pub fn operation_mode_name(&self) -> &'static str {
        if self.operation_mode == OPERATION_MODE_HEATING {
            "heating"
        } else {
            "cooling"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::address;

    fn encode(t: u8) -> u8 {
        (t + 16) * 2
    }

    fn long_status() -> Vec<u8> {
        let mut payload = [0u8; 18];
        payload[0] = 0xc3; // heating on, hot water on
        payload[1] = 0x24; // auto, night
        payload[2] = 0x1a; // compressor, hot water compressor, pump1
        payload[3] = encode(50);
        payload[4] = encode(35);
        payload[5] = encode(30);
        payload[6] = encode(48);
        payload[7] = encode(33);
        payload[8] = encode(28);
        payload[10] = 0x12; // defrost, night mode active
        Frame::build(frame_type::STATUS, address::MASTER, address::BROADCAST, data_type::STATUS, &payload)
    }

    #[test]
    fn decodes_long_status() {
        let bytes = long_status();
        let frame = Frame::parse(&bytes).unwrap();
        let status = StatusData::decode(&frame).unwrap();

        assert!(status.extended_data);
        assert_eq!(status.operation_mode, OPERATION_MODE_HEATING);
        assert_eq!(status.operation_mode_name(), "heating");
        assert!(status.heating);
        assert!(!status.cooling);
        assert!(status.hot_water);
        assert!(status.auto_mode);
        assert!(!status.quiet_mode);
        assert!(status.night_mode);
        assert!(!status.backup_heater);
        assert!(status.heating_cmp);
        assert!(!status.cooling_cmp);
        assert!(!status.hot_water_heater);
        assert!(status.hot_water_cmp);
        assert!(status.pump1);
        assert_eq!(status.hot_water_target, 50);
        assert_eq!(status.zone1_target, 35);
        assert_eq!(status.zone2_target, 30);
        assert_eq!(status.hot_water_target2, Some(48));
        assert_eq!(status.zone1_target2, Some(33));
        assert_eq!(status.zone2_target2, Some(28));
        assert!(status.defrost_in_progress);
        assert!(status.night_mode_active);
    }

    #[test]
    fn decodes_update_without_second_targets() {
        let mut payload = [0u8; 8];
        payload[0] = 0xa1; // cooling on
        payload[2] = 0x02;
        payload[3] = encode(45);
        payload[4] = encode(12);
        payload[5] = encode(12);
        payload[6] = 0x02;
        let bytes = Frame::build(frame_type::UPDATE, address::MASTER, address::BROADCAST, data_type::STATUS, &payload);
        let status = StatusData::decode(&Frame::parse(&bytes).unwrap()).unwrap();

        assert!(!status.extended_data);
        assert!(status.cooling);
        assert!(status.cooling_cmp);
        assert!(!status.heating_cmp);
        assert_eq!(status.operation_mode_name(), "cooling");
        assert_eq!(status.zone1_target, 12);
        assert_eq!(status.hot_water_target2, None);
        assert!(status.defrost_in_progress);
        assert!(!status.night_mode_active);
    }

    #[test]
    fn rejects_other_frames() {
        let bytes = Frame::build(frame_type::ACK, address::MASTER, address::MASTER, data_type::ACK, &[0x00, 0x41]);
        let frame = Frame::parse(&bytes).unwrap();
        assert!(matches!(StatusData::decode(&frame), Err(FrameError::Length { .. })));
    }

    #[test]
    fn serializes_without_absent_targets() {
        let status = StatusData::default();
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"pump1\":false"));
        assert!(!json.contains("zone1_target2"));
    }
}
