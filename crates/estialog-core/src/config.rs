use crate::error::LogError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    None,
    Odd,
    Even,
}

impl From<Parity> for serialport::Parity {
    fn from(parity: Parity) -> Self {
        match parity {
            Parity::None => serialport::Parity::None,
            Parity::Odd => serialport::Parity::Odd,
            Parity::Even => serialport::Parity::Even,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowControl {
    None,
    Software,
    Hardware,
}

impl From<FlowControl> for serialport::FlowControl {
    fn from(flow: FlowControl) -> Self {
        match flow {
            FlowControl::None => serialport::FlowControl::None,
            FlowControl::Software => serialport::FlowControl::Software,
            FlowControl::Hardware => serialport::FlowControl::Hardware,
        }
    }
}

/// Binding parameters for a serial port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: u8,
    pub parity: Parity,
    pub stop_bits: u8,
    pub flow_control: FlowControl,
    /// Size of the transmit buffer in bytes. Writes that do not fit are refused.
    pub tx_capacity: usize,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115_200,
            data_bits: 8,
            parity: Parity::None,
            stop_bits: 1,
            flow_control: FlowControl::None,
            tx_capacity: 1024,
        }
    }
}

impl SerialConfig {
    pub const ESTIA_BAUD: u32 = 2400;

    /// Settings of the Estia heat pump remote-controller bus (2400 baud, 8E1).
    pub fn estia_bus(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: Self::ESTIA_BAUD,
            parity: Parity::Even,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), LogError> {
        if self.port_name.is_empty() {
            return Err(LogError::Configuration("serial port name is empty".into()));
        }
        if self.baud_rate == 0 {
            return Err(LogError::Configuration("baud rate must be non-zero".into()));
        }
        if self.tx_capacity == 0 {
            return Err(LogError::Configuration("transmit buffer capacity must be non-zero".into()));
        }
        self.serial_data_bits()?;
        self.serial_stop_bits()?;
        Ok(())
    }

    fn serial_data_bits(&self) -> Result<serialport::DataBits, LogError> {
        match self.data_bits {
            5 => Ok(serialport::DataBits::Five),
            6 => Ok(serialport::DataBits::Six),
            7 => Ok(serialport::DataBits::Seven),
            8 => Ok(serialport::DataBits::Eight),
            n => Err(LogError::Configuration(format!("unsupported data bits: {n}"))),
        }
    }

    fn serial_stop_bits(&self) -> Result<serialport::StopBits, LogError> {
        match self.stop_bits {
            1 => Ok(serialport::StopBits::One),
            2 => Ok(serialport::StopBits::Two),
            n => Err(LogError::Configuration(format!("unsupported stop bits: {n}"))),
        }
    }

    pub fn open_port(&self, timeout: Duration) -> Result<Box<dyn serialport::SerialPort>, LogError> {
        Ok(self.builder(timeout)?.open()?)
    }

    pub fn builder(&self, timeout: Duration) -> Result<serialport::SerialPortBuilder, LogError> {
        self.validate()?;
        Ok(serialport::new(&self.port_name, self.baud_rate)
            .data_bits(self.serial_data_bits()?)
            .parity(self.parity.into())
            .stop_bits(self.serial_stop_bits()?)
            .flow_control(self.flow_control.into())
            .timeout(timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estia_bus_is_8e1_at_2400() {
        let cfg = SerialConfig::estia_bus("/dev/ttyUSB0");
        assert_eq!(cfg.baud_rate, 2400);
        assert_eq!(cfg.data_bits, 8);
        assert_eq!(cfg.parity, Parity::Even);
        assert_eq!(cfg.stop_bits, 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_port_name_is_a_configuration_error() {
        let err = SerialConfig::default().validate().unwrap_err();
        assert!(matches!(err, LogError::Configuration(_)));
    }

    #[test]
    fn rejects_odd_framing() {
        let cfg = SerialConfig {
            port_name: "COM3".into(),
            data_bits: 9,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LogError::Configuration(_))));

        let cfg = SerialConfig {
            port_name: "COM3".into(),
            stop_bits: 3,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LogError::Configuration(_))));
    }
}
