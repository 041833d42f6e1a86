use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

/// Reasons a transport refused a write.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transmit buffer full")]
    BufferFull,

    #[error("transport disconnected")]
    Disconnected,

    #[error("transport I/O error: {0}")]
    Io(String),
}
