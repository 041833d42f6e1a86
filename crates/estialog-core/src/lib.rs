//! Core functionalities: log records, the UART log sink, transports, sink registry.

pub mod bridge;
pub mod component;
pub mod config;
pub mod error;
pub mod record;
pub mod registry;
pub mod serial_transport;
pub mod sink;
pub mod transport;

pub use bridge::LogBridge;
pub use component::Component;
pub use config::{FlowControl, Parity, SerialConfig};
pub use error::{LogError, TransportError};
pub use record::{Level, LogRecord};
pub use registry::{LogRegistry, SinkId};
pub use serial_transport::{PortInfo, SerialTransport, TransportEvent};
pub use sink::{LogSink, SinkStats, UartLogSink};
pub use transport::{MemoryTransport, Transport};
