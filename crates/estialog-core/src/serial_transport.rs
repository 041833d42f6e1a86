use crate::config::SerialConfig;
use crate::error::{LogError, TransportError};
use crate::transport::Transport;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use serialport::{SerialPort, SerialPortInfo};
use std::collections::VecDeque;
use std::io::{ErrorKind, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PORT_TIMEOUT: Duration = Duration::from_millis(50);
const IDLE_POLL: Duration = Duration::from_millis(5);
const CHUNK_SIZE: usize = 256;

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, vid, pid, manufacturer, product) = match &info.port_type {
            serialport::SerialPortType::UsbPort(usb) => (
                "USB".to_string(),
                Some(usb.vid),
                Some(usb.pid),
                usb.manufacturer.clone(),
                usb.product.clone(),
            ),
            serialport::SerialPortType::PciPort => ("PCI".to_string(), None, None, None, None),
            serialport::SerialPortType::BluetoothPort => ("Bluetooth".to_string(), None, None, None, None),
            serialport::SerialPortType::Unknown => ("Unknown".to_string(), None, None, None, None),
        };
        Self {
            port_name: info.port_name,
            port_type,
            vid,
            pid,
            manufacturer,
            product,
        }
    }
}

/// Progress reported by the transport's worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened(String),
    Tx(usize),
    Error(String),
    Closed,
}

enum Command {
    Flush,
    Close,
}

struct Shared {
    buffer: Mutex<VecDeque<u8>>,
    capacity: usize,
    connected: AtomicBool,
}

impl Shared {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            connected: AtomicBool::new(true),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Release);
    }

    // All or nothing; the lock is held for the copy only.
    fn push(&self, bytes: &[u8]) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::Disconnected);
        }
        let mut buffer = self.buffer.lock();
        if buffer.len() + bytes.len() > self.capacity {
            return Err(TransportError::BufferFull);
        }
        buffer.extend(bytes);
        Ok(())
    }

    fn take_chunk(&self, chunk: &mut Vec<u8>) {
        let mut buffer = self.buffer.lock();
        let n = buffer.len().min(CHUNK_SIZE);
        chunk.extend(buffer.drain(..n));
    }
}

/// Serial port transport.
///
/// Writes land in a bounded buffer; a worker thread owns the port and drains
/// the buffer to it. No serial I/O happens on the caller's thread.
pub struct SerialTransport {
    cfg: SerialConfig,
    shared: Arc<Shared>,
    tx_cmd: Sender<Command>,
    rx_evt: Receiver<TransportEvent>,
}

impl SerialTransport {
    pub fn list_ports() -> Vec<PortInfo> {
        serialport::available_ports()
            .unwrap_or_default()
            .into_iter()
            .map(PortInfo::from)
            .collect()
    }

    /// Opens the port and starts the worker. Open failures are returned here
    /// so they reach the host's setup path.
    pub fn open(cfg: SerialConfig) -> Result<Self, LogError> {
        let port = cfg.open_port(PORT_TIMEOUT)?;

        let (tx_cmd, rx_cmd) = unbounded::<Command>();
        let (tx_evt, rx_evt) = unbounded::<TransportEvent>();
        let shared = Arc::new(Shared::new(cfg.tx_capacity));

        let _ = tx_evt.send(TransportEvent::Opened(cfg.port_name.clone()));
        let worker_shared = Arc::clone(&shared);
        std::thread::Builder::new()
            .name(format!("uart-tx {}", cfg.port_name))
            .spawn(move || run_worker(port, worker_shared, rx_cmd, tx_evt))
            .map_err(|e| LogError::Configuration(format!("failed to start transmit worker: {e}")))?;

        Ok(Self { cfg, shared, tx_cmd, rx_evt })
    }

    pub fn close(&self) {
        let _ = self.tx_cmd.send(Command::Close);
    }

    pub fn events(&self) -> &Receiver<TransportEvent> {
        &self.rx_evt
    }

    pub fn config(&self) -> &SerialConfig {
        &self.cfg
    }

    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }
}

impl Transport for SerialTransport {
    fn try_write(&self, bytes: &[u8]) -> Result<(), TransportError> {
        self.shared.push(bytes)
    }

    fn flush(&self) {
        let _ = self.tx_cmd.send(Command::Flush);
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

fn run_worker(
    mut port: Box<dyn SerialPort>,
    shared: Arc<Shared>,
    rx_cmd: Receiver<Command>,
    tx_evt: Sender<TransportEvent>,
) {
    let mut chunk: Vec<u8> = Vec::with_capacity(CHUNK_SIZE);
    let mut written = 0;
    loop {
        if chunk.is_empty() {
            shared.take_chunk(&mut chunk);
            written = 0;
        }

        if written < chunk.len() {
            match port.write(&chunk[written..]) {
                Ok(n) => {
                    written += n;
                    if written == chunk.len() {
                        let _ = tx_evt.send(TransportEvent::Tx(chunk.len()));
                        chunk.clear();
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    shared.disconnect();
                    let _ = tx_evt.send(TransportEvent::Error(e.to_string()));
                    let _ = tx_evt.send(TransportEvent::Closed);
                    return;
                }
            }
        }

        let idle = chunk.is_empty() && shared.buffer.lock().is_empty();
        let cmd = if idle {
            match rx_cmd.recv_timeout(IDLE_POLL) {
                Ok(cmd) => Some(cmd),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => Some(Command::Close),
            }
        } else {
            rx_cmd.try_recv().ok()
        };

        match cmd {
            Some(Command::Flush) => {
                if let Err(e) = port.flush() {
                    let _ = tx_evt.send(TransportEvent::Error(e.to_string()));
                }
            }
            Some(Command::Close) => {
                shared.disconnect();
                let _ = tx_evt.send(TransportEvent::Closed);
                return;
            }
            None => {}
        }
    }
}
