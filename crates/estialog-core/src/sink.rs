use crate::component::Component;
use crate::error::{LogError, TransportError};
use crate::record::LogRecord;
use crate::transport::Transport;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// A consumer of log records.
pub trait LogSink: Send + Sync {
    /// Handles one record. Must return without blocking.
    fn on_log_record(&self, record: &LogRecord<'_>);

    fn flush(&self) {}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkStats {
    /// Records refused because the transport buffer was full.
    pub dropped: u64,
    /// Records lost to transport errors other than a full buffer.
    pub write_errors: u64,
}

/// Writes every record as one ASCII line to a serial transport.
pub struct UartLogSink {
    id: String,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    active: AtomicBool,
    dropped: AtomicU64,
    write_errors: AtomicU64,
}

impl UartLogSink {
    /// Creates an inactive sink. The transport is checked by
    /// [`Component::initialize`], not here.
    pub fn new(id: impl Into<String>, transport: Option<Arc<dyn Transport>>) -> Self {
        Self {
            id: id.into(),
            transport: RwLock::new(transport),
            active: AtomicBool::new(false),
            dropped: AtomicU64::new(0),
            write_errors: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replaces the transport binding. Takes effect at the next
    /// [`Component::initialize`].
    pub fn bind(&self, transport: Option<Arc<dyn Transport>>) {
        self.active.store(false, Ordering::Release);
        *self.transport.write() = transport;
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> SinkStats {
        SinkStats {
            dropped: self.dropped.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }

    fn active_transport(&self) -> Option<Arc<dyn Transport>> {
        if !self.is_active() {
            return None;
        }
        self.transport.read().clone()
    }
}

impl Component for UartLogSink {
    fn initialize(&self) -> Result<(), LogError> {
        if self.transport.read().is_none() {
            self.active.store(false, Ordering::Release);
            return Err(LogError::Configuration(format!(
                "log sink `{}` has no transport bound",
                self.id
            )));
        }
        self.active.store(true, Ordering::Release);
        Ok(())
    }

    fn teardown(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            if let Some(transport) = self.transport.read().as_ref() {
                transport.flush();
            }
        }
    }
}

impl LogSink for UartLogSink {
    fn on_log_record(&self, record: &LogRecord<'_>) {
        let Some(transport) = self.active_transport() else {
            return;
        };
        let line = record.to_line();
        match transport.try_write(&line) {
            Ok(()) => {}
            Err(TransportError::BufferFull) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TransportError::Disconnected | TransportError::Io(_)) => {
                self.write_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn flush(&self) {
        if let Some(transport) = self.active_transport() {
            transport.flush();
        }
    }
}
