use crate::record::LogRecord;
use crate::sink::LogSink;
use log::LevelFilter;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(u64);

/// The set of sinks records are delivered to.
///
/// Passed explicitly to the code that produces records; [`LogBridge`](crate::LogBridge)
/// connects it to the `log` facade when a process-wide hook is wanted.
pub struct LogRegistry {
    sinks: RwLock<Vec<(SinkId, Arc<dyn LogSink>)>>,
    max_level: RwLock<LevelFilter>,
    next_id: AtomicU64,
    drives_facade: AtomicBool,
}

impl Default for LogRegistry {
    fn default() -> Self {
        Self::new(LevelFilter::Debug)
    }
}

impl LogRegistry {
    pub fn new(max_level: LevelFilter) -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
            max_level: RwLock::new(max_level),
            next_id: AtomicU64::new(1),
            drives_facade: AtomicBool::new(false),
        }
    }

    pub fn register(&self, sink: Arc<dyn LogSink>) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sinks.write().push((id, sink));
        id
    }

    /// Returns `false` when `id` was not registered.
    pub fn unregister(&self, id: SinkId) -> bool {
        let mut sinks = self.sinks.write();
        let before = sinks.len();
        sinks.retain(|(sink_id, _)| *sink_id != id);
        sinks.len() != before
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    pub fn max_level(&self) -> LevelFilter {
        *self.max_level.read()
    }

    /// Once a [`LogBridge`](crate::LogBridge) is installed over this registry
    /// the `log` facade's maximum level follows it too.
    pub fn set_max_level(&self, level: LevelFilter) {
        *self.max_level.write() = level;
        if self.drives_facade.load(Ordering::Acquire) {
            log::set_max_level(level);
        }
    }

    pub(crate) fn drive_facade(&self) {
        self.drives_facade.store(true, Ordering::Release);
        log::set_max_level(self.max_level());
    }

    pub fn enabled(&self, record: &LogRecord<'_>) -> bool {
        record.level.to_log_level() <= self.max_level()
    }

    pub fn dispatch(&self, record: &LogRecord<'_>) {
        if !self.enabled(record) {
            return;
        }
        for (_, sink) in self.sinks.read().iter() {
            sink.on_log_record(record);
        }
    }

    pub fn flush(&self) {
        for (_, sink) in self.sinks.read().iter() {
            sink.flush();
        }
    }
}
