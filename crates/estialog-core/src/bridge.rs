use crate::record::LogRecord;
use crate::registry::LogRegistry;
use std::sync::Arc;

/// Routes records from the `log` facade into a [`LogRegistry`].
pub struct LogBridge {
    registry: Arc<LogRegistry>,
}

impl LogBridge {
    pub fn new(registry: Arc<LogRegistry>) -> Self {
        Self { registry }
    }

    /// Makes the bridge the process-wide `log` logger. Can succeed only once
    /// per process. Later level changes on the registry reach the facade too.
    pub fn install(registry: Arc<LogRegistry>) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(Arc::clone(&registry))))?;
        registry.drive_facade();
        Ok(())
    }

    pub fn registry(&self) -> &Arc<LogRegistry> {
        &self.registry
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.registry.max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let formatted;
        let message = match record.args().as_str() {
            Some(s) => s,
            None => {
                formatted = record.args().to_string();
                formatted.as_str()
            }
        };
        self.registry
            .dispatch(&LogRecord::new(record.level().into(), record.target(), message));
    }

    fn flush(&self) {
        self.registry.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::sink::UartLogSink;
    use crate::transport::{MemoryTransport, Transport};
    use log::{Level, LevelFilter, Log};

    #[test]
    fn forwards_log_records_with_target_as_tag() {
        let transport = Arc::new(MemoryTransport::new(256));
        let sink = Arc::new(UartLogSink::new("uart_log", Some(transport.clone() as Arc<dyn Transport>)));
        sink.initialize().unwrap();

        let registry = Arc::new(LogRegistry::new(LevelFilter::Trace));
        registry.register(sink);
        let bridge = LogBridge::new(registry);

        let value = 42;
        bridge.log(
            &log::Record::builder()
                .level(Level::Trace)
                .target("estia")
                .args(format_args!("value {value}"))
                .build(),
        );
        bridge.log(
            &log::Record::builder()
                .level(Level::Warn)
                .target("bus")
                .args(format_args!("collision"))
                .build(),
        );

        assert_eq!(
            transport.outbound(),
            b"[DEBUG] estia: value 42\n[WARN] bus: collision\n"
        );
    }

    #[test]
    fn respects_registry_level() {
        let registry = Arc::new(LogRegistry::new(LevelFilter::Info));
        let bridge = LogBridge::new(registry);
        let debug = log::Metadata::builder().level(Level::Debug).build();
        let error = log::Metadata::builder().level(Level::Error).build();
        assert!(!bridge.enabled(&debug));
        assert!(bridge.enabled(&error));
    }
}
