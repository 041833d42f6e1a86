// Installs the process-wide logger, so it lives in its own test binary.

use estialog_core::{Component, LogBridge, LogRegistry, MemoryTransport, Transport, UartLogSink};
use log::LevelFilter;
use std::sync::Arc;

#[test]
fn registry_level_changes_reach_the_facade() {
    let transport = Arc::new(MemoryTransport::new(1024));
    let sink = Arc::new(UartLogSink::new(
        "uart_log",
        Some(transport.clone() as Arc<dyn Transport>),
    ));
    sink.initialize().expect("transport is bound");

    let registry = Arc::new(LogRegistry::new(LevelFilter::Info));
    registry.register(sink);
    LogBridge::install(Arc::clone(&registry)).expect("first logger in this process");
    assert_eq!(log::max_level(), LevelFilter::Info);

    log::debug!(target: "estia", "hidden");
    registry.set_max_level(LevelFilter::Debug);
    assert_eq!(log::max_level(), LevelFilter::Debug);
    log::debug!(target: "estia", "shown");

    registry.set_max_level(LevelFilter::Error);
    assert_eq!(log::max_level(), LevelFilter::Error);
    log::warn!(target: "estia", "muted");

    assert_eq!(transport.outbound(), b"[DEBUG] estia: shown\n");
    assert!(LogBridge::install(registry).is_err());
}
