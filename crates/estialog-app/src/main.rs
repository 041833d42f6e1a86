mod config;
mod monitor;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Cli, Settings};
use estialog_core::{Component, LogBridge, LogRegistry, SerialTransport, Transport, TransportEvent, UartLogSink};
use log::info;
use monitor::Monitor;
use std::io::{ErrorKind, Read};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SINK_ID: &str = "toshiba_log";
const BUS_TIMEOUT: Duration = Duration::from_millis(50);

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.list_ports {
        for port in SerialTransport::list_ports() {
            match (port.vid, port.pid) {
                (Some(vid), Some(pid)) => println!("{} ({} {:04x}:{:04x})", port.port_name, port.port_type, vid, pid),
                _ => println!("{} ({})", port.port_name, port.port_type),
            }
        }
        return Ok(());
    }

    let settings = config::load_settings(&cli)?;
    let registry = Arc::new(LogRegistry::new(settings.level_filter()?));

    let transport = match settings.log_port.clone() {
        Some(cfg) => {
            let name = cfg.port_name.clone();
            let transport = SerialTransport::open(cfg).with_context(|| format!("Failed to open log port {name}"))?;
            Some(Arc::new(transport))
        }
        None => None,
    };

    let sink = Arc::new(UartLogSink::new(
        SINK_ID,
        transport.clone().map(|t| t as Arc<dyn Transport>),
    ));
    sink.initialize().context("No log port configured (use --log-port)")?;
    registry.register(sink.clone());
    LogBridge::install(Arc::clone(&registry)).context("Failed to install logger")?;
    info!("UART logger started");

    let result = run(&settings, registry, &sink, transport.as_deref());
    sink.teardown();
    result
}

fn run(
    settings: &Settings,
    registry: Arc<LogRegistry>,
    sink: &UartLogSink,
    transport: Option<&SerialTransport>,
) -> Result<()> {
    let mut bus = settings
        .bus
        .open_port(BUS_TIMEOUT)
        .with_context(|| format!("Failed to open bus port {}", settings.bus.port_name))?;
    info!("listening on {} at {} baud", settings.bus.port_name, settings.bus.baud_rate);

    let stats_interval = (settings.stats_interval_secs > 0).then(|| Duration::from_secs(settings.stats_interval_secs));
    let mut last_stats = Instant::now();
    let mut monitor = Monitor::new(registry);
    let mut buf = [0u8; 256];

    loop {
        match bus.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => monitor.feed(&buf[..n], Instant::now()),
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e).context("Bus read failed"),
        }
        monitor.poll(Instant::now());

        if let Some(transport) = transport {
            for event in transport.events().try_iter() {
                if let TransportEvent::Error(e) = event {
                    eprintln!("log port {}: {e}", transport.config().port_name);
                }
            }
        }

        if let Some(interval) = stats_interval {
            if last_stats.elapsed() >= interval {
                let stats = monitor.stats();
                let sink_stats = sink.stats();
                info!(
                    "frames {} repaired {} bad {} overflowed {} dropped lines {} write errors {}",
                    stats.frames,
                    stats.repaired,
                    stats.unrecoverable,
                    stats.overflowed,
                    sink_stats.dropped,
                    sink_stats.write_errors
                );
                last_stats = Instant::now();
            }
        }
    }
}
