use anyhow::{Context, Result};
use clap::Parser;
use estialog_core::SerialConfig;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug, Default)]
#[clap(name = "estialog", version, about)]
pub struct Cli {
    /// Path to the settings file
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Serial port wired to the heat pump bus
    #[clap(long)]
    pub bus: Option<String>,

    /// Serial port the log lines are written to
    #[clap(long)]
    pub log_port: Option<String>,

    /// Override the log port baud rate
    #[clap(long)]
    pub log_baud: Option<u32>,

    /// Most verbose level written: error, warn, info or debug
    #[clap(long)]
    pub level: Option<String>,

    /// Print the available serial ports and exit
    #[clap(long)]
    pub list_ports: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bus: SerialConfig,
    pub log_port: Option<SerialConfig>,
    pub level: String,
    /// Seconds between counter summaries; 0 disables them.
    pub stats_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bus: SerialConfig::estia_bus(""),
            log_port: None,
            level: "debug".to_string(),
            stats_interval_secs: 300,
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("estialog").join("settings.json"))
    }

    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse settings file: {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("Failed to read settings file: {}", path.display())),
        }
    }

    pub fn apply(&mut self, cli: &Cli) {
        if let Some(ref bus) = cli.bus {
            self.bus.port_name = bus.clone();
        }
        if let Some(ref log_port) = cli.log_port {
            self.log_port
                .get_or_insert_with(SerialConfig::default)
                .port_name = log_port.clone();
        }
        if let (Some(baud), Some(log_port)) = (cli.log_baud, self.log_port.as_mut()) {
            log_port.baud_rate = baud;
        }
        if let Some(ref level) = cli.level {
            self.level = level.clone();
        }
    }

    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.level
            .parse()
            .with_context(|| format!("Unknown log level: {}", self.level))
    }
}

pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let path = cli.config.clone().or_else(Settings::default_path);
    let mut settings = match path {
        Some(ref path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.apply(cli);
    Ok(settings)
}
