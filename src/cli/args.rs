//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

use crate::domain::GeneratorParams;

pub const DEFAULT_ADDRESS: &str = "test.mosquitto.org:1883";
pub const DEFAULT_TOPIC: &str = "zhaw/pcls/wehs/phyphox";
pub const MIN_INTERVAL: f64 = 0.1;
pub const MAX_INTERVAL: f64 = 10.0;

/// Generate customized phyphox MQTT-connector experiment files
#[derive(Parser, Debug)]
#[command(name = "phyphox-mqtt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file (layered over the global config)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a customized .phyphox file
    Generate(GenerateArgs),

    /// Inspect the base template
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// MQTT broker address (host:port)
    #[arg(short, long, default_value = DEFAULT_ADDRESS, value_parser = parse_address)]
    pub address: String,

    /// MQTT topic to publish to
    #[arg(short, long, default_value = DEFAULT_TOPIC, value_parser = parse_topic)]
    pub topic: String,

    /// Sensor rate in Hz (1-100)
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub rate: u32,

    /// Network send interval in seconds (0.1-10.0)
    #[arg(short, long, default_value_t = 0.1, value_parser = parse_interval)]
    pub interval: f64,

    /// Experiment identifier (default: current time as ddmmyy-HHMM)
    #[arg(short, long)]
    pub experiment_id: Option<String>,

    /// Add the light sensor
    #[arg(long)]
    pub light: bool,

    /// Add the pressure sensor
    #[arg(long)]
    pub pressure: bool,

    /// Output file (default: <output_dir>/mqtt_connector_<id>.phyphox)
    #[arg(short, long, conflicts_with = "stdout", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Write the document to stdout
    #[arg(long)]
    pub stdout: bool,

    /// Base template (overrides config)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub template: Option<PathBuf>,
}

impl GenerateArgs {
    /// Build generator parameters, filling in the default experiment id.
    pub fn to_params(&self) -> GeneratorParams {
        GeneratorParams {
            address: self.address.clone(),
            topic: self.topic.clone(),
            rate: self.rate,
            interval: self.interval,
            experiment_id: self
                .experiment_id
                .clone()
                .unwrap_or_else(default_experiment_id),
            enable_light: self.light,
            enable_pressure: self.pressure,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Print the unmodified base template
    Show,

    /// Show the configured template path
    Path,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}

/// Current local time as `ddmmyy-HHMM`, e.g. `011024-1530`.
pub fn default_experiment_id() -> String {
    chrono::Local::now().format("%d%m%y-%H%M").to_string()
}

fn parse_address(s: &str) -> Result<String, String> {
    let (host, port) = s
        .rsplit_once(':')
        .ok_or_else(|| format!("expected host:port, got '{s}'"))?;
    if host.trim().is_empty() {
        return Err(format!("missing host in '{s}'"));
    }
    port.parse::<u16>()
        .map_err(|_| format!("invalid port '{port}' in '{s}'"))?;
    Ok(s.to_string())
}

fn parse_topic(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("topic must not be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn parse_interval(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (MIN_INTERVAL..=MAX_INTERVAL).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "interval must be between {MIN_INTERVAL} and {MAX_INTERVAL} seconds"
        ))
    }
}
