use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use std::time::Duration;

fn default_device_name() -> String {
    if cfg!(target_os = "windows") {
        String::from("COM1")
    } else {
        String::from("/dev/ttyUSB0")
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum CliCommands {
    /// Initialize the ECU and show its identifiers and supported parameters
    Init,
    /// List every parameter in the catalogue
    Params,
    /// Continuously log parameter values until interrupted (Ctrl+C)
    Log {
        /// Comma-separated parameter ids to log (e.g. P8,P12,P200); defaults
        /// to every supported parameter
        #[clap(long, short, use_value_delimiter = true)]
        params: Vec<String>,
        /// Per-parameter display units as id=symbol pairs (e.g. P9=mph,P2=F)
        #[clap(long, short, use_value_delimiter = true)]
        units: Vec<String>,
    },
    /// Read the set and stored diagnostic trouble codes
    Dtcs,
}

const fn about_text() -> &'static str {
    "subaru select monitor (ssm2) command line tool"
}

#[derive(Parser, Debug)]
#[command(version, about=about_text(), long_about = None)]
pub struct CliArgs {
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Serial port device path (e.g. /dev/ttyUSB0 on Linux, COM1 on Windows)
    #[arg(short, long, default_value_t = default_device_name())]
    pub device: String,

    /// Talk to an in-memory fake ECU instead of a serial port
    #[arg(long, action)]
    pub fake: bool,

    /// Response latency of the fake ECU
    #[arg(value_parser = humantime::parse_duration, long, default_value = "100ms")]
    pub fake_latency: Duration,

    #[command(subcommand)]
    pub command: CliCommands,

    /// Timeout for a single serial read (e.g. "500ms", "1s")
    #[arg(value_parser = humantime::parse_duration, long, default_value = "500ms")]
    pub timeout: Duration,

    /// Timeout for assembling one complete response frame
    #[arg(value_parser = humantime::parse_duration, long, default_value = "5s")]
    pub total_timeout: Duration,
}
