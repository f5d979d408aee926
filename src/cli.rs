//! CLI argument parsing for the pipeline runner.
//!
//! The CLI only collects raw form text; normalization and validation happen
//! in the library so the same rules apply to every caller.
use agro_pipeline::Stage;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "agro",
    version,
    about = "Weather, crop, nutrient and fertilizer recommendations in one pipeline",
    after_help = "Examples:\n  agro run --city Pune --state Maharashtra --soil-color Black --ph 6.5\n  agro run --latitude 18.52 --longitude 73.85 --soil-color Red --ph 6 --json\n  agro run --rainfall 900 --temperature 26 --soil-color Red --ph 6 --stop-after crop\n  agro config",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Run(RunArgs),
    Config(ConfigArgs),
}

/// Where to read endpoint configuration from.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigSource {
    /// Config file (defaults to $AGRO_CONFIG, then the platform config dir)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(about = "Run the pipeline from the weather stage to a fertilizer recommendation")]
pub struct RunArgs {
    #[command(flatten)]
    pub source: ConfigSource,

    /// Look up weather for the device position
    #[arg(long, conflicts_with_all = ["city", "latitude"])]
    pub use_current_location: bool,

    /// Position reported by the device; without it the location is unavailable
    #[arg(long, value_name = "LAT,LON", requires = "use_current_location", allow_hyphen_values = true)]
    pub device_position: Option<String>,

    /// City to geocode for the weather lookup
    #[arg(long, requires = "state", conflicts_with = "latitude")]
    pub city: Option<String>,

    /// State or region paired with --city
    #[arg(long, requires = "city")]
    pub state: Option<String>,

    #[arg(long, requires = "longitude", allow_hyphen_values = true)]
    pub latitude: Option<String>,

    #[arg(long, requires = "latitude", allow_hyphen_values = true)]
    pub longitude: Option<String>,

    /// Annual rainfall in mm; wins over the weather lookup
    #[arg(long, allow_hyphen_values = true)]
    pub rainfall: Option<String>,

    /// Temperature in degrees Celsius; wins over the weather lookup
    #[arg(long, allow_hyphen_values = true)]
    pub temperature: Option<String>,

    #[arg(long)]
    pub soil_color: String,

    #[arg(long)]
    pub ph: String,

    /// Stop once this stage has completed (weather, crop, nutrients, fertilizer)
    #[arg(long, value_name = "STAGE")]
    pub stop_after: Option<Stage>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,

    /// Log stage transitions and remote calls to stderr
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Print the effective configuration with credentials redacted")]
pub struct ConfigArgs {
    #[command(flatten)]
    pub source: ConfigSource,
}
