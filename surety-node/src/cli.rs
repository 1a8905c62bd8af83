use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "surety-node")]
#[command(about = "FlightSurety engine node")]
pub struct Args {
    /// Engine configuration (JSON). Generated with defaults when missing.
    #[arg(long, value_name = "FILE", default_value = "config.json")]
    pub config: String,

    /// REST API port
    #[arg(long, default_value_t = 3001)]
    pub port: u16,

    /// Node name, used for the audit log file
    #[arg(long, default_value = "surety")]
    pub name: String,
}
