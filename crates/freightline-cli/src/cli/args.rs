use std::path::PathBuf;

use clap::Args;

#[derive(Debug, Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, default_value_t = 8716)]
    pub port: u16,
}

#[derive(Debug, Args)]
pub struct ShippingArgs {
    /// JSON file holding one shipping request.
    pub file: PathBuf,
    /// Compare candidate services instead of pricing a single one.
    #[arg(long, default_value_t = false)]
    pub compare: bool,
    /// Comma-separated service list for --compare (all services when omitted).
    #[arg(long, value_name = "LIST")]
    pub services: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProfitArgs {
    /// JSON file holding one profit request.
    pub file: PathBuf,
}
