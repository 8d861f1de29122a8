use clap::{Parser, Subcommand};

mod args;

pub use args::{ProfitArgs, ServeArgs, ShippingArgs};

#[derive(Debug, Parser)]
#[command(
    name = "freightline",
    about = "Shipping-cost and profit-margin calculations for cross-border selling",
    version
)]
pub struct Cli {
    /// Rate source file path or URL. Defaults to FREIGHTLINE_RATES_SOURCE,
    /// falling back to the embedded rate card.
    #[arg(long, global = true)]
    pub rates: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP calculation service.
    Serve(ServeArgs),
    /// Price one shipping request from a JSON file.
    Shipping(ShippingArgs),
    /// Compute profit figures for one request from a JSON file.
    Profit(ProfitArgs),
    /// List published rate versions.
    Versions,
}
