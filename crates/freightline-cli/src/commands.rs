use std::path::Path;

use anyhow::{Context, Result};

use freightline_core::models::{ProfitRequest, ShippingRequest};
use freightline_core::{EngineConfig, Freightline};

use crate::cli::{Command, ShippingArgs};

pub fn run(rates: Option<&str>, command: Command) -> Result<()> {
    let mut config = EngineConfig::from_env();
    if let Some(rates) = rates {
        config.rates_source = Some(rates.to_string());
    }

    match command {
        Command::Serve(args) => {
            let engine = Freightline::new(config).context("failed to load rate tables")?;
            freightline_web::serve_web(engine, &args.host, args.port)
        }
        Command::Shipping(args) => {
            let engine = Freightline::new(config).context("failed to load rate tables")?;
            run_shipping(&engine, &args)
        }
        Command::Profit(args) => {
            let engine = Freightline::new(config).context("failed to load rate tables")?;
            let request: ProfitRequest = load_json(&args.file)?;
            let result = engine.calculate_profit(&request)?;
            print_json(&result)
        }
        Command::Versions => {
            let engine = Freightline::new(config).context("failed to load rate tables")?;
            let versions = engine.rate_versions()?;
            print_json(&versions)
        }
    }
}

fn run_shipping(engine: &Freightline, args: &ShippingArgs) -> Result<()> {
    let request: ShippingRequest = load_json(&args.file)?;
    if args.compare || args.services.is_some() {
        let services = args.services.as_deref().map(parse_service_list);
        let comparison = engine.compare_shipping(&request, services.as_deref())?;
        print_json(&comparison)
    } else {
        let result = engine.calculate_shipping(&request)?;
        print_json(&result)
    }
}

fn parse_service_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid request in {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use freightline_core::models::ShippingRequest;

    use super::{load_json, parse_service_list};

    #[test]
    fn service_list_parsing_trims_and_drops_empties() {
        assert_eq!(
            parse_service_list(" standard, express ,,economy"),
            vec!["standard", "express", "economy"]
        );
    }

    #[test]
    fn request_files_load_as_typed_requests() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("request.json");
        std::fs::write(
            &path,
            r#"{"platform":"shopee","weight_g":1200,"length_cm":30,"width_cm":20,"height_cm":15}"#,
        )
        .expect("write request");

        let request: ShippingRequest = load_json(&path).expect("load request");
        assert_eq!(request.platform, "shopee");
        assert_eq!(request.weight_g, dec!(1200));
        assert!(request.service_type.is_none());
    }

    #[test]
    fn missing_request_file_is_a_context_error() {
        let err = load_json::<ShippingRequest>(std::path::Path::new("/nonexistent/request.json"))
            .expect_err("missing file");
        assert!(err.to_string().contains("failed to read"));
    }
}
