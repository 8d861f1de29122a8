//! Rate source loading: raw TOML schema, semantic validation, and snapshot
//! construction. The version id of a snapshot is a content hash of the
//! canonical source text, so identical sources always publish the same id.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{FreightError, Result};
use crate::rates::{PlatformRates, RateSnapshot, RateTier, ServiceRateCard, SurchargeRule};

const EMBEDDED_RATES: &str = include_str!("default_rates.toml");

/// Where rate tables come from. Reload re-reads the same source.
#[derive(Debug, Clone)]
pub(crate) enum RateSource {
    Embedded,
    File(PathBuf),
    Http(String),
}

impl RateSource {
    pub(crate) fn from_config(location: Option<&str>) -> Self {
        match location {
            None => Self::Embedded,
            Some(value) if value.starts_with("http://") || value.starts_with("https://") => {
                Self::Http(value.to_string())
            }
            Some(value) => Self::File(PathBuf::from(value)),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Embedded => "embedded default rate card".to_string(),
            Self::File(path) => format!("file:{}", path.display()),
            Self::Http(url) => url.clone(),
        }
    }

    /// Fetch the raw source text. Only the HTTP variant performs I/O with a
    /// deadline; the timeout keeps a hung rate host from stalling reload
    /// while the previous snapshot keeps serving.
    pub(crate) fn fetch(&self, timeout: Duration) -> Result<String> {
        match self {
            Self::Embedded => Ok(EMBEDDED_RATES.to_string()),
            Self::File(path) => Ok(std::fs::read_to_string(path)?),
            Self::Http(url) => {
                let client = reqwest::blocking::Client::builder()
                    .timeout(timeout)
                    .build()?;
                Ok(client.get(url).send()?.error_for_status()?.text()?)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRateSource {
    effective_from: Option<String>,
    #[serde(default, rename = "platform")]
    platforms: Vec<RawPlatform>,
}

#[derive(Debug, Deserialize)]
struct RawPlatform {
    name: String,
    default_service: String,
    default_fee_rate: Decimal,
    #[serde(default)]
    category_fee_rates: BTreeMap<String, Decimal>,
    #[serde(default, rename = "service")]
    services: Vec<RawService>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    service_type: String,
    carrier: String,
    volumetric_divisor: Decimal,
    max_weight_kg: Decimal,
    max_dimension_cm: Decimal,
    oversize_dimension_cm: Decimal,
    oversize_fee: Decimal,
    min_charge: Decimal,
    delivery_days_min: u32,
    delivery_days_max: u32,
    #[serde(default, rename = "tier")]
    tiers: Vec<RawTier>,
    #[serde(default, rename = "surcharge")]
    surcharges: Vec<SurchargeRule>,
}

#[derive(Debug, Deserialize)]
struct RawTier {
    weight_floor_kg: Decimal,
    weight_step_kg: Decimal,
    base_rate: Decimal,
    weight_rate: Decimal,
}

/// Parse and validate source text into an immutable snapshot.
pub(crate) fn build_snapshot(text: &str) -> Result<RateSnapshot> {
    let raw: RawRateSource = toml::from_str(text)?;
    let effective_from = parse_effective_from(raw.effective_from.as_deref())?;

    if raw.platforms.is_empty() {
        return Err(invalid("rate source declares no platforms"));
    }

    let mut platforms = BTreeMap::new();
    for platform in raw.platforms {
        let name = platform.name.trim().to_string();
        if name.is_empty() {
            return Err(invalid("platform name must not be empty"));
        }
        if platforms.contains_key(&name) {
            return Err(invalid(&format!("duplicate platform: {name}")));
        }
        platforms.insert(name.clone(), validate_platform(&name, platform)?);
    }

    let rate_version = version_id(text);
    Ok(RateSnapshot {
        rate_version,
        effective_from,
        platforms,
    })
}

fn validate_platform(name: &str, raw: RawPlatform) -> Result<PlatformRates> {
    validate_fee_rate(name, "default_fee_rate", raw.default_fee_rate)?;
    for (category, rate) in &raw.category_fee_rates {
        validate_fee_rate(name, &format!("category_fee_rates.{category}"), *rate)?;
    }
    if raw.services.is_empty() {
        return Err(invalid(&format!("platform {name} declares no services")));
    }

    let mut services = BTreeMap::new();
    for service in raw.services {
        let service_type = service.service_type.trim().to_string();
        if service_type.is_empty() {
            return Err(invalid(&format!(
                "platform {name} has a service with an empty service_type"
            )));
        }
        if services.contains_key(&service_type) {
            return Err(invalid(&format!(
                "platform {name} declares service {service_type} twice"
            )));
        }
        services.insert(
            service_type.clone(),
            validate_service(name, &service_type, service)?,
        );
    }

    if !services.contains_key(&raw.default_service) {
        return Err(invalid(&format!(
            "platform {name} default_service {} is not a declared service",
            raw.default_service
        )));
    }

    Ok(PlatformRates {
        default_service: raw.default_service,
        default_fee_rate: raw.default_fee_rate,
        category_fee_rates: raw.category_fee_rates,
        services,
    })
}

fn validate_service(platform: &str, service: &str, raw: RawService) -> Result<ServiceRateCard> {
    let scope = format!("{platform}/{service}");
    for (field, value) in [
        ("volumetric_divisor", raw.volumetric_divisor),
        ("max_weight_kg", raw.max_weight_kg),
        ("max_dimension_cm", raw.max_dimension_cm),
        ("oversize_dimension_cm", raw.oversize_dimension_cm),
    ] {
        if value <= Decimal::ZERO {
            return Err(invalid(&format!("{scope}: {field} must be positive")));
        }
    }
    for (field, value) in [("oversize_fee", raw.oversize_fee), ("min_charge", raw.min_charge)] {
        if value < Decimal::ZERO {
            return Err(invalid(&format!("{scope}: {field} must not be negative")));
        }
    }
    if raw.oversize_dimension_cm > raw.max_dimension_cm {
        return Err(invalid(&format!(
            "{scope}: oversize_dimension_cm must not exceed max_dimension_cm"
        )));
    }
    if raw.delivery_days_min > raw.delivery_days_max {
        return Err(invalid(&format!(
            "{scope}: delivery_days_min must not exceed delivery_days_max"
        )));
    }

    if raw.tiers.is_empty() {
        return Err(invalid(&format!("{scope}: at least one tier is required")));
    }
    let mut tiers = Vec::with_capacity(raw.tiers.len());
    let mut previous_floor: Option<Decimal> = None;
    for tier in raw.tiers {
        if tier.weight_floor_kg < Decimal::ZERO {
            return Err(invalid(&format!("{scope}: tier floors must not be negative")));
        }
        if tier.weight_step_kg <= Decimal::ZERO {
            return Err(invalid(&format!("{scope}: tier steps must be positive")));
        }
        if tier.base_rate < Decimal::ZERO || tier.weight_rate < Decimal::ZERO {
            return Err(invalid(&format!("{scope}: tier rates must not be negative")));
        }
        if let Some(previous) = previous_floor {
            if tier.weight_floor_kg <= previous {
                return Err(invalid(&format!(
                    "{scope}: tier floors must be strictly ascending"
                )));
            }
        } else if tier.weight_floor_kg != Decimal::ZERO {
            return Err(invalid(&format!("{scope}: the first tier must start at 0 kg")));
        }
        previous_floor = Some(tier.weight_floor_kg);
        tiers.push(RateTier {
            weight_floor_kg: tier.weight_floor_kg,
            weight_step_kg: tier.weight_step_kg,
            base_rate: tier.base_rate,
            weight_rate: tier.weight_rate,
        });
    }

    let mut seen_surcharges = Vec::new();
    for surcharge in &raw.surcharges {
        let key = surcharge.key();
        if seen_surcharges.contains(&key) {
            return Err(invalid(&format!("{scope}: duplicate surcharge {key}")));
        }
        seen_surcharges.push(key);
        match surcharge {
            SurchargeRule::Battery { fee } | SurchargeRule::Liquid { fee } => {
                if *fee < Decimal::ZERO {
                    return Err(invalid(&format!("{scope}: {key} fee must not be negative")));
                }
            }
            SurchargeRule::Fragile { rate } | SurchargeRule::Insurance { rate } => {
                if *rate < Decimal::ZERO || *rate >= Decimal::ONE {
                    return Err(invalid(&format!("{scope}: {key} rate must be within [0, 1)")));
                }
            }
        }
    }

    Ok(ServiceRateCard {
        carrier: raw.carrier,
        volumetric_divisor: raw.volumetric_divisor,
        max_weight_kg: raw.max_weight_kg,
        max_dimension_cm: raw.max_dimension_cm,
        oversize_dimension_cm: raw.oversize_dimension_cm,
        oversize_fee: raw.oversize_fee,
        min_charge: raw.min_charge,
        delivery_days_min: raw.delivery_days_min,
        delivery_days_max: raw.delivery_days_max,
        tiers,
        surcharges: raw.surcharges,
    })
}

fn parse_effective_from(raw: Option<&str>) -> Result<DateTime<Utc>> {
    match raw {
        None => Ok(Utc::now()),
        Some(text) => DateTime::parse_from_rfc3339(text)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|err| invalid(&format!("invalid effective_from {text:?}: {err}"))),
    }
}

fn validate_fee_rate(platform: &str, field: &str, rate: Decimal) -> Result<()> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(invalid(&format!(
            "platform {platform}: {field} must be within [0, 1)"
        )));
    }
    Ok(())
}

fn invalid(message: &str) -> FreightError {
    FreightError::ReloadFailed(message.to_string())
}

fn version_id(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{EMBEDDED_RATES, RateSource, build_snapshot, version_id};
    use crate::rates::SurchargeRule;

    #[test]
    fn embedded_rate_card_parses_and_validates() {
        let snapshot = build_snapshot(EMBEDDED_RATES).expect("embedded card");
        assert_eq!(snapshot.platforms.len(), 2);
        let shopee = snapshot.platforms.get("shopee").expect("shopee");
        assert_eq!(shopee.default_service, "standard");
        assert_eq!(shopee.services.len(), 3);
        let standard = shopee.services.get("standard").expect("standard");
        assert_eq!(standard.carrier, "yunexpress");
        assert_eq!(standard.volumetric_divisor, dec!(5000));
        assert_eq!(standard.tiers.len(), 2);
        assert_eq!(standard.tiers[1].weight_floor_kg, dec!(1.5));
    }

    #[test]
    fn version_id_is_deterministic_over_source_text() {
        assert_eq!(version_id(EMBEDDED_RATES), version_id(EMBEDDED_RATES));
        assert_ne!(version_id(EMBEDDED_RATES), version_id("x = 1"));
        assert_eq!(version_id(EMBEDDED_RATES).len(), 16);
    }

    #[test]
    fn surcharge_rules_parse_as_tagged_variants() {
        let snapshot = build_snapshot(EMBEDDED_RATES).expect("embedded card");
        let standard = &snapshot.platforms["shopee"].services["standard"];
        assert!(standard
            .surcharges
            .iter()
            .any(|rule| matches!(rule, SurchargeRule::Fragile { rate } if *rate == dec!(0.10))));
        assert!(standard
            .surcharges
            .iter()
            .any(|rule| matches!(rule, SurchargeRule::Battery { fee } if *fee == dec!(6))));
    }

    #[test]
    fn source_without_platforms_is_rejected() {
        let err = build_snapshot("effective_from = \"2026-01-01T00:00:00Z\"\n")
            .expect_err("no platforms");
        assert_eq!(err.code(), "RELOAD_FAILED");
    }

    #[test]
    fn first_tier_must_start_at_zero() {
        let source = r#"
[[platform]]
name = "shopee"
default_service = "standard"
default_fee_rate = 0.06

[[platform.service]]
service_type = "standard"
carrier = "yunexpress"
volumetric_divisor = 5000.0
max_weight_kg = 20.0
max_dimension_cm = 120.0
oversize_dimension_cm = 60.0
oversize_fee = 15.0
min_charge = 8.0
delivery_days_min = 7
delivery_days_max = 12

[[platform.service.tier]]
weight_floor_kg = 0.5
weight_step_kg = 0.1
base_rate = 12.0
weight_rate = 4.0
"#;
        let err = build_snapshot(source).expect_err("nonzero first floor");
        assert!(err.to_string().contains("first tier"));
    }

    #[test]
    fn descending_tier_floors_are_rejected() {
        let source = r#"
[[platform]]
name = "shopee"
default_service = "standard"
default_fee_rate = 0.06

[[platform.service]]
service_type = "standard"
carrier = "yunexpress"
volumetric_divisor = 5000.0
max_weight_kg = 20.0
max_dimension_cm = 120.0
oversize_dimension_cm = 60.0
oversize_fee = 15.0
min_charge = 8.0
delivery_days_min = 7
delivery_days_max = 12

[[platform.service.tier]]
weight_floor_kg = 0.0
weight_step_kg = 0.1
base_rate = 12.0
weight_rate = 4.0

[[platform.service.tier]]
weight_floor_kg = 0.0
weight_step_kg = 0.5
base_rate = 20.0
weight_rate = 5.0
"#;
        let err = build_snapshot(source).expect_err("duplicate floor");
        assert!(err.to_string().contains("ascending"));
    }

    #[test]
    fn unknown_default_service_is_rejected() {
        let source = r#"
[[platform]]
name = "shopee"
default_service = "teleport"
default_fee_rate = 0.06

[[platform.service]]
service_type = "standard"
carrier = "yunexpress"
volumetric_divisor = 5000.0
max_weight_kg = 20.0
max_dimension_cm = 120.0
oversize_dimension_cm = 60.0
oversize_fee = 15.0
min_charge = 8.0
delivery_days_min = 7
delivery_days_max = 12

[[platform.service.tier]]
weight_floor_kg = 0.0
weight_step_kg = 0.1
base_rate = 12.0
weight_rate = 4.0
"#;
        let err = build_snapshot(source).expect_err("unknown default service");
        assert!(err.to_string().contains("default_service"));
    }

    #[test]
    fn malformed_toml_is_a_distinct_parse_error() {
        let err = build_snapshot("not [valid toml").expect_err("bad toml");
        assert_eq!(err.code(), "TOML_ERROR");
    }

    #[test]
    fn file_source_roundtrips_through_fetch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rates.toml");
        std::fs::write(&path, EMBEDDED_RATES).expect("write rates");
        let source = RateSource::from_config(path.to_str());
        let text = source
            .fetch(std::time::Duration::from_millis(500))
            .expect("fetch file");
        assert_eq!(text, EMBEDDED_RATES);
    }

    #[test]
    fn source_location_classification() {
        assert!(matches!(RateSource::from_config(None), RateSource::Embedded));
        assert!(matches!(
            RateSource::from_config(Some("https://rates.example/v1.toml")),
            RateSource::Http(_)
        ));
        assert!(matches!(
            RateSource::from_config(Some("/etc/freightline/rates.toml")),
            RateSource::File(_)
        ));
    }
}
