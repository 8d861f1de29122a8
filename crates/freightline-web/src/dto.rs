use serde::{Deserialize, Serialize};

use freightline_core::rates::RateVersionInfo;

#[derive(Debug, Deserialize)]
pub struct ServiceTypesQuery {
    pub service_types: Option<String>,
}

impl ServiceTypesQuery {
    /// Comma-separated service list; `None` means "all services the
    /// platform offers".
    pub fn parse(&self) -> Option<Vec<String>> {
        let raw = self.service_types.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(
            raw.split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchEnvelope<T> {
    pub requests: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct VersionsResponse {
    pub versions: Vec<RateVersionInfo>,
}
