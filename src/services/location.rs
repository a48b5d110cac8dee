//! Location fixing
//!
//! A provider answers one request with a single best-effort fix.
//! There is no continuous tracking.

use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::{debug, info};

use crate::config::LocationConfig;
use crate::error::Result;
use crate::state::data::Coordinate;

/// Something that can tell where we are right now.
/// `Ok(None)` means "no fix available", as opposed to an error.
pub trait LocationProvider: Send + Sync {
    fn current_location(&self) -> Result<Option<Coordinate>>;
}

/// Build the provider selected in the config
pub fn from_config(config: &LocationConfig) -> Arc<dyn LocationProvider> {
    match config {
        LocationConfig::Fixed { latitude, longitude } => {
            Arc::new(FixedLocation(Coordinate::new(*latitude, *longitude)))
        }
        LocationConfig::Ip {
            endpoint,
            timeout_secs,
        } => Arc::new(IpLocation {
            endpoint: endpoint.clone(),
            timeout: Duration::from_secs(*timeout_secs),
        }),
    }
}

/// Request one fix on the blocking pool
pub async fn locate(provider: Arc<dyn LocationProvider>) -> std::result::Result<Option<Coordinate>, String> {
    task::spawn_blocking(move || provider.current_location())
        .await
        .map_err(|e| format!("Task join error: {}", e))?
        .map_err(|e| e.to_string())
}

/// Always reports the same configured position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinate);

impl LocationProvider for FixedLocation {
    fn current_location(&self) -> Result<Option<Coordinate>> {
        Ok(Some(self.0))
    }
}

/// Coarse position from an IP geolocation service
#[derive(Debug, Clone)]
pub struct IpLocation {
    pub endpoint: String,
    pub timeout: Duration,
}

/// Response body; ip-api.com uses `lat`/`lon`, others `latitude`/`longitude`
#[derive(Debug, Deserialize)]
struct IpLocationResponse {
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude")]
    lon: Option<f64>,
}

impl LocationProvider for IpLocation {
    fn current_location(&self) -> Result<Option<Coordinate>> {
        debug!("Requesting IP location from {}", self.endpoint);

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let body = client.get(&self.endpoint).send()?.error_for_status()?.text()?;

        let fix = parse_ip_location(&body)?;
        if let Some(coordinate) = fix {
            info!("📍 Location fix: {}", coordinate);
        }
        Ok(fix)
    }
}

fn parse_ip_location(body: &str) -> Result<Option<Coordinate>> {
    let response: IpLocationResponse = serde_json::from_str(body)?;
    Ok(match (response.lat, response.lon) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_location() {
        let provider = from_config(&LocationConfig::Fixed {
            latitude: 12.5,
            longitude: 77.1,
        });
        assert_eq!(
            provider.current_location().unwrap(),
            Some(Coordinate::new(12.5, 77.1))
        );
    }

    #[test]
    fn test_parse_ip_api_response() {
        let body = r#"{"status":"success","country":"India","lat":12.9716,"lon":77.5946}"#;
        assert_eq!(
            parse_ip_location(body).unwrap(),
            Some(Coordinate::new(12.9716, 77.5946))
        );
    }

    #[test]
    fn test_parse_latitude_longitude_names() {
        let body = r#"{"latitude":48.85,"longitude":2.35}"#;
        assert_eq!(
            parse_ip_location(body).unwrap(),
            Some(Coordinate::new(48.85, 2.35))
        );
    }

    #[test]
    fn test_parse_failed_lookup_is_no_fix() {
        let body = r#"{"status":"fail","message":"private range"}"#;
        assert_eq!(parse_ip_location(body).unwrap(), None);
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(parse_ip_location("<html>").is_err());
    }
}
