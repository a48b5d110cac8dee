//! Reverse geocoding (coordinate → human-readable place)
//!
//! Each request is tied to a `GeocodeTicket` owned by the capture screen.
//! Leaving the screen cancels the ticket; a cancelled or superseded ticket's
//! result is thrown away instead of landing on a screen nobody sees.

use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task;
use tracing::debug;

use crate::config::GeocodingConfig;
use crate::error::Result;
use crate::state::data::Coordinate;

pub trait Geocoder: Send + Sync {
    /// Best place name for `coordinate`, or `None` when nothing is known there
    fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>>;
}

/// Build the geocoder from config; `None` when geocoding is switched off
pub fn from_config(config: &GeocodingConfig) -> Option<Arc<dyn Geocoder>> {
    if !config.enabled {
        return None;
    }
    Some(Arc::new(NominatimGeocoder {
        endpoint: config.endpoint.clone(),
        user_agent: config.user_agent.clone(),
        language: config.language.clone(),
        timeout: Duration::from_secs(config.timeout_secs),
    }))
}

/// One cancellable geocoding request
#[derive(Debug, Clone)]
pub struct GeocodeTicket {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl GeocodeTicket {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What a finished request hands back to the interactive thread
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeOutcome {
    Resolved(Option<String>),
    Failed(String),
    Cancelled,
}

/// Run one reverse geocoding request on the blocking pool.
/// The ticket is checked before the request goes out.
pub async fn resolve(
    geocoder: Arc<dyn Geocoder>,
    coordinate: Coordinate,
    ticket: GeocodeTicket,
) -> GeocodeOutcome {
    let joined = task::spawn_blocking(move || {
        if ticket.is_cancelled() {
            return GeocodeOutcome::Cancelled;
        }
        match geocoder.reverse(coordinate) {
            Ok(address) => GeocodeOutcome::Resolved(address),
            Err(e) => GeocodeOutcome::Failed(e.to_string()),
        }
    })
    .await;

    joined.unwrap_or_else(|e| GeocodeOutcome::Failed(format!("Task join error: {}", e)))
}

/// Nominatim-compatible `/reverse` client
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    pub endpoint: String,
    pub user_agent: String,
    pub language: Option<String>,
    pub timeout: Duration,
}

impl NominatimGeocoder {
    fn request_url(&self, coordinate: Coordinate) -> Result<url::Url> {
        let mut url = url::Url::parse(&self.endpoint)
            .map_err(|e| crate::error::Error::Config(format!("bad geocoding endpoint: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .append_pair("lat", &coordinate.latitude.to_string())
            .append_pair("lon", &coordinate.longitude.to_string())
            .append_pair("zoom", "18")
            .append_pair("addressdetails", "1");
        Ok(url)
    }
}

impl Geocoder for NominatimGeocoder {
    fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>> {
        let url = self.request_url(coordinate)?;
        debug!("Reverse geocoding {}", coordinate);

        let client = reqwest::blocking::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.timeout)
            .build()?;

        let mut request = client.get(url);
        if let Some(language) = &self.language {
            request = request.header(reqwest::header::ACCEPT_LANGUAGE, language.clone());
        }

        let body = request.send()?.error_for_status()?.text()?;
        parse_reverse_response(&body)
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    #[serde(default)]
    address: AddressParts,
}

#[derive(Debug, Default, Deserialize)]
struct AddressParts {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

/// Pick the full display line if there is one, otherwise join the
/// locality, county, state and country that are present.
fn parse_reverse_response(body: &str) -> Result<Option<String>> {
    let response: ReverseResponse = serde_json::from_str(body)?;

    if let Some(line) = response.display_name.filter(|line| !line.trim().is_empty()) {
        return Ok(Some(line));
    }

    let address = response.address;
    let locality = address.city.or(address.town).or(address.village);
    let parts: Vec<String> = [locality, address.county, address.state, address.country]
        .into_iter()
        .flatten()
        .filter(|part| !part.trim().is_empty())
        .collect();

    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_preferred() {
        let body = r#"{
            "display_name": "MG Road, Bengaluru, Karnataka, India",
            "address": {"city": "Bengaluru", "country": "India"}
        }"#;
        assert_eq!(
            parse_reverse_response(body).unwrap().as_deref(),
            Some("MG Road, Bengaluru, Karnataka, India")
        );
    }

    #[test]
    fn test_falls_back_to_address_parts() {
        let body = r#"{
            "display_name": "",
            "address": {"village": "Hosur", "county": "Krishnagiri", "state": "Tamil Nadu", "country": "India"}
        }"#;
        assert_eq!(
            parse_reverse_response(body).unwrap().as_deref(),
            Some("Hosur, Krishnagiri, Tamil Nadu, India")
        );
    }

    #[test]
    fn test_nothing_known_is_none() {
        assert_eq!(parse_reverse_response(r#"{"error":"Unable to geocode"}"#).unwrap(), None);
    }

    #[test]
    fn test_request_url() {
        let geocoder = NominatimGeocoder {
            endpoint: "https://nominatim.example.org/reverse".to_string(),
            user_agent: "test".to_string(),
            language: None,
            timeout: Duration::from_secs(1),
        };
        let url = geocoder.request_url(Coordinate::new(12.5, 77.1)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://nominatim.example.org/reverse?format=jsonv2&lat=12.5&lon=77.1&zoom=18&addressdetails=1"
        );
    }

    #[test]
    fn test_disabled_geocoding_has_no_geocoder() {
        let config = GeocodingConfig {
            enabled: false,
            ..GeocodingConfig::default()
        };
        assert!(from_config(&config).is_none());
    }

    #[test]
    fn test_ticket_cancel_is_shared_between_clones() {
        let ticket = GeocodeTicket::new(3);
        let worker_copy = ticket.clone();
        assert!(!worker_copy.is_cancelled());

        ticket.cancel();

        assert!(worker_copy.is_cancelled());
        assert_eq!(worker_copy.id(), 3);
    }
}
