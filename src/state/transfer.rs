//! Report hand-off between screens
//!
//! Screens pass a `TransferRecord` by value. The pipe-delimited line
//! `timestamp|imagePath|latitude|longitude|address` is the external form
//! (command line, clipboard) and decodes into the same record.

use thiserror::Error;

use super::data::{Coordinate, PotholeReport};

const SEPARATOR: char = '|';

/// Errors decoding a pipe-delimited transfer line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
}

/// The fields one screen hands to the detail screen
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub timestamp: i64,
    pub image_path: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Never `Some("")`; an empty address is normalized to `None`
    pub address: Option<String>,
}

impl TransferRecord {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Encode as `timestamp|imagePath|latitude|longitude|address`.
    ///
    /// A `|` inside the address becomes `/`. The image path is not escaped,
    /// so a path containing `|` does not survive a round trip.
    pub fn encode(&self) -> String {
        let address = self
            .address
            .as_deref()
            .map(|a| a.replace(SEPARATOR, "/"))
            .unwrap_or_default();

        format!(
            "{}|{}|{}|{}|{}",
            self.timestamp, self.image_path, self.latitude, self.longitude, address
        )
    }

    /// Decode a transfer line. The first four fields are required,
    /// the address is optional and anything after it is ignored.
    pub fn decode(line: &str) -> Result<Self, TransferError> {
        let parts: Vec<&str> = line.split(SEPARATOR).collect();

        let timestamp = parse_number::<i64>(required(&parts, 0, "timestamp")?, "timestamp")?;
        let image_path = required(&parts, 1, "imagePath")?.to_string();
        let latitude = parse_number::<f64>(required(&parts, 2, "latitude")?, "latitude")?;
        let longitude = parse_number::<f64>(required(&parts, 3, "longitude")?, "longitude")?;
        let address = optional(&parts, 4).map(str::to_string);

        Ok(Self {
            timestamp,
            image_path,
            latitude,
            longitude,
            address,
        })
    }
}

impl From<&PotholeReport> for TransferRecord {
    fn from(report: &PotholeReport) -> Self {
        Self {
            timestamp: report.timestamp,
            image_path: report.image_path.clone(),
            latitude: report.latitude,
            longitude: report.longitude,
            address: report.address.clone().filter(|a| !a.is_empty()),
        }
    }
}

/// The field at `index`, untouched. A blank field counts as absent.
fn optional<'a>(parts: &[&'a str], index: usize) -> Option<&'a str> {
    parts
        .get(index)
        .copied()
        .filter(|value| !value.trim().is_empty())
}

fn required<'a>(parts: &[&'a str], index: usize, name: &'static str) -> Result<&'a str, TransferError> {
    optional(parts, index).ok_or(TransferError::MissingField(name))
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &'static str) -> Result<T, TransferError> {
    value.trim().parse().map_err(|_| TransferError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}
