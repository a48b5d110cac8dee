//! Shared data structures for the application state
//!
//! These structs represent the data model that flows between
//! the report store and the screens.

use chrono::{DateTime, Local, TimeZone, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use std::fmt;

/// Display format used for report timestamps everywhere in the UI
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// How bad a pothole is, as chosen by the reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Low, Severity::Medium, Severity::High];

    /// Integer code stored in the database (1 = Low, 2 = Medium, 3 = High)
    pub fn code(self) -> i64 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Severity::Low),
            2 => Some(Severity::Medium),
            3 => Some(Severity::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Medium => "Medium",
            Severity::High => "High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl ToSql for Severity {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.code()))
    }
}

impl FromSql for Severity {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            // Rows written before severity existed count as Low
            ValueRef::Null => Ok(Severity::Low),
            other => {
                let code = i64::column_result(other)?;
                Severity::from_code(code).ok_or(FromSqlError::OutOfRange(code))
            }
        }
    }
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// One persisted pothole report
#[derive(Debug, Clone, PartialEq)]
pub struct PotholeReport {
    /// Unique database ID, assigned on insert
    pub id: i64,
    /// Capture time in epoch milliseconds
    pub timestamp: i64,
    /// Absolute path to the JPEG written at save time
    pub image_path: String,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: Severity,
    /// Reverse-geocoded place name, if geocoding succeeded
    pub address: Option<String>,
}

impl PotholeReport {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// A report that has not been inserted yet (no ID)
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub timestamp: i64,
    pub image_path: String,
    pub latitude: f64,
    pub longitude: f64,
    pub severity: Severity,
    pub address: Option<String>,
}

/// Format epoch milliseconds in the local time zone
pub fn format_timestamp(millis: i64) -> String {
    format_timestamp_in(millis, &Local)
}

/// Format epoch milliseconds in the given time zone.
/// Out-of-range values fall back to the epoch.
pub fn format_timestamp_in<Tz>(millis: i64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let time = tz
        .timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.with_timezone(tz));
    time.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_codes() {
        for severity in Severity::ALL {
            assert_eq!(Severity::from_code(severity.code()), Some(severity));
        }
        assert_eq!(Severity::from_code(0), None);
        assert_eq!(Severity::from_code(4), None);
        assert_eq!(Severity::default(), Severity::Low);
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Low.to_string(), "Low");
        assert_eq!(Severity::Medium.to_string(), "Medium");
        assert_eq!(Severity::High.to_string(), "High");
    }

    #[test]
    fn test_format_timestamp_utc() {
        assert_eq!(format_timestamp_in(0, &Utc), "1970-01-01 00:00:00");
        assert_eq!(
            format_timestamp_in(1_700_000_000_000, &Utc),
            "2023-11-14 22:13:20"
        );
    }

    #[test]
    fn test_coordinate_display() {
        assert_eq!(Coordinate::new(12.5, 77.1).to_string(), "12.5, 77.1");
    }
}
