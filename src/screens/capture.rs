//! Report creation screen
//!
//! Photo, coordinate and address are captured independently and may arrive
//! in any order. Saving needs a photo and a coordinate; the address is
//! best-effort and severity defaults to Low.

use iced::widget::image::Handle;
use iced::widget::{button, column, container, radio, row, scrollable, text, Image, Space};
use iced::{Alignment, Element, Length};
use image::DynamicImage;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::Error;
use crate::screens::header;
use crate::services::geocode::{GeocodeOutcome, GeocodeTicket};
use crate::state::data::{Coordinate, PotholeReport, Severity};
use crate::state::library::{Library, ReportDraft};
use crate::Message;

/// A decoded photo plus the handle the preview widget draws from
#[derive(Debug, Clone)]
struct Photo {
    image: Arc<DynamicImage>,
    preview: Handle,
}

/// What a finished location request means for the screen
#[derive(Debug, Clone, PartialEq)]
pub enum LocationUpdate {
    /// A fix arrived; reverse geocoding may start
    Fixed(Coordinate),
    /// No fix; show the notice
    Unavailable(&'static str),
}

#[derive(Debug)]
pub struct Capture {
    photo: Option<Photo>,
    coordinate: Option<Coordinate>,
    address: Option<String>,
    severity: Option<Severity>,
    location_text: String,
    geocoding: Option<GeocodeTicket>,
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}

impl Capture {
    pub fn new() -> Self {
        Self {
            photo: None,
            coordinate: None,
            address: None,
            severity: None,
            location_text: "Location: Not set".to_string(),
            geocoding: None,
        }
    }

    #[cfg(test)]
    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    #[cfg(test)]
    pub fn coordinate(&self) -> Option<Coordinate> {
        self.coordinate
    }

    #[cfg(test)]
    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    #[cfg(test)]
    pub fn pending_geocoding(&self) -> Option<&GeocodeTicket> {
        self.geocoding.as_ref()
    }

    pub fn location_text(&self) -> &str {
        &self.location_text
    }

    /// Apply the result of a photo capture. Returns a notice on failure;
    /// the previous photo (if any) is kept.
    pub fn photo_captured(&mut self, result: Result<Arc<DynamicImage>, String>) -> Option<&'static str> {
        match result {
            Ok(image) => {
                let rgba = image.to_rgba8();
                let preview = Handle::from_rgba(rgba.width(), rgba.height(), rgba.into_raw());
                self.photo = Some(Photo { image, preview });
                None
            }
            Err(e) => {
                error!("❌ Photo capture failed: {}", e);
                Some("No image captured")
            }
        }
    }

    /// Apply the result of a location request. A new fix forgets the old
    /// address and cancels any lookup still running for the old fix.
    pub fn location_fixed(&mut self, result: Result<Option<Coordinate>, String>) -> LocationUpdate {
        match result {
            Ok(Some(coordinate)) => {
                self.cancel_geocoding();
                self.coordinate = Some(coordinate);
                self.address = None;
                self.location_text = format!("Location: {}", coordinate);
                LocationUpdate::Fixed(coordinate)
            }
            Ok(None) => {
                self.location_text = "Location: Not available (try again)".to_string();
                LocationUpdate::Unavailable("Could not get location")
            }
            Err(e) => {
                error!("❌ Location request failed: {}", e);
                self.location_text = "Location: Error".to_string();
                LocationUpdate::Unavailable("Error getting location")
            }
        }
    }

    /// Remember the ticket of the lookup just started for the current fix
    pub fn geocoding_started(&mut self, ticket: GeocodeTicket) {
        self.cancel_geocoding();
        self.geocoding = Some(ticket);
    }

    /// Apply a finished lookup. Results for a ticket other than the pending
    /// one are dropped. Returns a notice when no address came back.
    pub fn address_resolved(&mut self, ticket: u64, outcome: GeocodeOutcome) -> Option<&'static str> {
        match &self.geocoding {
            Some(pending) if pending.id() == ticket && !pending.is_cancelled() => {}
            _ => {
                debug!("Dropping stale geocoding result #{}", ticket);
                return None;
            }
        }
        self.geocoding = None;

        let coordinate = self.coordinate?;
        match outcome {
            GeocodeOutcome::Resolved(Some(address)) if !address.trim().is_empty() => {
                self.location_text = format!("Location: {}\n{}", coordinate, address);
                self.address = Some(address);
                None
            }
            GeocodeOutcome::Resolved(_) => {
                self.address = None;
                self.location_text = format!("Location: {}", coordinate);
                Some("Couldn't get place name")
            }
            GeocodeOutcome::Failed(e) => {
                error!("❌ Reverse geocoding failed: {}", e);
                self.address = None;
                Some("Error fetching address")
            }
            GeocodeOutcome::Cancelled => None,
        }
    }

    pub fn select_severity(&mut self, severity: Severity) {
        self.severity = Some(severity);
    }

    /// Save the captured report. Nothing is written unless both a photo
    /// and a coordinate are present.
    pub fn save(&self, library: &mut Library, timestamp: i64) -> Result<PotholeReport, Error> {
        let photo = self.photo.as_ref().ok_or(Error::MissingPhoto)?;
        let coordinate = self.coordinate.ok_or(Error::MissingLocation)?;

        let draft = ReportDraft {
            timestamp,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            severity: self.severity.unwrap_or_default(),
            address: self.address.clone(),
        };

        library.save_report(&photo.image, draft)
    }

    /// The screen is going away; a running lookup must not land anywhere
    pub fn teardown(&mut self) {
        self.cancel_geocoding();
    }

    fn cancel_geocoding(&mut self) {
        if let Some(ticket) = self.geocoding.take() {
            debug!("Cancelling geocoding #{}", ticket.id());
            ticket.cancel();
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let preview: Element<'_, Message> = match &self.photo {
            Some(photo) => Image::new(photo.preview.clone())
                .width(Length::Fill)
                .height(Length::Fixed(280.0))
                .into(),
            None => container(text("No photo yet").size(16))
                .width(Length::Fill)
                .height(Length::Fixed(280.0))
                .center_x(Length::Fill)
                .center_y(Length::Fixed(280.0))
                .style(container::bordered_box)
                .into(),
        };

        let severity = Severity::ALL.iter().fold(row![text("Severity:")].spacing(20), |row, &level| {
            row.push(radio(level.label(), level, self.severity, Message::SeveritySelected))
        });

        let content = column![
            header("Report Pothole"),
            preview,
            row![
                button("Capture Photo").on_press(Message::CapturePhoto).padding(10),
                button("Get Location").on_press(Message::RequestLocation).padding(10),
            ]
            .spacing(10),
            text(self.location_text()).size(16),
            severity.align_y(Alignment::Center),
            Space::with_height(Length::Fixed(10.0)),
            button("Save Report")
                .on_press(Message::SaveReport)
                .style(button::success)
                .padding(10),
        ]
        .spacing(16);

        scrollable(content).into()
    }
}

/// Notice shown for the outcome of a save
pub fn save_notice(result: &Result<PotholeReport, Error>) -> &'static str {
    match result {
        Ok(_) => "Report saved!",
        Err(Error::MissingPhoto) => "Please capture a photo first",
        Err(Error::MissingLocation) => "Please get location first",
        Err(_) => "Error saving report",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::images::ImageDir;
    use crate::state::store::ReportStore;
    use std::path::Path;

    fn library(dir: &Path) -> Library {
        Library::from_parts(
            ReportStore::open_in_memory().unwrap(),
            ImageDir::new(dir.join("images")).unwrap(),
        )
    }

    fn photo() -> Result<Arc<DynamicImage>, String> {
        Ok(Arc::new(DynamicImage::new_rgb8(4, 4)))
    }

    fn fixed(capture: &mut Capture) -> Coordinate {
        let coordinate = Coordinate::new(12.5, 77.1);
        assert_eq!(
            capture.location_fixed(Ok(Some(coordinate))),
            LocationUpdate::Fixed(coordinate)
        );
        coordinate
    }

    #[test]
    fn test_save_without_photo_inserts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = library(dir.path());
        let mut capture = Capture::new();
        fixed(&mut capture);

        let result = capture.save(&mut library, 1000);

        assert!(matches!(result, Err(Error::MissingPhoto)));
        assert_eq!(save_notice(&result), "Please capture a photo first");
        assert!(library.get_all_reports().unwrap().is_empty());
    }

    #[test]
    fn test_save_without_location_inserts_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = library(dir.path());
        let mut capture = Capture::new();
        assert_eq!(capture.photo_captured(photo()), None);

        let result = capture.save(&mut library, 1000);

        assert!(matches!(result, Err(Error::MissingLocation)));
        assert_eq!(save_notice(&result), "Please get location first");
        assert!(library.get_all_reports().unwrap().is_empty());
    }

    #[test]
    fn test_save_without_address_defaults_to_low() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = library(dir.path());
        let mut capture = Capture::new();
        capture.photo_captured(photo());
        fixed(&mut capture);

        let result = capture.save(&mut library, 1000);
        assert_eq!(save_notice(&result), "Report saved!");

        let report = result.unwrap();
        assert_eq!(report.address, None);
        assert_eq!(report.severity, Severity::Low);
        assert_eq!(library.get_all_reports().unwrap(), vec![report]);
    }

    #[test]
    fn test_save_with_address_and_severity() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = library(dir.path());
        let mut capture = Capture::new();
        capture.photo_captured(photo());
        fixed(&mut capture);
        capture.geocoding_started(GeocodeTicket::new(1));
        capture.address_resolved(1, GeocodeOutcome::Resolved(Some("Ring Road".to_string())));
        capture.select_severity(Severity::High);

        let report = capture.save(&mut library, 1000).unwrap();

        assert_eq!(report.address.as_deref(), Some("Ring Road"));
        assert_eq!(report.severity, Severity::High);
    }

    #[test]
    fn test_failed_photo_keeps_previous() {
        let mut capture = Capture::new();
        capture.photo_captured(photo());

        assert_eq!(capture.photo_captured(Err("decode".to_string())), Some("No image captured"));
        assert!(capture.has_photo());
    }

    #[test]
    fn test_location_failures() {
        let mut capture = Capture::new();

        assert_eq!(
            capture.location_fixed(Ok(None)),
            LocationUpdate::Unavailable("Could not get location")
        );
        assert_eq!(capture.location_text(), "Location: Not available (try again)");

        assert_eq!(
            capture.location_fixed(Err("timeout".to_string())),
            LocationUpdate::Unavailable("Error getting location")
        );
        assert_eq!(capture.location_text(), "Location: Error");
        assert_eq!(capture.coordinate(), None);
    }

    #[test]
    fn test_address_updates_location_text() {
        let mut capture = Capture::new();
        fixed(&mut capture);
        assert_eq!(capture.location_text(), "Location: 12.5, 77.1");

        capture.geocoding_started(GeocodeTicket::new(7));
        let notice = capture.address_resolved(7, GeocodeOutcome::Resolved(Some("MG Road".to_string())));

        assert_eq!(notice, None);
        assert_eq!(capture.address(), Some("MG Road"));
        assert_eq!(capture.location_text(), "Location: 12.5, 77.1\nMG Road");
    }

    #[test]
    fn test_empty_or_failed_geocoding_leaves_address_unset() {
        let mut capture = Capture::new();
        fixed(&mut capture);

        capture.geocoding_started(GeocodeTicket::new(1));
        assert_eq!(
            capture.address_resolved(1, GeocodeOutcome::Resolved(None)),
            Some("Couldn't get place name")
        );
        assert_eq!(capture.address(), None);

        capture.geocoding_started(GeocodeTicket::new(2));
        assert_eq!(
            capture.address_resolved(2, GeocodeOutcome::Failed("503".to_string())),
            Some("Error fetching address")
        );
        assert_eq!(capture.address(), None);
    }

    #[test]
    fn test_superseded_lookup_is_dropped() {
        let mut capture = Capture::new();
        fixed(&mut capture);
        let first = GeocodeTicket::new(1);
        capture.geocoding_started(first.clone());
        capture.geocoding_started(GeocodeTicket::new(2));

        assert!(first.is_cancelled());
        let notice = capture.address_resolved(1, GeocodeOutcome::Resolved(Some("Old".to_string())));

        assert_eq!(notice, None);
        assert_eq!(capture.address(), None);
        assert_eq!(capture.location_text(), "Location: 12.5, 77.1");
    }

    #[test]
    fn test_new_fix_clears_address_and_cancels_lookup() {
        let mut capture = Capture::new();
        fixed(&mut capture);
        let ticket = GeocodeTicket::new(1);
        capture.geocoding_started(ticket.clone());
        capture.address_resolved(1, GeocodeOutcome::Resolved(Some("First".to_string())));

        let pending = GeocodeTicket::new(2);
        capture.geocoding_started(pending.clone());
        capture.location_fixed(Ok(Some(Coordinate::new(1.0, 2.0))));

        assert!(pending.is_cancelled());
        assert_eq!(capture.address(), None);
        assert_eq!(capture.location_text(), "Location: 1, 2");
    }

    #[test]
    fn test_teardown_cancels_pending_lookup() {
        let mut capture = Capture::new();
        fixed(&mut capture);
        let ticket = GeocodeTicket::new(9);
        capture.geocoding_started(ticket.clone());

        capture.teardown();

        assert!(ticket.is_cancelled());
        assert_eq!(capture.address_resolved(9, GeocodeOutcome::Resolved(Some("Late".to_string()))), None);
        assert_eq!(capture.address(), None);
    }
}
