//! One report in full, with hand-offs to the map app, the mail client
//! and the clipboard.

use chrono::{Local, TimeZone};
use iced::widget::image::Handle;
use iced::widget::{button, column, row, scrollable, text, Image};
use iced::{Element, Length};
use std::fmt;
use std::path::Path;

use crate::screens::header;
use crate::state::data::{format_timestamp, format_timestamp_in, Coordinate};
use crate::state::transfer::{TransferError, TransferRecord};
use crate::Message;

#[derive(Debug)]
pub struct Detail {
    record: TransferRecord,
    photo: Option<Handle>,
}

impl Detail {
    /// Open a report. A missing photo file does not stop the screen;
    /// it only produces a notice.
    pub fn new(record: TransferRecord) -> (Self, Option<&'static str>) {
        let path = Path::new(&record.image_path);
        let (photo, notice) = if path.is_file() {
            (Some(Handle::from_path(path)), None)
        } else {
            (None, Some("Image file not found"))
        };
        (Self { record, photo }, notice)
    }

    /// Open a report from a pipe-encoded transfer line.
    /// Fails with the notice to show when the line is unusable.
    pub fn from_line(line: &str) -> Result<(Self, Option<&'static str>), &'static str> {
        TransferRecord::decode(line)
            .map(Self::new)
            .map_err(|e| transfer_notice(&e))
    }

    pub fn coordinate(&self) -> Coordinate {
        self.record.coordinate()
    }

    #[cfg(test)]
    pub fn has_photo(&self) -> bool {
        self.photo.is_some()
    }

    pub fn time_text(&self) -> String {
        format!("Time: {}", format_timestamp(self.record.timestamp))
    }

    pub fn time_text_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        format!("Time: {}", format_timestamp_in(self.record.timestamp, tz))
    }

    pub fn location_text(&self) -> String {
        match self.address() {
            Some(address) => format!("Location: {}\n{}", self.coordinate(), address),
            None => format!("Location: {}", self.coordinate()),
        }
    }

    pub fn path_text(&self) -> String {
        format!("Image: {}", self.record.image_path)
    }

    pub fn share_text(&self) -> String {
        self.share_text_in(&Local)
    }

    /// Plain-text body handed to the share target
    pub fn share_text_in<Tz>(&self, tz: &Tz) -> String
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        format!(
            "RoadMedic Pothole Report\nTime: {}\nLocation: {}\nAddress: {}",
            format_timestamp_in(self.record.timestamp, tz),
            self.coordinate(),
            self.address().unwrap_or("Not available")
        )
    }

    pub fn transfer_line(&self) -> String {
        self.record.encode()
    }

    fn address(&self) -> Option<&str> {
        self.record.address.as_deref().filter(|a| !a.is_empty())
    }

    pub fn view(&self) -> Element<'_, Message> {
        let mut content = column![
            header("Report Details"),
            text(self.time_text()).size(16),
            text(self.location_text()).size(16),
            text(self.path_text()).size(13),
        ]
        .spacing(12);

        if let Some(photo) = &self.photo {
            content = content.push(
                Image::new(photo.clone())
                    .width(Length::Fill)
                    .height(Length::Fixed(360.0)),
            );
        }

        content = content.push(
            row![
                button("Open in Maps").on_press(Message::OpenInMaps).padding(10),
                button("Share").on_press(Message::ShareReport).padding(10),
                button("Copy Transfer Line")
                    .on_press(Message::CopyTransferLine)
                    .style(button::secondary)
                    .padding(10),
            ]
            .spacing(10),
        );

        scrollable(content).into()
    }
}

/// Notice for a transfer line that cannot be opened
pub fn transfer_notice(error: &TransferError) -> &'static str {
    match error {
        TransferError::MissingField(_) => "Missing report data",
        TransferError::InvalidNumber { .. } => "Invalid report data",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_location_text_without_address() {
        let (detail, notice) = Detail::from_line("100|/img.jpg|12.5|77.1|").unwrap();
        assert_eq!(detail.location_text(), "Location: 12.5, 77.1");
        assert_eq!(notice, Some("Image file not found"));
        assert!(!detail.has_photo());
    }

    #[test]
    fn test_location_text_with_address() {
        let (detail, _) = Detail::from_line("100|/img.jpg|12.5|77.1|MG Road").unwrap();
        assert_eq!(detail.location_text(), "Location: 12.5, 77.1\nMG Road");
        assert_eq!(detail.path_text(), "Image: /img.jpg");
    }

    #[test]
    fn test_time_text() {
        let (detail, _) = Detail::from_line("1000|/img.jpg|12.5|77.1").unwrap();
        assert_eq!(detail.time_text_in(&Utc), "Time: 1970-01-01 00:00:01");
    }

    #[test]
    fn test_share_text_without_address() {
        let (detail, _) = Detail::from_line("0|/img.jpg|12.5|77.1|").unwrap();
        assert_eq!(
            detail.share_text_in(&Utc),
            "RoadMedic Pothole Report\nTime: 1970-01-01 00:00:00\nLocation: 12.5, 77.1\nAddress: Not available"
        );
    }

    #[test]
    fn test_share_text_with_address() {
        let (detail, _) = Detail::from_line("0|/img.jpg|12.5|77.1|Ring Road").unwrap();
        assert!(detail.share_text_in(&Utc).ends_with("\nAddress: Ring Road"));
    }

    #[test]
    fn test_bad_lines_do_not_open() {
        assert_eq!(Detail::from_line("100|/img.jpg|12.5").err(), Some("Missing report data"));
        assert_eq!(Detail::from_line("|/img.jpg|12.5|77.1").err(), Some("Missing report data"));
        assert_eq!(Detail::from_line("100|/img.jpg|north|77.1").err(), Some("Invalid report data"));
        assert_eq!(Detail::from_line("soon|/img.jpg|12.5|77.1").err(), Some("Invalid report data"));
    }

    #[test]
    fn test_existing_photo_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pothole_1.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let (detail, notice) = Detail::new(TransferRecord {
            timestamp: 1,
            image_path: path.to_string_lossy().into_owned(),
            latitude: 1.0,
            longitude: 2.0,
            address: None,
        });

        assert_eq!(notice, None);
        assert!(detail.has_photo());
        assert_eq!(detail.transfer_line(), format!("1|{}|1|2|", path.display()));
    }
}
