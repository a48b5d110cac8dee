use iced::widget::{canvas, column, text};
use iced::{Element, Length, Vector};

use crate::screens::header;
use crate::state::data::PotholeReport;
use crate::state::transfer::TransferRecord;
use crate::ui::map::{MapCanvas, Marker, Viewport, INITIAL_ZOOM};
use crate::Message;

/// Every saved report as a pin on a pannable map
#[derive(Debug, Default)]
pub struct ReportMap {
    markers: Vec<Marker>,
    viewport: Viewport,
}

impl ReportMap {
    /// One marker per report; the view opens on the first (newest) one.
    /// Returns a notice when there is nothing to pin.
    pub fn load(reports: &[PotholeReport]) -> (Self, Option<&'static str>) {
        let Some(first) = reports.first() else {
            return (Self::default(), Some("No reports to show on map"));
        };

        let markers = reports
            .iter()
            .enumerate()
            .map(|(index, report)| Marker {
                position: report.coordinate(),
                title: format!("Pothole #{}", index + 1),
                payload: TransferRecord::from(report),
            })
            .collect();

        let map = Self {
            markers,
            viewport: Viewport::new(first.coordinate(), INITIAL_ZOOM),
        };
        (map, None)
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Payload of marker `index`, to hand to the detail screen
    pub fn select(&self, index: usize) -> Option<TransferRecord> {
        self.markers.get(index).map(|marker| marker.payload.clone())
    }

    pub fn zoom(&mut self, delta: f32) {
        self.viewport.zoom_by(delta);
    }

    pub fn pan(&mut self, delta: Vector) {
        self.viewport.pan_by(delta);
    }

    pub fn view(&self) -> Element<'_, Message> {
        let map = canvas(MapCanvas {
            markers: &self.markers,
            viewport: self.viewport,
        })
        .width(Length::Fill)
        .height(Length::Fill);

        column![
            header("Report Map"),
            text(format!("{} report(s), zoom {:.1}", self.markers().len(), self.viewport().zoom)).size(14),
            map,
        ]
        .spacing(12)
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::data::{Coordinate, Severity};
    use crate::ui::map::MIN_ZOOM;

    fn report(timestamp: i64, latitude: f64, longitude: f64) -> PotholeReport {
        PotholeReport {
            id: timestamp,
            timestamp,
            image_path: format!("/images/pothole_{}.jpg", timestamp),
            latitude,
            longitude,
            severity: Severity::Low,
            address: Some(String::new()),
        }
    }

    #[test]
    fn test_no_reports_no_markers() {
        let (map, notice) = ReportMap::load(&[]);
        assert_eq!(notice, Some("No reports to show on map"));
        assert!(map.markers().is_empty());
        assert!(map.select(0).is_none());
    }

    #[test]
    fn test_markers_titled_and_centered_on_first() {
        let reports = vec![report(300, 12.9, 77.6), report(200, 13.0, 77.5)];
        let (map, notice) = ReportMap::load(&reports);

        assert_eq!(notice, None);
        let titles: Vec<&str> = map.markers().iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["Pothole #1", "Pothole #2"]);
        assert_eq!(map.viewport(), Viewport::new(Coordinate::new(12.9, 77.6), INITIAL_ZOOM));
    }

    #[test]
    fn test_select_hands_over_payload() {
        let (map, _) = ReportMap::load(&[report(300, 12.9, 77.6), report(200, 13.0, 77.5)]);

        let record = map.select(1).unwrap();
        assert_eq!(record.timestamp, 200);
        assert_eq!(record.latitude, 13.0);
        assert_eq!(record.address, None);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let (mut map, _) = ReportMap::load(&[report(1, 0.0, 0.0)]);
        map.zoom(-100.0);
        assert_eq!(map.viewport().zoom, MIN_ZOOM);
    }
}
