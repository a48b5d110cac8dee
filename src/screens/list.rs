//! Saved reports, newest first

use chrono::{Local, TimeZone};
use iced::widget::{button, column, container, row, scrollable, text, Column};
use iced::{Alignment, Element, Length};
use std::fmt;

use crate::screens::header;
use crate::state::data::{format_timestamp_in, PotholeReport};
use crate::state::transfer::TransferRecord;
use crate::Message;

#[derive(Debug, Default)]
pub struct ReportList {
    reports: Vec<PotholeReport>,
    summaries: Vec<String>,
    confirming_clear: bool,
}

impl ReportList {
    /// Build the list. Returns a notice when there is nothing to show.
    pub fn new(reports: Vec<PotholeReport>) -> (Self, Option<&'static str>) {
        let notice = reports.is_empty().then_some("No reports saved yet");
        let summaries = summaries_in(&reports, &Local);
        (
            Self {
                reports,
                summaries,
                confirming_clear: false,
            },
            notice,
        )
    }

    pub fn title(&self) -> String {
        format!("Saved Pothole Reports ({})", self.len())
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Transfer record for entry `index`, to hand to the detail screen
    pub fn select(&self, index: usize) -> Option<TransferRecord> {
        self.reports.get(index).map(TransferRecord::from)
    }

    pub fn is_confirming_clear(&self) -> bool {
        self.confirming_clear
    }

    pub fn request_clear(&mut self) {
        self.confirming_clear = !self.is_empty();
    }

    pub fn cancel_clear(&mut self) {
        self.confirming_clear = false;
    }

    /// Everything was deleted; show the empty list
    pub fn cleared(&mut self) {
        self.reports.clear();
        self.summaries.clear();
        self.confirming_clear = false;
    }

    pub fn view(&self) -> Element<'_, Message> {
        let entries = self
            .summaries
            .iter()
            .enumerate()
            .fold(Column::new().spacing(8), |column, (index, summary)| {
                column.push(
                    button(text(summary.as_str()).size(15))
                        .on_press(Message::ReportSelected(index))
                        .width(Length::Fill)
                        .padding(12)
                        .style(button::secondary),
                )
            });

        let actions: Element<'_, Message> = if self.is_confirming_clear() {
            row![
                text(format!("Delete all {} reports and their photos?", self.len())),
                button("Confirm")
                    .on_press(Message::ClearAllConfirmed)
                    .style(button::danger)
                    .padding(8),
                button("Cancel").on_press(Message::ClearAllCancelled).padding(8),
            ]
            .spacing(12)
            .align_y(Alignment::Center)
            .into()
        } else {
            button("Clear All Reports")
                .on_press_maybe((!self.is_empty()).then_some(Message::ClearAllRequested))
                .style(button::danger)
                .padding(8)
                .into()
        };

        column![
            header("Saved Reports"),
            text(self.title()).size(20),
            container(scrollable(entries)).height(Length::Fill),
            actions,
        ]
        .spacing(16)
        .into()
    }
}

/// One summary block per report, numbered from 1
pub fn summaries_in<Tz>(reports: &[PotholeReport], tz: &Tz) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    reports
        .iter()
        .enumerate()
        .map(|(index, report)| summary_in(index, report, tz))
        .collect()
}

fn summary_in<Tz>(index: usize, report: &PotholeReport, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let mut summary = format!(
        "Report #{}\nTime: {}\nSeverity: {}\nLat: {}, Lon: {}",
        index + 1,
        format_timestamp_in(report.timestamp, tz),
        report.severity,
        report.latitude,
        report.longitude
    );
    if let Some(address) = report.address.as_deref().filter(|a| !a.is_empty()) {
        summary.push('\n');
        summary.push_str(address);
    }
    summary
}
