//! The screens of the app. Each one owns its state and renders itself;
//! navigation between them lives in `main.rs`.

pub mod capture;
pub mod detail;
pub mod home;
pub mod list;
pub mod map;

use iced::widget::{button, row, text};
use iced::{Alignment, Element};

use crate::Message;

pub use capture::Capture;
pub use detail::Detail;
pub use list::ReportList;
pub use map::ReportMap;

/// A screen above home. Home itself is the empty stack.
#[derive(Debug)]
pub enum Screen {
    Capture(Capture),
    List(ReportList),
    Detail(Detail),
    Map(ReportMap),
}

/// Back button plus screen title
pub(crate) fn header(title: &str) -> Element<'_, Message> {
    row![
        button("← Back").on_press(Message::Back).padding(8),
        text(title).size(24),
    ]
    .spacing(16)
    .align_y(Alignment::Center)
    .into()
}
