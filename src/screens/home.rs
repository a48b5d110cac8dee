use iced::widget::{button, column, container, text};
use iced::{Alignment, Element, Length};

use crate::Message;

pub fn view(report_count: i64) -> Element<'static, Message> {
    let entry = |label: &'static str, message: Message| {
        button(text(label).size(18).center())
            .on_press(message)
            .width(Length::Fixed(260.0))
            .padding(14)
    };

    let content = column![
        text("RoadMedic").size(40),
        text("Report potholes with a photo and a location").size(16),
        entry("Report Pothole", Message::OpenCapture),
        entry("View Saved Reports", Message::OpenList),
        entry("View Map", Message::OpenMap),
        text(format!("{} saved report(s)", report_count)).size(14),
    ]
    .spacing(20)
    .align_x(Alignment::Center);

    container(content)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
