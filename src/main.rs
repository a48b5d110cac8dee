use chrono::Utc;
use clap::Parser;
use iced::widget::{button, container, row, text, Column};
use iced::{Alignment, Element, Length, Task, Theme, Vector};
use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod error;
mod screens;
mod services;
mod state;
mod ui;

use config::{Config, Permission};
use screens::capture::{save_notice, LocationUpdate};
use screens::{Capture, Detail, ReportList, ReportMap, Screen};
use services::geocode::{self, GeocodeOutcome, GeocodeTicket, Geocoder};
use services::launcher::{Launcher, MapHandler};
use services::location::{self, LocationProvider};
use services::camera;
use state::data::{Coordinate, Severity};
use state::library::Library;
use state::transfer::TransferRecord;

/// How long a notice stays on screen
const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Parser, Debug)]
#[command(name = "road-medic")]
#[command(version, about = "Report potholes with a photo and a location", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, env = "ROAD_MEDIC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Open the details of a report given as a pipe-encoded transfer line
    #[arg(long, value_name = "TRANSFER_LINE")]
    open: Option<String>,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    // Navigation
    OpenCapture,
    OpenList,
    OpenMap,
    Back,

    /// User answered a permission prompt
    PermissionAnswered(Permission, bool),

    // Capture screen
    CapturePhoto,
    PhotoDecoded(Result<Arc<DynamicImage>, String>),
    RequestLocation,
    LocationFixed(Result<Option<Coordinate>, String>),
    AddressResolved { ticket: u64, outcome: GeocodeOutcome },
    SeveritySelected(Severity),
    SaveReport,

    // List screen
    ReportSelected(usize),
    ClearAllRequested,
    ClearAllConfirmed,
    ClearAllCancelled,

    // Map screen
    MarkerSelected(usize),
    MapZoom(f32),
    MapPan(Vector),

    // Detail screen
    OpenInMaps,
    ShareReport,
    CopyTransferLine,

    /// A notice timed out
    NoticeExpired(u64),
}

/// Short-lived message at the bottom of the window
#[derive(Debug, Clone)]
struct Notice {
    id: u64,
    text: String,
}

/// Main application state
struct RoadMedic {
    config: Config,
    /// Reports and their photos
    library: Library,
    location: Arc<dyn LocationProvider>,
    /// `None` when reverse geocoding is switched off
    geocoder: Option<Arc<dyn Geocoder>>,
    launcher: Launcher,
    /// Screen stack; empty means the home screen
    screens: Vec<Screen>,
    notice: Option<Notice>,
    /// Permission currently being asked for
    prompt: Option<Permission>,
    /// Source of notice and geocoding ticket IDs
    next_id: u64,
    report_count: i64,
}

impl RoadMedic {
    fn new(config: Config, library: Library) -> Self {
        let report_count = library.report_count().unwrap_or(0);
        info!("🚧 RoadMedic initialized with {} reports", report_count);

        RoadMedic {
            location: location::from_config(&config.location),
            geocoder: geocode::from_config(&config.geocoding),
            launcher: Launcher::new(&config.launcher),
            config,
            library,
            screens: Vec::new(),
            notice: None,
            prompt: None,
            next_id: 0,
            report_count,
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Show `text` and schedule it to disappear
    fn notify(&mut self, text: impl Into<String>) -> Task<Message> {
        let id = self.next_id();
        self.notice = Some(Notice { id, text: text.into() });
        // The timer is created when the task first runs, inside the runtime
        Task::perform(
            async move { tokio::time::sleep(NOTICE_DURATION).await },
            move |_| Message::NoticeExpired(id),
        )
    }

    fn notify_maybe(&mut self, text: Option<&str>) -> Task<Message> {
        match text {
            Some(text) => self.notify(text),
            None => Task::none(),
        }
    }

    fn current(&mut self) -> Option<&mut Screen> {
        self.screens.last_mut()
    }

    fn refresh_count(&mut self) {
        match self.library.report_count() {
            Ok(count) => self.report_count = count,
            Err(e) => warn!("⚠️  Failed to count reports: {}", e),
        }
    }

    fn open_detail(&mut self, record: TransferRecord) -> Task<Message> {
        let (detail, notice) = Detail::new(record);
        self.screens.push(Screen::Detail(detail));
        self.notify_maybe(notice)
    }

    /// Ask for `permission` unless it was granted before
    fn needs_permission(&mut self, permission: Permission) -> bool {
        if self.config.permissions.is_granted(permission) {
            return false;
        }
        self.prompt = Some(permission);
        true
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::OpenCapture => {
                self.screens.push(Screen::Capture(Capture::new()));
                Task::none()
            }
            Message::OpenList => match self.library.get_all_reports() {
                Ok(reports) => {
                    let (list, notice) = ReportList::new(reports);
                    self.screens.push(Screen::List(list));
                    self.notify_maybe(notice)
                }
                Err(e) => {
                    error!("❌ Failed to read reports: {}", e);
                    self.notify("Error reading reports")
                }
            },
            Message::OpenMap => match self.library.get_all_reports() {
                Ok(reports) => {
                    let (map, notice) = ReportMap::load(&reports);
                    self.screens.push(Screen::Map(map));
                    self.notify_maybe(notice)
                }
                Err(e) => {
                    error!("❌ Failed to read reports: {}", e);
                    self.notify("Error reading reports")
                }
            },
            Message::Back => {
                if let Some(Screen::Capture(mut capture)) = self.screens.pop() {
                    // A lookup still in flight must not outlive the screen
                    capture.teardown();
                }
                self.prompt = None;
                self.refresh_count();
                Task::none()
            }

            Message::PermissionAnswered(permission, granted) => {
                self.prompt = None;
                if !granted {
                    return self.notify(permission.denied_notice());
                }

                self.config.permissions.grant(permission);
                if let Err(e) = self.config.save() {
                    warn!("⚠️  Failed to remember permission: {}", e);
                }

                // Carry on with what the user asked for
                let retry = match permission {
                    Permission::Camera => Message::CapturePhoto,
                    Permission::Location => Message::RequestLocation,
                };
                self.update(retry)
            }

            Message::CapturePhoto => {
                if self.needs_permission(Permission::Camera) {
                    return Task::none();
                }
                match camera::pick_photo() {
                    Some(path) => Task::perform(camera::decode_photo(path), Message::PhotoDecoded),
                    None => self.notify("Camera cancelled"),
                }
            }
            Message::PhotoDecoded(result) => {
                let notice = match self.current() {
                    Some(Screen::Capture(capture)) => capture.photo_captured(result),
                    _ => None,
                };
                self.notify_maybe(notice)
            }
            Message::RequestLocation => {
                if self.needs_permission(Permission::Location) {
                    return Task::none();
                }
                Task::perform(location::locate(self.location.clone()), Message::LocationFixed)
            }
            Message::LocationFixed(result) => {
                let update = match self.current() {
                    Some(Screen::Capture(capture)) => capture.location_fixed(result),
                    _ => return Task::none(),
                };

                match update {
                    LocationUpdate::Fixed(coordinate) => self.start_geocoding(coordinate),
                    LocationUpdate::Unavailable(notice) => self.notify(notice),
                }
            }
            Message::AddressResolved { ticket, outcome } => {
                let notice = match self.current() {
                    Some(Screen::Capture(capture)) => capture.address_resolved(ticket, outcome),
                    _ => None,
                };
                self.notify_maybe(notice)
            }
            Message::SeveritySelected(severity) => {
                if let Some(Screen::Capture(capture)) = self.current() {
                    capture.select_severity(severity);
                }
                Task::none()
            }
            Message::SaveReport => {
                let Some(Screen::Capture(capture)) = self.screens.last() else {
                    return Task::none();
                };

                let result = capture.save(&mut self.library, Utc::now().timestamp_millis());
                match &result {
                    Ok(report) => {
                        info!("💾 Saved report #{} at {}", report.id, report.coordinate());
                        self.refresh_count();
                    }
                    Err(e) => warn!("⚠️  Report not saved: {}", e),
                }
                self.notify(save_notice(&result))
            }

            Message::ReportSelected(index) => {
                let record = match self.current() {
                    Some(Screen::List(list)) => list.select(index),
                    _ => None,
                };
                match record {
                    Some(record) => self.open_detail(record),
                    None => Task::none(),
                }
            }
            Message::ClearAllRequested => {
                if let Some(Screen::List(list)) = self.current() {
                    list.request_clear();
                }
                Task::none()
            }
            Message::ClearAllCancelled => {
                if let Some(Screen::List(list)) = self.current() {
                    list.cancel_clear();
                }
                Task::none()
            }
            Message::ClearAllConfirmed => match self.library.clear_all() {
                Ok(_) => {
                    if let Some(Screen::List(list)) = self.current() {
                        list.cleared();
                    }
                    self.refresh_count();
                    self.notify("All reports cleared")
                }
                Err(e) => {
                    error!("❌ Failed to clear reports: {}", e);
                    if let Some(Screen::List(list)) = self.current() {
                        list.cancel_clear();
                    }
                    self.notify("Error clearing reports")
                }
            },

            Message::MarkerSelected(index) => {
                let record = match self.current() {
                    Some(Screen::Map(map)) => map.select(index),
                    _ => None,
                };
                match record {
                    Some(record) => self.open_detail(record),
                    None => Task::none(),
                }
            }
            Message::MapZoom(delta) => {
                if let Some(Screen::Map(map)) = self.current() {
                    map.zoom(delta);
                }
                Task::none()
            }
            Message::MapPan(delta) => {
                if let Some(Screen::Map(map)) = self.current() {
                    map.pan(delta);
                }
                Task::none()
            }

            Message::OpenInMaps => {
                let Some(Screen::Detail(detail)) = self.screens.last() else {
                    return Task::none();
                };
                match self.launcher.open_map(detail.coordinate()) {
                    Ok(MapHandler::Dedicated(app)) => {
                        info!("🗺️  Opened map in {}", app);
                        Task::none()
                    }
                    Ok(MapHandler::Generic) => {
                        info!("🗺️  Opened map with the platform opener");
                        Task::none()
                    }
                    Err(e) => {
                        error!("❌ Failed to open map: {}", e);
                        self.notify("No map application available")
                    }
                }
            }
            Message::ShareReport => {
                let Some(Screen::Detail(detail)) = self.screens.last() else {
                    return Task::none();
                };
                let body = detail.share_text();
                match self.launcher.share(&body) {
                    Ok(()) => Task::none(),
                    Err(e) => {
                        // No mail client; the clipboard is the share target of last resort
                        warn!("⚠️  Share failed, copying instead: {}", e);
                        Task::batch([iced::clipboard::write(body), self.notify("Report copied to clipboard")])
                    }
                }
            }
            Message::CopyTransferLine => {
                let Some(Screen::Detail(detail)) = self.screens.last() else {
                    return Task::none();
                };
                let line = detail.transfer_line();
                Task::batch([iced::clipboard::write(line), self.notify("Transfer line copied")])
            }

            Message::NoticeExpired(id) => {
                if self.notice.as_ref().is_some_and(|notice| notice.id == id) {
                    self.notice = None;
                }
                Task::none()
            }
        }
    }

    /// Look up the place name for a fresh fix, unless geocoding is off
    fn start_geocoding(&mut self, coordinate: Coordinate) -> Task<Message> {
        let Some(geocoder) = self.geocoder.clone() else {
            return Task::none();
        };

        let id = self.next_id();
        let ticket = GeocodeTicket::new(id);
        let Some(Screen::Capture(capture)) = self.current() else {
            return Task::none();
        };
        capture.geocoding_started(ticket.clone());

        Task::perform(geocode::resolve(geocoder, coordinate, ticket), move |outcome| {
            Message::AddressResolved { ticket: id, outcome }
        })
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        let body = match self.screens.last() {
            None => screens::home::view(self.report_count),
            Some(Screen::Capture(capture)) => capture.view(),
            Some(Screen::List(list)) => list.view(),
            Some(Screen::Detail(detail)) => detail.view(),
            Some(Screen::Map(map)) => map.view(),
        };

        let mut content = Column::new().spacing(12).padding(20);

        if let Some(permission) = self.prompt {
            content = content.push(
                container(
                    row![
                        text(permission.rationale()).width(Length::Fill),
                        button("Allow").on_press(Message::PermissionAnswered(permission, true)),
                        button("Deny")
                            .on_press(Message::PermissionAnswered(permission, false))
                            .style(button::secondary),
                    ]
                    .spacing(12)
                    .align_y(Alignment::Center),
                )
                .padding(12)
                .width(Length::Fill)
                .style(container::rounded_box),
            );
        }

        content = content.push(container(body).width(Length::Fill).height(Length::Fill));

        if let Some(notice) = &self.notice {
            content = content.push(
                container(text(notice.text.as_str()).size(15))
                    .padding(10)
                    .center_x(Length::Fill)
                    .style(container::rounded_box),
            );
        }

        content.into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load(cli.config.as_deref())?;
    let library = Library::open(&config.db_path()?, &config.images_dir()?)?;

    // Photos left behind by an interrupted save
    let (orphans, missing) = library.verify()?;
    if orphans > 0 || missing > 0 {
        info!("🧹 Removed {} orphaned photos, {} reports reference missing photos", orphans, missing);
    }

    let mut app = RoadMedic::new(config, library);
    let startup = match cli.open.as_deref().map(Detail::from_line) {
        Some(Ok((detail, notice))) => {
            app.screens.push(Screen::Detail(detail));
            app.notify_maybe(notice)
        }
        Some(Err(notice)) => app.notify(notice),
        None => Task::none(),
    };

    iced::application("RoadMedic", RoadMedic::update, RoadMedic::view)
        .theme(RoadMedic::theme)
        .centered()
        .run_with(move || (app, startup))?;

    Ok(())
}
