//! Hand-off to external applications: map viewer and mail/share

use std::path::PathBuf;
use std::process::{Command, Stdio};
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::config::LauncherConfig;
use crate::error::{Error, Result};
use crate::state::data::Coordinate;

/// Subject line used for every shared report
pub const SHARE_SUBJECT: &str = "Pothole Report";

/// Which application ended up handling a map request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapHandler {
    Dedicated(String),
    Generic,
}

#[derive(Debug, Clone)]
pub struct Launcher {
    map_app: Option<String>,
}

impl Launcher {
    pub fn new(config: &LauncherConfig) -> Self {
        Self {
            map_app: config.map_app.clone().filter(|app| !app.trim().is_empty()),
        }
    }

    /// Open `coordinate` in the dedicated map application if it is installed,
    /// otherwise let the platform opener pick a handler.
    pub fn open_map(&self, coordinate: Coordinate) -> Result<MapHandler> {
        let uri = geo_uri(coordinate);

        if let Some(app) = self.map_app.as_deref().filter(|app| find_on_path(app).is_some()) {
            debug!("Opening {} with {}", uri, app);
            spawn_detached(app, &[uri.as_str()])?;
            return Ok(MapHandler::Dedicated(app.to_string()));
        }

        open_with_platform(&uri)?;
        Ok(MapHandler::Generic)
    }

    /// Hand `body` to the mail client with the fixed subject line
    pub fn share(&self, body: &str) -> Result<()> {
        open_with_platform(&mailto_uri(SHARE_SUBJECT, body))
    }
}

/// `geo:<lat>,<lon>?q=<lat>,<lon>(Pothole)`
pub fn geo_uri(coordinate: Coordinate) -> String {
    format!(
        "geo:{lat},{lon}?q={lat},{lon}(Pothole)",
        lat = coordinate.latitude,
        lon = coordinate.longitude
    )
}

/// `mailto:?subject=..&body=..` with RFC 6068 percent-encoding
pub fn mailto_uri(subject: &str, body: &str) -> String {
    format!(
        "mailto:?subject={}&body={}",
        percent_encode(subject),
        percent_encode(body)
    )
}

fn percent_encode(value: &str) -> String {
    // form encoding writes spaces as `+`; mail clients expect `%20`.
    // A literal `+` is already escaped as `%2B`, so the swap is safe.
    form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Locate an executable on `PATH`
fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = PathBuf::from(program);
    if candidate.is_absolute() {
        return candidate.is_file().then_some(candidate);
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}

fn open_with_platform(target: &str) -> Result<()> {
    if cfg!(target_os = "windows") {
        spawn_detached("cmd", &["/C", "start", "", target])
    } else if cfg!(target_os = "macos") {
        spawn_detached("open", &[target])
    } else {
        spawn_detached("xdg-open", &[target])
    }
}

fn spawn_detached(program: &str, args: &[&str]) -> Result<()> {
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
        .map_err(|e| {
            warn!("⚠️  Failed to launch {}: {}", program, e);
            Error::Launch(format!("{}: {}", program, e))
        })
}
