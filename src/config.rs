//! Configuration management for RoadMedic
//!
//! Loaded from `<config_dir>/road-medic/config.toml`. Every field has a
//! default, so a missing file simply means "use the defaults".

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};

const APP_DIR: &str = "road-medic";
const CONFIG_FILE: &str = "config.toml";
const DB_FILE: &str = "road_medic.db";
const IMAGES_DIR: &str = "images";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub location: LocationConfig,

    #[serde(default)]
    pub geocoding: GeocodingConfig,

    #[serde(default)]
    pub launcher: LauncherConfig,

    #[serde(default)]
    pub permissions: PermissionsConfig,

    /// Where this config was loaded from (and is saved back to)
    #[serde(skip)]
    pub path: Option<PathBuf>,
}

/// Where reports and photos are kept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Overrides the platform data directory
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Which location provider answers "get location"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LocationConfig {
    /// A fixed position, for machines that never move
    Fixed { latitude: f64, longitude: f64 },
    /// Approximate position from the public IP address
    Ip {
        #[serde(default = "default_ip_endpoint")]
        endpoint: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig::Ip {
            endpoint: default_ip_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Reverse geocoding (coordinate → place name)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Nominatim-compatible reverse endpoint
    #[serde(default = "default_geocoding_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Preferred language for place names (Accept-Language)
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_geocoding_endpoint(),
            user_agent: default_user_agent(),
            language: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// External applications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Map application that understands `geo:` URIs.
    /// Falls back to the platform opener when not installed.
    #[serde(default = "default_map_app")]
    pub map_app: Option<String>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            map_app: default_map_app(),
        }
    }
}

/// Features the user has allowed. Only grants are remembered;
/// a denial is asked again next time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionsConfig {
    #[serde(default)]
    pub camera: bool,

    #[serde(default)]
    pub location: bool,
}

/// A feature that needs the user's consent before first use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Camera,
    Location,
}

impl Permission {
    /// Question shown when asking for the permission
    pub fn rationale(self) -> &'static str {
        match self {
            Permission::Camera => "RoadMedic needs access to your photos to attach a picture of the pothole.",
            Permission::Location => "RoadMedic needs your location to pin the pothole on the map.",
        }
    }

    pub fn denied_notice(self) -> &'static str {
        match self {
            Permission::Camera => "Camera permission denied",
            Permission::Location => "Location permission denied",
        }
    }
}

impl PermissionsConfig {
    pub fn is_granted(&self, permission: Permission) -> bool {
        match permission {
            Permission::Camera => self.camera,
            Permission::Location => self.location,
        }
    }

    pub fn grant(&mut self, permission: Permission) {
        match permission {
            Permission::Camera => self.camera = true,
            Permission::Location => self.location = true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_ip_endpoint() -> String {
    "http://ip-api.com/json".to_string()
}

fn default_geocoding_endpoint() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

fn default_user_agent() -> String {
    format!("road-medic/{}", env!("CARGO_PKG_VERSION"))
}

fn default_map_app() -> Option<String> {
    Some("gnome-maps".to_string())
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`, or from the default location when `None`.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()
                .ok_or_else(|| Error::Config("no config directory on this platform".to_string()))?,
        };

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            info!("Loaded config from {}", path.display());
            config
        } else {
            debug!("No config at {}, using defaults", path.display());
            Config::default()
        };

        config.path = Some(path);
        Ok(config)
    }

    /// Write the config back to where it was loaded from
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| Error::Config("config has no file path".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Base directory for the database and photos
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.storage.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join(APP_DIR))
            .ok_or(Error::NoDataDir)
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(DB_FILE))
    }

    pub fn images_dir(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(IMAGES_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.geocoding.enabled);
        assert!(!config.permissions.camera);
        assert!(matches!(config.location, LocationConfig::Ip { .. }));
    }

    #[test]
    fn test_fixed_location_parses() {
        let config: Config = toml::from_str(
            r#"
            [location]
            provider = "fixed"
            latitude = 12.97
            longitude = 77.59

            [geocoding]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(
            config.location,
            LocationConfig::Fixed {
                latitude: 12.97,
                longitude: 77.59
            }
        );
        assert!(!config.geocoding.enabled);
        assert_eq!(config.geocoding.timeout_secs, 10);
    }

    #[test]
    fn test_grant_permission() {
        let mut permissions = PermissionsConfig::default();
        assert!(!permissions.is_granted(Permission::Location));

        permissions.grant(Permission::Location);

        assert!(permissions.is_granted(Permission::Location));
        assert!(!permissions.is_granted(Permission::Camera));
    }

    #[test]
    fn test_missing_file_uses_defaults_and_remembers_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.path.as_deref(), Some(path.as_path()));
        assert_eq!(config.launcher, LauncherConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::load(Some(&path)).unwrap();
        config.permissions.location = true;
        config.storage.data_dir = Some(dir.path().join("data"));
        config.save().unwrap();

        let reloaded = Config::load(Some(&path)).unwrap();
        assert_eq!(reloaded, config);
        assert_eq!(reloaded.db_path().unwrap(), dir.path().join("data").join("road_medic.db"));
        assert_eq!(reloaded.images_dir().unwrap(), dir.path().join("data").join("images"));
    }
}
