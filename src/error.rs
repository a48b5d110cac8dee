//! Error types for RoadMedic

use thiserror::Error;

use crate::state::transfer::TransferError;

/// Main error type for RoadMedic operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("UI error: {0}")]
    Ui(#[from] iced::Error),

    #[error("Invalid report data: {0}")]
    Transfer(#[from] TransferError),

    #[error("No photo captured")]
    MissingPhoto,

    #[error("No location fix")]
    MissingLocation,

    #[error("Could not launch {0}")]
    Launch(String),

    #[error("Could not determine user data directory")]
    NoDataDir,
}

/// Result type alias for RoadMedic
pub type Result<T> = std::result::Result<T, Error>;
