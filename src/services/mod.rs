//! Platform collaborators
//!
//! Everything the app asks of the outside world goes through here:
//! - Photo capture and decoding (camera.rs)
//! - Single location fixes (location.rs)
//! - Reverse geocoding with cancellable requests (geocode.rs)
//! - External map and share applications (launcher.rs)

pub mod camera;
pub mod geocode;
pub mod launcher;
pub mod location;
