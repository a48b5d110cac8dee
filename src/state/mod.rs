//! State management module
//!
//! This module handles all persisted application state:
//! - The report database (store.rs)
//! - The photo directory (images.rs)
//! - Keeping rows and photos consistent (library.rs)
//! - Shared data structures (data.rs)
//! - Hand-off of a report between screens (transfer.rs)

pub mod data;
pub mod images;
pub mod library;
pub mod store;
pub mod transfer;
