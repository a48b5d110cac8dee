//! Custom widgets

pub mod map;
