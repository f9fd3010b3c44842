//! Tuning constants shared by the viewport crate.

pub mod controls;
pub mod framing;
pub mod notice;
pub mod render_settings;
