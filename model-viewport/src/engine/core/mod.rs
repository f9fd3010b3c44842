//! Core application setup and viewport state.
//!
//! Plugin and app construction, viewer configuration, errors, and the
//! state shared between the load, frame and teardown systems.

/// Viewport plugin, system ordering and app construction for native and WASM targets.
pub mod app_setup;

/// Load phase, cancellable load tickets and the dispose handle.
pub mod app_state;

/// Viewer configuration parsed from JSON.
pub mod config;

pub mod error;

/// Window configuration with canvas binding for web targets.
pub mod window_config;
