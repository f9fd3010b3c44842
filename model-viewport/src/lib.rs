//! Embeddable 3D model viewport.
//!
//! Loads a Wavefront OBJ or binary FBX model into a bevy scene with orbit
//! controls, frames the camera on it and tears everything down on dispose.
//! Native hosts use [`ViewportPlugin`] or [`create_app`]; browser hosts call
//! the `createViewport` export.

pub mod engine;
pub mod host;

pub use engine::core::app_setup::{ViewportPlugin, ViewportSet, create_app};
pub use engine::core::app_state::{LoadPhase, ViewportHandle, ViewportState};
pub use engine::core::config::{Background, ViewerConfig};
pub use engine::core::error::ViewerError;
pub use engine::loading::model_loader::LoadModelRequest;
pub use host::HostSurface;
