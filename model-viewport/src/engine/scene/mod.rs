//! Scene contents owned by the viewport.
//!
//! Camera, lights and reference grid spawned at startup, and the release
//! pass that hands their GPU resources back.

/// Flat reference grid on the ground plane.
pub mod grid;

/// Ambient and directional lighting.
pub mod lighting;

/// Walks spawned sub-trees and removes the meshes, materials and textures they own.
pub mod release;

/// Startup system building the camera, lights and grid.
pub mod render_context;
