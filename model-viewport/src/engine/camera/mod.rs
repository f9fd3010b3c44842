//! Viewport camera navigation.
//!
//! Orbit, pan and zoom with inertial damping, plus framing of the camera
//! around a freshly loaded model.

use bevy::prelude::*;

/// Fits the camera and its clip planes to a model's bounding box.
pub mod framing;

/// Orbit controller component and the input/update systems driving it.
pub mod orbit_controller;

/// Marks the single perspective camera the viewport renders through.
#[derive(Component, Default)]
pub struct ViewportCamera;
