use bevy::prelude::*;
use constants::framing::{
    FAR_PLANE_MULTIPLIER, FRAMING_ELEVATION, FRAMING_MARGIN, NEAR_PLANE_DIVISOR,
};

use super::orbit_controller::OrbitController;
use crate::engine::assets::bounds::ModelBounds;

/// Camera placement that shows a whole model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramedView {
    pub position: Vec3,
    pub target: Vec3,
    pub near: f32,
    pub far: f32,
}

/// Computes the framed view for `bounds` under a vertical field of view in radians.
///
/// Returns `None` for empty, non-finite or zero-extent bounds; the camera
/// is then left where it is.
pub fn frame_bounds(bounds: &ModelBounds, fov: f32) -> Option<FramedView> {
    if bounds.is_empty() || !bounds.is_finite() {
        return None;
    }

    let max_dim = bounds.size().max_element();
    if max_dim <= 0.0 {
        return None;
    }

    let fit_distance = max_dim / (2.0 * (fov * 0.5).tan());
    let distance = FRAMING_MARGIN * fit_distance;
    if !distance.is_finite() || distance <= 0.0 {
        return None;
    }

    let center = bounds.center();
    Some(FramedView {
        position: center + Vec3::new(distance, FRAMING_ELEVATION * distance, distance),
        target: center,
        near: distance / NEAR_PLANE_DIVISOR,
        far: distance * FAR_PLANE_MULTIPLIER,
    })
}

/// Moves the camera to `view`, updates its clip planes and re-targets the orbit.
pub fn apply_framing(
    view: &FramedView,
    transform: &mut Transform,
    projection: &mut Projection,
    controller: &mut OrbitController,
) {
    transform.translation = view.position;
    transform.look_at(view.target, Vec3::Y);

    if let Projection::Perspective(perspective) = projection {
        perspective.near = view.near;
        perspective.far = view.far;
    }

    controller.target = view.target;
    controller.reset_motion();
}
