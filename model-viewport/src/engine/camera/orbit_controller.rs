use std::f32::consts::{PI, TAU};

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::input::touch::Touch;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use constants::controls::{
    AUTO_ROTATE_SPEED, DAMPING_FACTOR, PAN_SPEED, POLAR_EPSILON, ROTATE_SPEED, WHEEL_LINE_PIXELS,
    WHEEL_PIXELS_PER_STEP, ZOOM_SPEED, ZOOM_STEP_RATIO,
};
use constants::render_settings::CAMERA_FOV_DEGREES;

use super::ViewportCamera;

/// Camera offset from the orbit target in spherical coordinates.
/// `theta` is measured around +Y from +Z, `phi` down from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Orbit / pan / zoom controller with inertial damping.
///
/// Input accumulates into pending deltas; [`update`](Self::update) applies a
/// damped share of them once per frame and decays the remainder.
#[derive(Component, Debug, Clone)]
pub struct OrbitController {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
    pan_offset: Vec3,
    dragging: bool,
    enabled: bool,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: DAMPING_FACTOR,
            rotate_speed: ROTATE_SPEED,
            zoom_speed: ZOOM_SPEED,
            pan_speed: PAN_SPEED,
            auto_rotate: false,
            auto_rotate_speed: AUTO_ROTATE_SPEED,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            dragging: false,
            enabled: true,
        }
    }
}

impl OrbitController {
    pub fn new(auto_rotate: bool) -> Self {
        Self {
            auto_rotate,
            ..default()
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stops reacting to input and drops any pending motion.
    pub fn dispose(&mut self) {
        self.enabled = false;
        self.dragging = false;
        self.reset_motion();
    }

    pub fn reset_motion(&mut self) {
        self.theta_delta = 0.0;
        self.phi_delta = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vec3::ZERO;
    }

    pub fn has_pending_motion(&self) -> bool {
        self.theta_delta.abs() > 1e-6
            || self.phi_delta.abs() > 1e-6
            || self.pan_offset.length_squared() > 1e-12
            || (self.scale - 1.0).abs() > 1e-6
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Radians turned per second by auto-rotation.
    pub fn auto_rotation_rate(&self) -> f32 {
        TAU / 60.0 * self.auto_rotate_speed
    }

    fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    /// Drag rotation. A drag across the full viewport height is one full turn at speed 1.
    pub fn rotate_by_pixels(&mut self, delta: Vec2, viewport_height: f32) {
        if !self.enabled {
            return;
        }
        let height = viewport_height.max(1.0);
        self.rotate_left(TAU * delta.x / height * self.rotate_speed);
        self.rotate_up(TAU * delta.y / height * self.rotate_speed);
    }

    /// Wheel zoom; positive deltas (scrolling up) move the camera closer.
    pub fn zoom_by_pixels(&mut self, delta: f32) {
        if !self.enabled || delta == 0.0 {
            return;
        }
        let steps = delta.abs() / WHEEL_PIXELS_PER_STEP;
        let ratio = ZOOM_STEP_RATIO.powf(self.zoom_speed * steps);
        if delta > 0.0 {
            self.scale *= ratio;
        } else {
            self.scale /= ratio;
        }
    }

    /// Pinch zoom from the ratio of current to previous finger spacing.
    pub fn zoom_by_ratio(&mut self, ratio: f32) {
        if !self.enabled || !ratio.is_finite() || ratio <= 0.0 {
            return;
        }
        self.scale /= ratio.powf(self.zoom_speed);
    }

    /// Screen-space pan: the target moves in the camera's right/up plane,
    /// scaled so the model tracks the pointer at the target's depth.
    pub fn pan_by_pixels(&mut self, delta: Vec2, viewport_height: f32, fov: f32, camera: &Transform) {
        if !self.enabled {
            return;
        }
        let distance = (camera.translation - self.target).length() * (fov * 0.5).tan();
        let height = viewport_height.max(1.0);
        let left = 2.0 * delta.x * distance / height * self.pan_speed;
        let up = 2.0 * delta.y * distance / height * self.pan_speed;
        self.pan_offset += camera.right() * -left + camera.up() * up;
    }

    /// Applies pending motion to `transform` and decays it.
    pub fn update(&mut self, transform: &mut Transform, delta_secs: f32) {
        let mut spherical = Spherical::from_offset(transform.translation - self.target);

        if self.auto_rotate && self.enabled && !self.dragging {
            self.rotate_left(self.auto_rotation_rate() * delta_secs);
        }

        if self.enable_damping {
            spherical.theta += self.theta_delta * self.damping_factor;
            spherical.phi += self.phi_delta * self.damping_factor;
            self.target += self.pan_offset * self.damping_factor;
        } else {
            spherical.theta += self.theta_delta;
            spherical.phi += self.phi_delta;
            self.target += self.pan_offset;
        }

        spherical.phi = spherical.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        transform.translation = self.target + spherical.to_offset();
        transform.look_at(self.target, Vec3::Y);

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.theta_delta *= decay;
            self.phi_delta *= decay;
            self.pan_offset *= decay;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;
    }
}

/// Feeds mouse and touch input into the viewport camera's controller.
pub fn orbit_input(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<(&mut OrbitController, &Transform, &Projection), With<ViewportCamera>>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll: f32 = scroll_events
        .read()
        .map(|ev| match ev.unit {
            MouseScrollUnit::Line => ev.y * WHEEL_LINE_PIXELS,
            MouseScrollUnit::Pixel => ev.y,
        })
        .sum();

    let Ok((mut controller, transform, projection)) = cameras.single_mut() else {
        return;
    };
    if !controller.is_enabled() {
        return;
    }

    let viewport_height = windows.single().map(|w| w.height()).unwrap_or(1.0);
    let fov = match projection {
        Projection::Perspective(perspective) => perspective.fov,
        _ => CAMERA_FOV_DEGREES.to_radians(),
    };

    let active_touches: Vec<&Touch> = touches.iter().collect();
    let rotating = mouse_buttons.pressed(MouseButton::Left);
    let panning = mouse_buttons.any_pressed([MouseButton::Right, MouseButton::Middle]);
    controller.set_dragging(rotating || panning || !active_touches.is_empty());

    if mouse_delta != Vec2::ZERO {
        if rotating {
            controller.rotate_by_pixels(mouse_delta, viewport_height);
        } else if panning {
            controller.pan_by_pixels(mouse_delta, viewport_height, fov, transform);
        }
    }

    if scroll != 0.0 {
        controller.zoom_by_pixels(scroll);
    }

    match active_touches.as_slice() {
        [touch] => controller.rotate_by_pixels(touch.delta(), viewport_height),
        [first, second] => {
            let previous = first.previous_position().distance(second.previous_position());
            let current = first.position().distance(second.position());
            if previous > 0.0 {
                controller.zoom_by_ratio(current / previous);
            }
            let midpoint_delta = (first.delta() + second.delta()) * 0.5;
            controller.pan_by_pixels(midpoint_delta, viewport_height, fov, transform);
        }
        _ => {}
    }
}

/// Per-frame controller step (damping and auto-rotation).
pub fn update_orbit_controller(
    time: Res<Time>,
    mut cameras: Query<(&mut OrbitController, &mut Transform), With<ViewportCamera>>,
) {
    for (mut controller, mut transform) in &mut cameras {
        controller.update(&mut transform, time.delta_secs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(position: Vec3) -> Transform {
        Transform::from_translation(position).looking_at(Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn spherical_round_trip_preserves_offset() {
        let offset = Vec3::new(2.5, 2.0, 3.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!((back - offset).length() < 1e-5);
    }

    #[test]
    fn damped_rotation_converges_to_full_drag() {
        let mut controller = OrbitController::default();
        let mut transform = camera_at(Vec3::new(0.0, 0.0, 5.0));
        let start = Spherical::from_offset(transform.translation);

        // Drag a quarter of the viewport height horizontally
        controller.rotate_by_pixels(Vec2::new(100.0, 0.0), 400.0);
        for _ in 0..400 {
            controller.update(&mut transform, 1.0 / 60.0);
        }

        let end = Spherical::from_offset(transform.translation);
        let expected = -TAU * 0.25 * ROTATE_SPEED;
        assert!(((end.theta - start.theta) - expected).abs() < 1e-3);
        assert!((end.radius - 5.0).abs() < 1e-4);
        assert!(!controller.has_pending_motion());
    }

    #[test]
    fn damping_applies_a_fraction_per_frame() {
        let mut controller = OrbitController::default();
        let mut transform = camera_at(Vec3::new(0.0, 0.0, 5.0));
        controller.rotate_by_pixels(Vec2::new(100.0, 0.0), 400.0);

        let before = Spherical::from_offset(transform.translation).theta;
        controller.update(&mut transform, 1.0 / 60.0);
        let after = Spherical::from_offset(transform.translation).theta;

        let full = -TAU * 0.25 * ROTATE_SPEED;
        assert!(((after - before) - full * DAMPING_FACTOR).abs() < 1e-5);
    }

    #[test]
    fn auto_rotation_orbits_at_constant_distance() {
        let mut controller = OrbitController::new(true);
        let mut transform = camera_at(Vec3::new(2.5, 2.0, 3.0));
        let start = transform.translation;

        for _ in 0..120 {
            controller.update(&mut transform, 1.0 / 60.0);
        }

        assert!((transform.translation - start).length() > 1e-3);
        assert!((transform.translation.length() - start.length()).abs() < 1e-4);
        assert!((transform.translation.y - start.y).abs() < 1e-4);
    }

    #[test]
    fn auto_rotation_pauses_while_dragging() {
        let mut controller = OrbitController::new(true);
        controller.set_dragging(true);
        let mut transform = camera_at(Vec3::new(0.0, 1.0, 4.0));
        let start = transform.translation;

        controller.update(&mut transform, 1.0);
        assert!((transform.translation - start).length() < 1e-5);
    }

    #[test]
    fn scroll_up_moves_closer() {
        let mut controller = OrbitController::default();
        let mut transform = camera_at(Vec3::new(0.0, 0.0, 10.0));

        controller.zoom_by_pixels(100.0);
        controller.update(&mut transform, 1.0 / 60.0);

        let expected = 10.0 * ZOOM_STEP_RATIO.powf(ZOOM_SPEED);
        assert!((transform.translation.length() - expected).abs() < 1e-4);

        controller.zoom_by_pixels(-100.0);
        controller.update(&mut transform, 1.0 / 60.0);
        assert!((transform.translation.length() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn polar_angle_stops_at_the_poles() {
        for (drag, above) in [(10_000.0, true), (-10_000.0, false)] {
            let mut controller = OrbitController {
                enable_damping: false,
                ..default()
            };
            let mut transform = camera_at(Vec3::new(0.0, 0.0, 5.0));

            controller.rotate_by_pixels(Vec2::new(0.0, drag), 100.0);
            controller.update(&mut transform, 0.0);

            // Clamped at the pole instead of flipping over it
            assert!(transform.translation.is_finite());
            assert!((transform.translation.length() - 5.0).abs() < 1e-3);
            if above {
                assert!(transform.translation.y > 4.99);
            } else {
                assert!(transform.translation.y < -4.99);
            }
        }
    }

    #[test]
    fn pan_moves_target_sideways() {
        let mut controller = OrbitController {
            enable_damping: false,
            ..default()
        };
        let mut transform = camera_at(Vec3::new(0.0, 0.0, 5.0));

        controller.pan_by_pixels(Vec2::new(50.0, 0.0), 500.0, 60f32.to_radians(), &transform);
        controller.update(&mut transform, 0.0);

        // Dragging right slides the scene right, so the target moves left
        assert!(controller.target.x < 0.0);
        assert!(controller.target.y.abs() < 1e-5);
        assert!((transform.translation.z - 5.0).abs() < 1e-4);
    }

    #[test]
    fn disposed_controller_ignores_input() {
        let mut controller = OrbitController::new(true);
        controller.rotate_by_pixels(Vec2::new(10.0, 10.0), 100.0);
        controller.dispose();

        assert!(!controller.is_enabled());
        assert!(!controller.has_pending_motion());

        controller.rotate_by_pixels(Vec2::new(10.0, 10.0), 100.0);
        controller.zoom_by_pixels(100.0);
        assert!(!controller.has_pending_motion());

        let mut transform = camera_at(Vec3::new(0.0, 0.0, 5.0));
        let start = transform.translation;
        controller.update(&mut transform, 1.0);
        assert!((transform.translation - start).length() < 1e-5);
    }
}
