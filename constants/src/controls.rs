/// Fraction of the pending orbit motion applied each frame
pub const DAMPING_FACTOR: f32 = 0.08;
pub const ROTATE_SPEED: f32 = 0.6;
pub const ZOOM_SPEED: f32 = 0.8;
pub const PAN_SPEED: f32 = 1.0;

/// Auto-rotation speed, 1.0 is one full turn per minute
pub const AUTO_ROTATE_SPEED: f32 = 0.5;

/// Distance the polar angle keeps from either pole (radians)
pub const POLAR_EPSILON: f32 = 1e-6;

/// Pixels represented by one wheel "line" step
pub const WHEEL_LINE_PIXELS: f32 = 100.0;

/// Wheel delta (pixels) that maps to one base zoom step
pub const WHEEL_PIXELS_PER_STEP: f32 = 100.0;

/// Zoom ratio for a single base zoom step before speed is applied
pub const ZOOM_STEP_RATIO: f32 = 0.95;
