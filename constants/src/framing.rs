/// Extra distance beyond the tight fit so the model does not touch the frame edges
pub const FRAMING_MARGIN: f32 = 1.5;

/// Camera height relative to the horizontal framing distance
pub const FRAMING_ELEVATION: f32 = 0.6;

pub const NEAR_PLANE_DIVISOR: f32 = 100.0;
pub const FAR_PLANE_MULTIPLIER: f32 = 100.0;
