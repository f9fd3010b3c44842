/// Vertical field of view of the viewport camera in degrees
pub const CAMERA_FOV_DEGREES: f32 = 60.0;

/// Near clip plane used before a model has been framed
pub const CAMERA_NEAR: f32 = 0.1;

/// Far clip plane used before a model has been framed
pub const CAMERA_FAR: f32 = 1000.0;

/// Camera position before the first model is framed
pub const DEFAULT_CAMERA_POSITION: [f32; 3] = [2.5, 2.0, 3.0];

/// Upper bound on the device pixel ratio applied to the drawing surface
pub const MAX_PIXEL_RATIO: f32 = 2.0;

pub const AMBIENT_INTENSITY: f32 = 0.6;
pub const DIRECTIONAL_INTENSITY: f32 = 1.0;
pub const DIRECTIONAL_LIGHT_POSITION: [f32; 3] = [5.0, 10.0, 7.0];

/// Bevy ambient brightness is in cd/m², scale the unit intensity into a comparable range
pub const AMBIENT_BRIGHTNESS_SCALE: f32 = 500.0;

/// Directional illuminance in lux for an intensity of 1.0
pub const DIRECTIONAL_ILLUMINANCE_SCALE: f32 = 4000.0;

/// Reference grid edge length in world units
pub const GRID_SIZE: f32 = 10.0;
pub const GRID_DIVISIONS: u32 = 10;
pub const GRID_OPACITY: f32 = 0.25;
pub const GRID_CENTRE_COLOUR: u32 = 0x444444;
pub const GRID_LINE_COLOUR: u32 = 0x222222;

/// Colour given to meshes that arrive without a material
pub const FALLBACK_MATERIAL_COLOUR: u32 = 0xcccccc;

/// Default asset directory (native) or URL prefix (web) for model paths
pub const DEFAULT_ASSET_ROOT: &str = "assets";
