/// Background colour of the load error notice
pub const NOTICE_BACKGROUND_COLOUR: u32 = 0xd32f2f;
pub const NOTICE_TEXT_COLOUR: u32 = 0xffffff;

/// Offset from the top-left corner of the viewport (logical pixels)
pub const NOTICE_OFFSET: f32 = 8.0;
pub const NOTICE_PADDING: f32 = 8.0;
pub const NOTICE_BORDER_RADIUS: f32 = 6.0;
pub const NOTICE_FONT_SIZE: f32 = 14.0;

/// Shown when a failed load carries no message of its own
pub const DEFAULT_LOAD_FAILURE_MESSAGE: &str = "Failed to load model";
