use bevy::prelude::*;
use bevy::window::PresentMode;

use crate::engine::core::config::ViewerConfig;

/// Primary window for the viewport. In the browser it binds to the canvas
/// created inside the host element; the resize monitor owns its size.
pub fn create_window_config(config: &ViewerConfig, canvas: Option<String>) -> Window {
    let transparent = config.background().is_transparent();

    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas,
            fit_canvas_to_parent: false,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            transparent,
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = canvas;
        Window {
            title: "Model Viewport".into(),
            present_mode: PresentMode::AutoVsync,
            transparent,
            ..default()
        }
    }
}
