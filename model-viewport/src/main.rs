use bevy::prelude::*;
use model_viewport::engine::systems::frame_scheduler::ViewportSubscriptions;
use model_viewport::{HostSurface, ViewerConfig, ViewportHandle, create_app};

const DEFAULT_MODEL: &str = "models/cube.obj";

/// Opens the viewport in a desktop window.
///
/// Usage: `model-viewport [config.json]`. Without a config file the bundled
/// sample cube is shown.
fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match load_config(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("✗ {err}");
                std::process::exit(1);
            }
        },
        None => ViewerConfig::new(DEFAULT_MODEL)
            .with_material("models/cube.mtl")
            .with_auto_rotate(true),
    };

    let handle = ViewportHandle::new();
    let mut app = create_app(
        config,
        HostSurface::default(),
        ViewportSubscriptions::default(),
        &handle,
    );

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let exit = app.run();
        if let AppExit::Error(code) = exit {
            std::process::exit(code.get().into());
        }
    }
}

fn load_config(path: &str) -> Result<ViewerConfig, String> {
    let json = std::fs::read_to_string(path).map_err(|err| format!("Could not read {path}: {err}"))?;
    ViewerConfig::from_json(&json).map_err(|err| err.to_string())
}
