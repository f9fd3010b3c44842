use std::sync::Arc;

use bevy::asset::AssetMetaCheck;
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::window::WindowResized;

use crate::engine::assets::backends::import_backends;
use crate::engine::assets::loader::ModelLoader;
use crate::engine::assets::model_asset::ModelAsset;
use crate::engine::camera::orbit_controller::{orbit_input, update_orbit_controller};
use crate::engine::core::app_state::{DisposeRequest, LoadPhase, ViewportHandle, ViewportState};
use crate::engine::core::config::ViewerConfig;
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::model_loader::{
    LoadModelRequest, finish_model_load, handle_load_requests, request_configured_model,
};
use crate::engine::scene::render_context::setup_render_context;
use crate::engine::systems::frame_scheduler::{
    FrameClock, FrameLoopHandle, ViewportSubscriptions, advance_frame_clock, frame_loop_active,
};
#[cfg(not(target_arch = "wasm32"))]
use crate::engine::systems::resize::collect_window_resizes;
use crate::engine::systems::resize::{
    SurfaceSize, SurfaceSizeFeed, apply_pending_resize, cap_pixel_ratio, measure_initial_surface,
};
use crate::engine::systems::teardown::watch_dispose_signal;
use crate::host::HostSurface;

/// Ordering of the viewport's per-frame work.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewportSet {
    /// Start requested loads and insert finished ones.
    Load,
    /// Apply host size changes to the surface and camera.
    Resize,
    /// Input, controller update and frame bookkeeping.
    Frame,
}

/// Everything a model viewport needs on top of bevy's own plugins.
///
/// Works with the full default plugin set or headless with `MinimalPlugins`
/// plus `AssetPlugin`. Host surface, subscriptions, frame loop and the
/// dispose request are inserted with defaults when the caller has not
/// provided them. The resize feed resource is the one the subscription's
/// observer pushes into.
pub struct ViewportPlugin;

impl Plugin for ViewportPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_non_send::<HostSurface>() {
            app.insert_non_send_resource(HostSurface::default());
        }
        if !app.world().contains_non_send::<ViewportSubscriptions>() {
            app.insert_non_send_resource(ViewportSubscriptions::default());
        }
        if !app.world().contains_resource::<DisposeRequest>() {
            app.insert_resource(DisposeRequest(Arc::default()));
        }
        if !app.world().contains_resource::<FrameLoopHandle>() {
            app.insert_resource(FrameLoopHandle::start());
        }
        let feed = app
            .world()
            .get_non_send_resource::<ViewportSubscriptions>()
            .and_then(|subscriptions| subscriptions.resize_feed().cloned())
            .unwrap_or_default();
        app.insert_resource::<SurfaceSizeFeed>(feed);

        if !app.is_plugin_added::<StatesPlugin>() {
            app.add_plugins(StatesPlugin);
        }

        app.init_asset::<ModelAsset>()
            .register_asset_loader(ModelLoader::new(import_backends()))
            .init_resource::<ViewerConfig>()
            .init_resource::<ViewportState>()
            .init_state::<LoadPhase>()
            .init_resource::<FrameClock>()
            .init_resource::<SurfaceSize>()
            // Present already under DefaultPlugins; needed when running headless
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<Touches>()
            .add_event::<MouseMotion>()
            .add_event::<MouseWheel>()
            .add_event::<WindowResized>()
            .add_event::<LoadModelRequest>();

        app.configure_sets(
            Update,
            (ViewportSet::Load, ViewportSet::Resize, ViewportSet::Frame).chain(),
        )
        .configure_sets(Update, ViewportSet::Load.run_if(frame_loop_active))
        .configure_sets(Update, ViewportSet::Resize.run_if(frame_loop_active))
        .configure_sets(Update, ViewportSet::Frame.run_if(frame_loop_active));

        app.add_systems(
            Startup,
            (
                setup_render_context,
                measure_initial_surface,
                request_configured_model,
            )
                .chain(),
        )
        .add_systems(First, watch_dispose_signal)
        .add_systems(
            Update,
            (handle_load_requests, finish_model_load)
                .chain()
                .in_set(ViewportSet::Load),
        )
        .add_systems(
            Update,
            (cap_pixel_ratio, apply_pending_resize)
                .chain()
                .in_set(ViewportSet::Resize),
        )
        .add_systems(
            Update,
            (orbit_input, update_orbit_controller, advance_frame_clock)
                .chain()
                .in_set(ViewportSet::Frame),
        );

        #[cfg(not(target_arch = "wasm32"))]
        app.add_systems(
            Update,
            collect_window_resizes
                .before(apply_pending_resize)
                .in_set(ViewportSet::Resize),
        );
    }
}

/// Builds a windowed viewport app for `config`.
///
/// `handle` is how the caller later disposes it; the app only watches the
/// handle's signal.
pub fn create_app(
    config: ViewerConfig,
    surface: HostSurface,
    subscriptions: ViewportSubscriptions,
    handle: &ViewportHandle,
) -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins(&config, surface.canvas_selector()))
        .insert_resource(DisposeRequest(handle.signal()))
        .insert_resource(config)
        .insert_non_send_resource(surface)
        .insert_non_send_resource(subscriptions)
        .add_plugins(ViewportPlugin);

    app
}

fn create_default_plugins(config: &ViewerConfig, canvas: Option<String>) -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config(config, canvas)),
        ..default()
    };

    let asset_config = AssetPlugin {
        file_path: config.asset_root.clone(),
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    DefaultPlugins.set(window_config).set(asset_config)
}
