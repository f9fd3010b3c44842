//! Headless viewport harness shared by the integration tests.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetMetaCheck;
use bevy::image::{CompressedImageFormats, ImageLoader};
use bevy::prelude::*;
use model_viewport::engine::core::app_state::DisposeRequest;
use model_viewport::engine::loading::model_loader::ModelRoot;
use model_viewport::{
    HostSurface, LoadPhase, ViewerConfig, ViewportHandle, ViewportPlugin, ViewportState,
};

pub const HOST_SIZE: UVec2 = UVec2::new(800, 600);

/// A viewport app without a window or renderer, reading from `assets/`.
/// PNG textures decode through bevy's image loader.
pub fn headless_viewport(config: ViewerConfig) -> (App, ViewportHandle) {
    let handle = ViewportHandle::new();
    let mut app = App::new();

    app.add_plugins((
        MinimalPlugins,
        AssetPlugin {
            meta_check: AssetMetaCheck::Never,
            ..default()
        },
    ))
    .init_asset::<Mesh>()
    .init_asset::<StandardMaterial>()
    .init_asset::<Image>()
    .register_asset_loader(ImageLoader::new(CompressedImageFormats::NONE))
    .insert_resource(config)
    .insert_resource(DisposeRequest(handle.signal()))
    .insert_non_send_resource(HostSurface::headless(HOST_SIZE))
    .add_plugins(ViewportPlugin);

    app.finish();
    app.cleanup();

    (app, handle)
}

pub fn load_phase(app: &App) -> LoadPhase {
    *app.world().resource::<State<LoadPhase>>().get()
}

/// Updates until `done` holds for the viewport state and load phase,
/// sleeping between frames so asset IO can make progress.
pub fn run_until(app: &mut App, done: impl Fn(&ViewportState, LoadPhase) -> bool) {
    for _ in 0..500 {
        app.update();
        if done(app.world().resource::<ViewportState>(), load_phase(app)) {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("viewport did not settle, load phase: {:?}", load_phase(app));
}

pub fn is_settled(_: &ViewportState, phase: LoadPhase) -> bool {
    matches!(phase, LoadPhase::Loaded | LoadPhase::Failed)
}

/// Done once `url` is the model on screen.
pub fn loaded(url: &'static str) -> impl Fn(&ViewportState, LoadPhase) -> bool {
    move |state, phase| phase == LoadPhase::Loaded && state.shown_url.as_deref() == Some(url)
}

pub fn failed(_: &ViewportState, phase: LoadPhase) -> bool {
    phase == LoadPhase::Failed
}

pub fn count_with<C: Component>(app: &mut App) -> usize {
    app.world_mut()
        .query_filtered::<Entity, With<C>>()
        .iter(app.world())
        .count()
}

pub fn model_roots(app: &mut App) -> Vec<Entity> {
    app.world_mut()
        .query_filtered::<Entity, With<ModelRoot>>()
        .iter(app.world())
        .collect()
}

/// Mesh and material handles of every mesh node under the current model root.
pub fn model_surfaces(app: &mut App) -> Vec<(Handle<Mesh>, Handle<StandardMaterial>)> {
    let Some(root) = app.world().resource::<ViewportState>().model_root else {
        return Vec::new();
    };
    let mut stack = vec![root];
    let mut surfaces = Vec::new();

    while let Some(entity) = stack.pop() {
        let entity_ref = app.world().entity(entity);
        if let (Some(mesh), Some(material)) = (
            entity_ref.get::<Mesh3d>(),
            entity_ref.get::<MeshMaterial3d<StandardMaterial>>(),
        ) {
            surfaces.push((mesh.0.clone(), material.0.clone()));
        }
        if let Some(children) = entity_ref.get::<Children>() {
            stack.extend_from_slice(&children[..]);
        }
    }

    surfaces
}
