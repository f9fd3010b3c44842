use bevy::prelude::*;

use super::frame_scheduler::{FrameLoopHandle, ViewportSubscriptions};
use crate::engine::assets::model_asset::ModelAsset;
use crate::engine::camera::orbit_controller::OrbitController;
use crate::engine::core::app_state::{DisposeRequest, ViewportEntity, ViewportState};
use crate::engine::scene::release::SceneResources;
use crate::host::HostSurface;

/// Tears the viewport down the first frame after dispose is requested.
///
/// Order: frame loop and resize observation, controller, GPU resources,
/// in-flight load, entities, host surface. Later frames see `disposed` and
/// do nothing.
pub fn watch_dispose_signal(
    mut commands: Commands,
    request: Option<Res<DisposeRequest>>,
    mut state: ResMut<ViewportState>,
    frame_loop: Option<ResMut<FrameLoopHandle>>,
    subscriptions: Option<NonSendMut<ViewportSubscriptions>>,
    surface: Option<NonSendMut<HostSurface>>,
    mut exit: EventWriter<AppExit>,
    mut resources: SceneResources,
    mut models: ResMut<Assets<ModelAsset>>,
    mut controllers: Query<(Entity, &mut OrbitController)>,
    owned: Query<Entity, With<ViewportEntity>>,
) {
    if state.disposed || !request.is_some_and(|request| request.0.is_raised()) {
        return;
    }
    info!("→ Tearing down viewport");

    if let Some(mut frame_loop) = frame_loop {
        frame_loop.cancel();
    }
    if let Some(mut subscriptions) = subscriptions {
        subscriptions.release();
    }
    exit.write(AppExit::Success);

    for (entity, mut controller) in &mut controllers {
        controller.dispose();
        commands.entity(entity).remove::<OrbitController>();
    }

    let released = resources.release_all(owned.iter());
    if let Some(model) = state.model_asset.take() {
        models.remove(&model);
    }
    state.model_root = None;
    state.shown_url = None;
    state.shown_material_url = None;
    if state.cancel_pending() {
        debug!("Cancelled in-flight model load");
    }

    for entity in &owned {
        commands.entity(entity).despawn();
    }
    commands.insert_resource(AmbientLight::NONE);

    if let Some(mut surface) = surface {
        if surface.detach() {
            debug!("Drawing surface detached from host");
        }
    }

    state.disposed = true;
    info!(
        "✓ Viewport disposed ({} meshes, {} materials, {} textures released)",
        released.meshes, released.materials, released.textures
    );
}
