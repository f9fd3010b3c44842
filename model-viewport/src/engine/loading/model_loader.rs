use bevy::asset::{AssetLoadError, LoadState, RecursiveDependencyLoadState};
use bevy::pbr::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;
use constants::render_settings::CAMERA_FOV_DEGREES;

use super::format::{ModelFormat, asset_path};
use super::notice::{
    LoadErrorNotice, clear_load_error_notices, notice_message, spawn_load_error_notice,
};
use crate::engine::assets::bounds::model_bounds;
use crate::engine::assets::loader::ModelLoaderSettings;
use crate::engine::assets::model_asset::ModelAsset;
use crate::engine::camera::ViewportCamera;
use crate::engine::camera::framing::{apply_framing, frame_bounds};
use crate::engine::camera::orbit_controller::OrbitController;
use crate::engine::core::app_state::{
    LoadPhase, LoadTicket, PendingLoad, ViewportEntity, ViewportState,
};
use crate::engine::core::config::ViewerConfig;
use crate::engine::scene::release::SceneResources;

/// Asks the viewport to replace its model.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct LoadModelRequest {
    pub source_url: String,
    pub material_url: Option<String>,
}

impl LoadModelRequest {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            material_url: None,
        }
    }

    pub fn with_material(mut self, material_url: impl Into<String>) -> Self {
        self.material_url = Some(material_url.into());
        self
    }
}

/// Root of the model currently shown.
#[derive(Component)]
pub struct ModelRoot;

/// Startup: queue the model named in the configuration.
pub fn request_configured_model(
    config: Res<ViewerConfig>,
    mut requests: EventWriter<LoadModelRequest>,
) {
    requests.write(LoadModelRequest {
        source_url: config.source_url.clone(),
        material_url: config.material_url.clone(),
    });
}

/// Starts the most recent load request of this frame.
///
/// Any earlier request still in flight is cancelled. An unsupported
/// extension shows the notice without touching the scene.
pub fn handle_load_requests(
    mut commands: Commands,
    mut requests: EventReader<LoadModelRequest>,
    asset_server: Res<AssetServer>,
    mut state: ResMut<ViewportState>,
    mut next_phase: ResMut<NextState<LoadPhase>>,
    notices: Query<Entity, With<LoadErrorNotice>>,
) {
    let Some(request) = requests.read().last().cloned() else {
        return;
    };
    if state.disposed {
        return;
    }

    if request.source_url.trim().is_empty() {
        debug!("Empty model URL, nothing to load");
        return;
    }

    clear_load_error_notices(&mut commands, &notices);
    state.last_error = None;
    if state.cancel_pending() {
        info!("→ Superseding in-flight model load");
    }

    let format = match ModelFormat::from_url(&request.source_url) {
        Ok(format) => format,
        Err(err) => {
            report_failure(
                &mut commands,
                &mut state,
                &mut next_phase,
                &request.source_url,
                err.to_string(),
            );
            return;
        }
    };

    let material_url = request
        .material_url
        .as_deref()
        .map(asset_path)
        .filter(|url| !url.is_empty())
        .map(str::to_string);

    // The asset server keys models by path alone, so a model already shown
    // comes back as-is and a different material library is not applied
    let shown = state.shown_url.as_deref().map(asset_path);
    if shown == Some(asset_path(&request.source_url))
        && state.shown_material_url != material_url
    {
        warn!(
            "{} is already loaded; its material library stays {:?}",
            request.source_url, state.shown_material_url
        );
    }

    info!("→ Loading model {} ({})", request.source_url, format.extension());
    let settings_material = material_url.clone();
    let handle = asset_server.load_with_settings::<ModelAsset, ModelLoaderSettings>(
        asset_path(&request.source_url).to_string(),
        move |settings: &mut ModelLoaderSettings| {
            settings.format = Some(format);
            settings.material_url = settings_material.clone();
        },
    );

    state.pending = Some(PendingLoad {
        source_url: request.source_url,
        material_url,
        handle,
        ticket: LoadTicket::new(),
    });
    next_phase.set(LoadPhase::Loading);
}

/// Text for a failed model load: the importer's or reader's own message
/// rather than the asset server's wrapper around it.
pub fn load_failure_message(err: &AssetLoadError) -> String {
    match err {
        AssetLoadError::AssetLoaderError(loader_error) => {
            let text = loader_error.to_string();
            // Rendered as "Failed to load asset '<path>' with asset loader '<loader>': <error>"
            let prefix = format!(
                "Failed to load asset '{}' with asset loader '",
                loader_error.path()
            );
            text.strip_prefix(&prefix)
                .and_then(|rest| rest.split_once("': "))
                .map(|(_, message)| message.to_string())
                .unwrap_or(text)
        }
        AssetLoadError::AssetReaderError(reader_error) => reader_error.to_string(),
        other => other.to_string(),
    }
}

fn report_failure(
    commands: &mut Commands,
    state: &mut ViewportState,
    next_phase: &mut NextState<LoadPhase>,
    source_url: &str,
    message: String,
) {
    let message = notice_message(&message).to_string();
    error!("✗ Model load failed for {source_url}: {message}");
    spawn_load_error_notice(commands, &message);
    state.pending = None;
    state.last_error = Some(message);
    next_phase.set(LoadPhase::Failed);
}

/// Polls the pending load and swaps the model in once it and its textures are ready.
pub fn finish_model_load(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut models: ResMut<Assets<ModelAsset>>,
    mut state: ResMut<ViewportState>,
    mut next_phase: ResMut<NextState<LoadPhase>>,
    config: Res<ViewerConfig>,
    mut resources: SceneResources,
    mut cameras: Query<
        (&mut Transform, &mut Projection, &mut OrbitController),
        With<ViewportCamera>,
    >,
) {
    let Some(pending) = state.pending.as_ref() else {
        return;
    };
    if pending.ticket.is_cancelled() {
        state.pending = None;
        return;
    }

    match asset_server.get_load_states(&pending.handle) {
        Some((LoadState::Failed(err), _, _)) => {
            let source_url = pending.source_url.clone();
            let message = load_failure_message(&err);
            report_failure(&mut commands, &mut state, &mut next_phase, &source_url, message);
            return;
        }
        Some((LoadState::Loaded, _, RecursiveDependencyLoadState::Loaded)) => {}
        Some((LoadState::Loaded, _, RecursiveDependencyLoadState::Failed(err))) => {
            warn!("Model {} is missing textures: {err}", pending.source_url);
        }
        _ => return,
    }

    let Some(pending) = state.pending.take() else {
        return;
    };
    let Some(model) = models.get(&pending.handle) else {
        report_failure(
            &mut commands,
            &mut state,
            &mut next_phase,
            &pending.source_url,
            format!("{} was released before it could be shown", pending.source_url),
        );
        return;
    };

    let root_transform = Transform::from_scale(Vec3::splat(config.effective_scale()));
    let root = spawn_model(&mut commands, model, root_transform);
    let bounds = model_bounds(model, resources.meshes(), &root_transform);
    let mesh_count = model.mesh_count();

    // Reloading the same URL hands back the same asset; keep its resources
    let same_asset = state.model_asset.as_ref() == Some(&pending.handle);
    if let Some(previous) = state.model_root.replace(root) {
        if !same_asset {
            let released = resources.release_subtree(previous);
            debug!(
                "Released previous model: {} meshes, {} materials, {} textures",
                released.meshes, released.materials, released.textures
            );
        }
        commands.entity(previous).despawn();
    }
    if let Some(previous_asset) = state.model_asset.replace(pending.handle.clone()) {
        if !same_asset {
            models.remove(&previous_asset);
        }
    }

    match cameras.single_mut() {
        Ok((mut transform, mut projection, mut controller)) => {
            let fov = match &*projection {
                Projection::Perspective(perspective) => perspective.fov,
                _ => CAMERA_FOV_DEGREES.to_radians(),
            };
            match frame_bounds(&bounds, fov) {
                Some(view) => {
                    apply_framing(&view, &mut transform, &mut projection, &mut controller)
                }
                None => debug!("Model bounds are degenerate, keeping the current view"),
            }
        }
        Err(err) => warn!("No viewport camera to frame the model: {err}"),
    }

    info!("✓ Model loaded: {} ({mesh_count} meshes)", pending.source_url);
    if !same_asset {
        state.shown_material_url = pending.material_url;
    }
    state.shown_url = Some(pending.source_url);
    next_phase.set(LoadPhase::Loaded);
}

/// Spawns the model's node hierarchy under a new root entity.
pub fn spawn_model(commands: &mut Commands, model: &ModelAsset, root_transform: Transform) -> Entity {
    let root = commands
        .spawn((
            Name::new("Model"),
            root_transform,
            Visibility::default(),
            ModelRoot,
            ViewportEntity,
        ))
        .id();

    let mut spawned: Vec<Entity> = Vec::with_capacity(model.nodes.len());
    for (index, node) in model.nodes.iter().enumerate() {
        let mut entity = commands.spawn((
            Name::new(node.name.clone()),
            node.transform,
            Visibility::default(),
        ));
        if let Some(mesh) = &node.mesh {
            entity.insert((Mesh3d(mesh.clone()), NotShadowCaster, NotShadowReceiver));
            if let Some(material) = &node.material {
                entity.insert(MeshMaterial3d(material.clone()));
            }
        }
        let child = entity.id();

        let parent = node
            .parent
            .filter(|parent| *parent < index)
            .and_then(|parent| spawned.get(parent).copied())
            .unwrap_or(root);
        commands.entity(parent).add_child(child);
        spawned.push(child);
    }

    root
}
