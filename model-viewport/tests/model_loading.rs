//! Loading, replacing and failing models in a headless viewport.

mod common;

use bevy::pbr::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;
use common::{
    count_with, failed, headless_viewport, is_settled, load_phase, loaded, model_roots,
    model_surfaces, run_until,
};
use model_viewport::engine::camera::ViewportCamera;
use model_viewport::engine::assets::model_asset::ModelAsset;
use model_viewport::engine::camera::orbit_controller::OrbitController;
use model_viewport::engine::loading::notice::LoadErrorNotice;
use model_viewport::{LoadModelRequest, LoadPhase, ViewerConfig, ViewportState};

fn camera(app: &mut App) -> (Transform, Projection, OrbitController) {
    let mut query = app
        .world_mut()
        .query_filtered::<(&Transform, &Projection, &OrbitController), With<ViewportCamera>>();
    let (transform, projection, controller) = query
        .single(app.world())
        .expect("viewport camera should exist");
    (*transform, projection.clone(), controller.clone())
}

fn notice_messages(app: &mut App) -> Vec<String> {
    let mut notices = app.world_mut().query::<&LoadErrorNotice>();
    notices
        .iter(app.world())
        .map(|notice| notice.message.clone())
        .collect()
}

fn material(app: &App, handle: &Handle<StandardMaterial>) -> StandardMaterial {
    app.world()
        .resource::<Assets<StandardMaterial>>()
        .get(handle)
        .cloned()
        .expect("model material should be loaded")
}

#[test]
fn obj_with_material_library_is_scaled_and_framed() {
    let config = ViewerConfig::new("models/cube.obj")
        .with_material("models/cube.mtl")
        .with_model_scale(2.0);
    let (mut app, _handle) = headless_viewport(config);

    run_until(&mut app, is_settled);
    assert_eq!(load_phase(&app), LoadPhase::Loaded);
    assert_eq!(
        app.world().resource::<ViewportState>().shown_url.as_deref(),
        Some("models/cube.obj")
    );

    let roots = model_roots(&mut app);
    assert_eq!(roots.len(), 1);
    let root_transform = app.world().entity(roots[0]).get::<Transform>().copied();
    assert_eq!(root_transform.map(|t| t.scale), Some(Vec3::splat(2.0)));

    let surfaces = model_surfaces(&mut app);
    assert_eq!(surfaces.len(), 1);
    let material = material(&app, &surfaces[0].1);
    let colour = material.base_color.to_srgba();
    assert!((colour.red - 0.8).abs() < 1e-4);
    assert!((colour.green - 0.3).abs() < 1e-4);
    assert!((colour.blue - 0.2).abs() < 1e-4);
    assert_eq!(material.metallic, 0.0);

    assert_eq!(count_with::<NotShadowCaster>(&mut app), 1);
    assert_eq!(count_with::<NotShadowReceiver>(&mut app), 1);

    // Cube spans 2 units after scaling
    let distance = 1.5 * 2.0 / (2.0 * 30f32.to_radians().tan());
    let (transform, projection, controller) = camera(&mut app);
    let expected = Vec3::new(distance, 0.6 * distance, distance);
    assert!(
        (transform.translation - expected).length() < 1e-3,
        "camera at {:?}, expected {expected:?}",
        transform.translation
    );
    assert!(controller.target.length() < 1e-5);
    let Projection::Perspective(perspective) = projection else {
        panic!("viewport camera should use a perspective projection");
    };
    assert!((perspective.near - distance / 100.0).abs() < 1e-4);
    assert!((perspective.far - distance * 100.0).abs() < 1e-2);
}

#[test]
fn binary_fbx_hierarchy_is_loaded_and_framed() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::new("models/rig.fbx"));
    run_until(&mut app, is_settled);
    assert_eq!(load_phase(&app), LoadPhase::Loaded);
    assert!(notice_messages(&mut app).is_empty());

    let roots = model_roots(&mut app);
    assert_eq!(roots.len(), 1);

    // Rig (null) holds Box (mesh), even though Box comes first in the file
    let rig = app
        .world()
        .entity(roots[0])
        .get::<Children>()
        .map(|children| children.to_vec())
        .unwrap_or_default();
    assert_eq!(rig.len(), 1);
    assert_eq!(
        app.world().entity(rig[0]).get::<Name>().map(Name::as_str),
        Some("Rig")
    );
    assert!(app.world().entity(rig[0]).get::<Mesh3d>().is_none());

    let surfaces = model_surfaces(&mut app);
    assert_eq!(surfaces.len(), 1);
    let mesh = app
        .world()
        .resource::<Assets<Mesh>>()
        .get(&surfaces[0].0)
        .expect("box mesh should be loaded");
    // Six quads, one vertex per corner
    assert_eq!(mesh.count_vertices(), 24);
    assert_eq!(mesh.indices().map(|indices| indices.len()), Some(36));
    assert!(mesh.attribute(Mesh::ATTRIBUTE_NORMAL).is_some());
    assert!(mesh.attribute(Mesh::ATTRIBUTE_UV_0).is_some());

    let colour = material(&app, &surfaces[0].1).base_color.to_srgba();
    assert!((colour.red - 0.2).abs() < 1e-4);
    assert!((colour.green - 0.4).abs() < 1e-4);
    assert!((colour.blue - 0.6).abs() < 1e-4);

    // Unit box scaled by 2 under a rig lifted by 1
    let centre = Vec3::new(0.0, 1.0, 0.0);
    let distance = 1.5 * 2.0 / (2.0 * 30f32.to_radians().tan());
    let (transform, _, controller) = camera(&mut app);
    assert!((controller.target - centre).length() < 1e-4);
    let expected = centre + Vec3::new(distance, 0.6 * distance, distance);
    assert!(
        (transform.translation - expected).length() < 1e-3,
        "camera at {:?}, expected {expected:?}",
        transform.translation
    );
}

#[test]
fn unsupported_extension_shows_notice_and_leaves_scene_alone() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::new("models/model.xyz"));
    run_until(&mut app, failed);

    let state = app.world().resource::<ViewportState>();
    assert_eq!(
        state.last_error.as_deref(),
        Some("Unsupported model format: .xyz. Use .obj or .fbx")
    );
    assert!(state.pending.is_none());
    assert!(state.model_root.is_none());

    assert_eq!(
        notice_messages(&mut app),
        ["Unsupported model format: .xyz. Use .obj or .fbx"]
    );
    assert!(model_roots(&mut app).is_empty());
}

#[test]
fn parse_failure_notice_carries_the_importer_message() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::new("models/broken.obj"));
    run_until(&mut app, failed);

    assert_eq!(
        notice_messages(&mut app),
        ["Failed to parse OBJ: face vertex index out of bounds"]
    );
    assert_eq!(
        app.world().resource::<ViewportState>().last_error.as_deref(),
        Some("Failed to parse OBJ: face vertex index out of bounds")
    );
}

#[test]
fn query_string_is_ignored_when_loading() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::default());
    app.update();

    app.world_mut()
        .send_event(LoadModelRequest::new("models/pyramid.obj?cache=1"));
    run_until(&mut app, is_settled);
    assert_eq!(load_phase(&app), LoadPhase::Loaded);
}

#[test]
fn replacing_a_model_releases_the_previous_one() {
    let config = ViewerConfig::new("models/cube.obj").with_material("models/cube.mtl");
    let (mut app, _handle) = headless_viewport(config);
    run_until(&mut app, loaded("models/cube.obj"));

    let first_root = app.world().resource::<ViewportState>().model_root;
    let first_surfaces = model_surfaces(&mut app);
    assert_eq!(first_surfaces.len(), 1);
    let (first_mesh, first_material) = first_surfaces[0].clone();

    app.world_mut()
        .send_event(LoadModelRequest::new("models/pyramid.obj"));
    run_until(&mut app, loaded("models/pyramid.obj"));

    let roots = model_roots(&mut app);
    assert_eq!(roots.len(), 1);
    assert_ne!(Some(roots[0]), first_root);

    let meshes = app.world().resource::<Assets<Mesh>>();
    assert!(!meshes.contains(&first_mesh));
    let materials = app.world().resource::<Assets<StandardMaterial>>();
    assert!(!materials.contains(&first_material));

    // The pyramid has no material library and gets the neutral fallback
    let second_surfaces = model_surfaces(&mut app);
    assert_eq!(second_surfaces.len(), 1);
    let fallback = material(&app, &second_surfaces[0].1);
    assert_eq!(fallback.base_color, Color::srgb_u8(0xcc, 0xcc, 0xcc));
    assert_eq!(fallback.metallic, 0.0);
}

#[test]
fn material_url_applies_without_mtllib_line() {
    let config = ViewerConfig::new("models/panel.obj").with_material("models/panel.mtl");
    let (mut app, _handle) = headless_viewport(config);
    run_until(&mut app, loaded("models/panel.obj"));

    let surfaces = model_surfaces(&mut app);
    assert_eq!(surfaces.len(), 1);
    let panel = material(&app, &surfaces[0].1);
    let albedo = panel
        .base_color_texture
        .expect("panel.mtl names a diffuse map");
    assert!(panel.normal_map_texture.is_some());
    assert!(app.world().resource::<Assets<Image>>().contains(&albedo));
}

#[test]
fn replacing_keeps_textures_the_new_model_shares() {
    let config = ViewerConfig::new("models/panel.obj").with_material("models/panel.mtl");
    let (mut app, _handle) = headless_viewport(config);
    run_until(&mut app, loaded("models/panel.obj"));

    let surfaces = model_surfaces(&mut app);
    let panel = material(&app, &surfaces[0].1);
    let shared = panel.base_color_texture.expect("panel has a diffuse map");
    let panel_only = panel.normal_map_texture.expect("panel has a normal map");
    assert!(app.world().resource::<Assets<Image>>().contains(&panel_only));

    app.world_mut().send_event(
        LoadModelRequest::new("models/crate.obj").with_material("models/crate.mtl"),
    );
    run_until(&mut app, loaded("models/crate.obj"));

    let surfaces = model_surfaces(&mut app);
    let crate_material = material(&app, &surfaces[0].1);
    assert_eq!(
        crate_material.base_color_texture.as_ref().map(Handle::id),
        Some(shared.id())
    );

    let images = app.world().resource::<Assets<Image>>();
    assert!(images.contains(&shared));
    assert!(!images.contains(&panel_only));
}

#[test]
fn idle_viewport_can_replace_its_model() {
    let config = ViewerConfig::new("models/cube.obj").with_material("models/cube.mtl");
    let (mut app, _handle) = headless_viewport(config);
    run_until(&mut app, loaded("models/cube.obj"));

    for _ in 0..50 {
        app.update();
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    app.world_mut()
        .send_event(LoadModelRequest::new("models/pyramid.obj"));
    run_until(&mut app, loaded("models/pyramid.obj"));
    assert_eq!(model_roots(&mut app).len(), 1);
}

#[test]
fn newest_request_supersedes_one_in_flight() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::new("models/cube.obj"));
    // Starts the configured load
    app.update();
    assert!(app.world().resource::<ViewportState>().pending.is_some());

    app.world_mut()
        .send_event(LoadModelRequest::new("models/pyramid.obj"));
    run_until(&mut app, loaded("models/pyramid.obj"));

    // Give the superseded load time to finish; it must never be inserted
    for _ in 0..20 {
        app.update();
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    assert_eq!(model_roots(&mut app).len(), 1);
    assert_eq!(load_phase(&app), LoadPhase::Loaded);
    assert_eq!(
        app.world().resource::<ViewportState>().shown_url.as_deref(),
        Some("models/pyramid.obj")
    );
}

#[test]
fn shown_model_keeps_its_material_library() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::new("models/pyramid.obj"));
    run_until(&mut app, loaded("models/pyramid.obj"));
    let before = model_surfaces(&mut app);

    app.world_mut().send_event(
        LoadModelRequest::new("models/pyramid.obj").with_material("models/cube.mtl"),
    );
    for _ in 0..10 {
        app.update();
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    assert_eq!(load_phase(&app), LoadPhase::Loaded);
    let state = app.world().resource::<ViewportState>();
    assert_eq!(state.shown_material_url, None);
    let after = model_surfaces(&mut app);
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].1, before[0].1);
    assert_eq!(
        material(&app, &after[0].1).base_color,
        Color::srgb_u8(0xcc, 0xcc, 0xcc)
    );
}

#[test]
fn failed_load_keeps_previous_model_and_shows_notice() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::new("models/pyramid.obj"));
    run_until(&mut app, loaded("models/pyramid.obj"));
    let root = app.world().resource::<ViewportState>().model_root;

    app.world_mut()
        .send_event(LoadModelRequest::new("models/missing.obj"));
    run_until(&mut app, failed);

    assert_eq!(app.world().resource::<ViewportState>().model_root, root);
    assert_eq!(model_roots(&mut app).len(), 1);
    let messages = notice_messages(&mut app);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Path not found"), "{}", messages[0]);

    // The next attempt clears the notice
    app.world_mut()
        .send_event(LoadModelRequest::new("models/pyramid.obj"));
    app.update();
    assert_eq!(count_with::<LoadErrorNotice>(&mut app), 0);
    assert!(app.world().resource::<ViewportState>().last_error.is_none());
}

#[test]
fn model_released_under_a_pending_load_does_not_stall() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::new("models/pyramid.obj"));
    run_until(&mut app, loaded("models/pyramid.obj"));

    // The handle stays alive, so the server answers from its own bookkeeping
    let shown = app
        .world()
        .resource::<ViewportState>()
        .model_asset
        .clone()
        .expect("model asset should be tracked");
    app.world_mut().resource_mut::<Assets<ModelAsset>>().remove(&shown);
    app.world_mut()
        .send_event(LoadModelRequest::new("models/pyramid.obj"));
    for _ in 0..20 {
        app.update();
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    assert!(app.world().resource::<ViewportState>().pending.is_none());
    match load_phase(&app) {
        LoadPhase::Loaded => {}
        LoadPhase::Failed => {
            let messages = notice_messages(&mut app);
            assert_eq!(messages.len(), 1);
            assert!(
                messages[0].ends_with("was released before it could be shown"),
                "{}",
                messages[0]
            );
        }
        phase => panic!("load stalled in {phase:?}"),
    }
}

#[test]
fn degenerate_model_is_not_framed() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::new("models/degenerate.obj"));
    run_until(&mut app, is_settled);
    assert_eq!(load_phase(&app), LoadPhase::Loaded);

    let (transform, _, controller) = camera(&mut app);
    assert!((transform.translation - Vec3::new(2.5, 2.0, 3.0)).length() < 1e-3);
    assert_eq!(controller.target, Vec3::ZERO);
}

#[test]
fn empty_source_skips_loading() {
    let (mut app, _handle) = headless_viewport(ViewerConfig::default());
    for _ in 0..3 {
        app.update();
    }

    assert_eq!(load_phase(&app), LoadPhase::Idle);
    let state = app.world().resource::<ViewportState>();
    assert!(state.pending.is_none());
    assert!(state.last_error.is_none());
    assert_eq!(count_with::<LoadErrorNotice>(&mut app), 0);
}
