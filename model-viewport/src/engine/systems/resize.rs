use std::sync::{Arc, Mutex, PoisonError};

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
#[cfg(not(target_arch = "wasm32"))]
use bevy::window::WindowResized;
use constants::render_settings::MAX_PIXEL_RATIO;

use crate::engine::camera::ViewportCamera;
#[cfg(target_arch = "wasm32")]
use crate::host::web::HostResizeObserver;
use crate::host::HostSurface;

/// Latest host size reported by an observer, waiting for the next frame.
///
/// Observers overwrite each other; only the newest size is applied. The
/// app holds a clone as a resource; the host observer pushes into the other.
#[derive(Resource, Debug, Clone, Default)]
pub struct SurfaceSizeFeed(Arc<Mutex<Option<UVec2>>>);

impl SurfaceSizeFeed {
    pub fn push(&self, size: UVec2) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(size);
    }

    pub fn take(&self) -> Option<UVec2> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Keeps the host's size reaching the viewport until dropped.
pub struct ResizeSubscription {
    feed: SurfaceSizeFeed,
    #[cfg(target_arch = "wasm32")]
    _observer: Option<HostResizeObserver>,
}

impl ResizeSubscription {
    /// Subscription fed by window resize events.
    pub fn new(feed: SurfaceSizeFeed) -> Self {
        Self {
            feed,
            #[cfg(target_arch = "wasm32")]
            _observer: None,
        }
    }

    /// Subscription fed by a DOM `ResizeObserver`; dropping it disconnects the observer.
    #[cfg(target_arch = "wasm32")]
    pub fn observed(feed: SurfaceSizeFeed, observer: HostResizeObserver) -> Self {
        Self {
            feed,
            _observer: Some(observer),
        }
    }

    pub fn feed(&self) -> &SurfaceSizeFeed {
        &self.feed
    }
}

/// Current drawing surface size in logical pixels.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize(pub UVec2);

impl Default for SurfaceSize {
    fn default() -> Self {
        Self(UVec2::ONE)
    }
}

impl SurfaceSize {
    pub fn aspect_ratio(&self) -> f32 {
        self.0.x.max(1) as f32 / self.0.y.max(1) as f32
    }
}

/// Host region size with the fallbacks used when layout has not happened yet:
/// width from the client box, then the offset box, then 1; height from the
/// client box, then 1.
pub fn surface_size(client_width: i32, client_height: i32, offset_width: i32) -> UVec2 {
    let width = if client_width > 0 {
        client_width
    } else if offset_width > 0 {
        offset_width
    } else {
        1
    };
    let height = client_height.max(1);
    UVec2::new(width as u32, height as u32)
}

/// Startup: size the surface from the host once before any resize arrives.
pub fn measure_initial_surface(surface: Option<NonSend<HostSurface>>, feed: Res<SurfaceSizeFeed>) {
    if let Some(surface) = surface {
        feed.push(surface.measure());
    }
}

/// Native hosts: window resize events are the resize observation.
#[cfg(not(target_arch = "wasm32"))]
pub fn collect_window_resizes(
    mut resized: EventReader<WindowResized>,
    feed: Res<SurfaceSizeFeed>,
) {
    let Some(event) = resized.read().last() else {
        return;
    };
    feed.push(surface_size(
        event.width.round() as i32,
        event.height.round() as i32,
        0,
    ));
}

/// Holds the device pixel ratio at or below the cap.
pub fn cap_pixel_ratio(mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    for mut window in &mut windows {
        let wanted =
            (window.resolution.base_scale_factor() > MAX_PIXEL_RATIO).then_some(MAX_PIXEL_RATIO);
        if window.resolution.scale_factor_override() != wanted {
            window.resolution.set_scale_factor_override(wanted);
        }
    }
}

/// Applies the newest reported size to the window and the camera aspect.
pub fn apply_pending_resize(
    feed: Res<SurfaceSizeFeed>,
    mut surface_size: ResMut<SurfaceSize>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
    mut cameras: Query<&mut Projection, With<ViewportCamera>>,
) {
    let Some(size) = feed.take() else {
        return;
    };
    let size = size.max(UVec2::ONE);

    for mut window in &mut windows {
        let current = UVec2::new(
            window.resolution.width().round() as u32,
            window.resolution.height().round() as u32,
        );
        if current != size {
            window.resolution.set(size.x as f32, size.y as f32);
        }
    }

    surface_size.0 = size;
    let aspect_ratio = surface_size.aspect_ratio();
    for mut projection in &mut cameras {
        if let Projection::Perspective(perspective) = &mut *projection {
            perspective.aspect_ratio = aspect_ratio;
        }
    }
    debug!("Surface resized to {}x{}", size.x, size.y);
}
