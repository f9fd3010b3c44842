use bevy::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlElement, ResizeObserver};

use super::HostSurface;
use crate::engine::core::app_setup::create_app;
use crate::engine::core::app_state::ViewportHandle;
use crate::engine::core::config::ViewerConfig;
use crate::engine::core::error::ViewerError;
use crate::engine::systems::frame_scheduler::ViewportSubscriptions;
use crate::engine::systems::resize::{ResizeSubscription, SurfaceSizeFeed, surface_size};

fn surface_error(context: &str, err: JsValue) -> ViewerError {
    ViewerError::HostSurface(format!("{context}: {err:?}"))
}

/// Canvas the viewport created inside its host element.
pub struct DomSurface {
    host: HtmlElement,
    canvas: HtmlCanvasElement,
}

impl DomSurface {
    /// Clears the host element and appends a fresh canvas to it.
    pub fn attach(host_element_id: &str) -> Result<Self, ViewerError> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| ViewerError::HostSurface("no document available".into()))?;

        let host = document
            .get_element_by_id(host_element_id)
            .ok_or_else(|| ViewerError::HostNotFound(host_element_id.to_string()))?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ViewerError::HostSurface(format!("'{host_element_id}' is not an HTML element")))?;

        let canvas = document
            .create_element("canvas")
            .map_err(|err| surface_error("could not create canvas", err))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| ViewerError::HostSurface("created element is not a canvas".into()))?;
        canvas.set_id(&format!("{host_element_id}-viewport-canvas"));

        let style = canvas.style();
        for (property, value) in [("display", "block"), ("width", "100%"), ("height", "100%")] {
            style
                .set_property(property, value)
                .map_err(|err| surface_error("could not style canvas", err))?;
        }

        host.set_inner_html("");
        host.append_child(&canvas)
            .map_err(|err| surface_error("could not append canvas", err))?;

        Ok(Self { host, canvas })
    }

    pub fn host(&self) -> &HtmlElement {
        &self.host
    }

    pub fn canvas_selector(&self) -> String {
        format!("#{}", self.canvas.id())
    }

    pub fn measure(&self) -> UVec2 {
        measure_host(&self.host)
    }

    /// Removes the canvas if it is still a child of the host.
    pub fn detach(&self) {
        let host_node: &web_sys::Node = self.host.as_ref();
        let still_attached = self
            .canvas
            .parent_node()
            .is_some_and(|parent| parent.is_same_node(Some(host_node)));
        if still_attached {
            if let Err(err) = self.host.remove_child(&self.canvas) {
                warn!("Could not remove viewport canvas: {err:?}");
            }
        }
    }
}

fn measure_host(host: &HtmlElement) -> UVec2 {
    surface_size(host.client_width(), host.client_height(), host.offset_width())
}

/// `ResizeObserver` on the host element; disconnected when dropped.
pub struct HostResizeObserver {
    observer: ResizeObserver,
    _callback: Closure<dyn FnMut(js_sys::Array)>,
}

impl HostResizeObserver {
    pub fn observe(host: &HtmlElement, feed: SurfaceSizeFeed) -> Result<Self, ViewerError> {
        let observed = host.clone();
        let callback = Closure::wrap(Box::new(move |_entries: js_sys::Array| {
            feed.push(measure_host(&observed));
        }) as Box<dyn FnMut(js_sys::Array)>);

        let observer = ResizeObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|err| surface_error("could not create ResizeObserver", err))?;
        observer.observe(host);

        Ok(Self {
            observer,
            _callback: callback,
        })
    }
}

impl Drop for HostResizeObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Handle the page keeps for a mounted viewport.
#[wasm_bindgen]
pub struct ViewportWidget {
    handle: ViewportHandle,
}

#[wasm_bindgen]
impl ViewportWidget {
    /// Tears the viewport down. Safe to call more than once.
    pub fn dispose(&self) {
        self.handle.dispose();
    }
}

/// Mounts a viewport into the element with id `host_element_id`.
///
/// Throws when the configuration is invalid or the element does not exist.
#[wasm_bindgen(js_name = createViewport)]
pub fn create_viewport(host_element_id: &str, config_json: &str) -> Result<ViewportWidget, JsError> {
    let config = ViewerConfig::from_json(config_json)?;
    let surface = DomSurface::attach(host_element_id)?;

    let feed = SurfaceSizeFeed::default();
    let observer = HostResizeObserver::observe(surface.host(), feed.clone())?;
    let subscriptions = ViewportSubscriptions::new(ResizeSubscription::observed(feed, observer));

    let handle = ViewportHandle::new();
    let mut app = create_app(config, HostSurface::dom(surface), subscriptions, &handle);

    wasm_bindgen_futures::spawn_local(async move {
        app.run();
    });

    Ok(ViewportWidget { handle })
}
