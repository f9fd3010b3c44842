//! The region of the host page or desktop the viewport draws into.
//!
//! Native and headless hosts only track a size and whether the surface is
//! still attached. In the browser the surface is a canvas appended to a host
//! element, watched by a `ResizeObserver`.

use bevy::prelude::*;

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Drawing surface attached to the host. Held as a non-send resource.
pub struct HostSurface {
    size: UVec2,
    attached: bool,
    canvas_selector: Option<String>,
    #[cfg(target_arch = "wasm32")]
    dom: Option<web::DomSurface>,
}

impl Default for HostSurface {
    fn default() -> Self {
        Self::headless(UVec2::new(1280, 720))
    }
}

impl HostSurface {
    /// A surface with a fixed initial size and nothing to remove at detach.
    pub fn headless(size: UVec2) -> Self {
        Self {
            size: size.max(UVec2::ONE),
            attached: true,
            canvas_selector: None,
            #[cfg(target_arch = "wasm32")]
            dom: None,
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn dom(dom: web::DomSurface) -> Self {
        Self {
            size: dom.measure(),
            attached: true,
            canvas_selector: Some(dom.canvas_selector()),
            dom: Some(dom),
        }
    }

    /// CSS selector of the canvas bevy should render into, browser only.
    pub fn canvas_selector(&self) -> Option<String> {
        self.canvas_selector.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Current size of the host region.
    pub fn measure(&self) -> UVec2 {
        #[cfg(target_arch = "wasm32")]
        if let Some(dom) = &self.dom {
            return dom.measure();
        }
        self.size
    }

    /// Removes the drawing surface from the host. Returns false when it was
    /// already detached.
    pub fn detach(&mut self) -> bool {
        if !self.attached {
            return false;
        }
        #[cfg(target_arch = "wasm32")]
        if let Some(dom) = self.dom.take() {
            dom.detach();
        }
        self.attached = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detach_happens_once() {
        let mut surface = HostSurface::headless(UVec2::new(640, 480));
        assert!(surface.is_attached());
        assert_eq!(surface.measure(), UVec2::new(640, 480));

        assert!(surface.detach());
        assert!(!surface.is_attached());
        assert!(!surface.detach());
    }

    #[test]
    fn zero_size_is_clamped() {
        assert_eq!(HostSurface::headless(UVec2::ZERO).measure(), UVec2::ONE);
    }
}
