use bevy::prelude::*;

use super::resize::{ResizeSubscription, SurfaceSizeFeed};

/// The viewport's claim on the per-frame schedule.
///
/// While running, the viewport's `Update` systems are scheduled every frame.
/// Cancelling is one-way. Kept as a plain resource so run conditions can
/// read it from any executor thread.
#[derive(Resource, Debug)]
pub struct FrameLoopHandle {
    running: bool,
}

impl FrameLoopHandle {
    pub fn start() -> Self {
        debug!("→ Frame loop started");
        Self { running: true }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Stops scheduling frames. Returns false if it was already stopped.
    pub fn cancel(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }
}

/// Host-side resize observation one viewport holds. Lives as a non-send
/// resource since the browser observer is bound to the main thread.
pub struct ViewportSubscriptions {
    resize: Option<ResizeSubscription>,
}

impl Default for ViewportSubscriptions {
    fn default() -> Self {
        Self::new(ResizeSubscription::new(SurfaceSizeFeed::default()))
    }
}

impl ViewportSubscriptions {
    pub fn new(resize: ResizeSubscription) -> Self {
        Self {
            resize: Some(resize),
        }
    }

    pub fn resize_feed(&self) -> Option<&SurfaceSizeFeed> {
        self.resize.as_ref().map(ResizeSubscription::feed)
    }

    pub fn is_observing_resize(&self) -> bool {
        self.resize.is_some()
    }

    /// Drops the resize subscription. Returns true only on the first call.
    pub fn release(&mut self) -> bool {
        self.resize.take().is_some()
    }
}

/// Frames the viewport has scheduled and the time they covered.
#[derive(Resource, Debug, Default)]
pub struct FrameClock {
    pub frames: u64,
    pub elapsed_secs: f32,
}

pub fn advance_frame_clock(time: Res<Time>, mut clock: ResMut<FrameClock>) {
    clock.frames += 1;
    clock.elapsed_secs += time.delta_secs();
}

/// Run condition for every per-frame viewport system.
pub fn frame_loop_active(frame_loop: Option<Res<FrameLoopHandle>>) -> bool {
    frame_loop.is_some_and(|frame_loop| frame_loop.is_running())
}
