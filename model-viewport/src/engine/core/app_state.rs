use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bevy::prelude::*;

use crate::engine::assets::model_asset::ModelAsset;

/// Where the most recent load request stands.
///
/// Driven through `NextState` by the loading systems; the URL and error
/// text behind each phase live in [`ViewportState`].
#[derive(States, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Cancellation flag handed to an in-flight load.
///
/// Checked before the loaded model is inserted into the scene, so a result
/// arriving after dispose or after a newer request is dropped.
#[derive(Debug, Clone, Default)]
pub struct LoadTicket(Arc<AtomicBool>);

impl LoadTicket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
pub struct PendingLoad {
    pub source_url: String,
    pub material_url: Option<String>,
    pub handle: Handle<ModelAsset>,
    pub ticket: LoadTicket,
}

/// Everything one viewport instance owns across frames.
#[derive(Resource, Debug, Default)]
pub struct ViewportState {
    /// Root entity of the model currently in the scene, if any.
    pub model_root: Option<Entity>,
    /// Asset backing `model_root`, removed together with it.
    pub model_asset: Option<Handle<ModelAsset>>,
    /// Source and material URLs of the model currently shown.
    pub shown_url: Option<String>,
    pub shown_material_url: Option<String>,
    pub pending: Option<PendingLoad>,
    /// Message of the last failed load, cleared by the next attempt.
    pub last_error: Option<String>,
    pub disposed: bool,
}

impl ViewportState {
    /// Cancels and forgets the in-flight load, if there is one.
    pub fn cancel_pending(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.ticket.cancel();
                true
            }
            None => false,
        }
    }
}

/// Marker for every entity the viewport spawns and must despawn at teardown.
#[derive(Component, Default)]
pub struct ViewportEntity;

/// Shared flag raised by [`ViewportHandle::dispose`].
#[derive(Debug, Default)]
pub struct DisposeSignal(AtomicBool);

impl DisposeSignal {
    pub fn raise(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The app-side end of the dispose signal.
#[derive(Resource, Clone)]
pub struct DisposeRequest(pub Arc<DisposeSignal>);

/// Handle returned to whoever mounts the viewport.
///
/// Cheap to clone; every clone controls the same viewport. Calling
/// [`dispose`](Self::dispose) more than once has no further effect.
#[derive(Debug, Clone, Default)]
pub struct ViewportHandle {
    signal: Arc<DisposeSignal>,
}

impl ViewportHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispose(&self) {
        if self.signal.raise() {
            info!("→ Viewport dispose requested");
        }
    }

    pub fn is_dispose_requested(&self) -> bool {
        self.signal.is_raised()
    }

    pub fn signal(&self) -> Arc<DisposeSignal> {
        Arc::clone(&self.signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispose_signal_raises_once() {
        let handle = ViewportHandle::new();
        let clone = handle.clone();

        assert!(!handle.is_dispose_requested());
        clone.dispose();
        handle.dispose();
        assert!(handle.is_dispose_requested());
        assert!(!handle.signal().raise());
    }

    #[test]
    fn cancel_pending_cancels_ticket() {
        let ticket = LoadTicket::new();
        let mut state = ViewportState {
            pending: Some(PendingLoad {
                source_url: "a.obj".into(),
                material_url: None,
                handle: Handle::default(),
                ticket: ticket.clone(),
            }),
            ..default()
        };

        assert!(state.cancel_pending());
        assert!(ticket.is_cancelled());
        assert!(state.pending.is_none());
        assert!(!state.cancel_pending());
    }
}
