//! Per-frame and lifecycle systems of the viewport.
//!
//! The frame loop handle gating every `Update` system, the resize monitor
//! feeding host size changes into the camera, and the dispose watcher.

/// Frame loop handle, subscriptions and frame counter.
pub mod frame_scheduler;

/// Host size observation and surface/aspect updates.
pub mod resize;

/// Idempotent teardown triggered by the viewport handle.
pub mod teardown;
