//! Model loading for the viewport.
//!
//! Format dispatch from the URL, the request/poll systems that swap the
//! shown model, and the inline notice shown when a load fails.

/// Model format detection from file extensions.
pub mod format;

/// Load requests, completion polling and model insertion.
///
/// Replacing a model releases every mesh, material and texture of the previous one.
pub mod model_loader;

/// Inline error badge for failed loads.
pub mod notice;
