use thiserror::Error;

/// Failures surfaced to whoever constructs or drives the viewport.
#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("Unsupported model format: .{0}. Use .obj or .fbx")]
    UnsupportedFormat(String),

    #[error("Invalid viewer configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("Invalid background colour '{0}'")]
    InvalidBackground(String),

    #[error("Host element '{0}' not found")]
    HostNotFound(String),

    #[error("Host surface error: {0}")]
    HostSurface(String),
}
