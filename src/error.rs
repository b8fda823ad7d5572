use thiserror::Error;

pub type Result<T> = std::result::Result<T, StyleError>;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A layer name in the configuration does not exist in the network.
    #[error("network has no layer named `{0}`")]
    UnknownLayer(String),

    #[error("{context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    #[error("{0}: backward called before forward")]
    NoForwardPass(&'static str),

    #[error("at least one style layer is required")]
    EmptyLayerSet,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
