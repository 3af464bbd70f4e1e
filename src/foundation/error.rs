/// Crate-wide result alias.
pub type PosterResult<T> = Result<T, PosterError>;

/// Error type for fallible IO, decoding, rendering and validation paths.
///
/// Layer-model operations do not use this type; they report a [`crate::ModelError`] instead.
#[derive(thiserror::Error, Debug)]
pub enum PosterError {
    /// Input failed structural or semantic validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image or font could not be read or decoded.
    #[error("asset error: {0}")]
    Asset(String),

    /// The rasterizer could not execute a plan.
    #[error("render error: {0}")]
    Render(String),

    /// JSON (de)serialization failed.
    #[error("serialization error: {0}")]
    Serde(String),

    /// The remote export service failed or timed out.
    #[error("remote error: {0}")]
    Remote(String),

    /// Any other error, with source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PosterError {
    /// Build a [`PosterError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PosterError::Asset`].
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`PosterError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PosterError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`PosterError::Remote`].
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }
}

impl From<serde_json::Error> for PosterError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}
