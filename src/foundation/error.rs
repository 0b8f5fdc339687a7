/// Result alias used across the crate.
pub type TalkgenResult<T> = Result<T, TalkgenError>;

/// Error type for fallible scene, asset, and render operations.
///
/// Malformed ruby markup is never reported through this type: the parser degrades it to plain
/// text instead.
#[derive(thiserror::Error, Debug)]
pub enum TalkgenError {
    /// Caller-supplied input was rejected.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image or SVG source could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Rasterization or encoding failed.
    #[error("render error: {0}")]
    Render(String),

    /// A scene document or sprite catalog could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, usually IO with attached context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TalkgenError {
    /// Build a [`TalkgenError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`TalkgenError::Decode`].
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`TalkgenError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`TalkgenError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
