/// Convenience result type used across karma-video.
pub type KarmaResult<T> = Result<T, KarmaError>;

/// Top-level error taxonomy used by export APIs.
#[derive(thiserror::Error, Debug)]
pub enum KarmaError {
    /// Invalid caller-provided configuration or job data.
    #[error("validation error: {0}")]
    Validation(String),

    /// An image reference could not be fetched or decoded.
    #[error("load error: {0}")]
    Load(String),

    /// The background audio could not be decoded, or its trimmed interval is empty.
    #[error("audio decode error: {0}")]
    AudioDecode(String),

    /// An export was started with no images.
    #[error("empty input: no images to export")]
    EmptyInput,

    /// The streaming encoder failed during a session.
    #[error("encoder error: {0}")]
    Encoder(String),

    /// The session was torn down because a newer export started.
    #[error("session superseded by a newer export")]
    Superseded,

    /// Errors when serializing or deserializing job files.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KarmaError {
    /// Build a [`KarmaError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`KarmaError::Load`] value.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Build a [`KarmaError::AudioDecode`] value.
    pub fn audio_decode(msg: impl Into<String>) -> Self {
        Self::AudioDecode(msg.into())
    }

    /// Build a [`KarmaError::Encoder`] value.
    pub fn encoder(msg: impl Into<String>) -> Self {
        Self::Encoder(msg.into())
    }

    /// Build a [`KarmaError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Whether this error aborts the whole session.
    ///
    /// Load and audio errors are absorbed by the sequence driver and the audio preparer
    /// respectively; everything else ends the export.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Load(_) | Self::AudioDecode(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
