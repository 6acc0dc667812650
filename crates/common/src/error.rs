//! Error types shared across AudioSweet crates.

/// Top-level error type for AudioSweet operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioSweetError {
    #[error("No clips selected")]
    NoSelection,

    #[error("No focused effect to apply ({mode} mode)")]
    NoFocusTarget { mode: &'static str },

    #[error("Time window {start:.3}s..{end:.3}s does not overlap any selected clip")]
    WindowMissesSelection { start: f64, end: f64 },

    #[error("Render engine unavailable: {message}")]
    EngineLoad { message: String },

    #[error("Render call failed: {message}")]
    EngineCall { message: String },

    #[error("Render reported success but {selected} clip(s) are selected instead of one output")]
    MissingOutputSelection { selected: usize },

    #[error("Host error: {message}")]
    Host { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using AudioSweetError.
pub type AudioSweetResult<T> = Result<T, AudioSweetError>;

impl AudioSweetError {
    pub fn engine_load(msg: impl Into<String>) -> Self {
        Self::EngineLoad {
            message: msg.into(),
        }
    }

    pub fn engine_call(msg: impl Into<String>) -> Self {
        Self::EngineCall {
            message: msg.into(),
        }
    }

    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether the error was raised before the pipeline touched the timeline.
    pub fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            Self::NoSelection | Self::NoFocusTarget { .. } | Self::WindowMissesSelection { .. }
        )
    }

    /// Whether the error must stop the remaining units of a run.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, Self::EngineLoad { .. })
    }
}
