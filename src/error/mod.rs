use thiserror::Error;

/// Failures surfaced at lifecycle boundaries.
///
/// Anything returned from here kept the engine from reaching (or staying
/// in) the running phase. Per-frame hiccups never become an `EngineError`;
/// they are logged and the loop moves on.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid video options: {0}")]
    InvalidVideoOptions(String),

    #[error("Failed to create output surface: {0}")]
    Surface(String),

    #[error("Failed to create renderer: {0}")]
    Renderer(String),

    #[error("Failed to initialize text engine: {0}")]
    TextEngine(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{owner} failed during {stage}: {message}")]
    Hook {
        owner: String,
        stage: &'static str,
        message: String,
    },

    #[error("Failed to spawn the draw thread: {0}")]
    DrawThread(String),
}

/// Result type alias for engine lifecycle operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub(crate) fn hook(owner: impl Into<String>, stage: &'static str, err: &anyhow::Error) -> Self {
        EngineError::Hook {
            owner: owner.into(),
            stage,
            message: format!("{err:#}"),
        }
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_error_keeps_context_chain() {
        let err = anyhow::anyhow!("missing atlas").context("loading sprites");
        let hook = EngineError::hook("Hud", "load_content", &err);
        assert_eq!(
            hook.to_string(),
            "Hud failed during load_content: loading sprites: missing atlas"
        );
    }

    #[test]
    fn toml_errors_become_config_errors() {
        let err = toml::from_str::<toml::Table>("video = [").unwrap_err();
        assert!(matches!(EngineError::from(err), EngineError::Config(_)));
    }
}
