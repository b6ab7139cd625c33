use std::path::PathBuf;

/// Result alias that carries the custom [`ShowcaseError`] type.
pub type Result<T> = std::result::Result<T, ShowcaseError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum ShowcaseError {
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A manifest or configuration file is not valid JSON for its schema.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The asset gateway reported a failure for `path`.
    #[error("failed to load `{}`: {reason}", .path.display())]
    Load { path: PathBuf, reason: String },
    /// A character key that is not part of the catalog.
    #[error("unknown character `{0}`")]
    UnknownCharacter(String),
    /// The same character key appears twice in a catalog.
    #[error("character `{0}` is listed more than once")]
    DuplicateCharacter(String),
    #[error("catalog must contain at least one character")]
    EmptyCatalog,
    /// Audio backend failure (device, decoder or sink).
    #[error("audio: {0}")]
    Audio(String),
}

impl ShowcaseError {
    pub fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
