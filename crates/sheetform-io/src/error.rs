use std::fmt::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{backend} backend error: {message}")]
    Backend {
        backend: &'static str,
        message: String,
    },
}

impl IoError {
    /// Wrap a backend-specific failure, keeping only its message.
    pub fn from_backend<E: Display>(backend: &'static str, err: E) -> Self {
        IoError::Backend {
            backend,
            message: err.to_string(),
        }
    }
}
