//! Artifact producer errors and context helpers.

use super::generative::GenerationFailure;
use super::script::ScriptViolation;
use std::{
    fmt::Display,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Result type for artifact production
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while producing or writing an artifact
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    GenericError(String),

    /// File system operation failed
    #[error("{context} ({}): {error}", path.display())]
    Fs {
        context: &'static str,
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error(transparent)]
    IoError(#[from] io::Error),

    /// External tool could not be executed
    #[error("failed to run `{command}`: {error}")]
    CommandFailed {
        command: String,
        #[source]
        error: io::Error,
    },

    #[error("template error: {0}")]
    Template(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Produced script breaks the directive contract
    #[error("script violates the directive contract: {}", summarize(.0))]
    ScriptContract(Vec<ScriptViolation>),

    /// Every generation tier failed
    #[error(transparent)]
    Generation(#[from] GenerationFailure),
}

fn summarize(violations: &[ScriptViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Attach file system context to IO results.
pub trait ErrorExt<T> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, io::Error> {
    fn fs_context(self, context: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.as_ref().to_path_buf(),
            error,
        })
    }
}

/// Turn options and foreign errors into [`Error::GenericError`] with context.
pub trait Context<T> {
    fn context<C: Display>(self, context: C) -> Result<T>;
    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T>;
}

impl<T> Context<T> for Option<T> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

impl<T, E: Display> Context<T> for std::result::Result<T, E> {
    fn context<C: Display>(self, context: C) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C: Display, F: FnOnce() -> C>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

/// Return early with an [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::producer::Error::GenericError(format!($($arg)*)))
    };
}
