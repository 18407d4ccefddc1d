use std::path::{Path, PathBuf};

/// Convenience result type used across the pipeline.
pub type ForgeResult<T> = Result<T, ForgeError>;

/// Top-level error taxonomy used by every compiler and the project driver.
#[derive(thiserror::Error, Debug)]
pub enum ForgeError {
    /// Missing mandatory member, wrong format header, unknown enum string.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// A property, asset or compositor identifier that does not exist in scope.
    #[error("unresolved reference: {0}")]
    UnresolvedReference(String),

    /// Input that is well formed but rejected by a pipeline policy.
    #[error("policy violation: {0}")]
    PolicyViolation(String),

    /// Two declarations of the same material property disagree.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A compiled binary resource whose header type/version is not recognized.
    #[error("format error: {0}")]
    Format(String),

    /// Any error raised while compiling one asset, tagged with its file path.
    #[error("asset '{path}': {source}")]
    Asset {
        /// Path of the asset descriptor or input file being compiled.
        path: PathBuf,
        /// The underlying failure.
        #[source]
        source: Box<ForgeError>,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ForgeError {
    /// Build a [`ForgeError::MalformedInput`] value.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Build a [`ForgeError::UnresolvedReference`] value.
    pub fn unresolved(msg: impl Into<String>) -> Self {
        Self::UnresolvedReference(msg.into())
    }

    /// Build a [`ForgeError::PolicyViolation`] value.
    pub fn policy(msg: impl Into<String>) -> Self {
        Self::PolicyViolation(msg.into())
    }

    /// Build a [`ForgeError::TypeMismatch`] value.
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Build a [`ForgeError::Format`] value.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Tag this error with the asset file it was raised for.
    ///
    /// Errors that already carry a path are returned unchanged so the innermost file wins.
    pub fn in_asset(self, path: impl AsRef<Path>) -> Self {
        match self {
            Self::Asset { .. } => self,
            other => Self::Asset {
                path: path.as_ref().to_path_buf(),
                source: Box::new(other),
            },
        }
    }

    /// Copy of this error with the same variant and message. Wrapped dependency errors
    /// keep their full message chain but lose their concrete type.
    pub(crate) fn duplicate(&self) -> Self {
        match self {
            Self::MalformedInput(m) => Self::MalformedInput(m.clone()),
            Self::UnresolvedReference(m) => Self::UnresolvedReference(m.clone()),
            Self::PolicyViolation(m) => Self::PolicyViolation(m.clone()),
            Self::TypeMismatch(m) => Self::TypeMismatch(m.clone()),
            Self::Format(m) => Self::Format(m.clone()),
            Self::Asset { path, source } => Self::Asset {
                path: path.clone(),
                source: Box::new(source.duplicate()),
            },
            Self::Other(e) => Self::Other(anyhow::anyhow!("{e:#}")),
        }
    }

    /// Return the innermost error, skipping any [`ForgeError::Asset`] wrappers.
    pub fn root(&self) -> &ForgeError {
        match self {
            Self::Asset { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
