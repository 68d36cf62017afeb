//! Error types shared by every stage of card generation.

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, CardError>;

/// Coarse classification used when folding per-card outcomes into batch stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    NotReleased,
    AssetNotFound,
    Io,
    Catalog,
    Config,
}

#[derive(thiserror::Error, Debug)]
pub enum CardError {
    #[error("card ID {id} not found")]
    NotFound { id: String },

    #[error("card ID {id} has not been released")]
    NotReleased { id: String },

    #[error("{step} not found ({}): {reason}", path.display())]
    AssetNotFound {
        step: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode '{}': {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("config error: {0}")]
    Config(String),
}

impl CardError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn not_released(id: impl Into<String>) -> Self {
        Self::NotReleased { id: id.into() }
    }

    pub fn asset(step: &'static str, path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::AssetNotFound {
            step,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::NotReleased { .. } => ErrorKind::NotReleased,
            Self::AssetNotFound { .. } => ErrorKind::AssetNotFound,
            Self::Io { .. } | Self::Encode { .. } => ErrorKind::Io,
            Self::Catalog(_) => ErrorKind::Catalog,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Name of the composition step that failed, if any.
    pub fn step(&self) -> Option<&'static str> {
        match self {
            Self::AssetNotFound { step, .. } => Some(step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_error_names_the_step() {
        let err = CardError::asset("Rank", "rank/gold.png", "No such file");
        assert_eq!(err.kind(), ErrorKind::AssetNotFound);
        assert_eq!(err.step(), Some("Rank"));
        assert!(err.to_string().starts_with("Rank not found"));
        assert!(err.to_string().contains("rank/gold.png"));
    }

    #[test]
    fn encode_errors_count_as_io() {
        let source = image::ImageError::IoError(std::io::Error::other("disk full"));
        let err = CardError::Encode {
            path: "high.png".into(),
            source,
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.step().is_none());
    }

    #[test]
    fn not_released_is_distinct_from_not_found() {
        assert_eq!(CardError::not_released("1").kind(), ErrorKind::NotReleased);
        assert_eq!(CardError::not_found("1").kind(), ErrorKind::NotFound);
        assert_eq!(
            CardError::not_found("152101").to_string(),
            "card ID 152101 not found"
        );
    }
}
