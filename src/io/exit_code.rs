//! Process exit statuses for the CLI.
//!
//! An empty recommendation list or an empty build still exits `0`. Codes
//! above `2` let scripts tell a missing index from a broken source.

use crate::error::MentorError;
use crate::types::BuildReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    /// The served index cannot be trusted; automation should stop.
    BlockingError = 2,
    /// No generation has been published yet.
    NotFound = 3,
    SourceError = 4,
    IoError = 5,
    ConfigError = 6,
    /// Model failure, or the model differs from the one the index was built with.
    EmbeddingError = 7,
    /// Build aborted. The previous generation is still served.
    BuildFailed = 8,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl ExitCode {
    pub fn from_error(error: &MentorError) -> Self {
        match error {
            // Recoverable by running a build
            MentorError::IndexNotFound { .. } => ExitCode::NotFound,

            MentorError::IndexCorrupted { .. } | MentorError::MetadataLabelMismatch { .. } => {
                ExitCode::BlockingError
            }

            MentorError::UpstreamFetch(_) => ExitCode::SourceError,
            MentorError::UpstreamEmbedding { .. } | MentorError::ModelMismatch { .. } => {
                ExitCode::EmbeddingError
            }
            MentorError::DegenerateEmbedding { .. }
            | MentorError::EmbeddingCountMismatch { .. } => ExitCode::BuildFailed,
            MentorError::FileRead { .. } | MentorError::FileWrite { .. } => ExitCode::IoError,
            MentorError::ConfigError { .. } => ExitCode::ConfigError,

            _ => ExitCode::GeneralError,
        }
    }

    /// Exit code for a finished build. An empty build is not a failure.
    pub fn from_build_report(report: &BuildReport) -> Self {
        if report.is_success() {
            ExitCode::Success
        } else {
            ExitCode::BuildFailed
        }
    }

    /// Check if this exit code indicates a blocking error.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        matches!(self, ExitCode::BlockingError)
    }

    /// Check if this exit code indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    /// Get a human-readable description of the exit code.
    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::BlockingError => "Blocking error - index must be rebuilt",
            ExitCode::NotFound => "Index not built",
            ExitCode::SourceError => "Mentor source error",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::EmbeddingError => "Embedding model error",
            ExitCode::BuildFailed => "Build failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceError;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as u8, 0);
        assert_eq!(ExitCode::GeneralError as u8, 1);
        assert_eq!(ExitCode::BlockingError as u8, 2);
        assert_eq!(ExitCode::NotFound as u8, 3);
        assert_eq!(i32::from(ExitCode::BuildFailed), 8);
    }

    #[test]
    fn test_from_error() {
        let not_built = MentorError::IndexNotFound {
            path: PathBuf::from("index"),
        };
        assert_eq!(ExitCode::from_error(&not_built), ExitCode::NotFound);

        let corrupted = MentorError::IndexCorrupted {
            reason: "bad checksum".into(),
        };
        assert!(ExitCode::from_error(&corrupted).is_blocking());

        let fetch = MentorError::UpstreamFetch(SourceError::Unavailable("down".into()));
        assert_eq!(ExitCode::from_error(&fetch), ExitCode::SourceError);
    }

    #[test]
    fn test_from_build_report() {
        assert!(ExitCode::from_build_report(&BuildReport::empty(vec![])).is_success());
        assert_eq!(
            ExitCode::from_build_report(&BuildReport::failed(vec![], "x".into())),
            ExitCode::BuildFailed
        );
    }

    #[test]
    fn test_is_blocking() {
        assert!(ExitCode::BlockingError.is_blocking());
        assert!(!ExitCode::Success.is_blocking());
        assert!(!ExitCode::NotFound.is_blocking());
    }
}
