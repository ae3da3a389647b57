use std::path::Path;

use thiserror::Error;

/// Every way an update run can fail.
///
/// The set is closed: callers match on it to pick an exit code and message,
/// and the `Display` output is already a single user-facing line.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("Validation Error: {0}")]
    Validation(String),
    #[error("HTTP Error: {message}")]
    Http {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },
    #[error("File Error: {0}")]
    File(#[from] FileError),
    #[error("Error: {message}")]
    General { message: String },
    #[error("Operation cancelled")]
    Cancelled,
}

impl UpdateError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn http(message: impl Into<String>) -> Self {
        Self::Http {
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn http_from(context: &str, source: reqwest::Error) -> Self {
        let message = if source.is_timeout() {
            format!("{context}: request timed out")
        } else {
            format!("{context}: {source}")
        };
        Self::Http {
            message,
            source: Some(source),
        }
    }

    pub fn general(message: impl Into<String>) -> Self {
        Self::General {
            message: message.into(),
        }
    }
}

/// Filesystem or archive failure that aborts an extraction or download.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{context}: {source}")]
    Zip {
        context: &'static str,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("unsupported archive format: {name}")]
    UnsupportedArchive { name: String },
    #[error("extraction did not finish within {seconds}s")]
    TimedOut { seconds: u64 },
}

impl FileError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn zip(context: &'static str, source: zip::result::ZipError) -> Self {
        Self::Zip { context, source }
    }

    pub(crate) fn io_with_path(context: &'static str, path: &Path, source: &std::io::Error) -> Self {
        Self::io(
            context,
            std::io::Error::new(source.kind(), format!("{}: {source}", path.display())),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{FileError, UpdateError};

    #[test]
    fn display_prefixes_error_kind() {
        assert_eq!(
            UpdateError::validation("Invalid GitHub API URL").to_string(),
            "Validation Error: Invalid GitHub API URL"
        );
        assert_eq!(
            UpdateError::http("Download failed with status 404").to_string(),
            "HTTP Error: Download failed with status 404"
        );
        assert_eq!(
            UpdateError::general("opencode not found").to_string(),
            "Error: opencode not found"
        );
    }

    #[test]
    fn file_error_converts_and_keeps_cause() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error: UpdateError =
            FileError::io_with_path("failed to create extracted file", Path::new("/x/y"), &source)
                .into();

        let message = error.to_string();
        assert!(message.starts_with("File Error: failed to create extracted file"));
        assert!(message.contains("/x/y"));
        assert!(message.contains("denied"));
        assert!(matches!(
            error,
            UpdateError::File(FileError::Io { ref source, .. })
                if source.kind() == std::io::ErrorKind::PermissionDenied
        ));
    }

    #[test]
    fn timed_out_reports_budget() {
        let error = FileError::TimedOut { seconds: 120 };
        assert_eq!(error.to_string(), "extraction did not finish within 120s");
    }
}
