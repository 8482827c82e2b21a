use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving, writing, or verifying a tokenizer bundle.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid model identifier {0:?}")]
    InvalidIdentifier(String),

    #[error("model '{model_id}' was not found on the hub")]
    NotFound { model_id: String },

    #[error("model '{model_id}' was not found, or the configured token cannot access it")]
    Unauthorized { model_id: String },

    #[error("file '{file}' was not found in '{model_id}'")]
    FileNotFound { model_id: String, file: String },

    #[error("network error while fetching '{model_id}': {message}")]
    Network { model_id: String, message: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{origin}' has no tokenizer definition (expected tokenizer.json or a vocabulary file)")]
    IncompleteBundle { origin: String },

    #[error("invalid tokenizer file {}: {message}", .path.display())]
    InvalidTokenizer { path: PathBuf, message: String },

    #[error("failed to initialize hub client: {0}")]
    Client(String),
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status the CLI reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidIdentifier(_)
            | Self::NotFound { .. }
            | Self::Unauthorized { .. }
            | Self::FileNotFound { .. }
            | Self::IncompleteBundle { .. } => 2,
            Self::Network { .. } => 3,
            Self::Io { .. } => 4,
            Self::InvalidTokenizer { .. } => 5,
            Self::Client(_) => 1,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Unauthorized { .. } | Self::FileNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        let not_found = FetchError::NotFound {
            model_id: "org/missing".into(),
        };
        let network = FetchError::Network {
            model_id: "org/model".into(),
            message: "connection reset".into(),
        };
        let io = FetchError::io(
            "/tmp/out",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );

        assert_eq!(not_found.exit_code(), 2);
        assert_eq!(network.exit_code(), 3);
        assert_eq!(io.exit_code(), 4);
        assert!(not_found.is_not_found());
        assert!(!network.is_not_found());
    }

    #[test]
    fn unauthorized_reads_as_not_found_and_mentions_the_token() {
        let err = FetchError::Unauthorized {
            model_id: "org/private".into(),
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.is_not_found());
        assert!(err.to_string().contains("token"));
    }

    #[test]
    fn io_error_message_names_the_path() {
        let err = FetchError::io(
            "/tmp/out/vocab.txt",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/out/vocab.txt"));
        assert!(msg.contains("denied"));
    }
}
