use std::fmt;

use crate::location::LocationError;

/// Coarse classification of every failure the pipeline can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    NetworkError,
    ProviderError,
    LocationError,
    UserReported,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::NotFound => "not found",
            ErrorKind::NetworkError => "network error",
            ErrorKind::ProviderError => "provider error",
            ErrorKind::LocationError => "location error",
            ErrorKind::UserReported => "reported",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure returned by the provider client and the resolution service.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("no coordinates found for the specified place")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error(transparent)]
    Location(#[from] LocationError),
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::InvalidInput(_) => ErrorKind::InvalidInput,
            ResolveError::NotFound => ErrorKind::NotFound,
            ResolveError::Network(_) => ErrorKind::NetworkError,
            ResolveError::Provider(_) => ErrorKind::ProviderError,
            ResolveError::Location(_) => ErrorKind::LocationError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_is_stable() {
        assert_eq!(
            ResolveError::NotFound.to_string(),
            "no coordinates found for the specified place"
        );
    }

    #[test]
    fn kinds_follow_variants() {
        assert_eq!(ResolveError::InvalidInput("x".into()).kind(), ErrorKind::InvalidInput);
        assert_eq!(ResolveError::Network("x".into()).kind(), ErrorKind::NetworkError);
        assert_eq!(ResolveError::Provider("x".into()).kind(), ErrorKind::ProviderError);
        assert_eq!(
            ResolveError::from(LocationError::PermissionDenied).kind(),
            ErrorKind::LocationError
        );
    }

    #[test]
    fn location_errors_keep_their_message() {
        let err = ResolveError::from(LocationError::PermissionDenied);
        assert_eq!(err.to_string(), "location permission denied");
    }
}
