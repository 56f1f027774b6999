use thiserror::Error;

/// Failures surfaced by the session lifecycle and the import engine.
///
/// None of these are fatal: the caller shows the message as a transient
/// notice and the in-memory session stays intact.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error("Version mismatch: expected {expected}, found {}", describe_version(.found))]
    VersionMismatch { expected: u32, found: Option<i64> },
    #[error("No sets recorded")]
    EmptySession,
    #[error("Save failed: {0}")]
    Persistence(String),
    #[error("Import failed: {0}")]
    MalformedImport(String),
    #[error("No active session")]
    NoActiveSession,
}

fn describe_version(found: &Option<i64>) -> String {
    found.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Persistence(format!("serialization failed: {err}"))
    }
}

pub type DomainResult<T> = Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_mismatch_message() {
        let err = TrackerError::VersionMismatch { expected: 1, found: Some(2) };
        assert_eq!(err.to_string(), "Version mismatch: expected 1, found 2");

        let err = TrackerError::VersionMismatch { expected: 1, found: None };
        assert_eq!(err.to_string(), "Version mismatch: expected 1, found none");
    }

    #[test]
    fn test_empty_session_message() {
        assert_eq!(TrackerError::EmptySession.to_string(), "No sets recorded");
    }
}
