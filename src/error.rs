//! Error types shared across the content pipeline
//!
//! Two tiers: fetch boundaries return [`FetchResult`] so callers can
//! substitute defaults, while schema violations found while rendering are
//! [`BlockError`]s that abort the page.

use std::path::PathBuf;
use thiserror::Error;

/// Result of any content, media or network fetch
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Failure while fetching content or media metadata
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("content not found: {0}")]
    NotFound(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {source}")]
    Parse {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("media lookup task failed: {0}")]
    Task(String),
}

impl FetchError {
    /// Whether this error means the requested item does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound(_))
    }
}

/// Content that does not match the schema the renderer understands
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
    #[error("unsupported block type `{0}`")]
    UnsupportedType(String),

    #[error("invalid heading level {0} (expected 1-3)")]
    InvalidHeadingLevel(String),

    #[error("{kind} block is missing its `{kind}` payload")]
    MissingPayload { kind: String },

    #[error("malformed `{kind}` payload: {message}")]
    MalformedPayload { kind: String, message: String },

    #[error("{kind} block {url} has no caption")]
    MissingCaption { kind: &'static str, url: String },

    #[error("list item at position {index} survived grouping")]
    UngroupedListItem { index: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn not_found() -> FetchError {
        FetchError::NotFound("pages/missing.json".to_string())
    }

    #[test]
    fn test_ok_map_unwrap() {
        let result: FetchResult<i32> = Ok(5);
        assert_eq!(result.map(|x| x * 2).unwrap(), 10);
    }

    #[test]
    fn test_err_map_is_identity() {
        let result: FetchResult<i32> = Err(not_found());
        let mapped = result.map(|x| x * 2);
        match mapped {
            Err(FetchError::NotFound(what)) => assert_eq!(what, "pages/missing.json"),
            other => panic!("expected the original error, got {:?}", other),
        }
    }

    #[test]
    fn test_err_and_then_short_circuits() {
        let mut called = false;
        let result: FetchResult<i32> = Err(not_found());
        let chained = result.and_then(|x| {
            called = true;
            Ok(x + 1)
        });
        assert!(chained.is_err());
        assert!(!called);
    }

    #[test]
    fn test_unwrap_or_and_map_err() {
        let result: FetchResult<Vec<String>> = Err(not_found());
        assert!(result.unwrap_or_default().is_empty());

        let result: FetchResult<i32> = Err(not_found());
        let mapped = result.map_err(|e| e.to_string());
        assert_eq!(mapped, Err("content not found: pages/missing.json".to_string()));
    }

    #[test]
    #[should_panic(expected = "NotFound(\"pages/missing.json\")")]
    fn test_unwrap_err_panics_with_error() {
        let result: FetchResult<i32> = Err(not_found());
        result.unwrap();
    }

    #[test]
    fn test_unwrap_err_payload_carries_error() {
        let payload = std::panic::catch_unwind(|| {
            let result: FetchResult<i32> = Err(not_found());
            result.unwrap()
        })
        .unwrap_err();
        let message = payload.downcast_ref::<String>().unwrap();
        assert!(message.contains(&format!("{:?}", not_found())));
    }

    #[test]
    fn test_question_mark_keeps_error_at_boundary() {
        fn render() -> anyhow::Result<i32> {
            let value: FetchResult<i32> = Err(not_found());
            Ok(value?)
        }

        let err = render().unwrap_err();
        let fetch = err.downcast_ref::<FetchError>().unwrap();
        assert!(fetch.is_not_found());
    }
}
