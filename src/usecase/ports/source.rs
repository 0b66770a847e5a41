use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::field::FieldId;
use crate::domain::entities::record::ResponsePage;
use crate::usecase::services::request_builder::RequestDescriptor;

/// Failure to obtain a page from a record source.
///
/// Cloneable so one in-flight result can be handed to every caller that
/// attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned status {status}: {message}")]
    Server { status: u16, message: String },
    #[error("malformed response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Whether a source may retry the request that produced this error.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Server { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            FetchError::Decode(_) => false,
        }
    }
}

/// Intent rejected locally; the prior state is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("column `{0}` cannot be filtered")]
    NotFilterable(FieldId),
    #[error("column `{0}` cannot be sorted")]
    NotSortable(FieldId),
    #[error("unknown column `{0}`")]
    UnknownField(String),
    #[error("page size must be greater than zero, got {0}")]
    InvalidPageSize(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Anything that can answer a data request: the remote endpoint or a local
/// database speaking the same request format.
#[async_trait(?Send)]
pub trait RecordSource {
    async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponsePage, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_and_overload_statuses_are_transient() {
        assert!(FetchError::Network("reset".to_string()).is_transient());
        for status in [429, 500, 502, 503, 504] {
            let err = FetchError::Server {
                status,
                message: String::new(),
            };
            assert!(err.is_transient(), "{status} should be transient");
        }
        for status in [400, 401, 404, 422] {
            let err = FetchError::Server {
                status,
                message: String::new(),
            };
            assert!(!err.is_transient(), "{status} should not be transient");
        }
        assert!(!FetchError::Decode("eof".to_string()).is_transient());
    }

    #[test]
    fn grid_error_displays_inner_message() {
        let err = GridError::from(ValidationError::NotFilterable(FieldId::Path));

        assert_eq!(err.to_string(), "column `path` cannot be filtered");
    }
}
