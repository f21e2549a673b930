use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// The request was rejected before any upstream call was made.
    #[error("invalid parameter {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
}

impl SearchError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SearchError::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }
}
