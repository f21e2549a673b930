use thiserror::Error;

/// API statuses the upstream documents as temporary.
const TRANSIENT_API_STATUSES: &[&str] = &["OVER_QUERY_LIMIT", "UNKNOWN_ERROR"];

#[derive(Debug, Error)]
pub enum PlacesError {
    /// Network or TLS failure. The URL is stripped before wrapping so the
    /// API key never reaches logs.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("unexpected HTTP status {status} from {endpoint}")]
    UnexpectedStatus { status: u16, endpoint: String },

    /// The JSON envelope carried a non-`OK` `status` field.
    #[error("places API returned {status}: {message}")]
    Api { status: String, message: String },

    /// A continuation token was used before the upstream made it valid.
    #[error("page token not yet valid")]
    PageTokenNotReady,

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no results for \"{query}\"")]
    NotFound { query: String },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl From<reqwest::Error> for PlacesError {
    fn from(err: reqwest::Error) -> Self {
        PlacesError::Http(err.without_url())
    }
}

impl PlacesError {
    /// Whether retrying the same call after a delay can succeed.
    ///
    /// Transient: timeouts, connection failures, HTTP 429 and 5xx,
    /// `OVER_QUERY_LIMIT`, `UNKNOWN_ERROR`, and a not-yet-valid page token.
    /// Everything else (denied key, malformed request, bad body) is fatal.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            PlacesError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            PlacesError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
            PlacesError::Api { status, .. } => TRANSIENT_API_STATUSES.contains(&status.as_str()),
            PlacesError::PageTokenNotReady => true,
            PlacesError::Deserialize { .. }
            | PlacesError::NotFound { .. }
            | PlacesError::InvalidBaseUrl { .. } => false,
        }
    }
}
