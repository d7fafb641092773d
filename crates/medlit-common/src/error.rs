use thiserror::Error;

#[derive(Debug, Error)]
pub enum MedlitError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {origin}")]
    Status { origin: &'static str, status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Malformed query: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Crawl cancelled: {0}")]
    Cancelled(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MedlitError {
    /// Whether the retry policy may re-run the failed operation.
    ///
    /// Transient: timeouts, connection failures, HTTP 5xx, and 429
    /// (sources signal their own rate limit with it). Everything else is
    /// permanent and aborts the attempt loop immediately.
    pub fn is_transient(&self) -> bool {
        match self {
            MedlitError::Http(e) => {
                if let Some(status) = e.status() {
                    status.is_server_error() || status.as_u16() == 429
                } else {
                    e.is_timeout() || e.is_connect() || e.is_request()
                }
            }
            MedlitError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, MedlitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let e = MedlitError::Status { origin: "pubmed", status: 503 };
        assert!(e.is_transient());
    }

    #[test]
    fn rate_limit_rejection_is_transient() {
        let e = MedlitError::Status { origin: "pubmed", status: 429 };
        assert!(e.is_transient());
    }

    #[test]
    fn status_display_names_the_origin() {
        let e = MedlitError::Status { origin: "pubmed", status: 503 };
        assert_eq!(e.to_string(), "HTTP 503 from pubmed");
    }

    #[test]
    fn client_errors_are_permanent() {
        let e = MedlitError::Status { origin: "arxiv", status: 400 };
        assert!(!e.is_transient());
        assert!(!MedlitError::Xml("truncated".into()).is_transient());
        assert!(!MedlitError::Query("empty keyword".into()).is_transient());
    }
}
