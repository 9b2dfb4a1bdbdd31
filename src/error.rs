// ⚠️ Error kinds shared by the extraction, calculation and OCR layers

use thiserror::Error;

/// Every failure the library can surface to a caller.
///
/// Extraction heuristics never produce one of these: an unusable table
/// degrades to an empty partner list instead.
#[derive(Error, Debug)]
pub enum TipError {
    /// Upstream credentials or endpoint are missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed request, missing field, or zero total hours at calculation time.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The OCR service answered a submit or poll call with a non-2xx status.
    #[error("upstream request failed with status {status}: {body}")]
    UpstreamRequestFailed { status: u16, body: String },

    /// The submit call succeeded but carried no polling URL.
    #[error("no operation-location header received from the OCR service")]
    MissingOperationLocation,

    /// The OCR service reported `failed` for the analysis.
    #[error("OCR analysis failed: {0}")]
    UpstreamAnalysisFailed(String),

    #[error("OCR polling timeout after {attempts} attempts - analysis took too long")]
    PollingTimeout { attempts: u32 },

    #[cfg(feature = "server")]
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl TipError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        TipError::InvalidInput(message.into())
    }

    /// True for the caller's own mistakes (HTTP 400); everything else is a 500.
    pub fn is_client_error(&self) -> bool {
        matches!(self, TipError::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, TipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_invalid_input_is_client_error() {
        assert!(TipError::invalid_input("missing mimeType").is_client_error());
        assert!(!TipError::Configuration("no key".into()).is_client_error());
        assert!(!TipError::PollingTimeout { attempts: 20 }.is_client_error());
    }

    #[test]
    fn test_upstream_message_carries_body() {
        let err = TipError::UpstreamRequestFailed {
            status: 401,
            body: "Access denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "upstream request failed with status 401: Access denied"
        );
    }
}
