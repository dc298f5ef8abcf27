//! # Lookup Error Types Module
//!
//! Errors raised by the service layer around the core: barcode validation,
//! the external product and explanation providers, and the circuit breaker.
//! The normalizer and evaluators themselves never fail.

/// Custom error types for product lookups and explanations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Barcode is empty or not made of digits
    InvalidBarcode(String),
    /// Request payload rejected before any provider call
    InvalidRequest(String),
    /// Provider has no product for the barcode
    NotFound(String),
    /// Provider unreachable or answered with an error status
    Upstream(String),
    /// Provider answered with a body we could not read
    Decode(String),
    /// Feature needs configuration that is missing (e.g. an API key)
    Configuration(String),
    /// Provider calls suspended after repeated failures
    CircuitOpen(String),
}

impl LookupError {
    /// Whether retrying the same call could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Upstream(_))
    }
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupError::InvalidBarcode(msg) => write!(f, "Invalid barcode: {msg}"),
            LookupError::InvalidRequest(msg) => write!(f, "Invalid request: {msg}"),
            LookupError::NotFound(msg) => write!(f, "Product not found: {msg}"),
            LookupError::Upstream(msg) => write!(f, "Upstream error: {msg}"),
            LookupError::Decode(msg) => write!(f, "Decode error: {msg}"),
            LookupError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            LookupError::CircuitOpen(msg) => write!(f, "Service temporarily unavailable: {msg}"),
        }
    }
}

impl std::error::Error for LookupError {}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Decode(err.to_string())
        } else {
            LookupError::Upstream(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LookupError {
    fn from(err: serde_json::Error) -> Self {
        LookupError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            LookupError::NotFound("0000".to_string()).to_string(),
            "Product not found: 0000"
        );
        assert_eq!(
            LookupError::Configuration("EXPLAIN_API_KEY is not configured".to_string()).to_string(),
            "Configuration error: EXPLAIN_API_KEY is not configured"
        );
    }

    #[test]
    fn test_only_upstream_is_transient() {
        assert!(LookupError::Upstream("502".to_string()).is_transient());
        assert!(!LookupError::NotFound("1".to_string()).is_transient());
        assert!(!LookupError::Decode("bad".to_string()).is_transient());
    }

    #[test]
    fn test_from_json_error() {
        let err: LookupError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, LookupError::Decode(_)));
    }
}
