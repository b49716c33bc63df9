use std::string::FromUtf8Error;

use thiserror::Error;

/// Error types that can occur when talking to a generation provider.
#[derive(Error, Debug)]
pub enum AstraError {
    /// A wrapper for a generic, user-created error message.
    #[error("Generic Error: {0}")]
    GenericError(String),

    /// A wrapper for provider-specific error messages.
    #[error("Provider Error: {0}")]
    ProviderError(String),

    /// Missing or rejected credentials.
    #[error("Auth Error: {0}")]
    AuthError(String),

    /// Errors related to malformed requests.
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    /// Errors related to malformed response bodies.
    #[error("Response Format Error: {message}. Raw response: '{raw_response}'")]
    ResponseFormatError {
        message: String,
        raw_response: String,
    },

    /// The provider answered with a non-success HTTP status.
    #[error("[{code}] {message}")]
    Status { code: u16, message: String },

    #[error("HTTP Error: {0}")]
    HttpError(String),

    /// Handles JSON serialization and deserialization errors.
    #[error("JSON Error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Handles errors from parsing URLs.
    #[error("Invalid URL")]
    InvalidUrl(#[from] url::ParseError),

    /// Handles standard I/O errors.
    #[error("I/O Error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AstraError {
    /// HTTP status carried by the error, if the provider reported one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AstraError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the provider signalled a rate limit or exhausted quota.
    ///
    /// Matches status 429 as well as the textual markers Gemini puts in its
    /// error bodies (`429`, `quota`, `RESOURCE_EXHAUSTED`).
    pub fn is_quota_exceeded(&self) -> bool {
        if self.status_code() == Some(429) {
            return true;
        }
        let message = self.to_string();
        message.contains("429")
            || message.contains("RESOURCE_EXHAUSTED")
            || message.to_ascii_lowercase().contains("quota")
    }

    /// Whether the provider is unusable because of missing or bad credentials.
    ///
    /// Gemini answers a malformed key with 400 `INVALID_ARGUMENT`, so that
    /// status counts when its message names the key.
    pub fn is_auth(&self) -> bool {
        match self {
            AstraError::AuthError(_) => true,
            AstraError::Status { code: 401 | 403, .. } => true,
            AstraError::Status { code: 400, message } => {
                message.contains("API key not valid") || message.contains("API_KEY_INVALID")
            }
            _ => false,
        }
    }
}

#[cfg(feature = "http-client")]
impl From<reqwest::Error> for AstraError {
    fn from(err: reqwest::Error) -> Self {
        // request URLs carry the API key as a query parameter
        AstraError::HttpError(err.without_url().to_string())
    }
}

impl From<http::Error> for AstraError {
    fn from(err: http::Error) -> Self {
        AstraError::HttpError(err.to_string())
    }
}

impl From<FromUtf8Error> for AstraError {
    fn from(value: FromUtf8Error) -> Self {
        AstraError::GenericError(format!("Error decoding string: {:#}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_detection() {
        let by_status = AstraError::Status {
            code: 429,
            message: "Too Many Requests".into(),
        };
        assert!(by_status.is_quota_exceeded());

        let by_text = AstraError::ProviderError("You exceeded your current Quota".into());
        assert!(by_text.is_quota_exceeded());

        let by_gemini_status = AstraError::ProviderError("RESOURCE_EXHAUSTED".into());
        assert!(by_gemini_status.is_quota_exceeded());

        let other = AstraError::HttpError("network unreachable".into());
        assert!(!other.is_quota_exceeded());
    }

    #[test]
    fn test_auth_detection() {
        assert!(AstraError::AuthError("Missing Google API key".into()).is_auth());
        assert!(
            AstraError::Status {
                code: 403,
                message: "PERMISSION_DENIED".into()
            }
            .is_auth()
        );
        assert!(
            AstraError::Status {
                code: 400,
                message: "INVALID_ARGUMENT: API key not valid. Please pass a valid API key.".into()
            }
            .is_auth()
        );
        assert!(
            !AstraError::Status {
                code: 400,
                message: "INVALID_ARGUMENT: Request contains an invalid argument.".into()
            }
            .is_auth()
        );
        assert!(!AstraError::ProviderError("boom".into()).is_auth());
    }

    #[cfg(feature = "http-client")]
    #[tokio::test]
    async fn test_transport_error_hides_request_url() {
        // nothing listens on port 1
        let err = reqwest::Client::new()
            .get("http://127.0.0.1:1/v1beta/models?key=AIzaSecretKey")
            .send()
            .await
            .unwrap_err();
        let message = AstraError::from(err).to_string();
        assert!(!message.contains("AIzaSecretKey"));
        assert!(!message.contains("127.0.0.1"));
    }
}
