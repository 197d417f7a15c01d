//! ARM error types

use serde::Deserialize;

/// Maximum length of response body kept in error messages and logs
const MAX_BODY_LENGTH: usize = 200;

/// Errors returned by the ARM client
#[derive(Debug, thiserror::Error)]
pub enum ArmError {
    /// The API answered 404 for the requested resource
    #[error("{method} {url} returned 404 Not Found")]
    NotFound { method: String, url: String },

    /// Any other non-success response
    #[error("{method} {url} returned {status}: {code}: {message}")]
    Status {
        method: String,
        url: String,
        status: u16,
        code: String,
        message: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("decoding response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("authentication failed: {0}")]
    Auth(String),

    /// A long-running operation reached a terminal non-success state
    #[error("long-running operation finished with status {status}: {message}")]
    OperationFailed { status: String, message: String },
}

impl ArmError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::NotFound { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ArmError::NotFound { .. } => Some(404),
            ArmError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build an error from a non-success response body
    pub(crate) fn from_response(method: &str, url: &str, status: u16, body: &str) -> Self {
        if status == 404 {
            return ArmError::NotFound {
                method: method.to_string(),
                url: url.to_string(),
            };
        }

        let (code, message) = match serde_json::from_str::<CloudErrorEnvelope>(body) {
            Ok(envelope) => (envelope.error.code, envelope.error.message),
            Err(_) => ("Unknown".to_string(), truncate(body)),
        };

        ArmError::Status {
            method: method.to_string(),
            url: url.to_string(),
            status,
            code,
            message,
        }
    }
}

/// Standard ARM error envelope: `{"error": {"code": "...", "message": "..."}}`
#[derive(Debug, Deserialize)]
struct CloudErrorEnvelope {
    error: CloudError,
}

#[derive(Debug, Deserialize)]
struct CloudError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Truncate a response body and strip non-printable characters
pub(crate) fn truncate(body: &str) -> String {
    let cleaned: String = body
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    if cleaned.len() > MAX_BODY_LENGTH {
        format!(
            "{}... [truncated, {} bytes total]",
            &cleaned[..MAX_BODY_LENGTH],
            body.len()
        )
    } else {
        cleaned
    }
}
