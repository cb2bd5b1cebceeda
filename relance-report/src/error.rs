//! Report dispatch error taxonomy with HTTP status mapping.

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Email address is required")]
    MissingEmail,

    #[error("Missing API keys in environment")]
    MissingCredentials,

    #[error("Failed to send email: {0}")]
    Delivery(String),

    #[error("Task store error: {0}")]
    Store(String),
}

impl ReportError {
    /// HTTP status the dispatch endpoint answers with.
    pub fn status(&self) -> u16 {
        match self {
            ReportError::MissingEmail => 400,
            ReportError::MissingCredentials => 500,
            ReportError::Delivery(_) => 500,
            ReportError::Store(_) => 500,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let error = match self {
            ReportError::MissingEmail => "Email address is required",
            ReportError::MissingCredentials => "Missing API keys in environment",
            ReportError::Delivery(_) => "Failed to send email",
            ReportError::Store(_) => "Internal server error",
        };
        ErrorBody {
            error: error.to_string(),
            message: self.to_string(),
        }
    }
}

/// JSON body for a failed dispatch: `{ error, message }`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
