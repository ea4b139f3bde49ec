//! Error type for Power BI API operations

/// Errors returned by the Power BI client.
///
/// Every variant carries enough to tell "the API said no" apart from
/// "we never got an answer" and "the answer made no sense".
#[derive(Debug, thiserror::Error)]
pub enum PbiError {
    #[error("Authentication failed{}: {message}", fmt_status(.status))]
    Auth {
        status: Option<u16>,
        message: String,
    },

    #[error("Code: {status}, {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("Dataset '{dataset}' not found in workspace '{workspace}' (available: {available})")]
    DatasetNotFound {
        workspace: String,
        dataset: String,
        available: String,
    },
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl PbiError {
    /// HTTP status of the failed call, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            PbiError::Auth { status, .. } => *status,
            PbiError::Api { status, .. } => Some(*status),
            PbiError::Status(status) => Some(*status),
            _ => None,
        }
    }

    /// Build the error for a non-success response from its raw body.
    ///
    /// Power BI error bodies look like `{"error": {"code": "...", "message": "..."}}`.
    /// Anything else collapses to the bare status code.
    pub fn from_response(status: u16, body: &str) -> Self {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| Self::from_error_value(status, &value))
            .unwrap_or(PbiError::Status(status))
    }

    /// Extract an `Api` error from an object holding an `error` member.
    pub(crate) fn from_error_value(status: u16, value: &serde_json::Value) -> Option<Self> {
        let error = value.get("error")?;

        if let Some(message) = error.as_str() {
            return Some(PbiError::Api {
                status,
                code: None,
                message: message.to_string(),
            });
        }

        let code = error
            .get("code")
            .and_then(|v| v.as_str())
            .map(String::from);
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| {
                error
                    .get("pbi.error")
                    .and_then(|v| v.get("details"))
                    .and_then(|v| v.as_array())
                    .and_then(|details| details.first())
                    .and_then(|d| d.get("detail"))
                    .and_then(|d| d.get("value"))
                    .and_then(|v| v.as_str())
                    .map(String::from)
            })
            .or_else(|| code.clone())?;

        Some(PbiError::Api {
            status,
            code,
            message,
        })
    }
}

impl From<ureq::Transport> for PbiError {
    fn from(err: ureq::Transport) -> Self {
        PbiError::Transport(err.to_string())
    }
}
