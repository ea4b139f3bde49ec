//! Raw API responses

use serde::de::DeserializeOwned;

use crate::error::PbiError;

/// Status, body and request id of a completed HTTP exchange
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    /// Value of the `RequestId` header Power BI attaches to every response
    pub request_id: Option<String>,
}

impl ApiResponse {
    /// Turn a ureq result into a response; only transport failures are errors
    pub(crate) fn from_result(
        result: Result<ureq::Response, ureq::Error>,
    ) -> Result<Self, PbiError> {
        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => return Err(transport.into()),
        };

        let status = response.status();
        let request_id = response.header("RequestId").map(String::from);
        let body = response
            .into_string()
            .map_err(|e| PbiError::Transport(format!("Failed to read response body: {e}")))?;

        Ok(Self {
            status,
            body,
            request_id,
        })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fail with the API error for non-2xx responses
    pub fn error_for_status(self) -> Result<Self, PbiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(PbiError::from_response(self.status, &self.body))
        }
    }

    /// Check the status, then deserialize the body
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, PbiError> {
        let response = self.error_for_status()?;
        serde_json::from_str(&response.body)
            .map_err(|e| PbiError::Decode(format!("Failed to parse response: {e}")))
    }
}
