//! Service principal authentication (OAuth2 client-credentials flow)

use std::fmt;

use serde::Deserialize;
use tracing::{debug, info};

use crate::client::encode_url_path_segment;
use crate::config::{Credentials, Settings};
use crate::error::PbiError;

/// Bearer token for the Power BI API
#[derive(Clone)]
pub struct AccessToken {
    value: String,
    expires_in: Option<u64>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            expires_in: None,
        }
    }

    pub fn secret(&self) -> &str {
        &self.value
    }

    /// Lifetime in seconds as reported by the identity provider
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    /// Value for the `Authorization` header
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.value)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// The v1 endpoint reports `expires_in` as a string, v2 as a number
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    })
}

/// Exchanges service principal credentials for an access token
#[derive(Clone)]
pub struct Authenticator {
    agent: ureq::Agent,
    token_url: String,
    resource: String,
    credentials: Credentials,
}

impl Authenticator {
    pub fn new(agent: ureq::Agent, settings: &Settings, credentials: Credentials) -> Self {
        let token_url = format!(
            "{}/{}/oauth2/token",
            settings.authority_host.trim_end_matches('/'),
            encode_url_path_segment(&credentials.tenant_id)
        );
        Self {
            agent,
            token_url,
            resource: settings.resource_url.clone(),
            credentials,
        }
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Request a token from the authority. No retry.
    pub fn acquire_token(&self) -> Result<AccessToken, PbiError> {
        debug!("POST {}", self.token_url);

        let result = self.agent.post(&self.token_url).send_form(&[
            ("grant_type", "client_credentials"),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("resource", self.resource.as_str()),
        ]);

        let response = match result {
            Ok(response) => response,
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                return Err(PbiError::Auth {
                    status: Some(code),
                    message: describe_token_error(&body),
                });
            }
            Err(ureq::Error::Transport(transport)) => return Err(transport.into()),
        };

        let body = response
            .into_string()
            .map_err(|e| PbiError::Transport(format!("Failed to read token response: {e}")))?;
        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| PbiError::Auth {
            status: None,
            message: format!("Failed to parse token response: {e}"),
        })?;

        let value = parsed
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PbiError::Auth {
                status: None,
                message: "Token response did not contain an access_token".to_string(),
            })?;

        info!(
            "Acquired {} token (expires in {}s)",
            parsed.token_type.as_deref().unwrap_or("access"),
            parsed
                .expires_in
                .map(|s| s.to_string())
                .unwrap_or_else(|| "?".to_string())
        );

        Ok(AccessToken {
            value,
            expires_in: parsed.expires_in,
        })
    }
}

fn describe_token_error(body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error_description: Some(description),
            ..
        }) => description.lines().next().unwrap_or_default().to_string(),
        Ok(TokenErrorResponse {
            error: Some(error), ..
        }) => error,
        _ if body.trim().is_empty() => "empty response from identity provider".to_string(),
        _ => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_url_uses_tenant() {
        let settings = Settings {
            authority_host: "https://login.example.com/".into(),
            ..Default::default()
        };
        let credentials = Credentials {
            tenant_id: "contoso".into(),
            client_id: "c".into(),
            client_secret: "s".into(),
        };
        let auth = Authenticator::new(ureq::agent(), &settings, credentials);
        assert_eq!(auth.token_url(), "https://login.example.com/contoso/oauth2/token");
    }

    #[test]
    fn test_token_url_encodes_tenant() {
        let credentials = Credentials {
            tenant_id: "contoso/../other tenant".into(),
            client_id: "c".into(),
            client_secret: "s".into(),
        };
        let auth = Authenticator::new(ureq::agent(), &Settings::default(), credentials);
        assert_eq!(
            auth.token_url(),
            "https://login.microsoftonline.com/contoso%2F..%2Fother%20tenant/oauth2/token"
        );
    }

    #[test]
    fn test_describe_token_error_prefers_description() {
        let body = r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided.\r\nTrace ID: abc"}"#;
        assert_eq!(
            describe_token_error(body),
            "AADSTS7000215: Invalid client secret provided."
        );
        assert_eq!(
            describe_token_error(r#"{"error":"unauthorized_client"}"#),
            "unauthorized_client"
        );
        assert_eq!(describe_token_error("  "), "empty response from identity provider");
    }

    #[test]
    fn test_token_response_accepts_string_expiry() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","token_type":"Bearer","expires_in":"3599"}"#)
                .unwrap();
        assert_eq!(parsed.expires_in, Some(3599));

        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":3600}"#).unwrap();
        assert_eq!(parsed.expires_in, Some(3600));
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("super-secret");
        assert!(!format!("{token:?}").contains("super-secret"));
        assert_eq!(token.bearer_header(), "Bearer super-secret");
    }
}
