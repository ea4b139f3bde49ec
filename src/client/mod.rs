//! Blocking HTTP client for the Power BI REST API.
//!
//! Owns the HTTP agent, the API base URL and the session token. The token is
//! requested on the first call and reused for the lifetime of the client.

mod response;

pub use response::ApiResponse;

use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::debug;

use crate::auth::{AccessToken, Authenticator};
use crate::config::{Credentials, Settings};
use crate::error::PbiError;

pub(crate) fn encode_url_path_segment(segment: &str) -> String {
    // RFC3986 unreserved = ALPHA / DIGIT / "-" / "." / "_" / "~"
    let mut out = String::with_capacity(segment.len());
    for &b in segment.as_bytes() {
        let is_unreserved =
            matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~');
        if is_unreserved {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&format!("{:02X}", b));
        }
    }
    out
}

/// Client for the Power BI REST API
pub struct PowerBiClient {
    api_base_url: String,
    agent: ureq::Agent,
    authenticator: Option<Authenticator>,
    token: OnceCell<AccessToken>,
}

impl PowerBiClient {
    /// Create a client that authenticates with `credentials` on first use.
    ///
    /// No request is made here.
    pub fn new(settings: &Settings, credentials: Credentials) -> Self {
        let agent = build_agent(settings);
        let authenticator = Authenticator::new(agent.clone(), settings, credentials);
        Self {
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            agent,
            authenticator: Some(authenticator),
            token: OnceCell::new(),
        }
    }

    /// Create a client around an already acquired token
    pub fn with_token(settings: &Settings, token: AccessToken) -> Self {
        Self {
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            agent: build_agent(settings),
            authenticator: None,
            token: OnceCell::with_value(token),
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// The session token, acquiring it if this is the first call
    pub fn token(&self) -> Result<&AccessToken, PbiError> {
        self.token.get_or_try_init(|| match &self.authenticator {
            Some(authenticator) => authenticator.acquire_token(),
            None => Err(PbiError::Auth {
                status: None,
                message: "Client has neither a token nor credentials".to_string(),
            }),
        })
    }

    /// URL for a path below the `/groups/{groupId}` root
    pub(crate) fn group_url(&self, group_id: &str, rest: &str) -> String {
        format!(
            "{}/groups/{}{}",
            self.api_base_url,
            encode_url_path_segment(group_id),
            rest
        )
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    /// GET a URL. Non-2xx statuses come back as a response, not an error.
    pub(crate) fn get(&self, url: &str) -> Result<ApiResponse, PbiError> {
        debug!("GET {}", url);
        let request = self.authorized(self.agent.get(url))?;
        ApiResponse::from_result(request.call())
    }

    /// POST a JSON body
    pub(crate) fn post_json<T: Serialize>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<ApiResponse, PbiError> {
        debug!("POST {}", url);
        let request = self.authorized(self.agent.post(url))?;
        ApiResponse::from_result(request.send_json(body))
    }

    /// POST without a body
    pub(crate) fn post_empty(&self, url: &str) -> Result<ApiResponse, PbiError> {
        debug!("POST {} (no body)", url);
        let request = self.authorized(self.agent.post(url))?;
        ApiResponse::from_result(request.call())
    }

    fn authorized(&self, request: ureq::Request) -> Result<ureq::Request, PbiError> {
        let token = self.token()?;
        Ok(request.set("Authorization", &token.bearer_header()))
    }
}

impl std::fmt::Debug for PowerBiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PowerBiClient")
            .field("api_base_url", &self.api_base_url)
            .field("authenticated", &self.token.get().is_some())
            .finish()
    }
}

fn build_agent(settings: &Settings) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(Duration::from_secs(settings.connect_timeout_secs))
        .timeout_read(Duration::from_secs(settings.read_timeout_secs))
        .build()
}
