//! Shared test utilities: a local stand-in for the Power BI and Azure AD endpoints

#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use pbi_workspace::{AccessToken, PowerBiClient, Settings};
use tiny_http::{Header, Response, Server};

/// A request the mock server received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path and query, e.g. `/groups/g-1/datasets/d-1/refreshes?$top=1`
    pub url: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.url.split('?').next().unwrap_or(&self.url)
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is not JSON")
    }
}

/// Canned response for a method + path (query string ignored)
#[derive(Debug, Clone)]
pub struct Route {
    method: &'static str,
    path: String,
    status: u16,
    body: String,
    headers: Vec<(&'static str, String)>,
}

pub fn route(method: &'static str, path: &str, status: u16, body: impl ToString) -> Route {
    Route {
        method,
        path: path.to_string(),
        status,
        body: body.to_string(),
        headers: Vec::new(),
    }
}

impl Route {
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }
}

/// Serves routes on 127.0.0.1 from a background thread and records every request
pub struct MockServer {
    base_url: String,
    server: Arc<Server>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    pub fn start(routes: Vec<Route>) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").expect("Failed to bind mock server"));
        let addr = server
            .server_addr()
            .to_ip()
            .expect("Mock server has no IP address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            std::thread::spawn(move || {
                for mut request in server.incoming_requests() {
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);

                    let recorded = RecordedRequest {
                        method: request.method().as_str().to_string(),
                        url: request.url().to_string(),
                        authorization: request
                            .headers()
                            .iter()
                            .find(|h| h.field.equiv("Authorization"))
                            .map(|h| h.value.as_str().to_string()),
                        body,
                    };

                    let matched = routes
                        .iter()
                        .find(|r| r.method == recorded.method && r.path == recorded.path())
                        .cloned();
                    requests.lock().unwrap().push(recorded);

                    let reply = matched.unwrap_or_else(|| {
                        route(
                            "",
                            "",
                            404,
                            r#"{"error":{"code":"NotFound","message":"No mock route"}}"#,
                        )
                    });

                    let mut response = Response::from_string(reply.body)
                        .with_status_code(reply.status)
                        .with_header(
                            Header::from_bytes("Content-Type", "application/json").unwrap(),
                        );
                    for (name, value) in &reply.headers {
                        response =
                            response.with_header(Header::from_bytes(*name, value.as_str()).unwrap());
                    }
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            base_url: format!("http://{}", addr),
            server,
            requests,
            handle: Some(handle),
        }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests matching method and path
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path() == path)
            .count()
    }

    /// Settings pointing both the API and the authority at this server
    pub fn settings(&self) -> Settings {
        Settings {
            api_base_url: self.base_url.clone(),
            authority_host: self.base_url.clone(),
            ..Default::default()
        }
    }

    /// Client that skips authentication
    pub fn client(&self) -> PowerBiClient {
        PowerBiClient::with_token(&self.settings(), AccessToken::new("test-token"))
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

pub const GROUP_ID: &str = "f089354e-8366-4e18-aea3-4cb4a3a50b48";
pub const DATASET_ID: &str = "cfafbeb1-8037-4d0c-896e-a46fb27ff229";

pub fn groups_body() -> serde_json::Value {
    serde_json::json!({
        "@odata.context": "http://wabi-west-europe-redirect.analysis.windows.net/v1.0/myorg/$metadata#groups",
        "value": [
            {"id": GROUP_ID, "isReadOnly": false, "isOnDedicatedCapacity": true, "name": "Sales Reports"},
            {"id": "3d9b93c6-7b6d-4801-a491-1738910904fd", "isReadOnly": false, "name": "Finance"}
        ]
    })
}

pub fn datasets_body() -> serde_json::Value {
    serde_json::json!({
        "value": [
            {"id": DATASET_ID, "name": "Sales", "configuredBy": "svc@contoso.com", "isRefreshable": true},
            {"id": "5f0b9d6a-0000-4d0c-896e-a46fb27ff229", "name": "Report Usage Metrics Model", "isRefreshable": false},
            {"id": "9a1c2e3f-1111-4d0c-896e-a46fb27ff229", "name": "Inventory", "isRefreshable": true}
        ]
    })
}

pub fn datasets_path() -> String {
    format!("/groups/{}/datasets", GROUP_ID)
}

pub fn dataset_path(rest: &str) -> String {
    format!("/groups/{}/datasets/{}{}", GROUP_ID, DATASET_ID, rest)
}
