//! Token acquisition against a mock authority

mod common;

use common::{groups_body, route, MockServer};
use pbi_workspace::{list_workspaces, Credentials, PbiError, PowerBiClient};

const TOKEN_PATH: &str = "/contoso-tenant/oauth2/token";

fn credentials() -> Credentials {
    Credentials {
        tenant_id: "contoso-tenant".into(),
        client_id: "app-id".into(),
        client_secret: "app-secret".into(),
    }
}

#[test]
fn test_token_is_acquired_once_and_reused() {
    let server = MockServer::start(vec![
        route(
            "POST",
            TOKEN_PATH,
            200,
            r#"{"token_type":"Bearer","expires_in":"3599","access_token":"eyJ0eXAi.fake"}"#,
        ),
        route("GET", "/groups", 200, groups_body()),
    ]);
    let client = PowerBiClient::new(&server.settings(), credentials());

    // Construction makes no request
    assert!(server.requests().is_empty());

    list_workspaces(&client).unwrap();
    list_workspaces(&client).unwrap();

    assert_eq!(server.count("POST", TOKEN_PATH), 1);
    assert_eq!(server.count("GET", "/groups"), 2);
    assert_eq!(client.token().unwrap().expires_in(), Some(3599));

    let requests = server.requests();
    let token_request = &requests[0];
    assert!(token_request.body.contains("grant_type=client_credentials"));
    assert!(token_request.body.contains("client_id=app-id"));
    assert!(token_request.body.contains("client_secret=app-secret"));
    assert!(token_request
        .body
        .contains("resource=https%3A%2F%2Fanalysis.windows.net%2Fpowerbi%2Fapi"));

    for request in requests.iter().filter(|r| r.path() == "/groups") {
        assert_eq!(request.authorization.as_deref(), Some("Bearer eyJ0eXAi.fake"));
    }
}

#[test]
fn test_invalid_secret_surfaces_description() {
    let server = MockServer::start(vec![route(
        "POST",
        TOKEN_PATH,
        401,
        r#"{"error":"invalid_client","error_description":"AADSTS7000215: Invalid client secret provided.\r\nTrace ID: 1\r\nCorrelation ID: 2"}"#,
    )]);
    let client = PowerBiClient::new(&server.settings(), credentials());

    let err = list_workspaces(&client).unwrap_err();

    match err {
        PbiError::Auth { status, message } => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "AADSTS7000215: Invalid client secret provided.");
        }
        other => panic!("Expected Auth error, got {other:?}"),
    }
    // No API call once authentication failed
    assert_eq!(server.count("GET", "/groups"), 0);
}

#[test]
fn test_token_response_without_token() {
    let server = MockServer::start(vec![route("POST", TOKEN_PATH, 200, r#"{"token_type":"Bearer"}"#)]);
    let client = PowerBiClient::new(&server.settings(), credentials());

    let err = client.token().unwrap_err();
    assert!(matches!(err, PbiError::Auth { status: None, .. }), "{err:?}");
}

#[test]
fn test_unreachable_authority_is_transport_error() {
    let settings = {
        // Bind and drop a server to get a port nothing listens on
        let server = MockServer::start(vec![]);
        server.settings()
    };
    let client = PowerBiClient::new(&settings, credentials());

    let err = client.token().unwrap_err();
    assert!(matches!(err, PbiError::Transport(_)), "{err:?}");
    assert_eq!(err.status(), None);
}
