//! Shared wiremock scaffolding for the client integration tests.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stormdesk_client::{Client, ClientConfig, Credentials};

/// A successful login response issuing `cookie` and `csrf`.
pub fn login_response(csrf: &str, cookie: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header(
            "set-cookie",
            format!("sd_session={cookie}; Path=/; HttpOnly"),
        )
        .set_body_json(json!({
            "user_id": 17,
            "user_email": "bot@example.com",
            "csrf_token": csrf,
            "orgs": [{"id": 201, "name": "Alpha", "enabled": true}],
        }))
}

/// Accept any number of logins, always issuing the same session.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/session"))
        .respond_with(login_response("csrf-1", "cookie-1"))
        .mount(server)
        .await;
}

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri()).with_org("Alpha")
}

/// Connect to the mock server as the stock test account.
pub async fn connect(server: &MockServer) -> Client {
    Client::connect(
        config_for(server),
        Credentials::new("bot@example.com", "secret"),
    )
    .await
    .expect("connect should succeed")
}
