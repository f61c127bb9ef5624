use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stormdesk_client::ClientConfig;

use super::execute_with;
use crate::credentials::MockCredentialStore;

fn session_response() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("set-cookie", "sd_session=cookie-1; Path=/; HttpOnly")
        .set_body_json(json!({
            "csrf_token": "csrf-1",
            "user_id": 17,
            "user_email": "bot@example.com",
            "orgs": [{"id": 201, "name": "Alpha", "enabled": true}]
        }))
}

#[tokio::test]
async fn login_stores_the_resolved_org() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/session"))
        .respond_with(session_response())
        .mount(&server)
        .await;

    let mut store = MockCredentialStore::new();
    store
        .expect_store()
        .withf(|stored| stored.email == "bot@example.com" && stored.org.as_deref() == Some("Alpha"))
        .times(1)
        .returning(|_| Ok(()));

    let config = ClientConfig::new(server.uri());
    execute_with(config, "bot@example.com".into(), "hunter2".into(), &store)
        .await
        .unwrap();
}

#[tokio::test]
async fn a_failed_login_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/session"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let store = MockCredentialStore::new();

    let config = ClientConfig::new(server.uri());
    let err = execute_with(config, "bot@example.com".into(), "wrong".into(), &store)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("login failed"), "got: {err:#}");
}

#[tokio::test]
async fn an_unknown_org_lists_the_memberships() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/session"))
        .respond_with(session_response())
        .mount(&server)
        .await;

    let store = MockCredentialStore::new();

    let config = ClientConfig::new(server.uri()).with_org("Ghost");
    let err = execute_with(config, "bot@example.com".into(), "hunter2".into(), &store)
        .await
        .unwrap_err();
    let rendered = format!("{err:#}");
    assert!(rendered.contains("Ghost"), "got: {rendered}");
    assert!(rendered.contains("Alpha"), "got: {rendered}");
}
