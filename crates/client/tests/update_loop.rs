//! The optimistic fetch/apply/put cycle under contention.

mod support;

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stormdesk_client::{ConflictPolicy, Error};

use support::{connect, mount_login};

const MEMBERS: &str = "/rest/orgs/201/incidents/42/members";

async fn mount_sequenced_members(server: &MockServer) {
    // A rival writer lands between our first fetch and our first put: the
    // fetch sees [1, 2], the put conflicts, the refetch sees [1, 2, 4].
    Mock::given(method("GET"))
        .and(path(MEMBERS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"members": [1, 2]})))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(MEMBERS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"members": [1, 2, 4]})))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(MEMBERS))
        .respond_with(ResponseTemplate::new(409))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path(MEMBERS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"members": [1, 2, 4, 3]})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn a_conflicting_write_restarts_from_a_fresh_snapshot() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_sequenced_members(&server).await;

    let client = connect(&server).await;
    let mut applications = 0;
    let result = client
        .update("/incidents/42/members", |doc| {
            applications += 1;
            doc["members"].as_array_mut().unwrap().push(json!(3));
        })
        .await
        .unwrap();

    assert_eq!(result, json!({"members": [1, 2, 4, 3]}));
    assert_eq!(applications, 2, "the mutation reruns on every cycle");

    let requests = server.received_requests().await.unwrap();
    let puts: Vec<Value> = requests
        .iter()
        .filter(|r| r.method == "PUT")
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect();
    assert_eq!(
        puts,
        vec![
            json!({"members": [1, 2, 3]}),
            json!({"members": [1, 2, 4, 3]}),
        ],
        "each put reflects the snapshot it was derived from"
    );
    let gets = requests.iter().filter(|r| r.method == "GET").count();
    assert_eq!(gets, 2);
}

#[tokio::test]
async fn a_bounded_policy_gives_up_after_the_limit() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path(MEMBERS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"members": []})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(MEMBERS))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let policy = ConflictPolicy::new().with_max_attempts(NonZeroU32::new(2).unwrap());
    let err = client
        .update_with("/incidents/42/members", &policy, |doc| {
            doc["members"].as_array_mut().unwrap().push(json!(3));
        })
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::ConflictExhausted { attempts: 2 }),
        "got {err:?}"
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.iter().filter(|r| r.method == "PUT").count(), 2);
    assert_eq!(requests.iter().filter(|r| r.method == "GET").count(), 2);
}

#[tokio::test]
async fn backoff_spaces_out_conflicting_attempts() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_sequenced_members(&server).await;

    let client = connect(&server).await;
    let policy =
        ConflictPolicy::new().with_backoff(Duration::from_millis(120), Duration::from_secs(1));
    let started = Instant::now();
    client
        .update_with("/incidents/42/members", &policy, |doc| {
            doc["members"].as_array_mut().unwrap().push(json!(3));
        })
        .await
        .unwrap();
    assert!(
        started.elapsed() >= Duration::from_millis(120),
        "the retry must wait out the initial backoff"
    );
}

#[tokio::test]
async fn a_non_conflict_put_failure_aborts_the_loop() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path(MEMBERS))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"members": []})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(MEMBERS))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage offline"))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let err = client
        .update("/incidents/42/members", |doc| {
            doc["members"] = json!([9]);
        })
        .await
        .unwrap_err();
    match err {
        Error::RequestFailed { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert!(body.contains("storage offline"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.iter().filter(|r| r.method == "PUT").count(), 1);
}

#[tokio::test]
async fn a_failing_fetch_aborts_before_the_mutation_runs() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path(MEMBERS))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such incident"))
        .mount(&server)
        .await;

    let client = connect(&server).await;
    let mut applications = 0;
    let err = client
        .update("/incidents/42/members", |_| {
            applications += 1;
        })
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::RequestFailed { status, .. } if status.as_u16() == 404),
        "got {err:?}"
    );
    assert_eq!(applications, 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.iter().filter(|r| r.method == "PUT").count(), 0);
}
