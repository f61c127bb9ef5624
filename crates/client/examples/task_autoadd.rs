//! React to a "create follow-up task" action fired from the platform UI.
//!
//! Reads the delivered action event from a JSON file, makes sure the user who
//! triggered the action can see the incident (directly or through one of their
//! groups) and then files a task on the incident. All writes carry the event's
//! context token so the platform can attribute them to the originating action.
//!
//! Run with the bot account in the environment:
//!
//! ```text
//! STORMDESK_BASE_URL=https://sd.example.com \
//! STORMDESK_ORG="Response Team" \
//! STORMDESK_EMAIL=bot@example.com \
//! STORMDESK_PASSWORD=... \
//! cargo run --example task_autoadd -- event.json
//! ```

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::{Value, json};

use stormdesk_client::{Client, ClientConfig, Credentials, EMAIL_ENV_VAR, PASSWORD_ENV_VAR};

#[derive(Debug, Deserialize)]
struct ActionEvent {
    /// Context token scoping writes back to the originating action.
    context: String,
    user: EventUser,
    incident: Value,
}

#[derive(Debug, Deserialize)]
struct EventUser {
    id: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let event_path = std::env::args()
        .nth(1)
        .context("usage: task_autoadd <event.json>")?;
    let raw = std::fs::read_to_string(&event_path)
        .with_context(|| format!("failed to read event file {event_path}"))?;
    let event: ActionEvent = serde_json::from_str(&raw).context("malformed action event")?;

    let incident_id = event.incident["id"]
        .as_u64()
        .context("event incident has no id")?;

    let email = std::env::var(EMAIL_ENV_VAR).context("STORMDESK_EMAIL is not set")?;
    let password = std::env::var(PASSWORD_ENV_VAR).context("STORMDESK_PASSWORD is not set")?;
    let client = Client::connect(ClientConfig::from_env(), Credentials::new(email, password))
        .await
        .context("login failed")?;
    let client = client.with_context(&event.context);

    // Incident members can be users or groups, so pull the acting user's
    // group memberships before deciding whether they already have access.
    let user = client
        .get(&format!("/users/{}", event.user.id))
        .await
        .context("failed to look up the acting user")?;
    let groups: Vec<u64> = user["group_ids"]
        .as_array()
        .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
        .unwrap_or_default();

    if can_see(&event.incident, event.user.id, &groups) {
        println!("user {} can already see incident {incident_id}", event.user.id);
    } else {
        // Racing the incident's other editors is expected here, so go through
        // the conflict-retrying update rather than a bare put.
        client
            .update(&format!("/incidents/{incident_id}/members"), |doc| {
                add_member(doc, event.user.id);
            })
            .await
            .context("failed to add the user to the incident members")?;
        println!("added user {} to incident {incident_id}", event.user.id);
    }

    let task = client
        .post(
            &format!("/incidents/{incident_id}/tasks"),
            &json!({
                "name": "Follow up on triggered action",
                "owner_id": event.user.id,
                "required": true,
            }),
        )
        .await
        .context("failed to create the follow-up task")?;
    let Some(task_id) = task["id"].as_u64() else {
        bail!("task response has no id: {task}");
    };
    println!("created task {task_id} on incident {incident_id}");
    Ok(())
}

/// Whether the user can already see the incident: as its owner, through the
/// owning group, or on the member list directly or through a group.
fn can_see(incident: &Value, user_id: u64, groups: &[u64]) -> bool {
    let owner = incident["owner_id"].as_u64();
    if owner == Some(user_id) || owner.is_some_and(|id| groups.contains(&id)) {
        return true;
    }
    incident["members"].as_array().is_some_and(|members| {
        members
            .iter()
            .filter_map(Value::as_u64)
            .any(|id| id == user_id || groups.contains(&id))
    })
}

/// Append `user_id` to the member list unless a rival writer got there first.
fn add_member(doc: &mut Value, user_id: u64) {
    match doc["members"].as_array_mut() {
        Some(members) => {
            if !members.iter().any(|m| m.as_u64() == Some(user_id)) {
                members.push(json!(user_id));
            }
        }
        None => doc["members"] = json!([user_id]),
    }
}
