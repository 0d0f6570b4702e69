use crate::client::{AuthEvent, ResultsClient};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_client, try_resp};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "connection": state.client.as_ref().map(|c| c.connection_state()),
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, path.clone()) {
        Ok(client) => ok(
            &req.id,
            json!({
                "workspacePath": path.to_string_lossy(),
                "connection": client.connection_state(),
            }),
        ),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

/// Opens `path`, connects, and starts forwarding auth-state changes as
/// events. Any previously selected workspace is closed first.
pub fn select_workspace(state: &mut AppState, path: PathBuf) -> anyhow::Result<&ResultsClient> {
    state.close_workspace();

    let client = ResultsClient::open_workspace(&path)?;
    let connection = client.connect();
    info!(workspace = %path.to_string_lossy(), ?connection, "workspace selected");

    let events = state.events.clone();
    let watch = client.on_auth_state_changed(move |event: &AuthEvent| {
        let _ = events.send(json!({
            "event": "auth.stateChanged",
            "user": event.user(),
        }));
    });

    state.workspace = Some(path);
    state.auth_watch = Some(watch);
    Ok(state.client.insert(client))
}

fn handle_workspace_close(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.close_workspace();
    ok(&req.id, json!({ "closed": true }))
}

fn handle_connection_state(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    ok(
        &req.id,
        json!({
            "state": client.connection_state(),
            "lastError": client.last_error(),
        }),
    )
}

fn handle_connection_reconnect(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    let next = client.connect();
    ok(
        &req.id,
        json!({
            "state": next,
            "lastError": client.last_error(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "workspace.close" => Some(handle_workspace_close(state, req)),
        "connection.state" => Some(handle_connection_state(state, req)),
        "connection.reconnect" => Some(handle_connection_reconnect(state, req)),
        _ => None,
    }
}
