use crate::client::Collection;
use crate::ipc::error::ok;
use crate::ipc::helpers::{require_client, require_str, try_resp, value_param};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_collection(
    state: &mut AppState,
    req: &Request,
    collection: Collection,
    action: &str,
) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    match action {
        "save" => ok(
            &req.id,
            json!({ "saved": client.save(collection, value_param(req)) }),
        ),
        _ => ok(&req.id, json!({ "value": client.get(collection) })),
    }
}

fn handle_sessions_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    let session_id = try_resp!(require_str(req, "sessionId"));
    ok(
        &req.id,
        json!({ "saved": client.save_session(session_id, value_param(req)) }),
    )
}

fn handle_sessions_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    let session_id = try_resp!(require_str(req, "sessionId"));
    ok(&req.id, json!({ "value": client.get_session(session_id) }))
}

fn handle_sessions_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    ok(&req.id, json!({ "cleared": client.clear_session() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "sessions.save" => return Some(handle_sessions_save(state, req)),
        "sessions.get" => return Some(handle_sessions_get(state, req)),
        "sessions.clear" => return Some(handle_sessions_clear(state, req)),
        _ => {}
    }

    let (name, action) = req.method.split_once('.')?;
    let collection = Collection::from_name(name)?;
    match action {
        "save" | "get" => Some(handle_collection(state, req, collection, action)),
        _ => None,
    }
}
