use crate::client::Collection;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_client, require_str, try_resp};
use crate::ipc::types::{AppState, Listener, Request};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

#[derive(Default)]
struct ListenSlot {
    id: Option<String>,
    initial: Option<serde_json::Value>,
}

fn handle_listen_start(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = try_resp!(require_str(req, "collection"));
    let Some(collection) = Collection::from_name(name) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown collection: {name}"),
            None,
        );
    };
    let client = try_resp!(require_client(state, req));

    // The store calls back once during registration, before the id exists.
    // That first value goes into the response; later ones become events.
    let slot: Arc<Mutex<ListenSlot>> = Default::default();
    let events = state.events.clone();
    let cell = Arc::clone(&slot);
    let subscription = client.listen(collection, move |value| {
        let mut slot = cell.lock();
        let Some(id) = slot.id.clone() else {
            slot.initial = Some(value.clone());
            return;
        };
        let _ = events.send(json!({
            "event": "collection.changed",
            "subscriptionId": id,
            "collection": collection.path(),
            "value": value,
        }));
    });
    if !subscription.is_active() {
        return err(
            &req.id,
            "not_connected",
            "listener not registered: data store not connected",
            None,
        );
    }

    let subscription_id = subscription.id().to_string();
    let initial = {
        let mut slot = slot.lock();
        slot.id = Some(subscription_id.clone());
        slot.initial.take()
    };
    state.listeners.insert(
        subscription_id.clone(),
        Listener {
            collection,
            subscription,
        },
    );
    ok(
        &req.id,
        json!({
            "subscriptionId": subscription_id,
            "collection": collection.path(),
            "value": initial.unwrap_or_else(|| collection.empty()),
        }),
    )
}

fn handle_listen_stop(state: &mut AppState, req: &Request) -> serde_json::Value {
    let subscription_id = try_resp!(require_str(req, "subscriptionId"));
    match state.listeners.remove(subscription_id) {
        Some(listener) => {
            listener.subscription.unsubscribe();
            ok(
                &req.id,
                json!({ "stopped": true, "collection": listener.collection.path() }),
            )
        }
        None => err(&req.id, "not_found", "subscription not found", None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "listen.start" => Some(handle_listen_start(state, req)),
        "listen.stop" => Some(handle_listen_stop(state, req)),
        _ => None,
    }
}
