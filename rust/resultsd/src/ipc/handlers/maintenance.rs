use crate::backup;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{require_client, require_str, try_resp};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_cleanup(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    ok(&req.id, json!(client.cleanup_data()))
}

fn handle_export_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    let out_path = PathBuf::from(try_resp!(require_str(req, "outPath")));
    if !client.is_connected() {
        return err(&req.id, "not_connected", "data store not connected", None);
    }
    match backup::export_bundle(client.store().as_ref(), &out_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "outPath": out_path.to_string_lossy(),
                "bundleFormat": summary.bundle_format,
                "entryCount": summary.entry_count,
                "topLevelKeys": summary.top_level_keys,
            }),
        ),
        Err(e) => err(&req.id, "io_failed", format!("{e:?}"), None),
    }
}

fn handle_import_bundle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    let in_path = PathBuf::from(try_resp!(require_str(req, "inPath")));
    if !client.is_connected() {
        return err(&req.id, "not_connected", "data store not connected", None);
    }
    match backup::import_bundle(client.store().as_ref(), &in_path) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "bundleFormatDetected": summary.bundle_format_detected,
                "topLevelKeys": summary.top_level_keys,
            }),
        ),
        Err(e) => err(&req.id, "import_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "maintenance.cleanup" => Some(handle_cleanup(state, req)),
        "backup.exportBundle" => Some(handle_export_bundle(state, req)),
        "backup.importBundle" => Some(handle_import_bundle(state, req)),
        _ => None,
    }
}
