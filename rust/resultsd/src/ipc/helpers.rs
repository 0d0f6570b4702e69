/// Unwraps `Ok`, or returns the `Err` envelope from the handler.
macro_rules! try_resp {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(resp) => return resp,
        }
    };
}
pub(crate) use try_resp;

use crate::client::ResultsClient;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};

pub fn require_client<'a>(
    state: &'a AppState,
    req: &Request,
) -> Result<&'a ResultsClient, serde_json::Value> {
    state
        .client
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn require_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {key}"), None))
}

pub fn opt_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

/// `params.value`, with a missing value read as null.
pub fn value_param(req: &Request) -> serde_json::Value {
    req.params
        .get("value")
        .cloned()
        .unwrap_or(serde_json::Value::Null)
}
