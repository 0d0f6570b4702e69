use crate::client::{Role, SignUpProfile};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{opt_str, require_client, require_str, try_resp};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn handle_sign_in(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    let email = try_resp!(require_str(req, "email"));
    let password = try_resp!(require_str(req, "password"));
    ok(&req.id, json!(client.sign_in(email, password)))
}

fn handle_sign_up(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    let email = try_resp!(require_str(req, "email"));
    let password = try_resp!(require_str(req, "password"));
    let role: Role = match require_str(req, "role").map(str::parse::<Role>) {
        Ok(Ok(role)) => role,
        Ok(Err(e)) => return err(&req.id, "bad_params", e, None),
        Err(resp) => return resp,
    };
    let profile = SignUpProfile {
        name: opt_str(req, "name").unwrap_or("").trim().to_string(),
        role,
        department: opt_str(req, "department").unwrap_or("").trim().to_string(),
    };
    ok(&req.id, json!(client.sign_up(email, password, &profile)))
}

fn handle_sign_out(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    ok(&req.id, json!(client.sign_out()))
}

fn handle_current_user(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    ok(&req.id, json!({ "user": client.current_user() }))
}

fn handle_roles(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    let uid = opt_str(req, "uid");
    let result = match req.method.as_str() {
        "roles.get" => {
            let uid = uid.map(str::to_string).or_else(|| client.current_user().map(|u| u.uid));
            json!({ "role": client.get_role(uid.as_deref()) })
        }
        "roles.isAdmin" => json!({ "isAdmin": client.is_admin(uid) }),
        _ => json!({ "isTeacher": client.is_teacher(uid) }),
    };
    ok(&req.id, result)
}

fn handle_users_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let client = try_resp!(require_client(state, req));
    let uid = try_resp!(require_str(req, "uid"));
    ok(&req.id, json!({ "user": client.get_user_record(uid) }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.signIn" => Some(handle_sign_in(state, req)),
        "auth.signUp" => Some(handle_sign_up(state, req)),
        "auth.signOut" => Some(handle_sign_out(state, req)),
        "auth.currentUser" => Some(handle_current_user(state, req)),
        "roles.get" | "roles.isAdmin" | "roles.isTeacher" => Some(handle_roles(state, req)),
        "users.get" => Some(handle_users_get(state, req)),
        _ => None,
    }
}
