use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_resultsd");
    let mut child = Command::new(exe)
        .env_remove("RESULTSD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn resultsd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

/// Sends one request and returns (events pushed before the response, response).
fn exchange(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> (Vec<serde_json::Value>, serde_json::Value) {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut events = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read line");
        assert!(!line.trim().is_empty(), "empty line for {}", method);
        let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse json");
        if value.get("event").is_some() {
            events.push(value);
            continue;
        }
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
        return (events, value);
    }
}

#[test]
fn collection_changes_and_auth_transitions_are_pushed_as_events() {
    let workspace = temp_dir("resultsd-live-events");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let (events, resp) = exchange(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(resp["ok"], json!(true));
    assert_eq!(
        events,
        vec![json!({ "event": "auth.stateChanged", "user": null })]
    );

    let (events, resp) = exchange(
        &mut stdin,
        &mut reader,
        "2",
        "listen.start",
        json!({ "collection": "students" }),
    );
    assert!(events.is_empty());
    assert_eq!(resp["result"]["value"], json!([]));
    let sub_id = resp["result"]["subscriptionId"]
        .as_str()
        .expect("subscriptionId")
        .to_string();

    let (events, resp) = exchange(
        &mut stdin,
        &mut reader,
        "3",
        "students.save",
        json!({ "value": [{ "name": "Grace" }] }),
    );
    assert_eq!(resp["result"]["saved"], json!(true));
    assert_eq!(
        events,
        vec![json!({
            "event": "collection.changed",
            "subscriptionId": sub_id,
            "collection": "students",
            "value": [{ "name": "Grace" }]
        })]
    );

    let (events, _) = exchange(
        &mut stdin,
        &mut reader,
        "4",
        "marks.save",
        json!({ "value": [1, 2] }),
    );
    assert!(events.is_empty(), "unrelated collection must not notify");

    let (events, resp) = exchange(
        &mut stdin,
        &mut reader,
        "5",
        "auth.signUp",
        json!({
            "email": "ev@school.org",
            "password": "password",
            "name": "Ev",
            "role": "teacher"
        }),
    );
    assert_eq!(resp["result"]["success"], json!(true));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["event"], json!("auth.stateChanged"));
    assert_eq!(events[0]["user"]["email"], json!("ev@school.org"));
    assert!(events[0]["user"].get("token").is_none());

    let (_, resp) = exchange(
        &mut stdin,
        &mut reader,
        "6",
        "listen.stop",
        json!({ "subscriptionId": sub_id }),
    );
    assert_eq!(resp["result"]["stopped"], json!(true));
    let (events, _) = exchange(
        &mut stdin,
        &mut reader,
        "7",
        "students.save",
        json!({ "value": [] }),
    );
    assert!(events.is_empty());

    let (_, resp) = exchange(
        &mut stdin,
        &mut reader,
        "8",
        "listen.stop",
        json!({ "subscriptionId": sub_id }),
    );
    assert_eq!(resp["error"]["code"], json!("not_found"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn bad_params_and_unknown_methods_are_reported() {
    let workspace = temp_dir("resultsd-bad-params");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let (_, resp) = exchange(&mut stdin, &mut reader, "1", "workspace.select", json!({}));
    assert_eq!(resp["error"]["code"], json!("bad_params"));

    let _ = exchange(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let (_, resp) = exchange(
        &mut stdin,
        &mut reader,
        "3",
        "auth.signUp",
        json!({ "email": "a@b.org", "password": "password", "role": "principal" }),
    );
    assert_eq!(resp["error"]["code"], json!("bad_params"));

    let (_, resp) = exchange(
        &mut stdin,
        &mut reader,
        "4",
        "listen.start",
        json!({ "collection": "sessions" }),
    );
    assert_eq!(resp["error"]["code"], json!("bad_params"));

    let (_, resp) = exchange(&mut stdin, &mut reader, "5", "grades.compute", json!({}));
    assert_eq!(resp["error"]["code"], json!("not_implemented"));

    let (_, resp) = exchange(&mut stdin, &mut reader, "6", "teachers.delete", json!({}));
    assert_eq!(resp["error"]["code"], json!("not_implemented"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
