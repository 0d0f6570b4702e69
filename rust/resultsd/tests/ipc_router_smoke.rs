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

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    // Event lines may precede the response.
    let value = loop {
        let mut line = String::new();
        reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        if value.get("event").is_none() {
            break value;
        }
    };
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("resultsd-router-smoke");
    let bundle_out = workspace.join("smoke-backup.zip");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let before = request(&mut stdin, &mut reader, "0", "teachers.get", json!({}));
    assert_eq!(
        before["error"]["code"].as_str(),
        Some("no_workspace"),
        "{before}"
    );

    let _ = request(&mut stdin, &mut reader, "1", "health", json!({}));
    let selected = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["result"]["connection"], json!("connected"));

    let signed_up = request(
        &mut stdin,
        &mut reader,
        "3",
        "auth.signUp",
        json!({
            "email": "smoke@school.org",
            "password": "password",
            "name": "Smoke",
            "role": "admin",
            "department": "Office"
        }),
    );
    assert_eq!(signed_up["result"]["success"], json!(true));
    let uid = signed_up["result"]["user"]["uid"]
        .as_str()
        .expect("uid")
        .to_string();

    let _ = request(&mut stdin, &mut reader, "4", "auth.currentUser", json!({}));
    let is_admin = request(&mut stdin, &mut reader, "5", "roles.isAdmin", json!({}));
    assert_eq!(is_admin["result"]["isAdmin"], json!(true));
    let _ = request(&mut stdin, &mut reader, "6", "roles.isTeacher", json!({ "uid": uid }));
    let role = request(&mut stdin, &mut reader, "7", "roles.get", json!({}));
    assert_eq!(role["result"]["role"], json!("admin"));
    let _ = request(&mut stdin, &mut reader, "8", "users.get", json!({ "uid": uid }));

    let collections = [
        ("teachers", json!([{ "id": "t1" }])),
        ("students", json!([{ "id": "s1" }])),
        ("marks", json!([{ "s": "s1", "m": 90 }])),
        ("departmentData", json!({ "Maths": { "hod": "t1" } })),
        ("classSubjects", json!({ "7A": ["Maths"] })),
        ("proformaA", json!({ "t.one@school.org": { "grade": "A" } })),
        ("proformaB", json!({ "t1": { "grade": "B" } })),
    ];
    for (i, (name, value)) in collections.iter().enumerate() {
        let saved = request(
            &mut stdin,
            &mut reader,
            &format!("9.{i}.s"),
            &format!("{name}.save"),
            json!({ "value": value }),
        );
        assert_eq!(saved["result"]["saved"], json!(true), "{name}");
        let got = request(
            &mut stdin,
            &mut reader,
            &format!("9.{i}.g"),
            &format!("{name}.get"),
            json!({}),
        );
        if *name != "proformaA" {
            assert_eq!(&got["result"]["value"], value, "{name}");
        }
    }

    let _ = request(
        &mut stdin,
        &mut reader,
        "10",
        "sessions.save",
        json!({ "sessionId": "sess-1", "value": { "uid": uid } }),
    );
    let _ = request(&mut stdin, &mut reader, "11", "sessions.get", json!({ "sessionId": "sess-1" }));
    let _ = request(&mut stdin, &mut reader, "12", "sessions.clear", json!({}));

    let started = request(
        &mut stdin,
        &mut reader,
        "13",
        "listen.start",
        json!({ "collection": "marks" }),
    );
    let sub_id = started["result"]["subscriptionId"]
        .as_str()
        .unwrap_or("")
        .to_string();
    let _ = request(
        &mut stdin,
        &mut reader,
        "14",
        "listen.stop",
        json!({ "subscriptionId": sub_id }),
    );

    let _ = request(
        &mut stdin,
        &mut reader,
        "15",
        "backup.exportBundle",
        json!({ "outPath": bundle_out.to_string_lossy() }),
    );
    let cleanup = request(&mut stdin, &mut reader, "16", "maintenance.cleanup", json!({}));
    assert_eq!(cleanup["result"], json!({ "successful": 6, "failed": 0, "total": 6 }));
    let _ = request(
        &mut stdin,
        &mut reader,
        "17",
        "backup.importBundle",
        json!({ "inPath": bundle_out.to_string_lossy() }),
    );
    let _ = request(&mut stdin, &mut reader, "18", "connection.state", json!({}));
    let _ = request(&mut stdin, &mut reader, "19", "connection.reconnect", json!({}));
    let _ = request(&mut stdin, &mut reader, "20", "auth.signOut", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "21",
        "auth.signIn",
        json!({ "email": "smoke@school.org", "password": "password" }),
    );

    let _ = request(&mut stdin, &mut reader, "22", "workspace.close", json!({}));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
