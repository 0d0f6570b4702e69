use clap::Parser;
use resultsd::config::{self, Config};
use resultsd::ipc;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::Receiver;
use tracing::{error, info, warn};

fn flush_events(out: &mut impl Write, events: &Receiver<serde_json::Value>) {
    for event in events.try_iter() {
        let _ = writeln!(out, "{}", event);
    }
}

fn main() {
    let cfg = Config::parse();
    config::init_logging(&cfg);
    info!(version = env!("CARGO_PKG_VERSION"), "resultsd starting");

    let (mut state, events) = ipc::AppState::new();
    if let Some(path) = cfg.workspace.clone() {
        if let Err(e) = ipc::select_workspace(&mut state, path) {
            error!(error = %e, "startup workspace could not be opened");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    flush_events(&mut stdout, &events);
    let _ = stdout.flush();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id; report and move on.
                warn!(error = %e, "unparseable request line");
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        flush_events(&mut stdout, &events);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    state.close_workspace();
    info!("stdin closed, exiting");
}
