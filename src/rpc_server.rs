//! Headless JSON-RPC driver over stdin/stdout.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"navigate", "params":{"url":"/chat"}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr. Session storage lives in SQLite under the data directory
//! and is ended when stdin closes.

use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::sync::Arc;

use scroll_anchor::database::Database;
use scroll_anchor::logging;
use scroll_anchor::platform;
use scroll_anchor::rpc_handler::{handle_method, RpcSession};
use scroll_anchor::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use scroll_anchor::storage::sqlite::ABANDONED_AFTER;
use scroll_anchor::storage::{MemorySessionStorage, SessionStorage, SqliteSessionStorage};
use scroll_anchor::types::settings::ShellSettings;

use serde_json::{json, Value};
use tracing::{info, warn};

fn open_session_storage(settings: &ShellSettings) -> Option<Rc<SqliteSessionStorage>> {
    let data_dir = platform::get_data_dir();
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        warn!(error = %e, dir = %data_dir.display(), "cannot create data directory");
        return None;
    }
    let db_path = data_dir.join(&settings.shell.session_db);
    let db = match Database::open(&db_path) {
        Ok(db) => Arc::new(db),
        Err(e) => {
            warn!(error = %e, path = %db_path.display(), "cannot open session database");
            return None;
        }
    };
    match SqliteSessionStorage::begin(db) {
        Ok(storage) => {
            if let Err(e) = storage.purge_abandoned(ABANDONED_AFTER) {
                warn!(error = %e, "cannot purge abandoned sessions");
            }
            Some(Rc::new(storage))
        }
        Err(e) => {
            warn!(error = %e, "cannot start session storage");
            None
        }
    }
}

fn respond(out: &mut impl Write, value: &Value) {
    let _ = writeln!(out, "{}", value);
    let _ = out.flush();
}

fn main() {
    let mut engine = SettingsEngine::new(None);
    let settings = engine.load().unwrap_or_default();
    logging::init(&settings.shell.log_filter);

    let sqlite = open_session_storage(&settings);
    let storage: Rc<dyn SessionStorage> = match &sqlite {
        Some(s) => s.clone(),
        None => {
            warn!("falling back to in-memory session storage");
            Rc::new(MemorySessionStorage::new())
        }
    };

    let initial_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| settings.shell.dashboard_url.clone());
    let mut session = RpcSession::new(settings, storage, &initial_url);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    respond(
        &mut out,
        &json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")}),
    );

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                respond(&mut out, &json!({"id": null, "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);
        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&mut session, method, &params) {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        respond(&mut out, &response);
    }

    let _ = handle_method(&mut session, "session.shutdown", &json!({}));
    if let Some(storage) = sqlite {
        if let Err(e) = storage.end_session() {
            warn!(error = %e, "failed to end session storage");
        }
    }
    info!("rpc driver exiting");
}
