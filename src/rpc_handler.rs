//! RPC method handler for the headless JSON-RPC driver.
//!
//! A host shell that renders the dashboard itself (Electron, a test harness)
//! drives a [`HeadlessHost`] through these methods: it reports user scrolls,
//! clicks, navigations and frame ticks, and applies the `applied` offsets
//! returned in each response to its real viewport.
//!
//! Kept separate from `rpc_server.rs` so it can be unit-tested.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::{json, Value};

use crate::app::App;
use crate::host::{ClickEvent, HeadlessHost};
use crate::services::signals::PreserveScrollSignal;
use crate::storage::SessionStorage;
use crate::types::page::PageId;
use crate::types::settings::ShellSettings;

/// One driven session: the headless window plus the app running in it.
pub struct RpcSession {
    host: Rc<HeadlessHost>,
    app: App,
    received: Rc<RefCell<Vec<PreserveScrollSignal>>>,
}

impl RpcSession {
    pub fn new(settings: ShellSettings, storage: Rc<dyn SessionStorage>, initial_url: &str) -> Self {
        let host = HeadlessHost::with_storage(storage);
        let app = App::start(&host, settings, initial_url);
        Self {
            host,
            app,
            received: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn host(&self) -> &Rc<HeadlessHost> {
        &self.host
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    /// Viewport state plus every offset applied since the last response.
    fn viewport_state(&self) -> Value {
        let applied = self.host.scroll_journal();
        self.host.clear_journal();
        json!({"viewport": self.host.offset(), "applied": applied})
    }

    fn with_viewport(&self, mut result: Value) -> Value {
        if let (Value::Object(map), Value::Object(extra)) = (&mut result, self.viewport_state()) {
            map.extend(extra);
        }
        result
    }
}

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(session: &mut RpcSession, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        "session.info" => {
            let app = &session.app;
            Ok(session.with_viewport(json!({
                "active": app.is_active(),
                "bootstrap": app.bootstrap_outcome(),
                "route": app.route().map(|r| r.to_string()),
                "page": app.active_page(),
                "phase": app.coordinator_phase(),
                "stored": app.stored_position().map(|p| p.offset),
                "now_ms": session.host.now().as_millis() as u64,
                "pending_frames": session.host.pending_frames(),
                "pending_timers": session.host.pending_timers(),
            })))
        }

        // ─── Navigation ───
        "navigate" => {
            let url = str_param(params, "url")?;
            let changed = session.app.navigate(url);
            Ok(session.with_viewport(json!({
                "changed": changed,
                "route": session.app.route().map(|r| r.to_string()),
                "page": session.app.active_page(),
            })))
        }
        "link.click" => {
            let url = str_param(params, "url")?;
            let event = match params.get("path") {
                None => ClickEvent::on_link(url),
                Some(Value::Array(tags)) => {
                    let path = tags
                        .iter()
                        .map(|t| t.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                        .ok_or("invalid path")?;
                    let mut event = ClickEvent::new(path);
                    if event.targets_link() {
                        event.href = Some(url.to_string());
                    }
                    event
                }
                Some(_) => return Err("invalid path".into()),
            };
            let navigates = session.host.dispatch_click(&event);
            let saved = session.app.stored_position().map(|p| p.offset);
            let changed = navigates && session.app.navigate(url);
            Ok(session.with_viewport(json!({
                "saved": saved,
                "changed": changed,
                "route": session.app.route().map(|r| r.to_string()),
                "page": session.app.active_page(),
            })))
        }
        "page.unload" => {
            session.host.dispatch_before_unload();
            Ok(session.with_viewport(json!({"saved": session.app.stored_position().map(|p| p.offset)})))
        }

        // ─── Viewport ───
        "viewport.scroll" => {
            let y = params.get("y").and_then(|v| v.as_f64()).ok_or("missing y")?;
            session.host.user_scroll(y);
            Ok(session.with_viewport(json!({})))
        }
        "viewport.reflow" => {
            if let Some(max) = params.get("max_scroll") {
                let limit = match max {
                    Value::Null => None,
                    v => Some(
                        v.as_u64()
                            .and_then(|n| u32::try_from(n).ok())
                            .ok_or("invalid max_scroll")?,
                    ),
                };
                session.host.set_max_scroll(limit);
            }
            if let Some(y) = params.get("y") {
                let y = y
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or("invalid y")?;
                session.host.reflow_to(y);
            }
            Ok(session.with_viewport(json!({})))
        }

        // ─── Scheduling ───
        "frame" => {
            let count = params.get("count").and_then(|v| v.as_u64()).unwrap_or(1);
            let ran = session.host.run_frames(count.min(1_000) as usize);
            Ok(session.with_viewport(json!({"callbacks": ran})))
        }
        "timers.advance" => {
            let ms = params.get("ms").and_then(|v| v.as_u64()).ok_or("missing ms")?;
            let fired = session.host.advance(Duration::from_millis(ms));
            Ok(session.with_viewport(json!({
                "fired": fired,
                "now_ms": session.host.now().as_millis() as u64,
            })))
        }
        "idle" => {
            session.host.run_until_idle();
            Ok(session.with_viewport(json!({
                "now_ms": session.host.now().as_millis() as u64,
                "phase": session.app.coordinator_phase(),
            })))
        }

        // ─── Store ───
        "store.read" => Ok(json!({"offset": session.app.stored_position().map(|p| p.offset)})),

        // ─── Signals ───
        "signals.subscribe" => {
            let slug = str_param(params, "page")?;
            let page = PageId::from_slug(slug).ok_or_else(|| format!("unknown page: {}", slug))?;
            let signals = session.app.signals().ok_or("session inactive")?;
            let sink = session.received.clone();
            let id = signals.subscribe(
                page,
                Rc::new(move |signal: &PreserveScrollSignal| sink.borrow_mut().push(*signal)),
            );
            Ok(json!({"id": id.to_string(), "signal": page.signal_name()}))
        }
        "signals.drain" => {
            let drained: Vec<String> = session
                .received
                .borrow_mut()
                .drain(..)
                .map(|s| s.name())
                .collect();
            Ok(json!(drained))
        }

        "session.shutdown" => {
            session.app.shutdown();
            Ok(session.with_viewport(json!({"saved": session.app.stored_position().map(|p| p.offset)})))
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
