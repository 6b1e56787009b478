//! Webview front-end using `wry` + `tao`.
//!
//! Architecture:
//! - The dashboard is loaded from `shell.dashboard_url`.
//! - `with_initialization_script` injects the bootstrap script and an IPC bridge
//!   into every document before it hydrates.
//! - The bridge reports scrolls, capture-phase clicks, unloads and route changes
//!   via `window.ipc.postMessage()`; the IPC handler forwards them to the event
//!   loop as user events.
//! - [`WebviewHost`] implements the host surfaces: viewport writes become
//!   `window.scrollTo` evaluations and timers wake the loop with
//!   `ControlFlow::WaitUntil`.
//! - Frame callbacks run when the page's own `requestAnimationFrame` fires: a
//!   pending frame asks the bridge for one, and the bridge answers with a
//!   `frame` message. If no answer arrives within [`FRAME_FALLBACK`] (the page is
//!   still loading, or the script was dropped) the frame runs anyway.
//!
//! `window.scrollTo` is still an asynchronous evaluation issued from the frame
//! callback, so it lands shortly after the animation frame that triggered it,
//! not inside it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tao::event::{Event, WindowEvent};
use tao::event_loop::{ControlFlow, EventLoop, EventLoopBuilder, EventLoopProxy};
use tao::window::WindowBuilder;
use tracing::{debug, info, warn};
use wry::WebViewBuilder;

use crate::app::App;
use crate::database::Database;
use crate::host::{
    BrowserSurfaces, ClickEvent, ClickListener, DocumentEvents, FrameScheduler, HistoryControl,
    HostEnvironment, ScrollRestorationMode, Task, TaskQueue, UnloadListener, Viewport,
};
use crate::platform;
use crate::services::bootstrap;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::storage::sqlite::ABANDONED_AFTER;
use crate::storage::{MemorySessionStorage, SessionStorage, SqliteSessionStorage};

#[derive(Debug)]
enum UserEvent {
    Ipc(String),
    EvalScript(String),
}

/// Messages posted by the injected bridge.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
enum BridgeMessage {
    Scroll { y: f64 },
    Click { y: f64, path: Vec<String>, href: Option<String> },
    BeforeUnload { y: f64 },
    Route { url: String },
    ScrollSnapshot { offset: u32 },
    Frame,
}

/// How long a requested animation frame may go unanswered before it runs anyway.
const FRAME_FALLBACK: Duration = Duration::from_millis(50);

const BRIDGE_JS: &str = r#"(function(){
if(typeof window==='undefined'||!window.ipc||window.__scrollAnchorBridge)return;
window.__scrollAnchorBridge=true;
function y(){return Math.max(0,window.scrollY||window.pageYOffset||0)}
function post(m){try{window.ipc.postMessage(JSON.stringify(m))}catch(e){}}
var pending=false;
window.addEventListener('scroll',function(){
  if(pending)return;pending=true;
  requestAnimationFrame(function(){pending=false;post({cmd:'scroll',y:y()})});
},{passive:true});
window.addEventListener('beforeunload',function(){post({cmd:'before_unload',y:y()})});
document.addEventListener('click',function(e){
  var p=[];for(var n=e.target;n&&n.tagName;n=n.parentElement)p.push(n.tagName.toLowerCase());
  var a=e.target&&e.target.closest?e.target.closest('a'):null;
  post({cmd:'click',y:y(),path:p,href:a?a.href:null});
},true);
function route(){post({cmd:'route',url:location.href})}
['pushState','replaceState'].forEach(function(k){
  var orig=history[k];
  history[k]=function(){var r=orig.apply(this,arguments);route();return r};
});
window.addEventListener('popstate',route);
window.__scrollAnchorFrame=function(){requestAnimationFrame(function(){post({cmd:'frame'})})};
route();
})();"#;

/// Host surfaces backed by the webview and the event loop.
struct WebviewHost {
    scroll_y: Cell<f64>,
    restoration: Cell<Option<ScrollRestorationMode>>,
    started: Instant,
    queue: TaskQueue,
    frame_requested: Cell<Option<Instant>>,
    storage: Rc<dyn SessionStorage>,
    proxy: EventLoopProxy<UserEvent>,
    unload_listeners: RefCell<Vec<UnloadListener>>,
    click_listeners: RefCell<Vec<ClickListener>>,
}

impl WebviewHost {
    fn new(storage: Rc<dyn SessionStorage>, proxy: EventLoopProxy<UserEvent>) -> Rc<Self> {
        Rc::new(Self {
            scroll_y: Cell::new(0.0),
            restoration: Cell::new(Some(ScrollRestorationMode::Auto)),
            started: Instant::now(),
            queue: TaskQueue::new(),
            frame_requested: Cell::new(None),
            storage,
            proxy,
            unload_listeners: RefCell::new(Vec::new()),
            click_listeners: RefCell::new(Vec::new()),
        })
    }

    fn eval(&self, js: String) {
        let _ = self.proxy.send_event(UserEvent::EvalScript(js));
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn dispatch_click(&self, event: &ClickEvent) {
        let listeners: Vec<ClickListener> = self.click_listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
    }

    fn dispatch_before_unload(&self) {
        let listeners: Vec<UnloadListener> = self.unload_listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }

    /// Asks the page for an animation frame, unless one is already on its way.
    fn request_animation_frame(&self) {
        if self.frame_requested.get().is_none() {
            self.frame_requested.set(Some(Instant::now()));
            self.eval("window.__scrollAnchorFrame&&window.__scrollAnchorFrame()".to_string());
        }
    }

    /// Runs the queued frame callbacks.
    fn on_animation_frame(&self) {
        self.frame_requested.set(None);
        self.queue.run_frame();
        if self.queue.pending_frames() > 0 {
            self.request_animation_frame();
        }
    }

    /// Runs every due timer and any overdue frame, then says when to wake up next.
    fn pump(&self) -> ControlFlow {
        while let Some((_, task)) = self.queue.pop_due(self.elapsed()) {
            task();
        }
        if let Some(requested) = self.frame_requested.get() {
            if requested.elapsed() >= FRAME_FALLBACK {
                debug!("animation frame overdue; running frame callbacks");
                self.on_animation_frame();
            }
        }

        let timer = self.queue.next_due().map(|due| self.started + due);
        let frame = self
            .frame_requested
            .get()
            .filter(|_| self.queue.pending_frames() > 0)
            .map(|requested| requested + FRAME_FALLBACK);
        match (timer, frame) {
            (Some(a), Some(b)) => ControlFlow::WaitUntil(a.min(b)),
            (Some(at), None) | (None, Some(at)) => ControlFlow::WaitUntil(at),
            (None, None) => ControlFlow::Wait,
        }
    }
}

impl Viewport for WebviewHost {
    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn scroll_to(&self, y: u32) {
        self.scroll_y.set(f64::from(y));
        self.eval(format!("window.scrollTo(0,{})", y));
    }
}

impl FrameScheduler for WebviewHost {
    fn request_frame(&self, task: Task) {
        self.queue.push_frame(task);
        self.request_animation_frame();
    }

    fn set_timeout(&self, delay: Duration, task: Task) {
        self.queue.push_timer(self.elapsed() + delay, task);
    }
}

impl HistoryControl for WebviewHost {
    fn scroll_restoration(&self) -> Option<ScrollRestorationMode> {
        self.restoration.get()
    }

    fn set_scroll_restoration(&self, mode: ScrollRestorationMode) -> bool {
        let value = match mode {
            ScrollRestorationMode::Auto => "auto",
            ScrollRestorationMode::Manual => "manual",
        };
        self.eval(format!(
            "if('scrollRestoration' in history)history.scrollRestoration='{}'",
            value
        ));
        self.restoration.set(Some(mode));
        true
    }
}

impl DocumentEvents for WebviewHost {
    fn add_before_unload_listener(&self, listener: UnloadListener) {
        self.unload_listeners.borrow_mut().push(listener);
    }

    fn add_click_capture_listener(&self, listener: ClickListener) {
        self.click_listeners.borrow_mut().push(listener);
    }
}

impl HostEnvironment for Rc<WebviewHost> {
    fn surfaces(&self) -> Option<BrowserSurfaces> {
        Some(BrowserSurfaces {
            viewport: self.clone(),
            scheduler: self.clone(),
            history: self.clone(),
            document: self.clone(),
            storage: self.storage.clone(),
        })
    }
}

fn handle_ipc(host: &WebviewHost, app: &mut App, body: &str) {
    let msg: BridgeMessage = match serde_json::from_str(body) {
        Ok(m) => m,
        Err(e) => {
            debug!(error = %e, "ignoring unknown bridge message");
            return;
        }
    };
    match msg {
        BridgeMessage::Scroll { y } => host.scroll_y.set(y),
        BridgeMessage::Click { y, path, href } => {
            host.scroll_y.set(y);
            host.dispatch_click(&ClickEvent { path, href });
        }
        BridgeMessage::BeforeUnload { y } => {
            host.scroll_y.set(y);
            host.dispatch_before_unload();
        }
        BridgeMessage::Route { url } => {
            app.navigate(&url);
        }
        // Snapshots written by the in-page bootstrap; the Rust listeners already
        // persisted the same offset.
        BridgeMessage::ScrollSnapshot { offset } => host.scroll_y.set(f64::from(offset)),
        BridgeMessage::Frame => host.on_animation_frame(),
    }
}

fn open_storage(session_db: &str) -> (Rc<dyn SessionStorage>, Option<Rc<SqliteSessionStorage>>) {
    let data_dir = platform::get_data_dir();
    let opened = std::fs::create_dir_all(&data_dir)
        .map_err(|e| e.to_string())
        .and_then(|_| Database::open(data_dir.join(session_db)).map_err(|e| e.to_string()))
        .and_then(|db| SqliteSessionStorage::begin(Arc::new(db)).map_err(|e| e.to_string()));
    match opened {
        Ok(storage) => {
            if let Err(e) = storage.purge_abandoned(ABANDONED_AFTER) {
                warn!(error = %e, "cannot purge abandoned sessions");
            }
            let storage = Rc::new(storage);
            (storage.clone(), Some(storage))
        }
        Err(e) => {
            warn!(error = %e, "falling back to in-memory session storage");
            (Rc::new(MemorySessionStorage::new()), None)
        }
    }
}

// ─── Main entry point ───

pub fn run() {
    let mut engine = SettingsEngine::new(None);
    let settings = engine.load().unwrap_or_default();
    crate::logging::init(&settings.shell.log_filter);

    let event_loop: EventLoop<UserEvent> = EventLoopBuilder::with_user_event().build();
    let proxy = event_loop.create_proxy();

    let (storage, sqlite) = open_storage(&settings.shell.session_db);
    let host = WebviewHost::new(storage, proxy.clone());
    let dashboard_url = settings.shell.dashboard_url.clone();
    let init_script = format!("{}\n{}", bootstrap::script(&settings.restoration), BRIDGE_JS);
    let mut app = App::start(&host, settings, &dashboard_url);

    let window = WindowBuilder::new()
        .with_title("scroll-anchor")
        .with_inner_size(tao::dpi::LogicalSize::new(1280.0, 800.0))
        .build(&event_loop)
        .expect("Failed to create window");

    let ipc_proxy = proxy.clone();
    let builder = WebViewBuilder::new()
        .with_initialization_script(&init_script)
        .with_url(&dashboard_url)
        .with_ipc_handler(move |msg: wry::http::Request<String>| {
            let _ = ipc_proxy.send_event(UserEvent::Ipc(msg.body().clone()));
        })
        .with_devtools(cfg!(debug_assertions));

    #[cfg(target_os = "linux")]
    let webview = {
        use tao::platform::unix::WindowExtUnix;
        use wry::WebViewBuilderExtUnix;
        let vbox = window.default_vbox().expect("Failed to get GTK vbox");
        builder.build_gtk(vbox).expect("Failed to create WebView")
    };

    #[cfg(not(target_os = "linux"))]
    let webview = builder.build(&window).expect("Failed to create WebView");

    info!(url = %dashboard_url, "dashboard loaded");

    event_loop.run(move |event, _, control_flow| {
        match event {
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                app.shutdown();
                if let Some(storage) = &sqlite {
                    if let Err(e) = storage.end_session() {
                        warn!(error = %e, "failed to end session storage");
                    }
                }
                *control_flow = ControlFlow::Exit;
                return;
            }
            Event::UserEvent(UserEvent::Ipc(body)) => handle_ipc(&host, &mut app, &body),
            Event::UserEvent(UserEvent::EvalScript(js)) => {
                let _ = webview.evaluate_script(&js);
            }
            Event::MainEventsCleared => *control_flow = host.pump(),
            _ => {}
        }
    });
}
