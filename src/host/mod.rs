//! Host rendering surfaces.
//!
//! The scroll subsystem never talks to a concrete window. Everything it needs from
//! the host is expressed as a small trait:
//!
//! - [`Viewport`]: read and set the vertical scroll offset.
//! - [`FrameScheduler`]: run a task before the next rendering pass, or after a delay.
//! - [`HistoryControl`]: the native scroll-restoration mode switch.
//! - [`DocumentEvents`]: "page about to unload" and capture-phase click listeners.
//! - [`crate::storage::SessionStorage`]: the session-scoped persistence surface.
//!
//! Execution is single-threaded and cooperative, so surfaces are shared through
//! `Rc` and tasks are plain `FnOnce` closures.

pub mod headless;
pub mod scheduler;

pub use headless::{HeadlessHost, ServerRenderPass};
pub use scheduler::TaskQueue;

use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::storage::SessionStorage;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + 'static>;

pub type UnloadListener = Rc<dyn Fn()>;
pub type ClickListener = Rc<dyn Fn(&ClickEvent)>;

/// Vertical scroll control of the document viewport.
pub trait Viewport {
    /// Current offset as reported by the host, possibly fractional.
    fn scroll_y(&self) -> f64;
    fn scroll_to(&self, y: u32);
}

/// Scheduling primitives of the rendering engine.
pub trait FrameScheduler {
    /// Runs `task` immediately before the next rendering pass. Tasks requested
    /// while a frame is running go to the following frame.
    fn request_frame(&self, task: Task);
    fn set_timeout(&self, delay: Duration, task: Task);
}

/// Native scroll restoration performed by the host on history navigation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScrollRestorationMode {
    Auto,
    Manual,
}

pub trait HistoryControl {
    /// `None` when the host exposes no mode switch at all.
    fn scroll_restoration(&self) -> Option<ScrollRestorationMode>;
    /// Returns `false` when the switch is absent.
    fn set_scroll_restoration(&self, mode: ScrollRestorationMode) -> bool;
}

pub trait DocumentEvents {
    fn add_before_unload_listener(&self, listener: UnloadListener);
    /// Listener runs in the capture phase, before the click's default action.
    fn add_click_capture_listener(&self, listener: ClickListener);
}

/// A document click, described by the tag names on its composed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// Tag names from the target element up to the document root.
    pub path: Vec<String>,
    /// `href` of the nearest hyperlink, if the host resolved one.
    pub href: Option<String>,
}

impl ClickEvent {
    pub fn new<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            path: path.into_iter().map(Into::into).collect(),
            href: None,
        }
    }

    /// A click on an element nested inside `<a href=…>`.
    pub fn on_link(href: &str) -> Self {
        Self {
            path: vec!["span".into(), "a".into(), "nav".into(), "body".into(), "html".into()],
            href: Some(href.to_string()),
        }
    }

    /// True when the target is, or is contained within, a hyperlink element.
    pub fn targets_link(&self) -> bool {
        self.path.iter().any(|tag| tag.eq_ignore_ascii_case("a"))
    }
}

/// Every surface the scroll subsystem uses, as handed out by a browser host.
#[derive(Clone)]
pub struct BrowserSurfaces {
    pub viewport: Rc<dyn Viewport>,
    pub scheduler: Rc<dyn FrameScheduler>,
    pub history: Rc<dyn HistoryControl>,
    pub document: Rc<dyn DocumentEvents>,
    pub storage: Rc<dyn SessionStorage>,
}

/// Gives access to browser surfaces when the code runs inside a window.
pub trait HostEnvironment {
    /// `None` during non-browser render passes.
    fn surfaces(&self) -> Option<BrowserSurfaces>;
}
