//! Deterministic in-process browser host.
//!
//! [`HeadlessHost`] models just enough of a browser window to drive the scroll
//! subsystem without a rendering engine: a viewport with an optional scroll
//! limit, a frame pump, a virtual clock for timers, native scroll restoration,
//! and document listeners. Tests, the demo binary and the JSON-RPC driver all run
//! on it.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

use super::{
    BrowserSurfaces, ClickEvent, ClickListener, DocumentEvents, FrameScheduler, HistoryControl,
    HostEnvironment, ScrollRestorationMode, Task, TaskQueue, UnloadListener, Viewport,
};
use crate::storage::{MemorySessionStorage, SessionStorage};

/// Upper bound on frames pumped by [`HeadlessHost::run_until_idle`].
const MAX_IDLE_FRAMES: usize = 64;

pub struct HeadlessHost {
    scroll_y: Cell<f64>,
    max_scroll: Cell<Option<u32>>,
    restoration: Cell<Option<ScrollRestorationMode>>,
    now: Cell<Duration>,
    frames_run: Cell<u64>,
    queue: TaskQueue,
    storage: Rc<dyn SessionStorage>,
    unload_listeners: RefCell<Vec<UnloadListener>>,
    click_listeners: RefCell<Vec<ClickListener>>,
    scroll_journal: RefCell<Vec<u32>>,
}

impl HeadlessHost {
    /// A window with in-memory session storage and native restoration set to `auto`.
    pub fn new() -> Rc<Self> {
        Self::with_storage(Rc::new(MemorySessionStorage::new()))
    }

    pub fn with_storage(storage: Rc<dyn SessionStorage>) -> Rc<Self> {
        Rc::new(Self {
            scroll_y: Cell::new(0.0),
            max_scroll: Cell::new(None),
            restoration: Cell::new(Some(ScrollRestorationMode::Auto)),
            now: Cell::new(Duration::ZERO),
            frames_run: Cell::new(0),
            queue: TaskQueue::new(),
            storage,
            unload_listeners: RefCell::new(Vec::new()),
            click_listeners: RefCell::new(Vec::new()),
            scroll_journal: RefCell::new(Vec::new()),
        })
    }

    /// Models an older engine without a scroll-restoration switch.
    pub fn without_restoration_control(self: Rc<Self>) -> Rc<Self> {
        self.restoration.set(None);
        self
    }

    pub fn storage(&self) -> Rc<dyn SessionStorage> {
        self.storage.clone()
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn frames_run(&self) -> u64 {
        self.frames_run.get()
    }

    /// Current offset, truncated the same way a persisted snapshot would be.
    pub fn offset(&self) -> u32 {
        self.scroll_y.get().max(0.0) as u32
    }

    /// Limits how far the document can scroll, as short content does.
    /// Shrinking below the current offset pulls the viewport back.
    pub fn set_max_scroll(&self, max: Option<u32>) {
        self.max_scroll.set(max);
        if let Some(limit) = max {
            if self.scroll_y.get() > f64::from(limit) {
                self.scroll_y.set(f64::from(limit));
            }
        }
    }

    /// The user scrolls. Not recorded in the journal.
    pub fn user_scroll(&self, y: f64) {
        self.scroll_y.set(self.clamp(y));
    }

    /// Content reflow moves the viewport without any `scroll_to` call.
    pub fn reflow_to(&self, y: u32) {
        trace!(y, "content reflow");
        self.scroll_y.set(self.clamp(f64::from(y)));
    }

    /// Offsets passed to [`Viewport::scroll_to`], oldest first.
    pub fn scroll_journal(&self) -> Vec<u32> {
        self.scroll_journal.borrow().clone()
    }

    pub fn clear_journal(&self) {
        self.scroll_journal.borrow_mut().clear();
    }

    pub fn pending_frames(&self) -> usize {
        self.queue.pending_frames()
    }

    pub fn pending_timers(&self) -> usize {
        self.queue.pending_timers()
    }

    /// Runs one rendering frame. Returns how many callbacks ran.
    pub fn run_frame(&self) -> usize {
        self.frames_run.set(self.frames_run.get() + 1);
        self.queue.run_frame()
    }

    pub fn run_frames(&self, count: usize) -> usize {
        (0..count).map(|_| self.run_frame()).sum()
    }

    /// Advances the virtual clock, firing timers in due order. Returns how many fired.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now.get() + by;
        let mut fired = 0;
        while let Some((due, task)) = self.queue.pop_due(target) {
            if due > self.now.get() {
                self.now.set(due);
            }
            task();
            fired += 1;
        }
        self.now.set(target);
        fired
    }

    /// Pumps frames until none are pending, then fires every timer, repeating
    /// until both queues are empty.
    pub fn run_until_idle(&self) {
        for _ in 0..MAX_IDLE_FRAMES {
            if self.queue.pending_frames() > 0 {
                self.run_frame();
                continue;
            }
            match self.queue.next_due() {
                Some(due) => {
                    let wait = due.saturating_sub(self.now.get());
                    self.advance(wait);
                }
                None => break,
            }
        }
    }

    /// Dispatches a click through capture listeners. Returns whether the click
    /// would start a navigation.
    pub fn dispatch_click(&self, event: &ClickEvent) -> bool {
        let listeners: Vec<ClickListener> = self.click_listeners.borrow().clone();
        for listener in listeners {
            listener(event);
        }
        event.targets_link()
    }

    /// Fires the "page about to unload" signal.
    pub fn dispatch_before_unload(&self) {
        let listeners: Vec<UnloadListener> = self.unload_listeners.borrow().clone();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_counts(&self) -> (usize, usize) {
        (
            self.unload_listeners.borrow().len(),
            self.click_listeners.borrow().len(),
        )
    }

    fn clamp(&self, y: f64) -> f64 {
        let y = if y.is_nan() { 0.0 } else { y.max(0.0) };
        match self.max_scroll.get() {
            Some(limit) => y.min(f64::from(limit)),
            None => y,
        }
    }
}

impl Viewport for HeadlessHost {
    fn scroll_y(&self) -> f64 {
        self.scroll_y.get()
    }

    fn scroll_to(&self, y: u32) {
        self.scroll_journal.borrow_mut().push(y);
        self.scroll_y.set(self.clamp(f64::from(y)));
    }
}

impl FrameScheduler for HeadlessHost {
    fn request_frame(&self, task: Task) {
        self.queue.push_frame(task);
    }

    fn set_timeout(&self, delay: Duration, task: Task) {
        self.queue.push_timer(self.now.get() + delay, task);
    }
}

impl HistoryControl for HeadlessHost {
    fn scroll_restoration(&self) -> Option<ScrollRestorationMode> {
        self.restoration.get()
    }

    fn set_scroll_restoration(&self, mode: ScrollRestorationMode) -> bool {
        if self.restoration.get().is_none() {
            return false;
        }
        self.restoration.set(Some(mode));
        true
    }
}

impl DocumentEvents for HeadlessHost {
    fn add_before_unload_listener(&self, listener: UnloadListener) {
        self.unload_listeners.borrow_mut().push(listener);
    }

    fn add_click_capture_listener(&self, listener: ClickListener) {
        self.click_listeners.borrow_mut().push(listener);
    }
}

/// Surfaces of a shared headless window.
impl HostEnvironment for Rc<HeadlessHost> {
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

/// A render pass outside any browser window.
#[derive(Debug, Default, Clone, Copy)]
pub struct ServerRenderPass;

impl HostEnvironment for ServerRenderPass {
    fn surfaces(&self) -> Option<BrowserSurfaces> {
        None
    }
}
