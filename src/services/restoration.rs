//! Reusable restoration strategy.
//!
//! Both the global coordinator and every page hook restore the viewport the same
//! way: read the stored offset once, apply it on the next frame, apply it again on
//! the frame after that, and optionally re-read and re-apply after a short timer.
//! Each activation is independent. A frame chain only applies while the storage
//! key it read from is still the current one; a chain outlived by a navigation to
//! a differently keyed route stops without touching the viewport.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::host::{FrameScheduler, Viewport};
use crate::managers::position_store::PositionStore;
use crate::types::route::{CurrentRoute, Route};
use crate::types::scroll::ScrollPosition;
use crate::types::settings::RestorationSettings;

/// Restore and persist capabilities over one store and one viewport.
///
/// The viewport is held weakly: listeners installed on the host keep bindings
/// alive, and the host must not be kept alive by its own listeners.
#[derive(Clone)]
pub struct ScrollBinding {
    store: Rc<PositionStore>,
    viewport: Weak<dyn Viewport>,
    route: CurrentRoute,
}

impl ScrollBinding {
    pub fn new(store: Rc<PositionStore>, viewport: &Rc<dyn Viewport>, route: CurrentRoute) -> Self {
        Self {
            store,
            viewport: Rc::downgrade(viewport),
            route,
        }
    }

    /// Convenience for a binding that owns a fresh route cell.
    pub fn detached(store: Rc<PositionStore>, viewport: &Rc<dyn Viewport>, route: Route) -> Self {
        Self::new(store, viewport, Rc::new(RefCell::new(route)))
    }

    pub fn store(&self) -> &Rc<PositionStore> {
        &self.store
    }

    pub fn route(&self) -> Route {
        self.route.borrow().clone()
    }

    pub fn set_route(&self, route: &Route) {
        *self.route.borrow_mut() = route.clone();
    }

    pub fn read(&self) -> Option<ScrollPosition> {
        self.store.read(&self.route.borrow())
    }

    /// Storage key for the current route.
    pub fn key(&self) -> String {
        self.store.key_for(&self.route.borrow())
    }

    /// Moves the viewport. Returns `false` once the viewport is gone.
    pub fn apply(&self, position: ScrollPosition) -> bool {
        match self.viewport.upgrade() {
            Some(viewport) => {
                viewport.scroll_to(position.offset);
                true
            }
            None => false,
        }
    }

    /// Reads the stored offset and applies it, if there is one.
    pub fn restore(&self) -> Option<ScrollPosition> {
        let position = self.read()?;
        self.apply(position).then_some(position)
    }

    /// Current viewport offset.
    pub fn snapshot(&self) -> Option<ScrollPosition> {
        self.viewport
            .upgrade()
            .map(|viewport| ScrollPosition::from_pixels(viewport.scroll_y()))
    }

    /// Snapshots the viewport into the store, overwriting any prior value.
    pub fn persist(&self) -> Option<ScrollPosition> {
        let position = self.snapshot()?;
        self.store
            .write(&self.route.borrow(), position)
            .then_some(position)
    }
}

/// Progress of one activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationPhase {
    Idle,
    Restoring,
}

/// How many attempts an activation schedules, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestorationPlan {
    pub frame_attempts: u8,
    pub delayed_fallback: Option<Duration>,
}

impl Default for RestorationPlan {
    fn default() -> Self {
        Self {
            frame_attempts: 2,
            delayed_fallback: Some(Duration::from_millis(100)),
        }
    }
}

impl RestorationPlan {
    pub fn coordinator(settings: &RestorationSettings) -> Self {
        Self {
            frame_attempts: settings.frame_attempts,
            delayed_fallback: settings.delayed_restore(),
        }
    }

    pub fn page_hook(settings: &RestorationSettings) -> Self {
        Self {
            frame_attempts: settings.frame_attempts,
            delayed_fallback: settings.page_delayed_restore(),
        }
    }
}

/// Handle to one scheduled restoration.
#[derive(Debug, Clone)]
pub struct Activation {
    id: u64,
    label: &'static str,
    target: Option<ScrollPosition>,
    phase: Rc<Cell<ActivationPhase>>,
    applied: Rc<Cell<u8>>,
}

impl Activation {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Offset read when the activation started.
    pub fn target(&self) -> Option<ScrollPosition> {
        self.target
    }

    pub fn phase(&self) -> ActivationPhase {
        self.phase.get()
    }

    /// Frame attempts that have run so far.
    pub fn attempts_applied(&self) -> u8 {
        self.applied.get()
    }

    pub fn is_settled(&self) -> bool {
        self.phase.get() == ActivationPhase::Idle
    }
}

pub struct RestorationStrategy {
    plan: RestorationPlan,
    scheduler: Rc<dyn FrameScheduler>,
    next_id: Cell<u64>,
}

impl RestorationStrategy {
    pub fn new(plan: RestorationPlan, scheduler: Rc<dyn FrameScheduler>) -> Self {
        Self {
            plan,
            scheduler,
            next_id: Cell::new(1),
        }
    }

    pub fn plan(&self) -> RestorationPlan {
        self.plan
    }

    /// Starts an activation: `Idle -> Restoring` when there is something to
    /// restore, back to `Idle` after the last frame attempt.
    pub fn activate(&self, binding: &ScrollBinding, label: &'static str) -> Activation {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let target = binding.read();
        let activation = Activation {
            id,
            label,
            target,
            phase: Rc::new(Cell::new(ActivationPhase::Idle)),
            applied: Rc::new(Cell::new(0)),
        };

        match target {
            Some(position) if self.plan.frame_attempts > 0 => {
                debug!(label, id, offset = position.offset, "scheduling restoration");
                activation.phase.set(ActivationPhase::Restoring);
                FrameChain {
                    scheduler: self.scheduler.clone(),
                    binding: binding.clone(),
                    key: binding.key(),
                    position,
                    remaining: self.plan.frame_attempts,
                    phase: activation.phase.clone(),
                    applied: activation.applied.clone(),
                    label,
                    id,
                }
                .schedule();
            }
            Some(_) => {}
            None => debug!(label, id, "no stored position; nothing to restore"),
        }

        if let Some(delay) = self.plan.delayed_fallback {
            let binding = binding.clone();
            self.scheduler.set_timeout(
                delay,
                Box::new(move || {
                    if let Some(position) = binding.restore() {
                        trace!(label, id, offset = position.offset, "delayed restoration applied");
                    }
                }),
            );
        }

        activation
    }

    /// Ends an activation by persisting the current offset.
    pub fn deactivate(&self, binding: &ScrollBinding, label: &'static str) -> Option<ScrollPosition> {
        let saved = binding.persist();
        if let Some(position) = saved {
            debug!(label, offset = position.offset, "persisted on deactivation");
        }
        saved
    }
}

/// One pending frame attempt; schedules its successor when it runs.
struct FrameChain {
    scheduler: Rc<dyn FrameScheduler>,
    binding: ScrollBinding,
    key: String,
    position: ScrollPosition,
    remaining: u8,
    phase: Rc<Cell<ActivationPhase>>,
    applied: Rc<Cell<u8>>,
    label: &'static str,
    id: u64,
}

impl FrameChain {
    fn schedule(self) {
        let scheduler = self.scheduler.clone();
        scheduler.request_frame(Box::new(move || self.run()));
    }

    fn run(mut self) {
        if self.binding.key() != self.key {
            debug!(
                label = self.label,
                id = self.id,
                key = %self.key,
                "route changed; dropping frame restoration"
            );
            self.phase.set(ActivationPhase::Idle);
            return;
        }
        self.binding.apply(self.position);
        self.applied.set(self.applied.get() + 1);
        trace!(
            label = self.label,
            id = self.id,
            attempt = self.applied.get(),
            offset = self.position.offset,
            "frame restoration applied"
        );
        self.remaining -= 1;
        if self.remaining > 0 {
            self.schedule();
        } else {
            self.phase.set(ActivationPhase::Idle);
        }
    }
}
