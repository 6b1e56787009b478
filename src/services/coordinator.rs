//! Global Coordinator.
//!
//! Mounted once for the lifetime of the application root. Every mount and every
//! route change (including query-only changes) starts a restoration activation;
//! unmount persists the current offset.

use std::rc::Rc;

use tracing::{debug, info};

use super::restoration::{Activation, ActivationPhase, RestorationStrategy, ScrollBinding};
use crate::types::route::Route;
use crate::types::scroll::ScrollPosition;

const LABEL: &str = "coordinator";

pub struct GlobalCoordinator {
    binding: ScrollBinding,
    strategy: Rc<RestorationStrategy>,
    tracked: Option<Route>,
    last: Option<Activation>,
    activations: u64,
}

impl GlobalCoordinator {
    pub fn new(binding: ScrollBinding, strategy: Rc<RestorationStrategy>) -> Self {
        Self {
            binding,
            strategy,
            tracked: None,
            last: None,
            activations: 0,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.tracked.is_some()
    }

    /// Route the coordinator last activated for.
    pub fn tracked_route(&self) -> Option<&Route> {
        self.tracked.as_ref()
    }

    /// Mounts on the binding's current route and starts the first activation.
    /// Mounting again is a fresh activation.
    pub fn mount(&mut self) -> Activation {
        let route = self.binding.route();
        info!(route = %route, "scroll coordinator mounted");
        self.tracked = Some(route);
        self.activate()
    }

    /// Re-activates when `route` differs from the tracked one in path or query.
    ///
    /// Also updates the shared current route, so anything persisting afterwards
    /// writes under `route`. Returns `None` when unmounted or unchanged.
    pub fn on_route_change(&mut self, route: &Route) -> Option<Activation> {
        let tracked = self.tracked.as_ref()?;
        if tracked == route {
            return None;
        }
        debug!(from = %tracked, to = %route, "route changed");
        self.binding.set_route(route);
        self.tracked = Some(route.clone());
        Some(self.activate())
    }

    /// Persists the current offset and stops tracking routes.
    pub fn unmount(&mut self) -> Option<ScrollPosition> {
        self.tracked.take()?;
        info!("scroll coordinator unmounted");
        self.strategy.deactivate(&self.binding, LABEL)
    }

    /// Phase of the most recent activation.
    pub fn phase(&self) -> ActivationPhase {
        self.last
            .as_ref()
            .map(Activation::phase)
            .unwrap_or(ActivationPhase::Idle)
    }

    pub fn last_activation(&self) -> Option<&Activation> {
        self.last.as_ref()
    }

    pub fn activation_count(&self) -> u64 {
        self.activations
    }

    fn activate(&mut self) -> Activation {
        self.activations += 1;
        let activation = self.strategy.activate(&self.binding, LABEL);
        self.last = Some(activation.clone());
        activation
    }
}
