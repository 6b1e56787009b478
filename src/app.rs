//! App Core.
//!
//! [`App`] is the explicitly owned state of one browsing session: it runs the
//! bootstrap, owns the position store, the signal registry, the global
//! coordinator and the page hook of the tool page currently shown, and routes
//! navigations through them in the order the UI framework would.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use crate::host::{BrowserSurfaces, HostEnvironment};
use crate::managers::position_store::PositionStore;
use crate::services::bootstrap::{Bootstrap, BootstrapOutcome};
use crate::services::coordinator::GlobalCoordinator;
use crate::services::page_hooks::PageExtensionHook;
use crate::services::restoration::{
    ActivationPhase, RestorationPlan, RestorationStrategy, ScrollBinding,
};
use crate::services::signals::SignalRegistry;
use crate::types::page::PageId;
use crate::types::route::{CurrentRoute, Route};
use crate::types::scroll::ScrollPosition;
use crate::types::settings::ShellSettings;

/// Everything that only exists inside a browser window.
struct SessionCore {
    surfaces: BrowserSurfaces,
    route: CurrentRoute,
    store: Rc<PositionStore>,
    signals: Rc<SignalRegistry>,
    coordinator: GlobalCoordinator,
    page_strategy: Rc<RestorationStrategy>,
    page_hook: Option<PageExtensionHook>,
}

impl SessionCore {
    fn binding(&self) -> ScrollBinding {
        ScrollBinding::new(self.store.clone(), &self.surfaces.viewport, self.route.clone())
    }

    fn mount_page(&mut self, page: PageId, settings: &ShellSettings) {
        let signals = settings.pages.emit_signals.then(|| self.signals.clone());
        let mut hook =
            PageExtensionHook::new(page, self.binding(), self.page_strategy.clone(), signals);
        hook.mount();
        self.page_hook = Some(hook);
    }
}

pub struct App {
    settings: ShellSettings,
    bootstrap: Bootstrap,
    bootstrap_outcome: BootstrapOutcome,
    core: Option<SessionCore>,
}

impl App {
    /// Starts a session on `initial_url`.
    ///
    /// Without window surfaces the app is inert: the bootstrap reports
    /// [`BootstrapOutcome::Skipped`] and every later call is a no-op.
    pub fn start(env: &dyn HostEnvironment, settings: ShellSettings, initial_url: &str) -> Self {
        let bootstrap = Bootstrap::new();
        let route: CurrentRoute = Rc::new(RefCell::new(Route::parse(initial_url)));

        let Some(surfaces) = env.surfaces() else {
            info!("no browser window; scroll preservation inactive");
            return Self {
                settings,
                bootstrap,
                bootstrap_outcome: BootstrapOutcome::Skipped,
                core: None,
            };
        };

        let store = Rc::new(PositionStore::from_settings(
            surfaces.storage.clone(),
            &settings.restoration,
        ));
        let bootstrap_outcome = bootstrap.install(env, &store, &route);

        let coordinator_strategy = Rc::new(RestorationStrategy::new(
            RestorationPlan::coordinator(&settings.restoration),
            surfaces.scheduler.clone(),
        ));
        let page_strategy = Rc::new(RestorationStrategy::new(
            RestorationPlan::page_hook(&settings.restoration),
            surfaces.scheduler.clone(),
        ));
        let binding = ScrollBinding::new(store.clone(), &surfaces.viewport, route.clone());

        let mut core = SessionCore {
            surfaces,
            route,
            store,
            signals: Rc::new(SignalRegistry::new()),
            coordinator: GlobalCoordinator::new(binding, coordinator_strategy),
            page_strategy,
            page_hook: None,
        };

        core.coordinator.mount();
        let initial = core.route.borrow().clone();
        if let Some(page) = initial.page().filter(|p| settings.pages.is_enabled(*p)) {
            core.mount_page(page, &settings);
        }

        Self {
            settings,
            bootstrap,
            bootstrap_outcome,
            core: Some(core),
        }
    }

    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    pub fn bootstrap_outcome(&self) -> BootstrapOutcome {
        self.bootstrap_outcome
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrap.is_installed()
    }

    pub fn is_active(&self) -> bool {
        self.core.is_some()
    }

    pub fn route(&self) -> Option<Route> {
        self.core.as_ref().map(|c| c.route.borrow().clone())
    }

    /// Tool page whose hook is mounted.
    pub fn active_page(&self) -> Option<PageId> {
        self.core
            .as_ref()
            .and_then(|c| c.page_hook.as_ref())
            .map(PageExtensionHook::page)
    }

    pub fn coordinator(&self) -> Option<&GlobalCoordinator> {
        self.core.as_ref().map(|c| &c.coordinator)
    }

    pub fn page_hook(&self) -> Option<&PageExtensionHook> {
        self.core.as_ref().and_then(|c| c.page_hook.as_ref())
    }

    pub fn coordinator_phase(&self) -> ActivationPhase {
        self.core
            .as_ref()
            .map(|c| c.coordinator.phase())
            .unwrap_or(ActivationPhase::Idle)
    }

    pub fn signals(&self) -> Option<Rc<SignalRegistry>> {
        self.core.as_ref().map(|c| c.signals.clone())
    }

    pub fn store(&self) -> Option<Rc<PositionStore>> {
        self.core.as_ref().map(|c| c.store.clone())
    }

    /// Stored offset as the current route would read it.
    pub fn stored_position(&self) -> Option<ScrollPosition> {
        let core = self.core.as_ref()?;
        let route = core.route.borrow();
        core.store.read(&route)
    }

    /// Client-side navigation. Returns `false` if nothing changed.
    ///
    /// A path change unmounts the current page hook (persisting under the old
    /// route), re-activates the coordinator, then mounts the new page's hook.
    /// A query-only change re-activates the coordinator and keeps the hook.
    pub fn navigate(&mut self, url: &str) -> bool {
        let Some(core) = self.core.as_mut() else {
            return false;
        };
        let next = Route::parse(url);
        let path_changed = {
            let current = core.route.borrow();
            if *current == next {
                return false;
            }
            !current.same_path(&next)
        };

        if path_changed {
            if let Some(mut hook) = core.page_hook.take() {
                hook.unmount();
            }
        }

        core.coordinator.on_route_change(&next);
        debug!(route = %next, path_changed, "navigated");

        if path_changed {
            if let Some(page) = next.page().filter(|p| self.settings.pages.is_enabled(*p)) {
                core.mount_page(page, &self.settings);
            }
        }
        true
    }

    /// Unmounts the page hook and the coordinator; both persist the current offset.
    pub fn shutdown(&mut self) {
        let Some(core) = self.core.as_mut() else {
            return;
        };
        if let Some(mut hook) = core.page_hook.take() {
            hook.unmount();
        }
        core.coordinator.unmount();
        info!("scroll session shut down");
    }
}
