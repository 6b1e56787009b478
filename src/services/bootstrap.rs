//! Bootstrap: runs before any component mounts.
//!
//! Turns the host's native scroll restoration off and installs two write-only
//! capture points that snapshot the offset before a navigation can reset it:
//! the "page about to unload" signal and capture-phase clicks on hyperlinks.
//!
//! [`Bootstrap::install`] does this against [`HostEnvironment`] surfaces;
//! [`script`] renders the same behavior as a JavaScript snippet for hosts that
//! inject it into the page ahead of hydration.

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use tracing::{debug, info};

use super::restoration::ScrollBinding;
use crate::host::{ClickEvent, HistoryControl, HostEnvironment, ScrollRestorationMode};
use crate::managers::position_store::PositionStore;
use crate::types::route::CurrentRoute;
use crate::types::settings::{RestorationSettings, StorageKeying};

/// What happened to the host's own scroll restoration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NativeRestoration {
    Disabled,
    AlreadyManual,
    Unsupported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum BootstrapOutcome {
    /// No window or document; nothing was touched.
    Skipped,
    AlreadyInstalled,
    Installed { native_restoration: NativeRestoration },
}

/// Sets native scroll restoration to manual if the host exposes the switch.
pub fn disable_native_restoration(history: &dyn HistoryControl) -> NativeRestoration {
    match history.scroll_restoration() {
        None => NativeRestoration::Unsupported,
        Some(ScrollRestorationMode::Manual) => NativeRestoration::AlreadyManual,
        Some(ScrollRestorationMode::Auto) => {
            if history.set_scroll_restoration(ScrollRestorationMode::Manual) {
                NativeRestoration::Disabled
            } else {
                NativeRestoration::Unsupported
            }
        }
    }
}

/// Installs at most once per page load.
#[derive(Debug, Default)]
pub struct Bootstrap {
    installed: Cell<bool>,
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get()
    }

    pub fn install(
        &self,
        env: &dyn HostEnvironment,
        store: &Rc<PositionStore>,
        route: &CurrentRoute,
    ) -> BootstrapOutcome {
        if self.installed.get() {
            return BootstrapOutcome::AlreadyInstalled;
        }
        let Some(surfaces) = env.surfaces() else {
            debug!("no window surfaces; bootstrap skipped");
            return BootstrapOutcome::Skipped;
        };
        self.installed.set(true);

        let native_restoration = disable_native_restoration(surfaces.history.as_ref());
        let binding = ScrollBinding::new(store.clone(), &surfaces.viewport, route.clone());

        let on_unload = binding.clone();
        surfaces
            .document
            .add_before_unload_listener(Rc::new(move || {
                on_unload.persist();
            }));

        surfaces
            .document
            .add_click_capture_listener(Rc::new(move |event: &ClickEvent| {
                if event.targets_link() {
                    binding.persist();
                }
            }));

        info!(?native_restoration, "scroll bootstrap installed");
        BootstrapOutcome::Installed { native_restoration }
    }
}

/// Renders the bootstrap as a self-contained script.
///
/// The script guards against running outside a browser and against running twice,
/// swallows storage errors, and, when a `window.ipc` bridge exists, also posts
/// each snapshot as `{"cmd":"scroll_snapshot","offset":N}`.
pub fn script(settings: &RestorationSettings) -> String {
    let key = serde_json::to_string(&settings.storage_key)
        .unwrap_or_else(|_| "\"scrollPosition\"".to_string());
    let key_expr = match settings.keying {
        StorageKeying::Global => "KEY".to_string(),
        StorageKeying::PerRoute => "KEY+':'+location.pathname".to_string(),
    };
    format!(
        r#"(function(){{
if(typeof window==='undefined'||typeof document==='undefined')return;
if(window.__scrollAnchorBootstrapped)return;
window.__scrollAnchorBootstrapped=true;
try{{if('scrollRestoration' in history)history.scrollRestoration='manual';}}catch(e){{}}
var KEY={key};
function snapshot(){{
  var y=Math.max(0,Math.floor(window.scrollY||window.pageYOffset||0));
  try{{sessionStorage.setItem({key_expr},String(y));}}catch(e){{}}
  try{{if(window.ipc&&window.ipc.postMessage)window.ipc.postMessage(JSON.stringify({{cmd:'scroll_snapshot',offset:y}}));}}catch(e){{}}
}}
window.addEventListener('beforeunload',snapshot);
document.addEventListener('click',function(e){{
  var t=e.target;
  if(t&&t.closest&&t.closest('a'))snapshot();
}},true);
}})();"#
    )
}
