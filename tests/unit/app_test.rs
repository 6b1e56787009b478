//! End-to-end tests of the App core on the headless host: bootstrap, coordinator
//! and page hooks working together across navigations.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use scroll_anchor::app::App;
use scroll_anchor::database::Database;
use scroll_anchor::host::{ClickEvent, HeadlessHost, ServerRenderPass};
use scroll_anchor::services::bootstrap::{BootstrapOutcome, NativeRestoration};
use scroll_anchor::services::restoration::ActivationPhase;
use scroll_anchor::services::signals::PreserveScrollSignal;
use scroll_anchor::storage::{SessionStorage, SqliteSessionStorage};
use scroll_anchor::types::page::PageId;
use scroll_anchor::types::scroll::ScrollPosition;
use scroll_anchor::types::settings::{ShellSettings, StorageKeying};
use tempfile::TempDir;

fn start(url: &str) -> (Rc<HeadlessHost>, App) {
    let host = HeadlessHost::new();
    let app = App::start(&host, ShellSettings::default(), url);
    (host, app)
}

#[test]
fn test_start_bootstraps_and_mounts() {
    let (host, app) = start("/tools/chat");

    assert!(app.is_active());
    assert!(app.is_bootstrapped());
    assert_eq!(
        app.bootstrap_outcome(),
        BootstrapOutcome::Installed {
            native_restoration: NativeRestoration::Disabled
        }
    );
    assert_eq!(app.active_page(), Some(PageId::Chat));
    assert!(app.coordinator().is_some_and(|c| c.is_mounted()));
    assert_eq!(host.listener_counts(), (1, 1));
}

#[test]
fn test_start_outside_window_is_inert() {
    let mut app = App::start(&ServerRenderPass, ShellSettings::default(), "/tools/chat");

    assert!(!app.is_active());
    assert_eq!(app.bootstrap_outcome(), BootstrapOutcome::Skipped);
    assert!(!app.is_bootstrapped());
    assert!(!app.navigate("/tools/deep-research"));
    assert_eq!(app.stored_position(), None);
    assert_eq!(app.coordinator_phase(), ActivationPhase::Idle);
    assert!(app.signals().is_none());
    app.shutdown();
}

#[test]
fn test_fresh_session_keeps_viewport_at_top() {
    let (host, mut app) = start("/");
    host.dispatch_before_unload();
    assert_eq!(app.stored_position(), Some(ScrollPosition::TOP));

    app.navigate("/tools/chat");
    host.run_until_idle();

    assert_eq!(host.offset(), 0);
}

#[test]
fn test_link_click_persists_before_navigation() {
    let (host, app) = start("/tools/chat");
    host.user_scroll(842.0);

    let navigates = host.dispatch_click(&ClickEvent::on_link("/admin/users"));

    assert!(navigates);
    assert_eq!(app.stored_position(), Some(ScrollPosition::new(842)));
    assert_eq!(app.route().map(|r| r.to_string()).as_deref(), Some("/tools/chat"));
}

#[test]
fn test_returning_to_tool_page_restores_through_late_reflow() {
    let (host, mut app) = start("/tools/chat");
    host.run_until_idle();
    host.user_scroll(842.0);
    host.dispatch_click(&ClickEvent::on_link("/admin/users"));
    app.navigate("/admin/users");
    host.run_until_idle();

    // History back: no click, so the store still holds 842 while the freshly
    // rendered page starts at the top.
    host.reflow_to(0);
    host.clear_journal();
    assert!(app.navigate("/tools/chat"));
    assert_eq!(app.active_page(), Some(PageId::Chat));
    assert_eq!(app.coordinator_phase(), ActivationPhase::Restoring);

    host.run_frame();
    assert_eq!(host.offset(), 842);
    host.run_frame();
    assert_eq!(host.offset(), 842);
    assert_eq!(app.coordinator_phase(), ActivationPhase::Idle);

    host.reflow_to(0);
    host.advance(Duration::from_millis(100));
    assert_eq!(host.offset(), 842);
    assert!(host.scroll_journal().iter().all(|&y| y == 842));
    assert_eq!(app.stored_position(), Some(ScrollPosition::new(842)));
}

#[test]
fn test_page_unmount_persists_offset() {
    let (host, mut app) = start("/tools/deep-research");
    host.user_scroll(317.0);

    app.navigate("/settings");

    assert_eq!(app.active_page(), None);
    assert_eq!(app.stored_position(), Some(ScrollPosition::new(317)));
}

#[test]
fn test_navigation_order_unmount_coordinator_mount() {
    let (host, mut app) = start("/tools/chat");
    let signals = app.signals().unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    let l = log.clone();
    signals.subscribe(
        PageId::DataFormulator,
        Rc::new(move |s: &PreserveScrollSignal| l.borrow_mut().push(s.name())),
    );
    host.user_scroll(12.0);

    app.navigate("/tools/data-formulator");

    assert_eq!(*log.borrow(), vec!["preserve-scroll:data-formulator"]);
    assert_eq!(app.active_page(), Some(PageId::DataFormulator));
    // The chat hook persisted 12 on its way out, so both activations target it.
    assert_eq!(
        app.coordinator().and_then(|c| c.last_activation()).and_then(|a| a.target()),
        Some(ScrollPosition::new(12))
    );
    assert_eq!(
        app.page_hook().and_then(|h| h.activation()).and_then(|a| a.target()),
        Some(ScrollPosition::new(12))
    );
}

#[test]
fn test_same_route_is_not_a_navigation() {
    let (_host, mut app) = start("/tools/chat?thread=1");
    assert!(!app.navigate("/tools/chat?thread=1"));
    assert!(!app.navigate("http://localhost:3000/tools/chat?thread=1#latest"));
    assert_eq!(app.coordinator().map(|c| c.activation_count()), Some(1));
}

#[test]
fn test_query_change_reactivates_coordinator_but_keeps_hook() {
    let (_host, mut app) = start("/tools/chat?thread=1");
    let signals = app.signals().unwrap();

    assert!(app.navigate("/tools/chat?thread=2"));

    assert_eq!(app.coordinator().map(|c| c.activation_count()), Some(2));
    assert_eq!(signals.emitted_count(PageId::Chat), 1);
    assert_eq!(app.active_page(), Some(PageId::Chat));
}

#[test]
fn test_disabled_page_gets_no_hook() {
    let host = HeadlessHost::new();
    let mut settings = ShellSettings::default();
    settings.pages.enabled = vec![PageId::Chat];
    let mut app = App::start(&host, settings, "/tools/chat");

    app.navigate("/tools/deep-research");

    assert_eq!(app.active_page(), None);
    assert_eq!(app.signals().unwrap().emitted_count(PageId::DeepResearch), 0);
}

#[test]
fn test_signals_can_be_turned_off() {
    let host = HeadlessHost::new();
    let mut settings = ShellSettings::default();
    settings.pages.emit_signals = false;
    let app = App::start(&host, settings, "/tools/chat");

    assert_eq!(app.active_page(), Some(PageId::Chat));
    assert_eq!(app.signals().unwrap().emitted_count(PageId::Chat), 0);
}

#[test]
fn test_global_keying_carries_offset_to_unrelated_page() {
    let (host, mut app) = start("/tools/chat");
    host.user_scroll(600.0);
    app.navigate("/tools/deep-research");
    host.reflow_to(0);
    host.run_until_idle();

    assert_eq!(host.offset(), 600);
}

#[test]
fn test_per_route_keying_restores_each_page_separately() {
    let host = HeadlessHost::new();
    let mut settings = ShellSettings::default();
    settings.restoration.keying = StorageKeying::PerRoute;
    let mut app = App::start(&host, settings, "/tools/chat");

    host.user_scroll(300.0);
    app.navigate("/tools/deep-research");
    host.reflow_to(0);
    host.run_until_idle();
    assert_eq!(host.offset(), 0, "deep-research has no stored offset yet");

    host.user_scroll(40.0);
    app.navigate("/tools/chat");
    host.reflow_to(0);
    host.run_until_idle();
    assert_eq!(host.offset(), 300);

    let store = app.store().unwrap();
    assert_eq!(store.keying(), StorageKeying::PerRoute);
}

#[test]
fn test_per_route_keying_drops_restoration_outlived_by_navigation() {
    let host = HeadlessHost::new();
    host.storage()
        .set_item("scrollPosition:/tools/chat", "300")
        .unwrap();
    let mut settings = ShellSettings::default();
    settings.restoration.keying = StorageKeying::PerRoute;
    let mut app = App::start(&host, settings, "/tools/chat");
    assert_eq!(host.pending_frames(), 2);

    // Leave before any frame of the chat activation has run.
    app.navigate("/tools/deep-research");
    host.run_until_idle();

    assert_eq!(host.offset(), 0);
    assert!(host.scroll_journal().is_empty());
    assert_eq!(app.stored_position(), None);
    assert_eq!(app.coordinator_phase(), ActivationPhase::Idle);
    let hook = app.page_hook().unwrap();
    assert_eq!(hook.page(), PageId::DeepResearch);
    assert_eq!(hook.activation().unwrap().target(), None);
}

#[test]
fn test_shutdown_persists_and_unmounts() {
    let (host, mut app) = start("/tools/chat");
    host.user_scroll(77.0);

    app.shutdown();

    assert_eq!(app.stored_position(), Some(ScrollPosition::new(77)));
    assert_eq!(app.active_page(), None);
    assert!(app.coordinator().is_some_and(|c| !c.is_mounted()));
}

#[test]
fn test_sqlite_session_survives_full_reload() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("session.db");
    let storage = Rc::new(SqliteSessionStorage::begin(Arc::new(Database::open(&path).unwrap())).unwrap());
    let session_id = storage.session_id().to_string();

    {
        let host = HeadlessHost::with_storage(storage.clone());
        let _app = App::start(&host, ShellSettings::default(), "/tools/chat");
        host.user_scroll(515.0);
        host.dispatch_before_unload();
    }

    let resumed = SqliteSessionStorage::resume(Arc::new(Database::open(&path).unwrap()), &session_id).unwrap();
    let host = HeadlessHost::with_storage(Rc::new(resumed));
    let _app = App::start(&host, ShellSettings::default(), "/tools/chat");
    host.run_until_idle();

    assert_eq!(host.offset(), 515);
}
