//! Unit tests for PageExtensionHook: signals, restoration and persistence.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use scroll_anchor::host::{FrameScheduler, HeadlessHost, Viewport};
use scroll_anchor::managers::position_store::PositionStore;
use scroll_anchor::services::page_hooks::PageExtensionHook;
use scroll_anchor::services::restoration::{RestorationPlan, RestorationStrategy, ScrollBinding};
use scroll_anchor::services::signals::{PreserveScrollSignal, SignalRegistry};
use scroll_anchor::types::page::PageId;
use scroll_anchor::types::route::Route;
use scroll_anchor::types::scroll::ScrollPosition;
use scroll_anchor::types::settings::{RestorationSettings, StorageKeying};

fn hook_for(
    page: PageId,
    host: &Rc<HeadlessHost>,
    signals: Option<Rc<SignalRegistry>>,
) -> (Rc<PositionStore>, PageExtensionHook) {
    let store = Rc::new(PositionStore::new(
        host.storage(),
        "scrollPosition",
        StorageKeying::Global,
    ));
    let viewport: Rc<dyn Viewport> = host.clone();
    let scheduler: Rc<dyn FrameScheduler> = host.clone();
    let route = Route::parse(&format!("/tools/{}", page.slug()));
    let binding = ScrollBinding::detached(store.clone(), &viewport, route);
    let strategy = Rc::new(RestorationStrategy::new(
        RestorationPlan::page_hook(&RestorationSettings::default()),
        scheduler,
    ));
    (store, PageExtensionHook::new(page, binding, strategy, signals))
}

#[test]
fn test_mount_emits_page_signal() {
    let host = HeadlessHost::new();
    let signals = Rc::new(SignalRegistry::new());
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = received.clone();
    signals.subscribe(
        PageId::DeepResearch,
        Rc::new(move |s: &PreserveScrollSignal| sink.borrow_mut().push(s.name())),
    );

    let (_store, mut hook) = hook_for(PageId::DeepResearch, &host, Some(signals.clone()));
    hook.mount();

    assert_eq!(*received.borrow(), vec!["preserve-scroll:deep-research"]);
    assert_eq!(signals.emitted_count(PageId::DeepResearch), 1);
    assert_eq!(signals.emitted_count(PageId::Chat), 0);
}

#[test]
fn test_mount_without_registry_is_silent() {
    let host = HeadlessHost::new();
    let (_store, mut hook) = hook_for(PageId::Chat, &host, None);
    hook.mount();
    assert!(hook.is_mounted());
    assert_eq!(hook.page(), PageId::Chat);
}

#[test]
fn test_mount_restores_on_two_frames_without_timer() {
    let host = HeadlessHost::new();
    let (store, mut hook) = hook_for(PageId::DataFormulator, &host, None);
    store.write(&Route::default(), ScrollPosition::new(640));

    let activation = hook.mount();

    assert_eq!(activation.label(), "data-formulator");
    assert_eq!(host.pending_timers(), 0);
    host.run_frames(2);
    assert_eq!(host.scroll_journal(), vec![640, 640]);
    assert!(activation.is_settled());
    assert_eq!(host.pending_frames(), 0);
}

#[test]
fn test_configured_page_timer_is_scheduled() {
    let host = HeadlessHost::new();
    let store = Rc::new(PositionStore::new(
        host.storage(),
        "scrollPosition",
        StorageKeying::Global,
    ));
    store.write(&Route::default(), ScrollPosition::new(90));
    let viewport: Rc<dyn Viewport> = host.clone();
    let settings = RestorationSettings {
        page_delayed_restore_ms: Some(250),
        ..RestorationSettings::default()
    };
    let strategy = Rc::new(RestorationStrategy::new(
        RestorationPlan::page_hook(&settings),
        host.clone(),
    ));
    let mut hook = PageExtensionHook::new(
        PageId::Chat,
        ScrollBinding::detached(store, &viewport, Route::parse("/chat")),
        strategy,
        None,
    );

    hook.mount();
    host.run_frames(2);
    host.reflow_to(0);
    host.advance(Duration::from_millis(250));

    assert_eq!(host.offset(), 90);
}

#[test]
fn test_unmount_persists_current_offset() {
    let host = HeadlessHost::new();
    let (store, mut hook) = hook_for(PageId::Chat, &host, None);
    hook.mount();
    host.user_scroll(317.0);

    assert_eq!(hook.unmount(), Some(ScrollPosition::new(317)));
    assert_eq!(store.read(&Route::default()), Some(ScrollPosition::new(317)));
    assert!(!hook.is_mounted());
}

#[test]
fn test_unmount_without_mount_writes_nothing() {
    let host = HeadlessHost::new();
    let (store, mut hook) = hook_for(PageId::Chat, &host, None);
    host.user_scroll(10.0);

    assert_eq!(hook.unmount(), None);
    assert_eq!(store.write_count(), 0);
}
