//! scroll-anchor: scroll-position preservation for dashboard tool pages.
//!
//! With the `gui` feature, opens the dashboard in a webview with the coordinator
//! attached. Without it, runs a console walkthrough on the headless host.

#[cfg(feature = "gui")]
fn main() {
    scroll_anchor::ui::webview_app::run();
}

#[cfg(not(feature = "gui"))]
fn main() {
    use scroll_anchor::logging;
    use scroll_anchor::types::settings::ShellSettings;

    let settings = ShellSettings::default();
    logging::init(&settings.shell.log_filter);

    println!();
    println!("scroll-anchor v{}: headless walkthrough", env!("CARGO_PKG_VERSION"));
    println!();

    demo::fresh_session(&settings);
    demo::link_click_and_return(&settings);
    demo::late_content(&settings);
    demo::page_signals(&settings);

    println!();
    println!("All walkthrough steps completed.");
}

#[cfg(not(feature = "gui"))]
mod demo {
    use std::rc::Rc;
    use std::time::Duration;

    use scroll_anchor::app::App;
    use scroll_anchor::host::{ClickEvent, HeadlessHost};
    use scroll_anchor::services::signals::PreserveScrollSignal;
    use scroll_anchor::types::page::PageId;
    use scroll_anchor::types::settings::ShellSettings;

    fn section(name: &str) {
        println!("── {} ──", name);
    }

    pub fn fresh_session(settings: &ShellSettings) {
        section("Fresh session");
        let host = HeadlessHost::new();
        let app = App::start(&host, settings.clone(), "/tools/chat");
        host.run_until_idle();
        println!("  bootstrap: {:?}", app.bootstrap_outcome());
        println!("  stored: {:?}, viewport: {}", app.stored_position(), host.offset());
        println!();
    }

    pub fn link_click_and_return(settings: &ShellSettings) {
        section("Link click, then back to the tool page");
        let host = HeadlessHost::new();
        let mut app = App::start(&host, settings.clone(), "/tools/chat");
        host.run_until_idle();

        host.user_scroll(842.0);
        host.dispatch_click(&ClickEvent::on_link("/admin/users"));
        println!("  stored after click: {:?}", app.stored_position());
        app.navigate("/admin/users");
        host.reflow_to(0);

        app.navigate("/tools/chat");
        host.run_frames(2);
        println!("  viewport after two frames: {}", host.offset());
        host.run_until_idle();
        println!("  applied offsets: {:?}", host.scroll_journal());
        println!();
    }

    pub fn late_content(settings: &ShellSettings) {
        section("Content that loads after the frame attempts");
        let host = HeadlessHost::new();
        let mut app = App::start(&host, settings.clone(), "/tools/deep-research");
        host.user_scroll(1200.0);
        app.navigate("/settings");

        host.set_max_scroll(Some(0));
        app.navigate("/tools/deep-research");
        host.run_frames(2);
        println!("  after frames, short document: {}", host.offset());
        host.set_max_scroll(Some(5000));
        host.advance(Duration::from_millis(100));
        println!("  after delayed fallback: {}", host.offset());
        println!();
    }

    pub fn page_signals(settings: &ShellSettings) {
        section("Preserve-scroll signals");
        let host = HeadlessHost::new();
        let mut app = App::start(&host, settings.clone(), "/");
        if let Some(signals) = app.signals() {
            signals.subscribe(
                PageId::DataFormulator,
                Rc::new(|signal: &PreserveScrollSignal| println!("  received {}", signal.name())),
            );
        }
        app.navigate("/tools/data-formulator");
        app.shutdown();
        println!();
    }
}
