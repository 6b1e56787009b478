//! Webview shell.
//!
//! Uses `wry` to render the dashboard:
//! - Windows: WebView2
//! - Linux: WebKitGTK
//! - macOS: WKWebView
//!
//! The dashboard talks to the coordinator through wry IPC; see
//! [`webview_app`] for the bridge messages.

pub mod webview_app;
