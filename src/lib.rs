//! scroll-anchor: keeps the vertical scroll offset of the dashboard's tool pages
//! across client-side navigations within one browsing session.
//!
//! This library crate exposes all modules for use by the binaries and integration tests.

pub mod app;
pub mod database;
pub mod host;
pub mod logging;
pub mod managers;
pub mod platform;
pub mod rpc_handler;
pub mod services;
pub mod storage;
pub mod types;

#[cfg(feature = "gui")]
pub mod ui;
