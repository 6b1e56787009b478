// Scroll-preservation services
// Restoration strategy, coordinator, page hooks, signal registry, bootstrap and settings.

pub mod bootstrap;
pub mod coordinator;
pub mod page_hooks;
pub mod restoration;
pub mod settings_engine;
pub mod signals;
