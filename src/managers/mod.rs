// State managers
// Managers own mutable state shared across the scroll subsystem.

pub mod position_store;
