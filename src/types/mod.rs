// Shared type definitions
// Each submodule defines types used across the crate.

pub mod errors;
pub mod page;
pub mod route;
pub mod scroll;
pub mod settings;
