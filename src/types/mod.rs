// DocsFocus shared type definitions
// Each submodule defines types used across the application.

pub mod detection;
pub mod errors;
pub mod message;
pub mod override_entry;
pub mod preset;
pub mod settings;
