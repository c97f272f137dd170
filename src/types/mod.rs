// dotpush shared type definitions
// Each submodule defines types used across the application.

pub mod auth;
pub mod credential;
pub mod errors;
pub mod extraction;
pub mod github;
pub mod language;
pub mod message;
pub mod settings;
