// Engine surface for the TUI host and headless integration tests.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod achievements;
pub mod clock;
pub mod config;
pub mod corpus;
pub mod error;
pub mod history;
pub mod input;
pub mod runtime;
pub mod scoring;
pub mod session;
