// The binary entry point is main.rs; the module tree lives here so the
// integration tests can reach it as `typist::*`.

pub mod app;
pub mod config;
pub mod definitions;
pub mod error;
pub mod event;
pub mod keyboard;
pub mod lesson;
pub mod logging;
pub mod session;
pub mod store;
pub mod text;
pub mod ui;
