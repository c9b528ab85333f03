// Library root: re-exports all modules so the binary and integration tests
// can access the crate's public API.

pub mod app;
pub mod catalog;
pub mod config;
pub mod db;
pub mod draft;
pub mod protocol;
pub mod settings;
pub mod valuation;
pub mod ws_server;
