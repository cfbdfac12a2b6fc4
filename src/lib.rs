pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod notifications;
pub mod panel;
pub mod server;
pub mod settlement;
