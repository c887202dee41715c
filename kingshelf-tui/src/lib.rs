//! Terminal catalog browser: screen state machine, catalog controller, and
//! the cancellable fetch tasks that bridge the UI loop to the network.

pub mod app;
pub mod catalog;
pub mod config;
pub mod fetch;
pub mod message;
pub mod source;
pub mod ui;

pub use catalog::{CatalogController, FetchRequest, LoadPhase};
pub use config::Config;
