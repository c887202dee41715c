//! Core data model definitions shared across Kingshelf crates.

pub mod book;
pub mod search;

pub use book::{BookRecord, Character};
pub use search::{SearchField, visible};
