use serde::{Deserialize, Serialize};

/// Normalized in-memory representation of one catalog entry.
///
/// Every field is a denormalized copy of what the remote source returned;
/// records are created when a response is parsed and never mutated after.
/// `id` is the remote-assigned identifier and is unique within a loaded
/// collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub id: u64,
    pub year: i32,
    pub title: String,
    /// URL-safe slug assigned by the remote source.
    pub handle: String,
    pub publisher: String,
    pub isbn: String,
    pub pages: u32,
    pub notes: Vec<String>,
    pub characters: Vec<Character>,
}

/// A named entity associated with a book. The remote API calls these
/// "villains"; they have no identity or lifecycle of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub name: String,
    pub power: String,
}
