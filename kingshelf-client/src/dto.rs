//! Wire-format types for the remote book API.
//!
//! The API is inconsistent across deployments in two independent ways: the
//! payload envelope is either `{"data": [...]}` or `{"data": {"data": [...]}}`,
//! and field keys are either lower-camel-case (`title`, `pages`) or
//! capitalized (`Title`, `Pages`). Both axes are absorbed here so the rest of
//! the system only ever sees the normalized model types.

use kingshelf_model::{BookRecord, Character};
use serde::Deserialize;

/// Outer response envelope shared by the list and detail endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: EnvelopeData<T>,
}

/// Some deployments wrap the payload in a second `data` object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum EnvelopeData<T> {
    Flat(T),
    Nested { data: T },
}

impl<T> EnvelopeData<T> {
    pub fn into_inner(self) -> T {
        match self {
            EnvelopeData::Flat(inner) | EnvelopeData::Nested { data: inner } => inner,
        }
    }
}

/// One catalog entry as the remote source serializes it. Field aliases cover
/// the capitalized-key variant; defaults cover fields a variant omits.
#[derive(Debug, Deserialize)]
pub(crate) struct BookDto {
    pub id: u64,
    #[serde(default, alias = "Year")]
    pub year: i32,
    #[serde(default, alias = "Title")]
    pub title: String,
    #[serde(default, alias = "Handle")]
    pub handle: String,
    #[serde(default, alias = "Publisher")]
    pub publisher: String,
    #[serde(default, alias = "ISBN")]
    pub isbn: String,
    #[serde(default, alias = "Pages")]
    pub pages: u32,
    #[serde(default, alias = "Notes")]
    pub notes: Vec<String>,
    #[serde(default, alias = "Villains")]
    pub villains: Vec<CharacterDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CharacterDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub power: String,
}

impl BookDto {
    pub fn into_record(self) -> BookRecord {
        BookRecord {
            id: self.id,
            year: self.year,
            title: self.title,
            handle: self.handle,
            publisher: self.publisher,
            isbn: self.isbn,
            pages: self.pages,
            notes: self.notes,
            characters: self
                .villains
                .into_iter()
                .map(|villain| Character {
                    name: villain.name,
                    power: villain.power,
                })
                .collect(),
        }
    }
}
