use std::fmt;

use crate::book::BookRecord;

/// Which record field the search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchField {
    #[default]
    Title,
    Publisher,
}

impl SearchField {
    pub fn all() -> &'static [SearchField] {
        &[SearchField::Title, SearchField::Publisher]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchField::Title => "Title",
            SearchField::Publisher => "Publisher",
        }
    }

    /// The other selectable field, for toggle-style UI controls.
    pub fn toggled(&self) -> SearchField {
        match self {
            SearchField::Title => SearchField::Publisher,
            SearchField::Publisher => SearchField::Title,
        }
    }

    fn value<'a>(&self, record: &'a BookRecord) -> &'a str {
        match self {
            SearchField::Title => &record.title,
            SearchField::Publisher => &record.publisher,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Narrows `items` to the records whose `field` value contains `query` as a
/// case-insensitive substring. An empty query is the identity. Relative order
/// of `items` is preserved; there is no ranking and no fuzzy matching.
pub fn visible<'a>(
    items: &'a [BookRecord],
    query: &str,
    field: SearchField,
) -> Vec<&'a BookRecord> {
    if query.is_empty() {
        return items.iter().collect();
    }
    let needle = query.to_lowercase();
    items
        .iter()
        .filter(|record| field.value(record).to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: u64, title: &str, publisher: &str) -> BookRecord {
        BookRecord {
            id,
            year: 1986,
            title: title.to_string(),
            handle: title.to_lowercase().replace(' ', "-"),
            publisher: publisher.to_string(),
            isbn: String::new(),
            pages: 0,
            notes: Vec::new(),
            characters: Vec::new(),
        }
    }

    fn sample() -> Vec<BookRecord> {
        vec![
            book(1, "It", "Viking"),
            book(2, "Misery", "Viking"),
            book(3, "The Shining", "Doubleday"),
        ]
    }

    #[test]
    fn empty_query_is_identity() {
        let items = sample();
        for field in SearchField::all() {
            let shown = visible(&items, "", *field);
            assert_eq!(shown.len(), items.len());
            for (got, want) in shown.iter().zip(items.iter()) {
                assert_eq!(got.id, want.id);
            }
        }
    }

    #[test]
    fn matches_are_case_insensitive_substrings() {
        let items = sample();
        let shown = visible(&items, "it", SearchField::Title);
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, 1);

        // Every excluded record really does not contain the query.
        for record in &items {
            if !shown.iter().any(|r| r.id == record.id) {
                assert!(!record.title.to_lowercase().contains("it"));
            }
        }
    }

    #[test]
    fn field_switch_changes_the_result_set() {
        let items = sample();
        // "it" matches no publisher in the sample collection.
        let shown = visible(&items, "it", SearchField::Publisher);
        assert!(shown.is_empty());

        let shown = visible(&items, "viking", SearchField::Publisher);
        assert_eq!(shown.len(), 2);
    }

    #[test]
    fn relative_order_is_preserved() {
        let items = sample();
        let shown = visible(&items, "i", SearchField::Title);
        let ids: Vec<u64> = shown.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn toggled_alternates_between_both_fields() {
        assert_eq!(SearchField::Title.toggled(), SearchField::Publisher);
        assert_eq!(SearchField::Publisher.toggled(), SearchField::Title);
    }
}
