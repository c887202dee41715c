//! Catalog state controller.
//!
//! The controller is a synchronous request/apply state machine: the UI asks
//! it to begin a load, gets back a [`FetchRequest`] describing the page to
//! fetch, runs the fetch on a task, and feeds the outcome back through
//! [`CatalogController::apply_page`]. All pagination, loading, and query
//! state lives here; nothing in this module performs I/O.

use kingshelf_client::ApiError;
use kingshelf_model::{BookRecord, SearchField, visible};

/// One page request the task layer should run against the remote source.
///
/// `generation` identifies the collection the request belongs to. The result
/// carries it back, and a result whose generation no longer matches the
/// controller is dropped instead of applied; a completed fetch that was
/// already queued when the collection was reset can therefore never leak
/// into the fresh state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub generation: u64,
    pub offset: u32,
    pub limit: u32,
}

/// User-visible load state. `Failed` is deliberately distinct from an empty
/// `Ready` collection so the UI never passes off a broken fetch as "no
/// results".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

#[derive(Debug)]
pub struct CatalogController {
    items: Vec<BookRecord>,
    cursor: u32,
    page_size: u32,
    generation: u64,
    phase: LoadPhase,
    query: String,
    field: SearchField,
}

impl CatalogController {
    pub fn new(page_size: u32) -> Self {
        Self {
            items: Vec::new(),
            cursor: 0,
            page_size,
            generation: 0,
            phase: LoadPhase::Idle,
            query: String::new(),
            field: SearchField::default(),
        }
    }

    /// Start over: clear the collection, reset the cursor, and request the
    /// first page. Bumps the generation so any result still in flight for
    /// the old collection is rejected by [`Self::matches_generation`].
    pub fn begin_initial_load(&mut self) -> FetchRequest {
        self.items.clear();
        self.cursor = 0;
        self.generation += 1;
        self.phase = LoadPhase::Loading;
        FetchRequest {
            generation: self.generation,
            offset: 0,
            limit: self.page_size,
        }
    }

    /// Request the next page, or `None` while a page is already in flight.
    /// The guard gives at most one outstanding request, which in turn makes
    /// arrival order equal request order.
    pub fn begin_load_more(&mut self) -> Option<FetchRequest> {
        if self.phase == LoadPhase::Loading {
            return None;
        }
        self.phase = LoadPhase::Loading;
        Some(FetchRequest {
            generation: self.generation,
            offset: self.cursor,
            limit: self.page_size,
        })
    }

    /// Drop everything and go back to an idle empty collection, as logout
    /// does. The generation bump outlives the reset, so a page completed
    /// for the old collection but not yet handled is dropped, not folded
    /// into the fresh state.
    pub fn reset(&mut self) {
        self.items.clear();
        self.cursor = 0;
        self.generation += 1;
        self.phase = LoadPhase::Idle;
        self.query.clear();
        self.field = SearchField::default();
    }

    /// Whether a completed page still belongs to the current collection.
    pub fn matches_generation(&self, generation: u64) -> bool {
        self.generation == generation
    }

    /// Fold a completed page back into the state.
    ///
    /// On success the records are appended in arrival order and the cursor
    /// advances by the configured page size regardless of how many records
    /// the page actually held; a remote source whose page size disagrees
    /// with ours can therefore skip or duplicate records, and that is not
    /// defended against. On failure the error is logged and the collection
    /// that was already loaded is left untouched.
    pub fn apply_page(&mut self, result: Result<Vec<BookRecord>, ApiError>) {
        match result {
            Ok(records) => {
                tracing::info!(
                    count = records.len(),
                    offset = self.cursor,
                    "catalog page loaded"
                );
                self.items.extend(records);
                self.cursor += self.page_size;
                self.phase = LoadPhase::Ready;
            }
            Err(err) => {
                tracing::warn!(%err, "catalog page failed");
                self.phase = LoadPhase::Failed(err.to_string());
            }
        }
    }

    /// Pure state mutation: narrows the visible subset, never refetches.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn push_query_char(&mut self, ch: char) {
        self.query.push(ch);
    }

    pub fn pop_query_char(&mut self) {
        self.query.pop();
    }

    pub fn set_field(&mut self, field: SearchField) {
        self.field = field;
    }

    pub fn toggle_field(&mut self) {
        self.field = self.field.toggled();
    }

    pub fn visible(&self) -> Vec<&BookRecord> {
        visible(&self.items, &self.query, self.field)
    }

    pub fn items(&self) -> &[BookRecord] {
        &self.items
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn field(&self) -> SearchField {
        self.field
    }

    pub fn phase(&self) -> &LoadPhase {
        &self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_error() -> ApiError {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        ApiError::Parse(err)
    }

    fn book(id: u64, title: &str, publisher: &str, pages: u32) -> BookRecord {
        BookRecord {
            id,
            year: 0,
            title: title.to_string(),
            handle: String::new(),
            publisher: publisher.to_string(),
            isbn: String::new(),
            pages,
            notes: Vec::new(),
            characters: Vec::new(),
        }
    }

    /// Simulates the remote collection: hands out offset/limit slices the way
    /// the paginated endpoint does.
    fn remote_page(collection: &[BookRecord], request: FetchRequest) -> Vec<BookRecord> {
        collection
            .iter()
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .cloned()
            .collect()
    }

    fn five_books() -> Vec<BookRecord> {
        (1..=5)
            .map(|id| book(id, &format!("Book {id}"), "Viking", 100))
            .collect()
    }

    #[test]
    fn initial_load_fills_items_and_advances_cursor_by_page_size() {
        let mut controller = CatalogController::new(100);
        let request = controller.begin_initial_load();
        assert_eq!(request.offset, 0);
        assert!(controller.is_loading());

        controller.apply_page(Ok(vec![
            book(1, "It", "Viking", 1138),
            book(2, "Misery", "Viking", 320),
        ]));

        assert_eq!(controller.items().len(), 2);
        assert_eq!(controller.cursor(), 100);
        assert_eq!(*controller.phase(), LoadPhase::Ready);
    }

    #[test]
    fn load_more_is_a_no_op_while_loading() {
        let mut controller = CatalogController::new(2);
        let _ = controller.begin_initial_load();
        assert!(controller.is_loading());
        assert_eq!(controller.begin_load_more(), None);
    }

    #[test]
    fn two_load_more_cycles_against_five_items_yield_four_in_order() {
        let collection = five_books();
        let mut controller = CatalogController::new(2);

        for _ in 0..2 {
            let request = controller.begin_load_more().expect("not loading");
            controller.apply_page(Ok(remote_page(&collection, request)));
        }

        let ids: Vec<u64> = controller.items().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(controller.cursor(), 4);
    }

    #[test]
    fn failure_keeps_loaded_items_and_reports_failed_phase() {
        let mut controller = CatalogController::new(2);
        let request = controller.begin_initial_load();
        controller.apply_page(Ok(remote_page(&five_books(), request)));
        assert_eq!(controller.items().len(), 2);

        let _ = controller.begin_load_more().expect("not loading");
        controller.apply_page(Err(parse_error()));

        assert_eq!(controller.items().len(), 2);
        assert!(matches!(controller.phase(), LoadPhase::Failed(_)));

        // A failed phase does not wedge the guard; the next attempt issues a
        // request at the same cursor.
        let retry = controller.begin_load_more().expect("failed is not loading");
        assert_eq!(retry.offset, 2);
    }

    #[test]
    fn reset_invalidates_requests_from_the_old_collection() {
        let mut controller = CatalogController::new(2);
        let request = controller.begin_initial_load();
        assert!(controller.matches_generation(request.generation));

        controller.reset();
        assert!(!controller.matches_generation(request.generation));
        assert!(controller.items().is_empty());
        assert_eq!(*controller.phase(), LoadPhase::Idle);

        // The next load belongs to a new generation.
        let fresh = controller.begin_initial_load();
        assert!(fresh.generation > request.generation);
    }

    #[test]
    fn query_and_field_switch_recompute_without_refetch() {
        let mut controller = CatalogController::new(100);
        let _ = controller.begin_initial_load();
        controller.apply_page(Ok(vec![
            book(1, "It", "Viking", 1138),
            book(2, "Misery", "Viking", 320),
        ]));
        let cursor_before = controller.cursor();

        controller.set_query("it");
        let shown = controller.visible();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, 1);

        controller.set_field(SearchField::Publisher);
        assert!(controller.visible().is_empty());

        // Neither mutation touched pagination state.
        assert_eq!(controller.cursor(), cursor_before);
        assert_eq!(*controller.phase(), LoadPhase::Ready);
    }

    #[test]
    fn empty_query_shows_everything() {
        let mut controller = CatalogController::new(100);
        let _ = controller.begin_initial_load();
        controller.apply_page(Ok(five_books()));
        controller.set_query("");
        assert_eq!(controller.visible().len(), 5);
    }
}
