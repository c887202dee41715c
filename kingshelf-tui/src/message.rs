use crossterm::event::Event as InputEvent;
use kingshelf_client::ApiError;
use kingshelf_model::BookRecord;

/// Everything the UI loop can wake up on: terminal input plus completed
/// network work reported by the task layer.
#[derive(Debug)]
pub enum AppEvent {
    Input(InputEvent),
    Page {
        /// Generation of the request that produced this page; stale results
        /// are dropped instead of applied.
        generation: u64,
        result: Result<Vec<BookRecord>, ApiError>,
    },
    Detail(Result<BookRecord, ApiError>),
    LoginDone {
        username: String,
        result: Result<serde_json::Value, ApiError>,
    },
}
