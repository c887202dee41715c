//! Cancellable network tasks.
//!
//! Each fetch runs on its own tokio task holding a [`CancellationToken`]
//! owned by the screen that started it. Tearing the screen down cancels the
//! token, so a stale response is dropped on the task instead of being fed
//! back into state that no longer wants it.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use kingshelf_client::AuthClient;

use crate::catalog::FetchRequest;
use crate::message::AppEvent;
use crate::source::CatalogSource;

/// Handle to one in-flight request.
#[derive(Debug)]
pub struct FetchTask {
    token: CancellationToken,
}

impl FetchTask {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

impl Drop for FetchTask {
    fn drop(&mut self) {
        // Dropping the handle means nobody can receive the result anymore.
        self.token.cancel();
    }
}

fn spawn<F>(events: UnboundedSender<AppEvent>, work: F) -> FetchTask
where
    F: std::future::Future<Output = AppEvent> + Send + 'static,
{
    let token = CancellationToken::new();
    let task_token = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = task_token.cancelled() => {
                tracing::debug!("fetch cancelled before completion");
            }
            event = work => {
                // The loop may already be gone on shutdown; nothing to do.
                let _ = events.send(event);
            }
        }
    });
    FetchTask { token }
}

/// Run one catalog page request in the background.
pub fn spawn_page_fetch<S: CatalogSource>(
    source: Arc<S>,
    request: FetchRequest,
    events: UnboundedSender<AppEvent>,
) -> FetchTask {
    spawn(events, async move {
        AppEvent::Page {
            generation: request.generation,
            result: source.fetch_page(request.offset, request.limit).await,
        }
    })
}

/// Run one detail request in the background.
pub fn spawn_detail_fetch<S: CatalogSource>(
    source: Arc<S>,
    id: u64,
    events: UnboundedSender<AppEvent>,
) -> FetchTask {
    spawn(events, async move {
        AppEvent::Detail(source.fetch_by_id(id).await)
    })
}

/// Run a credential check in the background.
pub fn spawn_login(
    auth: AuthClient,
    username: String,
    password: String,
    events: UnboundedSender<AppEvent>,
) -> FetchTask {
    spawn(events, async move {
        let result = auth.login(&username, &password).await;
        AppEvent::LoginDone { username, result }
    })
}
