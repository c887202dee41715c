//! Application state machine and event loop.
//!
//! One logical thread of control: the loop below owns all mutable state and
//! wakes on terminal input or completed network tasks. Network work never
//! mutates anything directly; it reports back as [`AppEvent`]s.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{
        EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
        enable_raw_mode,
    },
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use kingshelf_client::{ApiError, AuthClient, Session, SessionStore};
use kingshelf_model::BookRecord;

use crate::catalog::{CatalogController, LoadPhase};
use crate::fetch::{self, FetchTask};
use crate::message::AppEvent;
use crate::source::CatalogSource;
use crate::ui;

/// How close the grid cursor may get to the end of the visible list before
/// the next page is requested.
pub const LOAD_MORE_THRESHOLD: usize = 4;

/// The catalog renders as a fixed two-column grid.
pub const GRID_COLUMNS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginFocus {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focus: LoginFocus,
    /// Blocking error dialog; any key dismisses it.
    pub modal: Option<String>,
    pub submitting: bool,
}

impl LoginForm {
    fn focused_field(&mut self) -> &mut String {
        match self.focus {
            LoginFocus::Username => &mut self.username,
            LoginFocus::Password => &mut self.password,
        }
    }
}

#[derive(Debug, Default)]
pub struct DetailView {
    pub record: Option<BookRecord>,
    pub error: Option<String>,
}

#[derive(Debug)]
pub enum Screen {
    Login(LoginForm),
    Catalog,
    Detail(DetailView),
}

pub struct App<S: CatalogSource> {
    pub(crate) screen: Screen,
    pub(crate) controller: CatalogController,
    pub(crate) selected: usize,
    pub(crate) session: Option<Session>,
    store: Option<SessionStore>,
    source: Arc<S>,
    auth: AuthClient,
    events: UnboundedSender<AppEvent>,
    page_task: Option<FetchTask>,
    detail_task: Option<FetchTask>,
    login_task: Option<FetchTask>,
    /// Set once a page comes back empty; stops the scroll threshold from
    /// hammering an exhausted collection.
    end_reached: bool,
    should_quit: bool,
}

impl<S: CatalogSource> App<S> {
    pub fn new(
        source: Arc<S>,
        auth: AuthClient,
        store: Option<SessionStore>,
        page_size: u32,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        // Startup routing: a persisted session skips the login screen.
        let session = store.as_ref().and_then(SessionStore::load);
        let screen = if session.is_some() {
            Screen::Catalog
        } else {
            Screen::Login(LoginForm::default())
        };

        Self {
            screen,
            controller: CatalogController::new(page_size),
            selected: 0,
            session,
            store,
            source,
            auth,
            events,
            page_task: None,
            detail_task: None,
            login_task: None,
            end_reached: false,
            should_quit: false,
        }
    }

    /// Kick off the initial page load when startup routed straight to the
    /// catalog. Must run inside the runtime, hence not part of `new`.
    pub fn start(&mut self) {
        if matches!(self.screen, Screen::Catalog) {
            self.begin_initial_load();
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key);
            }
            AppEvent::Input(_) => {}
            AppEvent::Page { generation, result } => {
                // Cancellation stops a task before it sends, but a result
                // already queued when the collection was reset still arrives
                // here. The generation check drops it.
                if !self.controller.matches_generation(generation) {
                    tracing::debug!(generation, "dropping stale page result");
                    return;
                }
                if let Ok(records) = &result {
                    if records.is_empty() {
                        self.end_reached = true;
                    }
                }
                self.controller.apply_page(result);
                self.page_task = None;
                self.clamp_selection();
            }
            AppEvent::Detail(result) => {
                if let Screen::Detail(view) = &mut self.screen {
                    match result {
                        Ok(record) => view.record = Some(record),
                        Err(err) => {
                            tracing::warn!(%err, "detail fetch failed");
                            view.error = Some(err.to_string());
                        }
                    }
                }
                self.detail_task = None;
            }
            AppEvent::LoginDone { username, result } => {
                self.login_task = None;
                self.finish_login(username, result);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // Ctrl+C quits from anywhere.
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && key.code == KeyCode::Char('c')
        {
            self.quit();
            return;
        }

        match &mut self.screen {
            Screen::Login(_) => self.handle_login_key(key),
            Screen::Catalog => self.handle_catalog_key(key),
            Screen::Detail(_) => self.handle_detail_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        let Screen::Login(form) = &mut self.screen else {
            return;
        };

        if form.modal.is_some() {
            // Blocking dialog: any key dismisses it.
            form.modal = None;
            return;
        }
        if form.submitting {
            return;
        }

        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Tab | KeyCode::Down | KeyCode::Up => {
                form.focus = match form.focus {
                    LoginFocus::Username => LoginFocus::Password,
                    LoginFocus::Password => LoginFocus::Username,
                };
            }
            KeyCode::Enter => {
                if form.username.is_empty() {
                    form.focus = LoginFocus::Username;
                    return;
                }
                form.submitting = true;
                self.login_task = Some(fetch::spawn_login(
                    self.auth.clone(),
                    form.username.clone(),
                    form.password.clone(),
                    self.events.clone(),
                ));
            }
            KeyCode::Backspace => {
                form.focused_field().pop();
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.focused_field().push(ch);
            }
            _ => {}
        }
    }

    fn finish_login(
        &mut self,
        username: String,
        result: Result<serde_json::Value, ApiError>,
    ) {
        let Screen::Login(form) = &mut self.screen else {
            // Stale outcome after the screen moved on; drop it.
            return;
        };
        form.submitting = false;

        match result {
            Ok(payload) => {
                if let Some(store) = &self.store {
                    match store.create(&username, payload) {
                        Ok(session) => self.session = Some(session),
                        Err(err) => {
                            // Login still succeeds; it just will not stick
                            // across restarts.
                            tracing::warn!(%err, "failed to persist session");
                        }
                    }
                }
                self.enter_catalog();
            }
            Err(ApiError::InvalidCredentials) => {
                form.password.clear();
                form.modal = Some("Invalid username or password.".to_string());
            }
            Err(err) => {
                tracing::warn!(%err, "login attempt failed");
                form.modal =
                    Some("Login failed. Check the log for details.".to_string());
            }
        }
    }

    fn enter_catalog(&mut self) {
        self.screen = Screen::Catalog;
        self.begin_initial_load();
    }

    fn begin_initial_load(&mut self) {
        self.selected = 0;
        self.end_reached = false;
        if let Some(task) = self.page_task.take() {
            task.cancel();
        }
        let request = self.controller.begin_initial_load();
        self.page_task = Some(fetch::spawn_page_fetch(
            self.source.clone(),
            request,
            self.events.clone(),
        ));
    }

    fn handle_catalog_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                // Esc first clears an active filter, then quits.
                if self.controller.query().is_empty() {
                    self.quit();
                } else {
                    self.controller.set_query("");
                    self.clamp_selection();
                }
            }
            KeyCode::Tab => {
                self.controller.toggle_field();
                self.clamp_selection();
            }
            KeyCode::Char('l') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.logout();
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if matches!(self.controller.phase(), LoadPhase::Failed(_)) {
                    self.load_more();
                }
            }
            KeyCode::Left => self.move_selection(-1),
            KeyCode::Right => self.move_selection(1),
            KeyCode::Up => self.move_selection(-(GRID_COLUMNS as isize)),
            KeyCode::Down => self.move_selection(GRID_COLUMNS as isize),
            KeyCode::Enter => self.open_detail(),
            KeyCode::Backspace => {
                self.controller.pop_query_char();
                self.clamp_selection();
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.controller.push_query_char(ch);
                self.clamp_selection();
            }
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('q') => {
                // Leaving the screen cancels whatever it was still fetching.
                if let Some(task) = self.detail_task.take() {
                    task.cancel();
                }
                self.screen = Screen::Catalog;
            }
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.controller.visible().len();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let next = self.selected as isize + delta;
        self.selected = next.clamp(0, len as isize - 1) as usize;
        self.maybe_load_more();
    }

    fn clamp_selection(&mut self) {
        let len = self.controller.visible().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    /// Scroll-threshold contract: request the next page once the cursor is
    /// near the end of what is currently visible.
    fn maybe_load_more(&mut self) {
        if self.end_reached {
            return;
        }
        let len = self.controller.visible().len();
        if len == 0 || self.selected + LOAD_MORE_THRESHOLD < len {
            return;
        }
        self.load_more();
    }

    fn load_more(&mut self) {
        // `begin_load_more` is a no-op while a page is already in flight.
        if let Some(request) = self.controller.begin_load_more() {
            self.page_task = Some(fetch::spawn_page_fetch(
                self.source.clone(),
                request,
                self.events.clone(),
            ));
        }
    }

    fn open_detail(&mut self) {
        let Some(record) = self.controller.visible().get(self.selected).copied()
        else {
            return;
        };
        let id = record.id;
        self.screen = Screen::Detail(DetailView::default());
        self.detail_task = Some(fetch::spawn_detail_fetch(
            self.source.clone(),
            id,
            self.events.clone(),
        ));
    }

    fn logout(&mut self) {
        if let Some(store) = &self.store {
            if let Err(err) = store.invalidate() {
                tracing::warn!(%err, "failed to remove session file");
            }
        }
        self.session = None;
        if let Some(task) = self.page_task.take() {
            task.cancel();
        }
        // Keeps the generation counter monotone, so a page completed for the
        // old collection but still queued is rejected when it is handled.
        self.controller.reset();
        self.selected = 0;
        self.end_reached = false;
        self.screen = Screen::Login(LoginForm::default());
    }

    fn quit(&mut self) {
        if let Some(task) = self.page_task.take() {
            task.cancel();
        }
        if let Some(task) = self.detail_task.take() {
            task.cancel();
        }
        if let Some(task) = self.login_task.take() {
            task.cancel();
        }
        self.should_quit = true;
    }
}

/// Terminal event loop. Input arrives from a dedicated reader thread so the
/// async loop can wake on either keys or completed fetches.
pub async fn run<S: CatalogSource>(
    mut app: App<S>,
    events_tx: UnboundedSender<AppEvent>,
    mut events_rx: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    spawn_input_reader(events_tx);
    app.start();

    let result = event_loop(&mut terminal, &mut app, &mut events_rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    result
}

fn spawn_input_reader(tx: UnboundedSender<AppEvent>) {
    std::thread::spawn(move || {
        loop {
            match crossterm::event::read() {
                Ok(event) => {
                    if tx.send(AppEvent::Input(event)).is_err() {
                        break;
                    }
                }
                Err(err) => {
                    tracing::error!(%err, "terminal input read failed");
                    break;
                }
            }
        }
    });
}

async fn event_loop<S: CatalogSource>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<S>,
    events: &mut UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        tokio::select! {
            maybe = events.recv() => {
                match maybe {
                    Some(event) => app.handle_event(event),
                    None => break,
                }
            }
            _ = tokio::time::sleep(Duration::from_millis(150)) => {
                // periodic redraw while fetches are in flight
            }
        }

        if app.should_quit() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;
    use url::Url;

    struct FakeSource {
        collection: Vec<BookRecord>,
    }

    #[async_trait]
    impl CatalogSource for FakeSource {
        async fn fetch_page(
            &self,
            offset: u32,
            limit: u32,
        ) -> Result<Vec<BookRecord>, ApiError> {
            Ok(self
                .collection
                .iter()
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn fetch_by_id(&self, id: u64) -> Result<BookRecord, ApiError> {
            Ok(self
                .collection
                .iter()
                .find(|b| b.id == id)
                .cloned()
                .expect("test ids exist"))
        }
    }

    fn book(id: u64, title: &str) -> BookRecord {
        BookRecord {
            id,
            year: 0,
            title: title.to_string(),
            handle: String::new(),
            publisher: "Viking".to_string(),
            isbn: String::new(),
            pages: 0,
            notes: Vec::new(),
            characters: Vec::new(),
        }
    }

    fn collection(n: u64) -> Vec<BookRecord> {
        (1..=n).map(|id| book(id, &format!("Book {id}"))).collect()
    }

    fn test_app(
        books: Vec<BookRecord>,
        store: Option<SessionStore>,
        page_size: u32,
    ) -> (App<FakeSource>, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let auth =
            AuthClient::new(Url::parse("http://localhost:1/api").unwrap());
        let app = App::new(
            Arc::new(FakeSource { collection: books }),
            auth,
            store,
            page_size,
            tx,
        );
        (app, rx)
    }

    fn press(app: &mut App<FakeSource>, code: KeyCode) {
        app.handle_event(AppEvent::Input(Event::Key(KeyEvent::new(
            code,
            KeyModifiers::NONE,
        ))));
    }

    #[tokio::test]
    async fn starts_on_login_without_a_session() {
        let (app, _rx) = test_app(collection(0), None, 100);
        assert!(matches!(app.screen, Screen::Login(_)));
    }

    #[tokio::test]
    async fn persisted_session_routes_straight_to_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("user.json"));
        store.create("annie", serde_json::Value::Null).unwrap();

        let (app, _rx) = test_app(collection(0), Some(store), 100);
        assert!(matches!(app.screen, Screen::Catalog));
        assert_eq!(app.session.as_ref().unwrap().username, "annie");
    }

    #[tokio::test]
    async fn typing_on_the_login_form_fills_the_focused_field() {
        let (mut app, _rx) = test_app(collection(0), None, 100);
        for ch in "annie".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Tab);
        for ch in "pw".chars() {
            press(&mut app, KeyCode::Char(ch));
        }

        let Screen::Login(form) = &app.screen else {
            panic!("expected login screen");
        };
        assert_eq!(form.username, "annie");
        assert_eq!(form.password, "pw");
    }

    #[tokio::test]
    async fn rejected_credentials_raise_the_blocking_modal() {
        let (mut app, _rx) = test_app(collection(0), None, 100);
        app.handle_event(AppEvent::LoginDone {
            username: "annie".to_string(),
            result: Err(ApiError::InvalidCredentials),
        });

        let Screen::Login(form) = &app.screen else {
            panic!("expected login screen");
        };
        assert_eq!(
            form.modal.as_deref(),
            Some("Invalid username or password.")
        );

        // Any key dismisses the dialog.
        press(&mut app, KeyCode::Char('x'));
        let Screen::Login(form) = &app.screen else {
            panic!("expected login screen");
        };
        assert!(form.modal.is_none());
    }

    #[tokio::test]
    async fn successful_login_enters_the_catalog_and_requests_a_page() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("user.json"));
        let (mut app, mut rx) = test_app(collection(3), Some(store), 100);

        app.handle_event(AppEvent::LoginDone {
            username: "annie".to_string(),
            result: Ok(serde_json::json!({"token": "t"})),
        });

        assert!(matches!(app.screen, Screen::Catalog));
        assert!(app.controller.is_loading());
        assert_eq!(app.session.as_ref().unwrap().username, "annie");

        // The spawned fetch reports back through the channel.
        match rx.recv().await {
            Some(AppEvent::Page {
                result: Ok(records),
                ..
            }) => assert_eq!(records.len(), 3),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn scrolling_near_the_end_requests_the_next_page() {
        let (mut app, mut rx) = test_app(collection(10), None, 5);
        app.screen = Screen::Catalog;
        app.start();
        let page = rx.recv().await.expect("initial page");
        app.handle_event(page);
        assert_eq!(app.controller.items().len(), 5);

        // Within the threshold from the start of a 5-item grid, the very
        // first move already trips the next request.
        press(&mut app, KeyCode::Down);
        assert!(app.controller.is_loading());

        let page = rx.recv().await.expect("second page");
        app.handle_event(page);
        assert_eq!(app.controller.items().len(), 10);
    }

    #[tokio::test]
    async fn selection_clamps_when_the_filter_narrows_the_grid() {
        let (mut app, mut rx) = test_app(collection(6), None, 10);
        app.screen = Screen::Catalog;
        app.start();
        let page = rx.recv().await.expect("initial page");
        app.handle_event(page);

        app.selected = 5;
        // "book 1" matches exactly one title.
        for ch in "book 1".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        assert_eq!(app.controller.visible().len(), 1);
        assert_eq!(app.selected, 0);
    }

    #[tokio::test]
    async fn logout_invalidates_the_session_and_returns_to_login() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("user.json"));
        store.create("annie", serde_json::Value::Null).unwrap();
        let reopened = SessionStore::new(dir.path().join("user.json"));

        let (mut app, _rx) = test_app(collection(0), Some(store), 100);
        assert!(matches!(app.screen, Screen::Catalog));

        app.handle_event(AppEvent::Input(Event::Key(KeyEvent::new(
            KeyCode::Char('l'),
            KeyModifiers::CONTROL,
        ))));

        assert!(matches!(app.screen, Screen::Login(_)));
        assert!(app.session.is_none());
        assert!(reopened.load().is_none());
    }

    #[tokio::test]
    async fn queued_page_result_is_dropped_after_logout() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("user.json"));
        store.create("annie", serde_json::Value::Null).unwrap();

        let (mut app, mut rx) = test_app(collection(3), Some(store), 100);
        assert!(matches!(app.screen, Screen::Catalog));
        app.start();

        // The page completes and sits in the queue, but the user logs out
        // before the loop gets to it.
        let queued = rx.recv().await.expect("completed page");
        app.handle_event(AppEvent::Input(Event::Key(KeyEvent::new(
            KeyCode::Char('l'),
            KeyModifiers::CONTROL,
        ))));
        app.handle_event(queued);

        assert!(matches!(app.screen, Screen::Login(_)));
        assert!(app.controller.items().is_empty());
        assert_eq!(*app.controller.phase(), LoadPhase::Idle);
    }

    #[tokio::test]
    async fn detail_screen_returns_to_the_catalog_on_escape() {
        let (mut app, mut rx) = test_app(collection(2), None, 10);
        app.screen = Screen::Catalog;
        app.start();
        let page = rx.recv().await.expect("initial page");
        app.handle_event(page);

        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.screen, Screen::Detail(_)));

        let detail = rx.recv().await.expect("detail outcome");
        app.handle_event(detail);
        let Screen::Detail(view) = &app.screen else {
            panic!("expected detail screen");
        };
        assert_eq!(view.record.as_ref().unwrap().id, 1);

        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.screen, Screen::Catalog));
    }
}
