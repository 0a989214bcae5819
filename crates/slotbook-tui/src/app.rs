//! Application state management for slotbook.
//!
//! This module contains the `App` struct that owns the session store, the
//! API gateway, the view data and the background task channel. It is the
//! only place that reacts to `ApiError::Unauthorized`: the whole shell is
//! reset as if the program had been restarted.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use chrono::{Duration, Local, NaiveDate, Utc};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

use slotbook_core::api::ApiError;
use slotbook_core::auth::{Session, SessionStorage};
use slotbook_core::messages::MessageQueue;
use slotbook_core::models::{AllBookingsResponse, Booking, Role, Slot};
use slotbook_core::validation::{validate_login, validate_registration};
use slotbook_core::{ApiClient, ApiConfig, Config, SessionState, SessionStore};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for name and email inputs.
const MAX_TEXT_LENGTH: usize = 64;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Days shown in one page of the slot browser.
pub const SLOT_WINDOW_DAYS: i64 = 7;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";
const LOGIN_REJECTED_MESSAGE: &str = "Invalid email or password.";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Slots,
    MyBookings,
    AllBookings,
}

impl Tab {
    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Slots => "Book a Slot",
            Tab::MyBookings => "My Bookings",
            Tab::AllBookings => "All Bookings",
        }
    }

    /// Tabs available to a role, in display order.
    pub fn for_role(role: Role) -> &'static [Tab] {
        match role {
            Role::Patient => &[Tab::Slots, Tab::MyBookings],
            Role::Admin => &[Tab::AllBookings],
        }
    }

    /// Get the next tab for the role (wrapping around)
    pub fn next(&self, role: Role) -> Self {
        let tabs = Self::for_role(role);
        let i = tabs.iter().position(|t| t == self).unwrap_or(0);
        tabs[(i + 1) % tabs.len()]
    }

    /// Get the previous tab for the role (wrapping around)
    pub fn prev(&self, role: Role) -> Self {
        let tabs = Self::for_role(role);
        let i = tabs.iter().position(|t| t == self).unwrap_or(0);
        tabs[(i + tabs.len() - 1) % tabs.len()]
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Loading,
    LoggingIn,
    Registering,
    Normal,
    ShowingHelp,
    ConfirmingQuit,
    ConfirmingCancel,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
    Register,
}

/// Registration form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFocus {
    Name,
    Email,
    Password,
    Confirm,
    Button,
    Back,
}

/// What a background task was doing, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Register,
    LoadSlots,
    LoadMyBookings,
    LoadAllBookings,
    Book,
    Cancel,
}

impl Action {
    fn describe(&self) -> &'static str {
        match self {
            Action::Login => "login",
            Action::Register => "registration",
            Action::LoadSlots => "loading slots",
            Action::LoadMyBookings => "loading bookings",
            Action::LoadAllBookings => "loading all bookings",
            Action::Book => "booking",
            Action::Cancel => "cancellation",
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from spawned API calls.
pub enum TaskResult {
    LoggedIn(Session),
    Registered { email: String },
    Slots(Vec<Slot>),
    MyBookings(Vec<Booking>),
    AllBookings(AllBookingsResponse),
    Booked,
    Cancelled,
    Failed { action: Action, error: ApiError },
}

// ============================================================================
// View Data
// ============================================================================

/// Everything fetched from the server. Dropped wholesale on logout and on
/// a forced reload.
#[derive(Debug, Default)]
pub struct ViewData {
    pub slots: Vec<Slot>,
    pub slots_loaded: bool,
    pub slot_selection: usize,

    pub bookings: Vec<Booking>,
    pub bookings_loaded: bool,
    pub booking_selection: usize,

    pub all_bookings: Option<AllBookingsResponse>,
    pub admin_page: u32,
    pub admin_selection: usize,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    storage: Arc<dyn SessionStorage>,
    pub session: Arc<SessionStore>,
    pub api: ApiClient,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub week_start: NaiveDate,
    pub data: ViewData,
    pub messages: MessageQueue,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Registration form state
    pub register_name: String,
    pub register_email: String,
    pub register_password: String,
    pub register_confirm: String,
    pub register_focus: RegisterFocus,
    pub register_error: Option<String>,

    /// Booking awaiting cancel confirmation
    pub pending_cancel: Option<String>,

    /// Number of API calls in flight
    pub in_flight: usize,

    /// A login or registration call is outstanding
    pub auth_pending: bool,

    /// Spawned calls, aborted on reload
    tasks: Vec<AbortHandle>,

    /// Bumped on every reload
    generation: u64,

    // Background task channel
    task_rx: mpsc::Receiver<TaskResult>,
    task_tx: mpsc::Sender<TaskResult>,
}

impl App {
    /// Create the shell. The session store starts in its loading state;
    /// call `initialize` before the first frame that shows content.
    pub fn new(config: Config, api_config: ApiConfig, storage: Arc<dyn SessionStorage>) -> Result<Self> {
        let session = Arc::new(SessionStore::new(storage.clone()));
        let api = ApiClient::new(api_config, session.clone())?;
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let login_email = config.last_email.clone().unwrap_or_default();

        Ok(Self {
            config,
            storage,
            session,
            api,

            state: AppState::Loading,
            current_tab: Tab::Slots,
            week_start: Local::now().date_naive(),
            data: ViewData::default(),
            messages: MessageQueue::new(),

            login_email,
            login_password: String::new(),
            login_focus: LoginFocus::Email,
            login_error: None,

            register_name: String::new(),
            register_email: String::new(),
            register_password: String::new(),
            register_confirm: String::new(),
            register_focus: RegisterFocus::Name,
            register_error: None,

            pending_cancel: None,
            in_flight: 0,
            auth_pending: false,
            tasks: Vec::new(),
            generation: 0,

            task_rx: rx,
            task_tx: tx,
        })
    }

    // =========================================================================
    // Session Lifecycle
    // =========================================================================

    /// Rehydrate the session and route to the first view.
    pub fn initialize(&mut self) {
        match self.session.initialize(Utc::now()) {
            SessionState::Active(session) => {
                debug!(role = %session.role(), "Starting with restored session");
                self.enter_authenticated(session.role());
            }
            SessionState::Absent | SessionState::Loading => self.start_login(),
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session.snapshot()
    }

    pub fn role(&self) -> Option<Role> {
        self.session.snapshot().session().map(|s| s.role())
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.snapshot().is_active()
    }

    fn enter_authenticated(&mut self, role: Role) {
        self.state = AppState::Normal;
        self.current_tab = Tab::for_role(role)[0];
        self.load_current_tab();
    }

    /// Show the login form
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Show the registration form
    pub fn start_register(&mut self) {
        self.state = AppState::Registering;
        self.register_focus = RegisterFocus::Name;
        self.register_error = None;
        if self.register_email.is_empty() {
            self.register_email = self.login_email.clone();
        }
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.data = ViewData::default();
        self.pending_cancel = None;
        self.login_password.clear();
        self.start_login();
        self.messages.success("You have been logged out.");
    }

    /// Throw away everything tied to the previous session and start over
    /// from storage, as a fresh process would. Calls still in flight are
    /// aborted; the old store is retired so any that finish anyway cannot
    /// touch storage, and their results land on the dropped channel.
    pub fn reload(&mut self, notice: &str) {
        info!("Reloading application shell");

        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.session.retire();

        let session = Arc::new(SessionStore::new(self.storage.clone()));
        self.api = self.api.with_session(session.clone());
        self.session = session;

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        self.task_tx = tx;
        self.task_rx = rx;
        self.in_flight = 0;
        self.auth_pending = false;
        self.generation += 1;

        self.data = ViewData::default();
        self.pending_cancel = None;
        self.login_password.clear();
        self.week_start = Local::now().date_naive();
        self.messages.clear();

        self.state = AppState::Loading;
        self.initialize();
        self.messages.error(notice);
    }

    /// Periodic housekeeping, called once per event-loop tick.
    pub fn tick(&mut self) {
        self.messages.prune(Instant::now());

        if self.session.expire_if_due(Utc::now()) {
            self.reload(SESSION_EXPIRED_MESSAGE);
            return;
        }

        self.check_background_tasks();
    }

    // =========================================================================
    // Forms
    // =========================================================================

    /// Validate the login form and start the login call.
    pub fn attempt_login(&mut self) {
        if self.auth_pending {
            return;
        }
        let email = self.login_email.trim().to_string();
        if let Err(e) = validate_login(&email, &self.login_password) {
            self.login_error = Some(e.to_string());
            return;
        }
        self.login_error = None;
        self.auth_pending = true;

        let password = self.login_password.clone();
        self.spawn(Action::Login, move |api| async move {
            api.login(&email, &password).await.map(TaskResult::LoggedIn)
        });
    }

    /// Validate the registration form. Nothing is sent when validation fails.
    pub fn attempt_register(&mut self) {
        if self.auth_pending {
            return;
        }
        if let Err(e) = validate_registration(
            &self.register_name,
            &self.register_email,
            &self.register_password,
            &self.register_confirm,
        ) {
            let message = e.to_string();
            self.messages.error(message.clone());
            self.register_error = Some(message);
            return;
        }
        self.register_error = None;
        self.auth_pending = true;

        let name = self.register_name.trim().to_string();
        let email = self.register_email.trim().to_string();
        let password = self.register_password.clone();
        self.spawn(Action::Register, move |api| async move {
            api.register(&name, &email, &password)
                .await
                .map(|_| TaskResult::Registered { email })
        });
    }

    // =========================================================================
    // Data Loading
    // =========================================================================

    /// End of the visible slot window (exclusive).
    pub fn week_end(&self) -> NaiveDate {
        self.week_start + Duration::days(SLOT_WINDOW_DAYS)
    }

    pub fn shift_week(&mut self, weeks: i64) {
        let today = Local::now().date_naive();
        let candidate = self.week_start + Duration::days(SLOT_WINDOW_DAYS * weeks);
        // No browsing into the past
        self.week_start = candidate.max(today);
        self.data.slot_selection = 0;
        self.load_slots();
    }

    pub fn load_current_tab(&mut self) {
        match self.current_tab {
            Tab::Slots => self.load_slots(),
            Tab::MyBookings => self.load_my_bookings(),
            Tab::AllBookings => {
                let page = self.data.admin_page.max(1);
                self.load_all_bookings(page);
            }
        }
    }

    pub fn load_slots(&mut self) {
        let (from, to) = (self.week_start, self.week_end());
        self.spawn(Action::LoadSlots, move |api| async move {
            api.fetch_slots(from, to).await.map(TaskResult::Slots)
        });
    }

    pub fn load_my_bookings(&mut self) {
        self.spawn(Action::LoadMyBookings, |api| async move {
            api.fetch_my_bookings().await.map(TaskResult::MyBookings)
        });
    }

    pub fn load_all_bookings(&mut self, page: u32) {
        let limit = self.config.admin_page_size();
        self.spawn(Action::LoadAllBookings, move |api| async move {
            api.fetch_all_bookings(page, limit).await.map(TaskResult::AllBookings)
        });
    }

    pub fn admin_next_page(&mut self) {
        if let Some(ref all) = self.data.all_bookings {
            let pagination = all.pagination();
            if pagination.has_next() {
                self.load_all_bookings(pagination.page + 1);
            }
        }
    }

    pub fn admin_prev_page(&mut self) {
        if let Some(ref all) = self.data.all_bookings {
            let pagination = all.pagination();
            if pagination.has_prev() {
                self.load_all_bookings(pagination.page - 1);
            }
        }
    }

    // =========================================================================
    // Booking Actions
    // =========================================================================

    pub fn book_selected_slot(&mut self) {
        let Some(slot) = self.data.slots.get(self.data.slot_selection) else {
            return;
        };
        let slot_id = slot.id.clone();
        self.spawn(Action::Book, move |api| async move {
            api.book(&slot_id).await.map(|_| TaskResult::Booked)
        });
    }

    /// Ask for confirmation before cancelling the selected booking. Past
    /// bookings cannot be cancelled.
    pub fn request_cancel_selected(&mut self) {
        let Some(booking) = self.data.bookings.get(self.data.booking_selection) else {
            return;
        };
        if !booking.is_upcoming(Utc::now()) {
            self.messages.error("Past bookings cannot be cancelled.");
            return;
        }
        self.pending_cancel = Some(booking.id.clone());
        self.state = AppState::ConfirmingCancel;
    }

    pub fn confirm_cancel(&mut self) {
        self.state = AppState::Normal;
        let Some(booking_id) = self.pending_cancel.take() else {
            return;
        };
        self.spawn(Action::Cancel, move |api| async move {
            api.cancel_booking(&booking_id).await.map(|_| TaskResult::Cancelled)
        });
    }

    /// Re-fetch both patient lists at once after a booking changes.
    fn refresh_patient_data(&mut self) {
        let (from, to) = (self.week_start, self.week_end());
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        self.in_flight += 2;

        let handle = tokio::spawn(async move {
            let (slots, bookings) =
                futures::future::join(api.fetch_slots(from, to), api.fetch_my_bookings()).await;
            let slots = slots
                .map(TaskResult::Slots)
                .unwrap_or_else(|error| TaskResult::Failed { action: Action::LoadSlots, error });
            let bookings = bookings
                .map(TaskResult::MyBookings)
                .unwrap_or_else(|error| TaskResult::Failed { action: Action::LoadMyBookings, error });
            Self::send_result(&tx, slots).await;
            Self::send_result(&tx, bookings).await;
        });
        self.track(handle.abort_handle());
    }

    // =========================================================================
    // Background Tasks
    // =========================================================================

    /// Run one API call on the runtime and report back through the channel.
    fn spawn<F, Fut>(&mut self, action: Action, call: F)
    where
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<TaskResult, ApiError>> + Send + 'static,
    {
        let api = self.api.clone();
        let tx = self.task_tx.clone();
        self.in_flight += 1;
        debug!(action = action.describe(), "Spawning API call");

        let handle = tokio::spawn(async move {
            let result = call(api)
                .await
                .unwrap_or_else(|error| TaskResult::Failed { action, error });
            Self::send_result(&tx, result).await;
        });
        self.track(handle.abort_handle());
    }

    fn track(&mut self, task: AbortHandle) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(task);
    }

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskResult>, result: TaskResult) {
        if tx.send(result).await.is_err() {
            // The shell reloaded while this call was in flight
            debug!("Dropping result for a discarded shell");
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Drain finished tasks and apply their results
    pub fn check_background_tasks(&mut self) {
        let generation = self.generation;
        while let Ok(result) = self.task_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            self.process_task_result(result);
            // A reload swapped the channel; stop reading the old one
            if self.generation != generation {
                break;
            }
        }
    }

    pub fn process_task_result(&mut self, result: TaskResult) {
        match result {
            TaskResult::LoggedIn(session) => {
                self.auth_pending = false;
                let role = session.role();
                info!(role = %role, "Login complete");
                self.config.last_email = Some(self.login_email.trim().to_string());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.login_password.clear();
                self.messages
                    .success(format!("Welcome, {}!", session.user.display_name()));
                self.enter_authenticated(role);
            }
            TaskResult::Registered { email } => {
                self.auth_pending = false;
                self.register_password.clear();
                self.register_confirm.clear();
                self.login_email = email;
                self.start_login();
                self.messages.success("Registration successful! Please log in.");
            }
            TaskResult::Slots(slots) => {
                self.data.slot_selection = self.data.slot_selection.min(slots.len().saturating_sub(1));
                self.data.slots = slots;
                self.data.slots_loaded = true;
            }
            TaskResult::MyBookings(mut bookings) => {
                let now = Utc::now();
                // Upcoming first, soonest first; then past, most recent first
                bookings.sort_by(|a, b| {
                    b.is_upcoming(now).cmp(&a.is_upcoming(now)).then_with(|| {
                        if a.is_upcoming(now) {
                            a.slot.start_time.cmp(&b.slot.start_time)
                        } else {
                            b.slot.start_time.cmp(&a.slot.start_time)
                        }
                    })
                });
                self.data.booking_selection =
                    self.data.booking_selection.min(bookings.len().saturating_sub(1));
                self.data.bookings = bookings;
                self.data.bookings_loaded = true;
            }
            TaskResult::AllBookings(all) => {
                self.data.admin_page = all.pagination().page;
                self.data.admin_selection = 0;
                self.data.all_bookings = Some(all);
            }
            TaskResult::Booked => {
                self.messages.success("Appointment booked successfully!");
                self.refresh_patient_data();
            }
            TaskResult::Cancelled => {
                self.messages.success("Booking cancelled.");
                self.refresh_patient_data();
            }
            TaskResult::Failed { action, error } => self.handle_failure(action, error),
        }
    }

    fn handle_failure(&mut self, action: Action, error: ApiError) {
        if error.is_unauthorized() {
            let notice = if action == Action::Login {
                LOGIN_REJECTED_MESSAGE
            } else {
                SESSION_EXPIRED_MESSAGE
            };
            warn!(action = action.describe(), "Authorization failure, forcing reload");
            self.reload(notice);
            return;
        }

        error!(action = action.describe(), error = %error, "API call failed");
        let message = error.to_string();
        if matches!(action, Action::Login | Action::Register) {
            self.auth_pending = false;
        }
        match action {
            Action::Login => self.login_error = Some(message.clone()),
            Action::Register => self.register_error = Some(message.clone()),
            _ => {}
        }
        self.messages.error(message);
    }
}

// ============================================================================
// Input Validation Helpers
// ============================================================================

fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a name or email character should be accepted
pub fn can_add_text_char(current_len: usize, c: char) -> bool {
    current_len < MAX_TEXT_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use slotbook_core::auth::{MemoryStorage, TOKEN_KEY, USER_KEY};
    use slotbook_core::models::Pagination;

    fn test_app(storage: Arc<MemoryStorage>) -> App {
        App::new(
            Config::default(),
            ApiConfig::new("http://127.0.0.1:1/api"),
            storage,
        )
        .unwrap()
    }

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tabs_for_role() {
        assert_eq!(Tab::for_role(Role::Patient), &[Tab::Slots, Tab::MyBookings]);
        assert_eq!(Tab::for_role(Role::Admin), &[Tab::AllBookings]);
    }

    #[test]
    fn test_tab_next_prev_wrap() {
        assert_eq!(Tab::Slots.next(Role::Patient), Tab::MyBookings);
        assert_eq!(Tab::MyBookings.next(Role::Patient), Tab::Slots);
        assert_eq!(Tab::Slots.prev(Role::Patient), Tab::MyBookings);
        assert_eq!(Tab::AllBookings.next(Role::Admin), Tab::AllBookings);
    }

    // -------------------------------------------------------------------------
    // Session Lifecycle Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_app_starts_loading() {
        let app = test_app(Arc::new(MemoryStorage::new()));
        assert_eq!(app.state, AppState::Loading);
        assert!(app.session_state().is_loading());
    }

    #[test]
    fn test_initialize_without_session_shows_login() {
        let mut app = test_app(Arc::new(MemoryStorage::new()));
        app.initialize();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(!app.is_authenticated());
    }

    #[test]
    fn test_initialize_clears_stale_storage() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(TOKEN_KEY, "not.a.token").unwrap();
        storage.set(USER_KEY, r#"{"name":"Pat"}"#).unwrap();

        let mut app = test_app(storage.clone());
        app.initialize();
        assert_eq!(app.state, AppState::LoggingIn);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_register_mismatch_stays_local() {
        let mut app = test_app(Arc::new(MemoryStorage::new()));
        app.initialize();
        app.start_register();
        app.register_name = "Pat".to_string();
        app.register_email = "patient@example.com".to_string();
        app.register_password = "Passw0rd!".to_string();
        app.register_confirm = "Passw0rd".to_string();

        // No runtime here: a spawned call would panic
        app.attempt_register();

        assert_eq!(app.in_flight, 0);
        assert_eq!(app.register_error.as_deref(), Some("Passwords do not match"));
        assert_eq!(
            app.messages.latest(Instant::now()).map(|m| m.text.as_str()),
            Some("Passwords do not match")
        );
    }

    #[test]
    fn test_login_requires_fields() {
        let mut app = test_app(Arc::new(MemoryStorage::new()));
        app.initialize();
        app.login_email.clear();
        app.attempt_login();
        assert_eq!(app.in_flight, 0);
        assert_eq!(app.login_error.as_deref(), Some("Email is required"));
    }

    #[test]
    fn test_unauthorized_failure_reloads_shell() {
        let storage = Arc::new(MemoryStorage::new());
        let mut app = test_app(storage);
        app.initialize();
        app.state = AppState::Normal;
        app.data.all_bookings = Some(AllBookingsResponse::Paginated {
            bookings: vec![],
            pagination: Pagination { page: 3, limit: 10, total: 30, total_pages: 3 },
        });
        app.data.slots_loaded = true;

        app.process_task_result(TaskResult::Failed {
            action: Action::LoadAllBookings,
            error: ApiError::Unauthorized,
        });

        assert_eq!(app.state, AppState::LoggingIn);
        assert!(app.data.all_bookings.is_none());
        assert!(!app.data.slots_loaded);
        assert_eq!(app.in_flight, 0);
        assert_eq!(
            app.messages.latest(Instant::now()).map(|m| m.text.as_str()),
            Some(SESSION_EXPIRED_MESSAGE)
        );
    }

    #[test]
    fn test_login_rejection_message() {
        let mut app = test_app(Arc::new(MemoryStorage::new()));
        app.initialize();
        app.process_task_result(TaskResult::Failed {
            action: Action::Login,
            error: ApiError::Unauthorized,
        });
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(
            app.messages.latest(Instant::now()).map(|m| m.text.as_str()),
            Some(LOGIN_REJECTED_MESSAGE)
        );
    }

    #[test]
    fn test_application_error_becomes_message() {
        let mut app = test_app(Arc::new(MemoryStorage::new()));
        app.initialize();
        app.state = AppState::Normal;
        app.process_task_result(TaskResult::Failed {
            action: Action::Book,
            error: ApiError::Application { status: 409, message: "Slot already booked".to_string() },
        });
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(
            app.messages.latest(Instant::now()).map(|m| m.text.as_str()),
            Some("Slot already booked")
        );
    }

    #[test]
    fn test_empty_slot_week_is_empty_state() {
        let mut app = test_app(Arc::new(MemoryStorage::new()));
        app.process_task_result(TaskResult::Slots(vec![]));
        assert!(app.data.slots_loaded);
        assert!(app.data.slots.is_empty());
        assert!(app.messages.is_empty());
    }

    #[test]
    fn test_registered_returns_to_login() {
        let mut app = test_app(Arc::new(MemoryStorage::new()));
        app.initialize();
        app.start_register();
        app.process_task_result(TaskResult::Registered { email: "new@example.com".to_string() });
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_email, "new@example.com");
        assert_eq!(app.login_focus, LoginFocus::Password);
    }

    #[tokio::test]
    async fn test_repeated_login_submits_once() {
        let mut app = test_app(Arc::new(MemoryStorage::new()));
        app.initialize();
        app.login_email = "patient@example.com".to_string();
        app.login_password = "Passw0rd!".to_string();

        app.attempt_login();
        app.attempt_login();
        app.attempt_login();

        assert!(app.auth_pending);
        assert_eq!(app.in_flight, 1);
    }

    #[tokio::test]
    async fn test_reload_retires_store_and_drops_calls() {
        let mut app = test_app(Arc::new(MemoryStorage::new()));
        app.initialize();
        app.login_email = "patient@example.com".to_string();
        app.login_password = "Passw0rd!".to_string();
        app.attempt_login();
        let old_store = app.session.clone();

        app.process_task_result(TaskResult::Failed {
            action: Action::LoadSlots,
            error: ApiError::Unauthorized,
        });

        assert!(old_store.is_retired());
        assert!(!app.session.is_retired());
        assert!(!Arc::ptr_eq(&old_store, &app.session));
        assert!(app.tasks.is_empty());
        assert!(!app.auth_pending);
        assert_eq!(app.in_flight, 0);

        // The form is usable again on the fresh store
        app.login_password = "Passw0rd!".to_string();
        app.attempt_login();
        assert_eq!(app.in_flight, 1);
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_text_char() {
        assert!(can_add_text_char(0, 'a'));
        assert!(can_add_text_char(63, '@'));
        assert!(!can_add_text_char(64, 'a'));
        assert!(!can_add_text_char(0, '\n'));
        assert!(!can_add_text_char(0, '\x00'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\r'));
    }
}
