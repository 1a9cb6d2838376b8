//! Application state management for wicket.
//!
//! This module contains the `App` struct that holds the current route, the
//! per-screen form state, and the Google sign-in flow, and forwards submitted
//! forms to the authentication store in `wicket-core`.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use wicket_core::{guard, AuthStore, Config, IdentityProvider, ProviderStatus, Route};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
/// Only the provider probe reports through it, so a couple of slots suffice.
const CHANNEL_BUFFER_SIZE: usize = 4;

/// Maximum length for email, username, and one-time code input.
/// Identity emails and usernames fit well within 64 chars.
const MAX_FIELD_LENGTH: usize = 64;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for pasted values (reset tokens, authorization codes).
/// OAuth authorization codes run long; 256 chars leaves ample room.
const MAX_PASTE_LENGTH: usize = 256;

// ============================================================================
// Form Focus
// ============================================================================

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Remember,
    Button,
}

impl LoginFocus {
    pub fn next(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Remember,
            LoginFocus::Remember => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Email,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            LoginFocus::Email => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Remember => LoginFocus::Password,
            LoginFocus::Button => LoginFocus::Remember,
        }
    }
}

/// Registration form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegisterFocus {
    Username,
    Email,
    Password,
    Button,
}

impl RegisterFocus {
    pub fn next(self) -> Self {
        match self {
            RegisterFocus::Username => RegisterFocus::Email,
            RegisterFocus::Email => RegisterFocus::Password,
            RegisterFocus::Password => RegisterFocus::Button,
            RegisterFocus::Button => RegisterFocus::Username,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            RegisterFocus::Username => RegisterFocus::Button,
            RegisterFocus::Email => RegisterFocus::Username,
            RegisterFocus::Password => RegisterFocus::Email,
            RegisterFocus::Button => RegisterFocus::Password,
        }
    }
}

/// Email verification form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VerifyFocus {
    Email,
    Otp,
    Button,
}

impl VerifyFocus {
    pub fn next(self) -> Self {
        match self {
            VerifyFocus::Email => VerifyFocus::Otp,
            VerifyFocus::Otp => VerifyFocus::Button,
            VerifyFocus::Button => VerifyFocus::Email,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            VerifyFocus::Email => VerifyFocus::Button,
            VerifyFocus::Otp => VerifyFocus::Email,
            VerifyFocus::Button => VerifyFocus::Otp,
        }
    }
}

/// Forgot-password form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForgotFocus {
    Email,
    Button,
}

impl ForgotFocus {
    pub fn next(self) -> Self {
        match self {
            ForgotFocus::Email => ForgotFocus::Button,
            ForgotFocus::Button => ForgotFocus::Email,
        }
    }

    pub fn prev(self) -> Self {
        self.next()
    }
}

/// Reset-password form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResetFocus {
    Email,
    Token,
    Password,
    Button,
}

impl ResetFocus {
    pub fn next(self) -> Self {
        match self {
            ResetFocus::Email => ResetFocus::Token,
            ResetFocus::Token => ResetFocus::Password,
            ResetFocus::Password => ResetFocus::Button,
            ResetFocus::Button => ResetFocus::Email,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            ResetFocus::Email => ResetFocus::Button,
            ResetFocus::Token => ResetFocus::Email,
            ResetFocus::Password => ResetFocus::Token,
            ResetFocus::Button => ResetFocus::Password,
        }
    }
}

/// Google sign-in flow state
#[derive(Debug, Clone, PartialEq)]
pub enum GoogleFlow {
    Idle,
    /// Browser opened to the authorization URL; waiting for the pasted code
    AwaitingCode { url: String, code: String },
}

// ============================================================================
// App
// ============================================================================

/// Central application state
pub struct App {
    // Core state
    pub config: Config,
    pub store: AuthStore,
    pub route: Route,
    pub should_quit: bool,

    // Status line
    pub notice: Option<String>,

    // Google sign-in state
    pub google_status: Option<ProviderStatus>,
    pub google_flow: GoogleFlow,
    provider_rx: Option<mpsc::Receiver<ProviderStatus>>,

    // Login form
    pub login_email: String,
    pub login_password: String,
    pub login_remember: bool,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Registration form
    pub register_username: String,
    pub register_email: String,
    pub register_password: String,
    pub register_focus: RegisterFocus,
    pub register_error: Option<String>,

    // Email verification form
    pub verify_email: String,
    pub verify_otp: String,
    pub verify_focus: VerifyFocus,
    pub verify_error: Option<String>,

    // Forgot-password form
    pub forgot_email: String,
    pub forgot_focus: ForgotFocus,
    pub forgot_error: Option<String>,

    // Reset-password form
    pub reset_email: String,
    pub reset_token: String,
    pub reset_new_password: String,
    pub reset_focus: ResetFocus,
    pub reset_error: Option<String>,
}

impl App {
    /// Create the application state. A token restored by the store lands the
    /// user on the home screen; everyone else starts at sign-in.
    pub fn new(config: Config, store: AuthStore) -> Self {
        let route = guard(store.is_authenticated(), Route::Home);
        let login_email = config.last_email.clone().unwrap_or_default();
        let login_focus = if login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };

        let mut app = Self {
            config,
            store,
            route,
            should_quit: false,
            notice: None,
            google_status: None,
            google_flow: GoogleFlow::Idle,
            provider_rx: None,
            login_email,
            login_password: String::new(),
            login_remember: false,
            login_focus,
            login_error: None,
            register_username: String::new(),
            register_email: String::new(),
            register_password: String::new(),
            register_focus: RegisterFocus::Username,
            register_error: None,
            verify_email: String::new(),
            verify_otp: String::new(),
            verify_focus: VerifyFocus::Email,
            verify_error: None,
            forgot_email: String::new(),
            forgot_focus: ForgotFocus::Email,
            forgot_error: None,
            reset_email: String::new(),
            reset_token: String::new(),
            reset_new_password: String::new(),
            reset_focus: ResetFocus::Email,
            reset_error: None,
        };

        if app.route == Route::Login {
            app.ensure_google_probe();
        }
        app
    }

    /// Navigate to a route, passing the target through the access guard.
    /// A redirected navigation leaves a notice on the status line.
    pub fn navigate(&mut self, target: Route) {
        let resolved = guard(self.store.is_authenticated(), target);
        if resolved != target {
            info!(?target, ?resolved, "navigation redirected");
            self.notice = Some("Please sign in to continue".to_string());
        }
        self.route = resolved;
        if self.route == Route::Login {
            self.ensure_google_probe();
        }
    }

    // ------------------------------------------------------------------------
    // Google sign-in
    // ------------------------------------------------------------------------

    /// Kick off the provider readiness probe the first time the sign-in
    /// screen needs it. The probe runs once per process and reports back
    /// through the background channel; the store memoizes the outcome.
    fn ensure_google_probe(&mut self) {
        if self.google_status.is_some() || self.provider_rx.is_some() {
            return;
        }

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let provider = self.store.provider_handle();
        tokio::spawn(async move {
            let status = provider.ensure_ready().await;
            if let Err(e) = tx.send(status).await {
                error!(error = %e, "Failed to send provider status - channel closed");
            }
        });
        self.provider_rx = Some(rx);
    }

    /// Check for a completed provider probe and record its status
    pub fn check_background_tasks(&mut self) {
        let status = match self.provider_rx.as_mut() {
            Some(rx) => rx.try_recv().ok(),
            None => None,
        };
        if let Some(status) = status {
            self.google_status = Some(status);
            if status == ProviderStatus::Unavailable {
                info!("Google sign-in unavailable");
            }
        }
    }

    /// Open the browser at the authorization URL and collect the pasted code.
    /// The URL also shows in the overlay for environments with no browser.
    pub fn start_google_sign_in(&mut self) {
        let url = match self.store.begin_google_sign_in() {
            Some(url) => url,
            None => {
                self.login_error = Some("Google sign-in is not available".to_string());
                return;
            }
        };

        if let Err(e) = open::that(&url) {
            warn!(error = %e, "Failed to open browser");
        }
        self.google_flow = GoogleFlow::AwaitingCode {
            url,
            code: String::new(),
        };
    }

    /// Exchange the pasted authorization code and sign in with the result.
    /// A failed attempt consumes the pending sign-in, so the overlay closes
    /// either way and a retry starts fresh.
    pub async fn attempt_google_code(&mut self) {
        let code = match &self.google_flow {
            GoogleFlow::AwaitingCode { code, .. } => code.trim().to_string(),
            GoogleFlow::Idle => return,
        };
        if code.is_empty() {
            self.login_error = Some("Authorization code required".to_string());
            self.google_flow = GoogleFlow::Idle;
            return;
        }
        self.login_error = None;
        self.google_flow = GoogleFlow::Idle;

        match self.store.complete_google_sign_in(&code).await {
            Ok(()) => {
                self.navigate(Route::Home);
                self.notice = Some(self.signed_in_notice());
            }
            Err(e) => {
                self.login_error = Some(e.message().to_string());
            }
        }
    }

    // ------------------------------------------------------------------------
    // Form submission
    // ------------------------------------------------------------------------

    pub async fn attempt_login(&mut self) {
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();

        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return;
        }
        self.login_error = None;

        match self.store.login(&email, &password, self.login_remember).await {
            Ok(()) => {
                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                self.login_password.clear();
                self.navigate(Route::Home);
                self.notice = Some(self.signed_in_notice());
            }
            Err(e) => {
                self.login_error = Some(e.message().to_string());
            }
        }
    }

    pub async fn attempt_register(&mut self) {
        let username = self.register_username.trim().to_string();
        let email = self.register_email.trim().to_string();
        let password = self.register_password.clone();

        if username.is_empty() || email.is_empty() || password.is_empty() {
            self.register_error = Some("All fields are required".to_string());
            return;
        }
        self.register_error = None;

        match self.store.register(&username, &email, &password).await {
            Ok(()) => {
                self.register_password.clear();
                // The store parks the email for the verification screen
                self.verify_email = self
                    .store
                    .session()
                    .pending_email
                    .clone()
                    .unwrap_or(email);
                self.verify_focus = VerifyFocus::Otp;
                self.navigate(Route::VerifyEmail);
                self.notice = Some("Account created. Check your email for a code".to_string());
            }
            Err(e) => {
                self.register_error = Some(e.message().to_string());
            }
        }
    }

    pub async fn attempt_verify(&mut self) {
        let email = self.verify_email.trim().to_string();
        let otp = self.verify_otp.trim().to_string();

        if email.is_empty() || otp.is_empty() {
            self.verify_error = Some("Email and code required".to_string());
            return;
        }
        self.verify_error = None;

        match self.store.verify_email(&email, &otp).await {
            Ok(()) => {
                self.verify_otp.clear();
                self.login_email = email;
                self.login_focus = LoginFocus::Password;
                self.navigate(Route::Login);
                self.notice = Some("Email verified. Please sign in".to_string());
            }
            Err(e) => {
                self.verify_error = Some(e.message().to_string());
            }
        }
    }

    pub async fn attempt_forgot(&mut self) {
        let email = self.forgot_email.trim().to_string();

        if email.is_empty() {
            self.forgot_error = Some("Email required".to_string());
            return;
        }
        self.forgot_error = None;

        match self.store.forgot_password(&email).await {
            Ok(()) => {
                self.reset_email = email;
                self.reset_focus = ResetFocus::Token;
                self.navigate(Route::ResetPassword);
                self.notice = Some("Password reset email sent".to_string());
            }
            Err(e) => {
                self.forgot_error = Some(e.message().to_string());
            }
        }
    }

    pub async fn attempt_reset(&mut self) {
        let email = self.reset_email.trim().to_string();
        let token = self.reset_token.trim().to_string();
        let password = self.reset_new_password.clone();

        if email.is_empty() || token.is_empty() || password.is_empty() {
            self.reset_error = Some("All fields are required".to_string());
            return;
        }
        self.reset_error = None;

        match self.store.reset_password(&email, &token, &password).await {
            Ok(()) => {
                self.reset_token.clear();
                self.reset_new_password.clear();
                self.login_email = email;
                self.login_focus = LoginFocus::Password;
                self.navigate(Route::Login);
                self.notice = Some("Password reset. Please sign in".to_string());
            }
            Err(e) => {
                self.reset_error = Some(e.message().to_string());
            }
        }
    }

    /// Sign out and land back on the sign-in screen
    pub fn sign_out(&mut self) {
        self.store.logout();
        self.navigate(Route::Home);
        self.notice = Some("Signed out".to_string());
    }

    fn signed_in_notice(&self) -> String {
        match self.store.session().user.as_ref() {
            Some(user) => format!("Signed in as {}", user.username),
            None => "Signed in".to_string(),
        }
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email/username/code character should be accepted
pub fn can_add_field_char(current_len: usize, c: char) -> bool {
    current_len < MAX_FIELD_LENGTH && is_valid_input_char(c)
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Check if a pasted token/code character should be accepted
pub fn can_add_paste_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASTE_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
