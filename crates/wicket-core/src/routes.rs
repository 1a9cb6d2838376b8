//! Named routes and the access-control guard.
//!
//! Every navigation attempt passes through `guard`, which decides where
//! the navigation actually lands. Only login, registration, and email
//! verification are reachable without a signed-in session; the password
//! recovery screens are deliberately not in the public set.

/// Views reachable in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    VerifyEmail,
    ForgotPassword,
    ResetPassword,
    Profile,
}

impl Route {
    /// Routes reachable without a signed-in session
    pub fn is_public(self) -> bool {
        matches!(self, Route::Login | Route::Register | Route::VerifyEmail)
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Login => "Sign in",
            Route::Register => "Create account",
            Route::VerifyEmail => "Verify email",
            Route::ForgotPassword => "Forgot password",
            Route::ResetPassword => "Reset password",
            Route::Profile => "Profile",
        }
    }
}

/// Decide where a navigation attempt lands.
/// Unauthenticated attempts at protected routes land on the login screen;
/// everything else proceeds to the target. Pure function, no side effects.
pub fn guard(authenticated: bool, target: Route) -> Route {
    if authenticated || target.is_public() {
        target
    } else {
        Route::Login
    }
}
