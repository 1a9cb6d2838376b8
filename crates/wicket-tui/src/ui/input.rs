//! Keyboard input handling for the TUI.
//!
//! This module translates key events into form edits, route changes, and
//! operations on the authentication store.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use wicket_core::Route;

use crate::app::{
    can_add_field_char, can_add_paste_char, can_add_password_char, App, ForgotFocus, GoogleFlow,
    LoginFocus, RegisterFocus, ResetFocus, VerifyFocus,
};

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> bool {
    // The code overlay captures all input while a Google sign-in is pending
    if matches!(app.google_flow, GoogleFlow::AwaitingCode { .. }) {
        handle_google_code_input(app, key).await;
        return app.should_quit;
    }

    match app.route {
        Route::Home => handle_home_input(app, key),
        Route::Login => handle_login_input(app, key).await,
        Route::Register => handle_register_input(app, key).await,
        Route::VerifyEmail => handle_verify_input(app, key).await,
        Route::ForgotPassword => handle_forgot_input(app, key).await,
        Route::ResetPassword => handle_reset_input(app, key).await,
        Route::Profile => handle_profile_input(app, key),
    }

    app.should_quit
}

async fn handle_google_code_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.google_flow = GoogleFlow::Idle;
        }
        KeyCode::Enter => {
            app.attempt_google_code().await;
        }
        KeyCode::Backspace => {
            if let GoogleFlow::AwaitingCode { code, .. } = &mut app.google_flow {
                code.pop();
            }
        }
        KeyCode::Char(c) => {
            if let GoogleFlow::AwaitingCode { code, .. } = &mut app.google_flow {
                if can_add_paste_char(code.len(), c) {
                    code.push(c);
                }
            }
        }
        _ => {}
    }
}

fn handle_home_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('p') => app.navigate(Route::Profile),
        KeyCode::Char('q') => app.should_quit = true,
        _ => {}
    }
}

fn handle_profile_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('s') => app.sign_out(),
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc => app.navigate(Route::Home),
        _ => {}
    }
}

async fn handle_login_input(app: &mut App, key: KeyEvent) {
    // Screen switches use control chords so plain characters reach the fields
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('r') => app.navigate(Route::Register),
            KeyCode::Char('f') => app.navigate(Route::ForgotPassword),
            KeyCode::Char('g') => app.start_google_sign_in(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => {
            // Sign-in is the root screen while signed out
            if app.store.is_authenticated() {
                app.navigate(Route::Home);
            } else {
                app.should_quit = true;
            }
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = app.login_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = app.login_focus.prev();
        }
        KeyCode::Enter => {
            if app.login_focus == LoginFocus::Button {
                app.attempt_login().await;
            } else {
                app.login_focus = app.login_focus.next();
            }
        }
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Remember | LoginFocus::Button => {}
        },
        KeyCode::Char(' ') if app.login_focus == LoginFocus::Remember => {
            app.login_remember = !app.login_remember;
        }
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_field_char(app.login_email.len(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.len(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Remember | LoginFocus::Button => {}
        },
        _ => {}
    }
}

async fn handle_register_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Login),
        KeyCode::Down | KeyCode::Tab => {
            app.register_focus = app.register_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.register_focus = app.register_focus.prev();
        }
        KeyCode::Enter => {
            if app.register_focus == RegisterFocus::Button {
                app.attempt_register().await;
            } else {
                app.register_focus = app.register_focus.next();
            }
        }
        KeyCode::Backspace => match app.register_focus {
            RegisterFocus::Username => {
                app.register_username.pop();
            }
            RegisterFocus::Email => {
                app.register_email.pop();
            }
            RegisterFocus::Password => {
                app.register_password.pop();
            }
            RegisterFocus::Button => {}
        },
        KeyCode::Char(c) => match app.register_focus {
            RegisterFocus::Username => {
                if can_add_field_char(app.register_username.len(), c) {
                    app.register_username.push(c);
                }
            }
            RegisterFocus::Email => {
                if can_add_field_char(app.register_email.len(), c) {
                    app.register_email.push(c);
                }
            }
            RegisterFocus::Password => {
                if can_add_password_char(app.register_password.len(), c) {
                    app.register_password.push(c);
                }
            }
            RegisterFocus::Button => {}
        },
        _ => {}
    }
}

async fn handle_verify_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Login),
        KeyCode::Down | KeyCode::Tab => {
            app.verify_focus = app.verify_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.verify_focus = app.verify_focus.prev();
        }
        KeyCode::Enter => {
            if app.verify_focus == VerifyFocus::Button {
                app.attempt_verify().await;
            } else {
                app.verify_focus = app.verify_focus.next();
            }
        }
        KeyCode::Backspace => match app.verify_focus {
            VerifyFocus::Email => {
                app.verify_email.pop();
            }
            VerifyFocus::Otp => {
                app.verify_otp.pop();
            }
            VerifyFocus::Button => {}
        },
        KeyCode::Char(c) => match app.verify_focus {
            VerifyFocus::Email => {
                if can_add_field_char(app.verify_email.len(), c) {
                    app.verify_email.push(c);
                }
            }
            VerifyFocus::Otp => {
                if can_add_field_char(app.verify_otp.len(), c) {
                    app.verify_otp.push(c);
                }
            }
            VerifyFocus::Button => {}
        },
        _ => {}
    }
}

async fn handle_forgot_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Login),
        KeyCode::Down | KeyCode::Tab | KeyCode::Up | KeyCode::BackTab => {
            app.forgot_focus = app.forgot_focus.next();
        }
        KeyCode::Enter => {
            if app.forgot_focus == ForgotFocus::Button {
                app.attempt_forgot().await;
            } else {
                app.forgot_focus = app.forgot_focus.next();
            }
        }
        KeyCode::Backspace => {
            if app.forgot_focus == ForgotFocus::Email {
                app.forgot_email.pop();
            }
        }
        KeyCode::Char(c) => {
            if app.forgot_focus == ForgotFocus::Email
                && can_add_field_char(app.forgot_email.len(), c)
            {
                app.forgot_email.push(c);
            }
        }
        _ => {}
    }
}

async fn handle_reset_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.navigate(Route::Login),
        KeyCode::Down | KeyCode::Tab => {
            app.reset_focus = app.reset_focus.next();
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.reset_focus = app.reset_focus.prev();
        }
        KeyCode::Enter => {
            if app.reset_focus == ResetFocus::Button {
                app.attempt_reset().await;
            } else {
                app.reset_focus = app.reset_focus.next();
            }
        }
        KeyCode::Backspace => match app.reset_focus {
            ResetFocus::Email => {
                app.reset_email.pop();
            }
            ResetFocus::Token => {
                app.reset_token.pop();
            }
            ResetFocus::Password => {
                app.reset_new_password.pop();
            }
            ResetFocus::Button => {}
        },
        KeyCode::Char(c) => match app.reset_focus {
            ResetFocus::Email => {
                if can_add_field_char(app.reset_email.len(), c) {
                    app.reset_email.push(c);
                }
            }
            ResetFocus::Token => {
                if can_add_paste_char(app.reset_token.len(), c) {
                    app.reset_token.push(c);
                }
            }
            ResetFocus::Password => {
                if can_add_password_char(app.reset_new_password.len(), c) {
                    app.reset_new_password.push(c);
                }
            }
            ResetFocus::Button => {}
        },
        _ => {}
    }
}
