use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use wicket_core::{ProviderStatus, Route};

use crate::app::{App, ForgotFocus, GoogleFlow, LoginFocus, RegisterFocus, ResetFocus, VerifyFocus};

use super::styles;

/// Visible width of a text field in columns
const FIELD_WIDTH: usize = 24;

/// Width of the centered form boxes
const BOX_WIDTH: u16 = 46;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    if let GoogleFlow::AwaitingCode { url, code } = &app.google_flow {
        render_google_overlay(frame, url, code);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  wicket";
    let route_title = app.route.title();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + route_title.len() + 2),
        )),
        Span::styled(route_title, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.route {
        Route::Home => render_home(frame, app, area),
        Route::Login => render_login(frame, app, area),
        Route::Register => render_register(frame, app, area),
        Route::VerifyEmail => render_verify(frame, app, area),
        Route::ForgotPassword => render_forgot(frame, app, area),
        Route::ResetPassword => render_reset(frame, app, area),
        Route::Profile => render_profile(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match &app.notice {
        Some(notice) => format!(" {} ", notice),
        None => String::new(),
    };
    let right_text = format!(" {} ", hints(app.route));

    let width = area.width as usize;
    let padding = width
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::highlight_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

/// Key hints shown in the status bar for each screen
fn hints(route: Route) -> &'static str {
    match route {
        Route::Home => "[p] Profile | [q] Quit",
        Route::Login => "[Ctrl+R] Register | [Ctrl+F] Forgot | [Ctrl+G] Google | [Esc] Quit",
        Route::Register => "[Tab] Next field | [Enter] Submit | [Esc] Back",
        Route::VerifyEmail => "[Tab] Next field | [Enter] Submit | [Esc] Back",
        Route::ForgotPassword => "[Enter] Submit | [Esc] Back",
        Route::ResetPassword => "[Tab] Next field | [Enter] Submit | [Esc] Back",
        Route::Profile => "[s] Sign out | [Esc] Back | [q] Quit",
    }
}

// ============================================================================
// Screens
// ============================================================================

fn render_home(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = logo_lines();
    lines.push(Line::from(""));

    match app.store.session().user.as_ref() {
        Some(user) => {
            lines.push(Line::from(Span::styled(
                format!("   Signed in as {}", user.username),
                styles::success_style(),
            )));
            lines.push(Line::from(Span::styled(
                format!("   {}", user.email),
                styles::muted_style(),
            )));
        }
        None => {
            lines.push(Line::from(Span::styled("   Signed in", styles::success_style())));
        }
    }

    draw_centered_box(frame, area, lines);
}

fn render_login(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = logo_lines();
    lines.push(Line::from(""));

    lines.push(field_line(
        "Email:",
        &app.login_email,
        app.login_focus == LoginFocus::Email,
        false,
    ));
    lines.push(field_line(
        "Password:",
        &app.login_password,
        app.login_focus == LoginFocus::Password,
        true,
    ));

    // Remember-me toggle picks the durable token tier
    let remember_focused = app.login_focus == LoginFocus::Remember;
    let remember_style = if remember_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let mark = if app.login_remember { "x" } else { " " };
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("Remember: ", styles::muted_style()),
        Span::styled(format!("[{}]", mark), remember_style),
        Span::styled(" stay signed in", styles::muted_style()),
    ]));

    lines.push(Line::from(""));
    lines.push(button_line("Sign in", app.login_focus == LoginFocus::Button));
    lines.push(Line::from(""));

    lines.push(match app.google_status {
        Some(ProviderStatus::Ready) => Line::from(vec![
            Span::raw("   "),
            Span::styled("Ctrl+G", styles::help_key_style()),
            Span::styled(" Sign in with Google", styles::help_desc_style()),
        ]),
        Some(ProviderStatus::Unavailable) => Line::from(Span::styled(
            "   Google sign-in unavailable",
            styles::muted_style(),
        )),
        None => Line::from(Span::styled(
            "   Checking Google sign-in...",
            styles::muted_style(),
        )),
    });

    push_error(&mut lines, &app.login_error);
    draw_centered_box(frame, area, lines);
}

fn render_register(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("   Create account", styles::highlight_style())),
        Line::from(""),
    ];

    lines.push(field_line(
        "Username:",
        &app.register_username,
        app.register_focus == RegisterFocus::Username,
        false,
    ));
    lines.push(field_line(
        "Email:",
        &app.register_email,
        app.register_focus == RegisterFocus::Email,
        false,
    ));
    lines.push(field_line(
        "Password:",
        &app.register_password,
        app.register_focus == RegisterFocus::Password,
        true,
    ));

    lines.push(Line::from(""));
    lines.push(button_line(
        "Create account",
        app.register_focus == RegisterFocus::Button,
    ));

    push_error(&mut lines, &app.register_error);
    draw_centered_box(frame, area, lines);
}

fn render_verify(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("   Verify email", styles::highlight_style())),
        Line::from(Span::styled(
            "   Enter the code we mailed you",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    lines.push(field_line(
        "Email:",
        &app.verify_email,
        app.verify_focus == VerifyFocus::Email,
        false,
    ));
    lines.push(field_line(
        "Code:",
        &app.verify_otp,
        app.verify_focus == VerifyFocus::Otp,
        false,
    ));

    lines.push(Line::from(""));
    lines.push(button_line("Verify", app.verify_focus == VerifyFocus::Button));

    push_error(&mut lines, &app.verify_error);
    draw_centered_box(frame, area, lines);
}

fn render_forgot(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("   Forgot password", styles::highlight_style())),
        Line::from(Span::styled(
            "   We will mail you a reset token",
            styles::muted_style(),
        )),
        Line::from(""),
    ];

    lines.push(field_line(
        "Email:",
        &app.forgot_email,
        app.forgot_focus == ForgotFocus::Email,
        false,
    ));

    lines.push(Line::from(""));
    lines.push(button_line(
        "Send reset email",
        app.forgot_focus == ForgotFocus::Button,
    ));

    push_error(&mut lines, &app.forgot_error);
    draw_centered_box(frame, area, lines);
}

fn render_reset(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("   Reset password", styles::highlight_style())),
        Line::from(""),
    ];

    lines.push(field_line(
        "Email:",
        &app.reset_email,
        app.reset_focus == ResetFocus::Email,
        false,
    ));
    lines.push(field_line(
        "Token:",
        &app.reset_token,
        app.reset_focus == ResetFocus::Token,
        false,
    ));
    lines.push(field_line(
        "Password:",
        &app.reset_new_password,
        app.reset_focus == ResetFocus::Password,
        true,
    ));

    lines.push(Line::from(""));
    lines.push(button_line(
        "Reset password",
        app.reset_focus == ResetFocus::Button,
    ));

    push_error(&mut lines, &app.reset_error);
    draw_centered_box(frame, area, lines);
}

fn render_profile(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![
        Line::from(Span::styled("   Profile", styles::highlight_style())),
        Line::from(""),
    ];

    match app.store.session().user.as_ref() {
        Some(user) => {
            lines.push(profile_row("Username:", &user.username));
            lines.push(profile_row("Email:", &user.email));
            if let Some(avatar) = &user.avatar_url {
                lines.push(profile_row("Avatar:", avatar));
            }
        }
        None => {
            // A session restored from storage has a token but no profile
            lines.push(Line::from(Span::styled(
                "   Profile details arrive with a fresh sign-in",
                styles::muted_style(),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("   "),
        Span::styled("s", styles::help_key_style()),
        Span::styled(" sign out", styles::help_desc_style()),
    ]));

    draw_centered_box(frame, area, lines);
}

fn render_google_overlay(frame: &mut Frame, url: &str, code: &str) {
    // Interior width for wrapping the authorization URL
    let inner_width = 52usize;
    let url_rows = (url.len() + inner_width - 1) / inner_width;
    let height = (11 + url_rows) as u16;

    let area = centered_rect_fixed(56, height, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            "  Sign in with Google",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Finish signing in with your browser, then paste",
            styles::help_desc_style(),
        )),
        Line::from(Span::styled(
            "  the authorization code below.",
            styles::help_desc_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("  {}", url), styles::muted_style())),
        Line::from(""),
        field_line("Code:", code, true, false),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("[Enter]", styles::help_key_style()),
            Span::styled(" Submit  ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" Cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

// ============================================================================
// Building blocks
// ============================================================================

fn logo_lines() -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(
            "              ╦ ╦╦╔═╗╦╔═╔═╗╔╦╗",
            styles::title_style(),
        )),
        Line::from(Span::styled(
            "              ║║║║║  ╠╩╗║╣  ║ ",
            styles::title_style(),
        )),
        Line::from(Span::styled(
            "              ╚╩╝╩╚═╝╩ ╩╚═╝ ╩ ",
            styles::title_style(),
        )),
    ]
}

/// One labelled text field with a trailing cursor when focused
fn field_line(label: &str, value: &str, focused: bool, mask: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let shown = if mask {
        "*".repeat(value.chars().count().min(FIELD_WIDTH))
    } else {
        field_tail(value, FIELD_WIDTH)
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("   "),
        Span::styled(format!("{:<10}[", label), styles::muted_style()),
        Span::styled(format!("{:<24}{}", shown, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw("            ["),
        Span::styled(text, style),
        Span::raw("]"),
    ])
}

fn profile_row(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("   "),
        Span::styled(format!("{:<10}", label), styles::muted_style()),
        Span::styled(field_tail(value, 30), styles::list_item_style()),
    ])
}

fn push_error(lines: &mut Vec<Line<'static>>, error: &Option<String>) {
    if let Some(error) = error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }
}

/// Visible tail of a field value, so the cursor end stays in view
fn field_tail(value: &str, width: usize) -> String {
    let len = value.chars().count();
    if len <= width {
        value.to_string()
    } else {
        value.chars().skip(len - width).collect()
    }
}

/// Center the lines in a fixed-width bordered box
fn draw_centered_box(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let rect = centered_rect_fixed(BOX_WIDTH, lines.len() as u16 + 2, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, rect);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
