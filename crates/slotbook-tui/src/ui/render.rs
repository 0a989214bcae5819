use std::time::Instant;

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use slotbook_core::validation::{password_strength, strength_label};

use crate::app::{App, AppState, LoginFocus, RegisterFocus, Tab};

use super::styles;
use super::tabs::{admin, bookings, slots};

const LOGO: [&str; 3] = [
    "   ╔═╗╦  ╔═╗╔╦╗╔╗ ╔═╗╔═╗╦╔═",
    "   ╚═╗║  ║ ║ ║ ╠╩╗║ ║║ ║╠╩╗",
    "   ╚═╝╩═╝╚═╝ ╩ ╚═╝╚═╝╚═╝╩ ╩",
];

pub fn render(frame: &mut Frame, app: &App) {
    // Nothing but a spinner until the session store has decided
    if matches!(app.state, AppState::Loading) || app.session_state().is_loading() {
        render_loading(frame);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(2), // Tabs
            Constraint::Min(8),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame, app),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::Registering => render_register_overlay(frame, app),
        AppState::ConfirmingQuit => render_confirm_overlay(
            frame,
            "Are you sure you want to quit?",
            "to quit",
        ),
        AppState::ConfirmingCancel => render_confirm_overlay(
            frame,
            "Cancel this booking?",
            "to cancel it",
        ),
        _ => {}
    }
}

fn render_loading(frame: &mut Frame) {
    let area = centered_rect_fixed(36, 5, frame.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::frame(true));
    let paragraph = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("        Loading session...", styles::dim())),
    ])
    .block(block);
    frame.render_widget(paragraph, area);
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Slotbook";
    let who = match app.session_state().session() {
        Some(session) => {
            let expiry = session
                .minutes_until_expiry(Utc::now())
                .map(|m| format!(" | session {}m", m))
                .unwrap_or_default();
            format!("{} ({}){}  [?] Help ", session.user.display_name(), session.role(), expiry)
        }
        None => "[?] Help ".to_string(),
    };

    let title_line = Line::from(vec![
        Span::styled(title, styles::header()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + who.chars().count()),
        )),
        Span::styled(who, styles::dim()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::dim());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let Some(role) = app.role() else {
        frame.render_widget(Paragraph::new(""), area);
        return;
    };

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::for_role(role).iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::dim()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        spans.push(Span::styled(label, styles::tab(*tab == app.current_tab)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::dim());

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    frame.render_widget(paragraph, area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    if !app.is_authenticated() {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::frame(false));
        frame.render_widget(block, area);
        return;
    }

    match app.current_tab {
        Tab::Slots => slots::render(frame, app, area),
        Tab::MyBookings => bookings::render(frame, app, area),
        Tab::AllBookings => admin::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.current_tab {
        _ if !app.is_authenticated() => "[q]uit",
        Tab::Slots => "[Enter] book | [ ] week | [r]efresh | [L]ogout | [q]uit",
        Tab::MyBookings => "[c]ancel | [r]efresh | [L]ogout | [q]uit",
        Tab::AllBookings => "[n]ext/[p]rev page | [r]efresh | [L]ogout | [q]uit",
    };

    let (left_text, left_style) = match app.messages.latest(Instant::now()) {
        Some(msg) => (format!(" {} ", msg.text), styles::notice(msg.severity)),
        None if app.is_busy() => (" Loading... ".to_string(), styles::dim()),
        None => (String::new(), styles::dim()),
    };

    let right_text = format!(" {} ", shortcuts);
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::dim()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar());
    frame.render_widget(paragraph, area);
}

fn logo_lines() -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(*l, styles::header())))
        .collect()
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::key_hint()),
        Span::styled(desc, styles::key_desc()),
    ])
}

fn render_help_overlay(frame: &mut Frame, _app: &App) {
    let area = centered_rect_fixed(50, 24, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let mut help_text = logo_lines();
    help_text.push(Line::from(Span::styled(
        format!("              version {}", version),
        styles::dim(),
    )));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Navigation", styles::accent())));
    help_text.push(help_line("1-2", "Switch tabs"));
    help_text.push(help_line("←/→", "Prev/next tab"));
    help_text.push(help_line("↑/↓", "Move selection"));
    help_text.push(help_line("PgUp/PgDn", "Move selection by a page"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(Span::styled(" Actions", styles::accent())));
    help_text.push(help_line("Enter", "Book the selected slot"));
    help_text.push(help_line("[ / ]", "Previous/next week of slots"));
    help_text.push(help_line("c", "Cancel the selected booking"));
    help_text.push(help_line("n / p", "Next/previous page (admin)"));
    help_text.push(help_line("r", "Refresh"));
    help_text.push(help_line("x", "Dismiss message"));
    help_text.push(help_line("L", "Log out"));
    help_text.push(help_line("q", "Quit"));
    help_text.push(Line::from(""));
    help_text.push(Line::from(vec![
        Span::styled("       Press ", styles::dim()),
        Span::styled("?", styles::key_hint()),
        Span::styled(" or ", styles::dim()),
        Span::styled("Esc", styles::key_hint()),
        Span::styled(" to close", styles::dim()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::frame(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

/// One labelled input row: `Label: [value▌]`
fn field_line(label: &str, value: &str, focused: bool, masked: bool) -> Line<'static> {
    let shown: String = if masked {
        "*".repeat(value.chars().count().min(20))
    } else {
        value.chars().rev().take(20).collect::<Vec<_>>().into_iter().rev().collect()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(format!("  {:>9}: [", label), styles::dim()),
        Span::styled(format!("{:<20}{}", shown, cursor), styles::row(focused)),
        Span::styled("]", styles::dim()),
    ])
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    let text = if focused {
        format!(" ▶ {} ◀ ", label)
    } else {
        format!("   {}   ", label)
    };
    Line::from(vec![
        Span::raw("             ["),
        Span::styled(text, styles::row(focused)),
        Span::raw("]"),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(field_line("Email", &app.login_email, app.login_focus == LoginFocus::Email, false));
    lines.push(field_line(
        "Password",
        &app.login_password,
        app.login_focus == LoginFocus::Password,
        true,
    ));
    lines.push(Line::from(""));
    lines.push(button_line("Log in", app.login_focus == LoginFocus::Button));
    lines.push(button_line("Create account", app.login_focus == LoginFocus::Register));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::problem())));
    }
    if app.is_busy() {
        lines.push(Line::from(Span::styled(" Signing in...", styles::dim())));
    }

    render_form(frame, lines, " Log in ");
}

fn render_register_overlay(frame: &mut Frame, app: &App) {
    let focus = app.register_focus;
    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(field_line("Name", &app.register_name, focus == RegisterFocus::Name, false));
    lines.push(field_line("Email", &app.register_email, focus == RegisterFocus::Email, false));
    lines.push(field_line(
        "Password",
        &app.register_password,
        focus == RegisterFocus::Password,
        true,
    ));
    lines.push(field_line(
        "Confirm",
        &app.register_confirm,
        focus == RegisterFocus::Confirm,
        true,
    ));

    if !app.register_password.is_empty() {
        let score = password_strength(&app.register_password);
        lines.push(Line::from(vec![
            Span::styled("   Strength: ", styles::dim()),
            Span::styled(
                strength_label(score),
                styles::strength(score),
            ),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(button_line("Register", focus == RegisterFocus::Button));
    lines.push(button_line("Back to login", focus == RegisterFocus::Back));

    if let Some(ref error) = app.register_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::problem())));
    }

    render_form(frame, lines, " Create account ");
}

fn render_form(frame: &mut Frame, lines: Vec<Line<'static>>, title: &'static str) {
    let height = lines.len() as u16 + 2;
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(title)
        .title_style(styles::header())
        .borders(Borders::ALL)
        .border_style(styles::frame(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_confirm_overlay(frame: &mut Frame, question: &str, action: &str) {
    let area = centered_rect_fixed(46, 10, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("   {}", question),
        styles::accent(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("   Press ", styles::dim()),
        Span::styled("[Y]", styles::key_hint()),
        Span::styled(format!(" {}, ", action), styles::dim()),
        Span::styled("[N]", styles::key_hint()),
        Span::styled(" to go back", styles::dim()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::frame(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
