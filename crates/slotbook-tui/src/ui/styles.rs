//! Colors and text styles for the booking screens.
//!
//! Styles are named for what they mark (a notice, a booking's timing, a
//! password's strength) rather than for their color, so the views never
//! pick colors themselves.

use ratatui::style::{Color, Modifier, Style};

use slotbook_core::messages::Severity;
use slotbook_core::models::BookingTiming;
use slotbook_core::validation::MIN_PASSWORD_SCORE;

// Clinic palette
const TEAL: Color = Color::Rgb(38, 150, 160);
const SAGE: Color = Color::Rgb(120, 180, 120);
const AMBER: Color = Color::Rgb(230, 180, 80);
const CORAL: Color = Color::Rgb(235, 110, 95);
const SLATE: Color = Color::Rgb(120, 130, 140);
const INK: Color = Color::Rgb(28, 44, 56);
const PANEL: Color = Color::Rgb(22, 26, 34);

/// View and overlay titles, table headers.
pub fn header() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

/// A list row, table row, form field or button.
pub fn row(selected: bool) -> Style {
    if selected {
        Style::default().bg(INK).fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

/// Secondary text: hints, separators, empty states.
pub fn dim() -> Style {
    Style::default().fg(SLATE)
}

/// Labels and values that should catch the eye.
pub fn accent() -> Style {
    Style::default().fg(AMBER)
}

/// Inline form errors.
pub fn problem() -> Style {
    Style::default().fg(CORAL)
}

pub fn notice(severity: Severity) -> Style {
    let color = match severity {
        Severity::Error => CORAL,
        Severity::Success => SAGE,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

pub fn timing(timing: BookingTiming) -> Style {
    match timing {
        BookingTiming::Upcoming => Style::default().fg(SAGE),
        BookingTiming::Past => dim(),
    }
}

/// Strength label color: green once the score would pass registration.
pub fn strength(score: u8) -> Style {
    if score >= MIN_PASSWORD_SCORE {
        Style::default().fg(SAGE)
    } else {
        problem()
    }
}

pub fn tab(selected: bool) -> Style {
    if selected {
        header().add_modifier(Modifier::UNDERLINED)
    } else {
        dim()
    }
}

/// Block borders. The focused view gets the brand color.
pub fn frame(focused: bool) -> Style {
    Style::default().fg(if focused { TEAL } else { SLATE })
}

pub fn status_bar() -> Style {
    Style::default().bg(PANEL).fg(Color::White)
}

pub fn key_hint() -> Style {
    accent().add_modifier(Modifier::BOLD)
}

pub fn key_desc() -> Style {
    Style::default().fg(Color::White)
}
