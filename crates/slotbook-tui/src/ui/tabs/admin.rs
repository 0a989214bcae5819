use chrono::Local;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use slotbook_core::models::Pagination;

use crate::app::App;
use crate::ui::styles;
use crate::utils::{format_date, format_short, format_time_range, truncate};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    render_booking_table(frame, app, chunks[0]);
    render_page_footer(frame, app, chunks[1]);
}

/// "Page 2 of 5 (42 total)"
pub fn page_summary(pagination: &Pagination) -> String {
    format!(
        "Page {} of {} ({} total)",
        pagination.page, pagination.total_pages, pagination.total
    )
}

fn render_booking_table(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" All Bookings ")
        .title_style(styles::header())
        .borders(Borders::ALL)
        .border_style(styles::frame(true));

    let Some(ref all) = app.data.all_bookings else {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "  Loading bookings...",
            styles::dim(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let bookings = all.bookings();
    if bookings.is_empty() {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            "  No bookings found",
            styles::dim(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([
        Cell::from("Patient"),
        Cell::from("Email"),
        Cell::from("Date"),
        Cell::from("Time"),
        Cell::from("Booked On"),
    ])
    .style(styles::header())
    .height(1);

    let rows: Vec<Row> = bookings
        .iter()
        .enumerate()
        .map(|(i, booking)| {
            let style = styles::row(i == app.data.admin_selection);

            let (name, email) = match booking.user {
                Some(ref user) => (user.name.as_str(), user.email.as_str()),
                None => ("-", "-"),
            };
            let start = booking.slot.start_time.with_timezone(&Local);
            let end = booking.slot.end_time.with_timezone(&Local);

            Row::new(vec![
                Cell::from(truncate(name, 22)),
                Cell::from(truncate(email, 28)),
                Cell::from(format_date(&start)),
                Cell::from(format_time_range(&start, &end)),
                Cell::from(format_short(&booking.created_at.with_timezone(&Local))),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Length(22),
        Constraint::Length(28),
        Constraint::Length(17),
        Constraint::Length(14),
        Constraint::Min(12),
    ];

    let table = Table::new(rows, widths).header(header).block(block);

    let mut state = TableState::default();
    state.select(Some(app.data.admin_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_page_footer(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref all) = app.data.all_bookings else {
        return;
    };
    let pagination = all.pagination();

    let mut spans = vec![Span::styled(
        format!(" {}", page_summary(&pagination)),
        styles::accent(),
    )];
    if pagination.has_prev() {
        spans.push(Span::styled("  [p] previous", styles::dim()));
    }
    if pagination.has_next() {
        spans.push(Span::styled("  [n] next", styles::dim()));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
