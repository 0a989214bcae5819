use chrono::{Local, Utc};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use slotbook_core::models::BookingTiming;

use crate::app::App;
use crate::ui::styles;
use crate::utils::{format_countdown, format_date, format_short, format_time_range};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_booking_list(frame, app, chunks[0]);
    render_booking_detail(frame, app, chunks[1]);
}

fn render_booking_list(frame: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();
    let bookings = &app.data.bookings;

    let block = Block::default()
        .title(format!(" My Bookings ({}) ", bookings.len()))
        .title_style(styles::header())
        .borders(Borders::ALL)
        .border_style(styles::frame(true));

    if bookings.is_empty() {
        let text = if app.data.bookings_loaded {
            "You have no bookings yet"
        } else {
            "Loading bookings..."
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!("  {}", text),
            styles::dim(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = bookings
        .iter()
        .enumerate()
        .map(|(i, booking)| {
            let timing = booking.timing(now);
            let start = booking.slot.start_time.with_timezone(&Local);
            let end = booking.slot.end_time.with_timezone(&Local);

            let style = styles::row(i == app.data.booking_selection);

            let line = Line::from(vec![
                Span::styled(format!("{:<9}", timing.to_string()), styles::timing(timing)),
                Span::raw(format!(
                    "{:<18} {}",
                    format_date(&start),
                    format_time_range(&start, &end)
                )),
            ]);
            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items).block(block);

    let mut state = ListState::default();
    state.select(Some(app.data.booking_selection));

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_booking_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Details ")
        .title_style(styles::header())
        .borders(Borders::ALL)
        .border_style(styles::frame(false));

    let Some(booking) = app.data.bookings.get(app.data.booking_selection) else {
        frame.render_widget(block, area);
        return;
    };

    let now = Utc::now();
    let timing = booking.timing(now);
    let start = booking.slot.start_time.with_timezone(&Local);
    let end = booking.slot.end_time.with_timezone(&Local);

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Date:      ", styles::accent()),
            Span::raw(format_date(&start)),
        ]),
        Line::from(vec![
            Span::styled("Time:      ", styles::accent()),
            Span::raw(format_time_range(&start, &end)),
        ]),
        Line::from(vec![
            Span::styled("Status:    ", styles::accent()),
            Span::styled(timing.to_string(), styles::timing(timing)),
        ]),
    ];

    if timing == BookingTiming::Upcoming {
        let minutes = (booking.slot.start_time - now).num_minutes();
        lines.push(Line::from(vec![
            Span::styled("Starts:    ", styles::accent()),
            Span::raw(format_countdown(minutes)),
        ]));
    }

    lines.push(Line::from(vec![
        Span::styled("Booked on: ", styles::accent()),
        Span::raw(format_short(&booking.created_at.with_timezone(&Local))),
    ]));

    lines.push(Line::from(""));
    if timing == BookingTiming::Upcoming {
        lines.push(Line::from(vec![
            Span::styled("Press ", styles::dim()),
            Span::styled("c", styles::key_hint()),
            Span::styled(" to cancel this booking", styles::dim()),
        ]));
    }

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}
