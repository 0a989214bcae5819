use chrono::{Duration, Local};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::App;
use crate::ui::styles;
use crate::utils::{format_date, format_time_range};

const EMPTY_WEEK: &str = "No available slots for this week";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(area);

    render_week_header(frame, app, chunks[0]);
    render_slot_list(frame, app, chunks[1]);
}

fn render_week_header(frame: &mut Frame, app: &App, area: Rect) {
    // week_end is exclusive
    let last_day = app.week_end() - Duration::days(1);
    let line = Line::from(vec![
        Span::styled(" Week of ", styles::dim()),
        Span::styled(
            format!("{} - {}", app.week_start.format("%b %d"), last_day.format("%b %d, %Y")),
            styles::accent(),
        ),
        Span::styled("   [ previous | next ]", styles::dim()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_slot_list(frame: &mut Frame, app: &App, area: Rect) {
    let slots = &app.data.slots;
    let block = Block::default()
        .title(format!(" Available Slots ({}) ", slots.len()))
        .title_style(styles::header())
        .borders(Borders::ALL)
        .border_style(styles::frame(true));

    if slots.is_empty() {
        let text = if app.data.slots_loaded {
            EMPTY_WEEK
        } else {
            "Loading slots..."
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!("  {}", text),
            styles::dim(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let start = slot.start_time.with_timezone(&Local);
            let end = slot.end_time.with_timezone(&Local);
            let line = Line::from(format!(
                "{:<18} {}  ({} min)",
                format_date(&start),
                format_time_range(&start, &end),
                slot.duration_minutes()
            ));

            let style = styles::row(i == app.data.slot_selection);

            ListItem::new(line).style(style)
        })
        .collect();

    let list = List::new(items).block(block);

    let mut state = ListState::default();
    state.select(Some(app.data.slot_selection));

    frame.render_stateful_widget(list, area, &mut state);
}
