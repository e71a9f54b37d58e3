use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table},
    Frame,
};
use crate::dates::{days_remaining, NEVER_EXPIRES};
use crate::urgency::{classify, dashboard_stats, due_band, DueBand, NotificationTier};
use super::app::{App, InputMode, ViewMode, InputField};

fn band_style(band: DueBand) -> Style {
    match band {
        DueBand::Done => Style::default().fg(Color::DarkGray),
        DueBand::Overdue => Style::default().fg(Color::Red),
        DueBand::Soon => Style::default().fg(Color::Yellow),
        DueBand::Normal => Style::default().fg(Color::Green),
    }
}

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Stats
            Constraint::Min(0),    // Body
            Constraint::Length(3)  // Help
        ].as_ref())
        .split(f.area());

    let today = app.today();
    let stats = dashboard_stats(&app.all_tasks, today);
    let summary = Line::from(vec![
        Span::raw(format!("Active: {}   ", stats.total)),
        Span::styled(format!("Next 7 days: {}   ", stats.upcoming), Style::default().fg(Color::Yellow)),
        Span::styled(format!("Overdue: {}   ", stats.overdue), Style::default().fg(Color::Red)),
        Span::raw(format!("Total cost: {:.2}", stats.total_cost)),
    ]);
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title(format!("Upkeep - {}", today))),
        chunks[0],
    );

    match app.view_mode {
        ViewMode::Tasks => {
            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)].as_ref())
                .split(chunks[1]);

            let rows: Vec<Row> = app
                .tasks
                .iter()
                .map(|t| {
                    let days = days_remaining(t.next_date, today);
                    let time_left_str = if t.is_completed() || days == NEVER_EXPIRES {
                        "-".to_string()
                    } else if days < 0 {
                        format!("{}d overdue", days.abs())
                    } else if days == 0 {
                        "Today".to_string()
                    } else {
                        format!("{}d", days)
                    };

                    Row::new(vec![
                        Cell::from(t.name.clone()),
                        Cell::from(t.category.clone()),
                        Cell::from(t.next_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())),
                        Cell::from(time_left_str),
                        Cell::from(t.periodicity.short()),
                        Cell::from(t.cost.map(|c| format!("{:.2}", c)).unwrap_or_default()),
                        Cell::from(t.status.to_string()),
                    ]).style(band_style(due_band(t, today)))
                })
                .collect();

            let widths = [
                Constraint::Min(20),
                Constraint::Length(16),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(7),
                Constraint::Length(9),
                Constraint::Length(8),
            ];

            let title = if app.show_completed { "Maintenance (all)" } else { "Maintenance" };
            let table = Table::new(rows, widths)
                .header(Row::new(vec!["Name", "Category", "Next", "Time Left", "Every", "Cost", "Status"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title(title))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, body[0], &mut app.state);

            let alerts: Vec<ListItem> = classify(&app.all_tasks, today)
                .into_iter()
                .map(|n| {
                    let color = match n.tier {
                        NotificationTier::Danger => Color::Red,
                        NotificationTier::Warning => Color::Yellow,
                    };
                    ListItem::new(vec![
                        Line::from(Span::styled(n.title, Style::default().fg(color).add_modifier(Modifier::BOLD))),
                        Line::from(n.message),
                    ])
                })
                .collect();
            let alert_title = format!("Alerts ({})", alerts.len());
            f.render_widget(
                List::new(alerts).block(Block::default().borders(Borders::ALL).title(alert_title)),
                body[1],
            );
        }
        ViewMode::Categories => {
            let rows: Vec<Row> = app
                .categories
                .iter()
                .map(|c| {
                    let used = app.category_usage(&c.name);
                    Row::new(vec![
                        Cell::from(c.name.clone()),
                        Cell::from(c.icon.clone()),
                        Cell::from(c.color.clone()),
                        Cell::from(used.to_string()),
                    ])
                })
                .collect();

            let widths = [
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(6),
            ];

            let table = Table::new(rows, widths)
                .header(Row::new(vec!["Name", "Icon", "Color", "Tasks"])
                    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .bottom_margin(1))
                .block(Block::default().borders(Borders::ALL).title("Categories"))
                .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
                .highlight_symbol(">> ");

            f.render_stateful_widget(table, chunks[1], &mut app.category_state);
        }
    }

    let help_text = match app.input_mode {
        InputMode::Normal => match app.view_mode {
            ViewMode::Tasks => "q: Quit | a: Add | Space: Done | n: Name | t: Next Date | r: Every | $: Cost | c: Toggle Done | d: Del | v: Categories",
            ViewMode::Categories => "q: Quit | a: Add | d: Del | v: Tasks",
        },
        InputMode::Editing => "Enter: Save | Esc: Cancel",
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };
    let help = match &app.status {
        Some(msg) if app.input_mode == InputMode::Normal => {
            Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Magenta))
        }
        _ => Paragraph::new(help_text).style(Style::default().fg(Color::Gray)),
    };
    f.render_widget(help.block(Block::default().borders(Borders::ALL)), chunks[2]);

    // Render Input Box if needed
    if app.input_mode != InputMode::Normal {
        let area = centered_rect(60, 3, f.area()); // Fixed height of 3 (border + 1 line)
        f.render_widget(Clear, area); // Clear the area first

        let title = match app.input_mode {
            InputMode::Adding => match app.view_mode {
                ViewMode::Tasks => match app.add_state.step {
                    0 => "Add Task: Enter Name",
                    1 => "Add Task: Enter Category",
                    2 => "Add Task: Enter Last Service Date (YYYY-MM-DD, empty = today)",
                    3 => "Add Task: Enter Periodicity (none, 30d, 3m, 6m, 1y, custom)",
                    4 => "Add Task: Enter Cost (Optional)",
                    _ => "Add Task",
                },
                ViewMode::Categories => "Add Category: Enter Name",
            },
            InputMode::Editing => match app.input_field {
                InputField::Name => "Edit Name",
                InputField::NextDate => "Edit Next Date (YYYY-MM-DD, empty clears)",
                InputField::Every => "Edit Periodicity",
                InputField::Cost => "Edit Cost",
                InputField::None => "Edit",
            },
            InputMode::Normal => "",
        };

        let input = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(title));

        f.render_widget(input, area);
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let margin = r.height.saturating_sub(height) / 2;
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(margin),
            Constraint::Length(height),
            Constraint::Length(margin),
        ].as_ref())
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ].as_ref())
        .split(popup_layout[1])[1]
}
