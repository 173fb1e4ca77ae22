use crate::output::summary_rows;
use crate::tui::app::{App, Mode, SearchStatus};
use crate::utils::format_size;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph},
};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(10),   // Results + stats
            Constraint::Length(3), // Progress gauge
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_main_area(f, app, chunks[1]);
    draw_progress(f, app, chunks[2]);
    draw_status_bar(f, app, chunks[3]);

    if app.mode == Mode::Help {
        draw_help(f, f.area());
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let header = Paragraph::new(app.header.as_str())
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    f.render_widget(header, area);
}

fn draw_main_area(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(42)])
        .split(area);

    draw_results_list(f, app, chunks[0]);
    draw_stats(f, app, chunks[1]);
}

fn draw_results_list(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .results
        .iter()
        .map(|entry| {
            let line = if entry.is_dir {
                Line::from(Span::styled(
                    format!("{}{}", entry.path.display(), std::path::MAIN_SEPARATOR),
                    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        entry.path.display().to_string(),
                        Style::default().fg(Color::White),
                    ),
                    Span::raw("  "),
                    Span::styled(format_size(entry.size), Style::default().fg(Color::Green)),
                ])
            };
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Results ({}) ", app.results.len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default();
    if !app.results.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let label_style = Style::default().fg(Color::DarkGray);
    let value_style = Style::default().fg(Color::Cyan);

    let mut lines: Vec<Line> = summary_rows(&app.stats)
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{:23}", label), label_style),
                Span::styled(value, value_style),
            ])
        })
        .collect();

    if let Some(entry) = app.selected_entry() {
        let kind = if entry.is_dir {
            "directory".to_string()
        } else {
            format_size(entry.size)
        };
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Selected", label_style)));
        lines.push(Line::from(Span::styled(
            entry.path.display().to_string(),
            Style::default().fg(Color::White),
        )));
        lines.push(Line::from(Span::styled(kind, value_style)));
    }

    let stats = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Statistics "),
    );
    f.render_widget(stats, area);
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let (ratio, label, color) = match (&app.status, app.fraction) {
        (SearchStatus::Running, None) => (0.0, "Enumerating...".to_string(), Color::Yellow),
        (SearchStatus::Running, Some(fraction)) => (
            fraction,
            format!("{:.0}%", fraction * 100.0),
            Color::Cyan,
        ),
        (SearchStatus::Completed, _) => (1.0, "Done".to_string(), Color::Green),
        (SearchStatus::Cancelled, fraction) => {
            (fraction.unwrap_or(0.0), "Cancelled".to_string(), Color::DarkGray)
        }
        (SearchStatus::Failed(_), fraction) => {
            (fraction.unwrap_or(0.0), "Failed".to_string(), Color::Red)
        }
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);
    f.render_widget(gauge, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let keys = if app.status.is_running() {
        "  [c] cancel  [?] help  [q] close"
    } else {
        "  [?] help  [q] close"
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(app.status_line(), Style::default().fg(Color::Cyan)),
        Span::styled(keys, Style::default().fg(Color::DarkGray)),
    ]));

    f.render_widget(status, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = [
        ("j / Down", "next result"),
        ("k / Up", "previous result"),
        ("PageDown / PageUp", "move by a page"),
        ("g / G", "first / last result"),
        ("c", "cancel the search"),
        ("q / Esc / Ctrl+C", "close the window"),
    ];
    let lines: Vec<Line> = help
        .iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("{:20}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        })
        .collect();

    let width = 48.min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Keys ")),
        popup,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SearchEngine;
    use crate::search::SearchParameters;
    use crate::search::testing::ScriptedEngine;
    use crate::search::types::FoundEntry;
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_stats_panel_describes_selected_entry() {
        let engine = ScriptedEngine::new();
        let mut app = App::start(
            engine as Arc<dyn SearchEngine>,
            SearchParameters::new("/data", "needle"),
        )
        .unwrap();
        assert!(!render(&app).contains("Selected"));

        app.results = vec![
            FoundEntry {
                path: "/data/needle.txt".into(),
                is_dir: false,
                size: 12,
                modified: None,
            },
            FoundEntry {
                path: "/data/needles".into(),
                is_dir: true,
                size: 0,
                modified: None,
            },
        ];
        let screen = render(&app);
        assert!(screen.contains("Selected"));
        assert!(!screen.contains("directory"));

        app.select_last();
        assert!(render(&app).contains("directory"));
    }
}
