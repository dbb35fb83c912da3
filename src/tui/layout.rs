use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::config::ColorConfig;
use crate::session::{Coordinator, StatusLevel, ViewMode};
use crate::tui::app::{ActivePane, TuiApp};

const HELP: &str =
    "/:Search  Enter:Open  n/p:Page  b:Bookmark  e:Export  o:Browser  B:Bookmarks  1/2/3:Sort  q:Quit";

pub fn render(frame: &mut Frame, app: &mut TuiApp, session: &Coordinator, colors: &ColorConfig) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Search bar
            Constraint::Min(5),    // Results, reader, bookmarks
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_search_bar(frame, app, session, rows[0], colors);

    let columns = if app.show_bookmarks {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(72), Constraint::Percentage(28)])
            .split(rows[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(rows[1])
    };

    if session.view() == ViewMode::Results {
        let main = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(45), Constraint::Min(5)])
            .split(columns[0]);
        render_results(frame, app, session, main[0], colors);
        render_reader(frame, app, session, main[1], colors);
    } else {
        render_reader(frame, app, session, columns[0], colors);
    }

    if app.show_bookmarks {
        render_bookmarks(frame, app, session, columns[1], colors);
    }

    render_status_line(frame, session, rows[2], colors);
}

fn border_style(active: bool, colors: &ColorConfig) -> Style {
    if active {
        Style::default().fg(colors.active_border)
    } else {
        Style::default().fg(colors.inactive_border)
    }
}

fn highlight_style(active: bool, colors: &ColorConfig) -> Style {
    if active {
        Style::default()
            .bg(colors.selection_bg_active)
            .fg(colors.selection_fg_active)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
            .bg(colors.selection_bg_inactive)
            .fg(colors.selection_fg_inactive)
    }
}

fn render_search_bar(
    frame: &mut Frame,
    app: &TuiApp,
    session: &Coordinator,
    area: Rect,
    colors: &ColorConfig,
) {
    let text = if app.editing {
        format!("{}_", app.query_input)
    } else if app.query_input.is_empty() {
        "Tag, character, author, or URL... (press /)".to_string()
    } else {
        app.query_input.clone()
    };

    let sort = session.result_set().sort;
    let title = if session.results().is_empty() {
        " Search ".to_string()
    } else {
        format!(" Search [{}] ", sort)
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(app.editing, colors));

    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_results(
    frame: &mut Frame,
    app: &mut TuiApp,
    session: &Coordinator,
    area: Rect,
    colors: &ColorConfig,
) {
    let is_active = app.active_pane == ActivePane::Results;

    let items: Vec<ListItem> = session
        .results()
        .iter()
        .enumerate()
        .map(|(i, work)| {
            let kudos = work
                .kudos
                .map(|k| format!("♥{}", k))
                .unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::raw(format!("{}. {} ", i + 1, work.title)),
                Span::styled(
                    format!("by {} ", work.author),
                    Style::default().fg(colors.metadata_author),
                ),
                Span::raw(format!("[{}] {}", work.status_label(), kudos)),
            ]))
        })
        .collect();

    let title = format!(
        " Results [{}/{}] ",
        (app.result_index + 1).min(items.len()),
        items.len()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active, colors));

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style(is_active, colors))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.result_list_state);
}

fn render_reader(
    frame: &mut Frame,
    app: &TuiApp,
    session: &Coordinator,
    area: Rect,
    colors: &ColorConfig,
) {
    let is_active = app.active_pane == ActivePane::Reader;

    let (title, content) = match (session.work(), session.pages()) {
        (Some(work), Some(pages)) => {
            let mut title = vec![Span::raw(format!(" {} ", work.title))];
            if session.is_current_bookmarked() {
                title.push(Span::styled(
                    "★ ",
                    Style::default().fg(colors.bookmark_marker),
                ));
            }

            let mut lines = vec![
                Line::from(Span::styled(
                    format!("By: {}", work.author),
                    Style::default().fg(colors.metadata_author),
                )),
                Line::from(Span::styled(
                    work.link.clone(),
                    Style::default().fg(colors.metadata_link),
                )),
                Line::from(Span::styled(
                    pages.position_label(),
                    Style::default().add_modifier(Modifier::DIM),
                )),
                Line::from(""),
            ];
            lines.extend(
                pages
                    .current_page()
                    .lines()
                    .map(|line| Line::from(line.to_string())),
            );
            (Line::from(title), Text::from(lines))
        }
        _ => (
            Line::from(" Reader "),
            Text::from("Search with / or pick a bookmark"),
        ),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(is_active, colors));

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.reader_scroll, 0));

    frame.render_widget(paragraph, area);
}

fn render_bookmarks(
    frame: &mut Frame,
    app: &mut TuiApp,
    session: &Coordinator,
    area: Rect,
    colors: &ColorConfig,
) {
    let is_active = app.active_pane == ActivePane::Bookmarks;
    let current = session.work().map(|w| w.link.as_str());

    let items: Vec<ListItem> = session
        .bookmarks()
        .iter()
        .enumerate()
        .map(|(i, bookmark)| {
            let style = if Some(bookmark.url.as_str()) == current {
                Style::default().fg(colors.bookmark_marker)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}. {}", i + 1, bookmark.display_title())).style(style)
        })
        .collect();

    let block = Block::default()
        .title(format!(" Bookmarks ({}) ", items.len()))
        .borders(Borders::ALL)
        .border_style(border_style(is_active, colors));

    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style(is_active, colors))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.bookmark_list_state);
}

fn render_status_line(frame: &mut Frame, session: &Coordinator, area: Rect, colors: &ColorConfig) {
    let (text, fg) = match session.status() {
        Some(status) => {
            let fg = match status.level {
                StatusLevel::Error => colors.status_error,
                StatusLevel::Success => colors.status_success,
                StatusLevel::Info | StatusLevel::Progress => colors.status_fg,
            };
            (status.message.clone(), fg)
        }
        None => (HELP.to_string(), colors.status_fg),
    };

    let paragraph = Paragraph::new(text).style(Style::default().fg(fg).bg(colors.status_bg));
    frame.render_widget(paragraph, area);
}
