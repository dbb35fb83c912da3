pub mod app;
pub mod event;
pub mod layout;

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    event::{KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::app::{AppContext, Result};
use crate::domain::{SearchQuery, SortKey};
use crate::session::{Coordinator, TracingSink, ViewMode};

use self::app::{ActivePane, TuiApp};
use self::event::{Action, AppEvent, EventHandler};

type Tui = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = run_app(&mut terminal, ctx).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

async fn run_app(terminal: &mut Tui, ctx: Arc<AppContext>) -> Result<()> {
    let mut tui_app = TuiApp::new();
    let event_handler = EventHandler::new(Duration::from_millis(100));
    let mut session = Coordinator::new(
        ctx.session_deps(Arc::new(TracingSink)),
        ctx.session_settings(),
    );
    let mut revisions = session.subscribe();
    let mut last_view = session.view();
    let mut dirty = true;

    loop {
        session.apply_pending();
        if revisions.has_changed().unwrap_or(false) {
            revisions.borrow_and_update();
            follow_session(&mut tui_app, &session, &mut last_view);
            dirty = true;
        }

        if dirty {
            terminal.draw(|frame| {
                layout::render(frame, &mut tui_app, &session, &ctx.config.colors)
            })?;
            dirty = false;
        }

        if let AppEvent::Key(key) = event_handler.next()? {
            dirty = true;
            if tui_app.editing {
                handle_input(&mut tui_app, &mut session, key);
            } else {
                let action = ctx.config.keybindings.get_action(&key);
                handle_action(&mut tui_app, &mut session, action);
            }
        }

        if tui_app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Keep UI selections and focus consistent with the session after it changes.
fn follow_session(tui_app: &mut TuiApp, session: &Coordinator, last_view: &mut ViewMode) {
    let view = session.view();
    if view != *last_view {
        match view {
            ViewMode::Results => tui_app.active_pane = ActivePane::Results,
            ViewMode::Reading => tui_app.active_pane = ActivePane::Reader,
            ViewMode::Idle => {}
        }
        *last_view = view;
    }

    tui_app.clamp(session.results().len(), session.bookmarks().len());
    let shown = session
        .work()
        .zip(session.pages())
        .map(|(work, pages)| (work.link.as_str(), pages.current_index()));
    tui_app.sync_page(shown);
}

fn handle_input(tui_app: &mut TuiApp, session: &mut Coordinator, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => tui_app.editing = false,
        KeyCode::Enter => {
            tui_app.editing = false;
            submit_search(tui_app, session, SortKey::None);
        }
        KeyCode::Backspace => {
            tui_app.query_input.pop();
        }
        KeyCode::Char(c) => tui_app.query_input.push(c),
        _ => {}
    }
}

fn submit_search(tui_app: &mut TuiApp, session: &mut Coordinator, sort: SortKey) {
    let text = tui_app.query_input.trim();
    if text.is_empty() {
        session.rerun_search(sort);
    } else {
        session.search(SearchQuery::new(text), sort);
    }
    tui_app.reset_results();
}

fn handle_action(tui_app: &mut TuiApp, session: &mut Coordinator, action: Action) {
    match action {
        Action::Quit => tui_app.should_quit = true,
        Action::MoveUp => tui_app.move_up(),
        Action::MoveDown => {
            tui_app.move_down(session.results().len(), session.bookmarks().len())
        }
        Action::NextPage => {
            session.page_next();
        }
        Action::PrevPage => {
            session.page_prev();
        }
        Action::NextPane => tui_app.next_pane(),
        Action::PrevPane => tui_app.prev_pane(),
        Action::Select => match tui_app.active_pane {
            ActivePane::Results => {
                session.select_result(tui_app.result_index);
            }
            ActivePane::Bookmarks => {
                let id = session.bookmarks().get(tui_app.bookmark_index).map(|b| b.id);
                if let Some(id) = id {
                    session.select_bookmark(id);
                }
            }
            ActivePane::Reader => {}
        },
        Action::Search => tui_app.editing = true,
        Action::Back => {
            if !session.show_results() {
                session.show_reader();
            }
        }
        Action::ToggleBookmark => session.toggle_bookmark(),
        Action::Export => session.export(),
        Action::OpenInBrowser => session.open_external(),
        Action::ToggleBookmarks => tui_app.toggle_bookmarks(),
        Action::SortKudos => submit_search(tui_app, session, SortKey::Kudos),
        Action::SortDate => submit_search(tui_app, session, SortKey::Date),
        Action::FilterComplete => submit_search(tui_app, session, SortKey::Complete),
        Action::None => {}
    }
}
