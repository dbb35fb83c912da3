use ratatui::widgets::ListState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePane {
    Results,
    Reader,
    Bookmarks,
}

/// UI-only state. Everything the session owns lives in the coordinator.
pub struct TuiApp {
    pub active_pane: ActivePane,
    pub show_bookmarks: bool,
    pub editing: bool,
    pub query_input: String,
    pub result_index: usize,
    pub bookmark_index: usize,
    pub result_list_state: ListState,
    pub bookmark_list_state: ListState,
    pub reader_scroll: u16,
    pub should_quit: bool,
    // (link, page index) last drawn, to reset scrolling on page changes
    shown_page: Option<(String, usize)>,
}

impl TuiApp {
    pub fn new() -> Self {
        let mut result_list_state = ListState::default();
        result_list_state.select(Some(0));
        let mut bookmark_list_state = ListState::default();
        bookmark_list_state.select(Some(0));

        Self {
            active_pane: ActivePane::Results,
            show_bookmarks: true,
            editing: false,
            query_input: String::new(),
            result_index: 0,
            bookmark_index: 0,
            result_list_state,
            bookmark_list_state,
            reader_scroll: 0,
            should_quit: false,
            shown_page: None,
        }
    }

    pub fn next_pane(&mut self) {
        self.active_pane = match self.active_pane {
            ActivePane::Results => ActivePane::Reader,
            ActivePane::Reader if self.show_bookmarks => ActivePane::Bookmarks,
            ActivePane::Reader | ActivePane::Bookmarks => ActivePane::Results,
        };
    }

    pub fn prev_pane(&mut self) {
        self.active_pane = match self.active_pane {
            ActivePane::Results if self.show_bookmarks => ActivePane::Bookmarks,
            ActivePane::Results | ActivePane::Bookmarks => ActivePane::Reader,
            ActivePane::Reader => ActivePane::Results,
        };
    }

    pub fn toggle_bookmarks(&mut self) {
        self.show_bookmarks = !self.show_bookmarks;
        if !self.show_bookmarks && self.active_pane == ActivePane::Bookmarks {
            self.active_pane = ActivePane::Reader;
        }
    }

    pub fn move_up(&mut self) {
        match self.active_pane {
            ActivePane::Results => {
                self.result_index = self.result_index.saturating_sub(1);
                self.result_list_state.select(Some(self.result_index));
            }
            ActivePane::Bookmarks => {
                self.bookmark_index = self.bookmark_index.saturating_sub(1);
                self.bookmark_list_state.select(Some(self.bookmark_index));
            }
            ActivePane::Reader => {
                self.reader_scroll = self.reader_scroll.saturating_sub(1);
            }
        }
    }

    pub fn move_down(&mut self, result_count: usize, bookmark_count: usize) {
        match self.active_pane {
            ActivePane::Results => {
                if self.result_index + 1 < result_count {
                    self.result_index += 1;
                    self.result_list_state.select(Some(self.result_index));
                }
            }
            ActivePane::Bookmarks => {
                if self.bookmark_index + 1 < bookmark_count {
                    self.bookmark_index += 1;
                    self.bookmark_list_state.select(Some(self.bookmark_index));
                }
            }
            ActivePane::Reader => {
                self.reader_scroll = self.reader_scroll.saturating_add(1);
            }
        }
    }

    /// Pull selections back inside lists that shrank.
    pub fn clamp(&mut self, result_count: usize, bookmark_count: usize) {
        self.result_index = self.result_index.min(result_count.saturating_sub(1));
        self.bookmark_index = self.bookmark_index.min(bookmark_count.saturating_sub(1));
        self.result_list_state.select(Some(self.result_index));
        self.bookmark_list_state.select(Some(self.bookmark_index));
    }

    /// A new result set starts at the top.
    pub fn reset_results(&mut self) {
        self.result_index = 0;
        self.result_list_state.select(Some(0));
    }

    /// Scroll back to the top whenever the displayed page changes.
    pub fn sync_page(&mut self, page: Option<(&str, usize)>) {
        let changed = match (&self.shown_page, page) {
            (Some((link, idx)), Some((new_link, new_idx))) => link != new_link || *idx != new_idx,
            (None, None) => false,
            _ => true,
        };
        if changed {
            self.reader_scroll = 0;
            self.shown_page = page.map(|(link, idx)| (link.to_string(), idx));
        }
    }
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pane_cycle_skips_hidden_bookmarks() {
        let mut app = TuiApp::new();
        app.next_pane();
        app.next_pane();
        assert_eq!(app.active_pane, ActivePane::Bookmarks);

        app.toggle_bookmarks();
        assert_eq!(app.active_pane, ActivePane::Reader);
        app.next_pane();
        assert_eq!(app.active_pane, ActivePane::Results);
        app.prev_pane();
        assert_eq!(app.active_pane, ActivePane::Reader);
    }

    #[test]
    fn test_move_down_clamps_to_list() {
        let mut app = TuiApp::new();
        app.move_down(2, 0);
        app.move_down(2, 0);
        assert_eq!(app.result_index, 1);
        app.move_up();
        app.move_up();
        assert_eq!(app.result_index, 0);

        app.move_down(3, 0);
        app.move_down(3, 0);
        app.clamp(1, 0);
        assert_eq!(app.result_index, 0);
    }

    #[test]
    fn test_scroll_resets_on_page_change() {
        let mut app = TuiApp::new();
        app.active_pane = ActivePane::Reader;
        app.sync_page(Some(("https://a/works/1", 0)));
        app.move_down(0, 0);
        app.move_down(0, 0);
        assert_eq!(app.reader_scroll, 2);

        app.sync_page(Some(("https://a/works/1", 0)));
        assert_eq!(app.reader_scroll, 2);

        app.sync_page(Some(("https://a/works/1", 1)));
        assert_eq!(app.reader_scroll, 0);

        app.move_down(0, 0);
        app.sync_page(Some(("https://a/works/2", 1)));
        assert_eq!(app.reader_scroll, 0);
    }
}
