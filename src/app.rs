use ratatui::widgets::ListState;

use crate::fetch::FetchHandle;
use crate::loader::{Completion, FeedLoader, LoadKind, PageRequest};
use crate::sentinel::{Sentinel, SentinelKey};
use crate::source::{FetchError, Page};

/// Rows moved by PageUp / PageDown when no frame has been drawn yet.
const DEFAULT_PAGE_JUMP: usize = 10;

pub struct App {
    /// Pagination state; the only owner of the item list.
    pub loader: FeedLoader,
    /// Watches the last rendered item.
    pub sentinel: Sentinel,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last fetch status message.
    pub status: String,
    /// Title shown above the list.
    pub title: String,
    /// Item rows that fit in the list during the last draw.
    visible_rows: usize,
    /// Requests waiting to be handed to the fetch worker.
    outbox: Vec<PageRequest>,
}

impl App {
    pub fn new(loader: FeedLoader, title: impl Into<String>) -> Self {
        Self {
            loader,
            sentinel: Sentinel::new(),
            list_state: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            title: title.into(),
            visible_rows: 0,
            outbox: Vec::new(),
        }
    }

    /// Queue the first page.
    pub fn start(&mut self) {
        if let Some(req) = self.loader.load_initial() {
            self.status = "Loading…".into();
            self.outbox.push(req);
        }
    }

    /// Requests produced since the last call, oldest first.
    pub fn drain_requests(&mut self) -> Vec<PageRequest> {
        std::mem::take(&mut self.outbox)
    }

    /// Hand queued requests to the worker.  A request the worker cannot
    /// accept is completed as failed right away so the loader leaves its
    /// loading state.
    pub fn dispatch(&mut self, fetcher: &FetchHandle) {
        for request in self.drain_requests() {
            let id = request.id;
            if let Err(e) = fetcher.submit(request) {
                self.on_fetched(id, Err(e));
            }
        }
    }

    /// Hand a fetch result to the loader and update the status line.
    pub fn on_fetched(&mut self, id: u64, result: Result<Page, FetchError>) {
        let received_at = result.as_ref().ok().map(|p| p.received_at);
        match self.loader.complete(id, result) {
            Completion::Loaded {
                added, exhausted, ..
            } => {
                let at = received_at
                    .map(|t| t.format("%H:%M:%S").to_string())
                    .unwrap_or_default();
                self.status = if exhausted {
                    format!("Fetched {added} items at {at}, end of feed")
                } else {
                    format!("Fetched {added} items at {at}")
                };
            }
            Completion::Failed { kind, error } => {
                self.status = match kind {
                    LoadKind::Initial => format!("Error: {error} (r: retry)"),
                    LoadKind::More => format!("Error: {error} (r: retry page)"),
                };
            }
            Completion::Stale => {}
        }
    }

    /// Called by the view after every draw with the scroll offset of the
    /// list and the number of item rows it can show.
    ///
    /// Binds the sentinel to the current last item and, if that item is on
    /// screen, queues the next page.  The sentinel is keyed by the loader's
    /// generation as well as the row, so every successful fetch re-arms it.
    pub fn observe_viewport(&mut self, offset: usize, visible_rows: usize) {
        self.visible_rows = visible_rows;

        let generation = self.loader.generation();
        let last = self.loader.items().len().checked_sub(1);
        self.sentinel.attach(last.map(|row| SentinelKey { generation, row }));

        let visible = last.is_some_and(|i| i >= offset && i < offset + visible_rows);
        // While a fetch is in flight load_more would be a no-op; stay armed.
        let can_load = self.loader.next_cursor().is_some() && !self.loader.is_loading();
        if self.sentinel.observe(visible, can_load) {
            if let Some(req) = self.loader.load_more() {
                self.status = "Loading more…".into();
                self.outbox.push(req);
            }
        }
    }

    /// Retry after a failure: page 1 if nothing loaded yet, otherwise the
    /// page at the current cursor.
    pub fn retry(&mut self) {
        let req = if self.loader.items().is_empty() {
            self.loader.load_initial()
        } else {
            self.loader.load_more()
        };
        if let Some(req) = req {
            self.status = "Retrying…".into();
            self.outbox.push(req);
        }
    }

    /// Start over from page 1, replacing the list when it arrives.
    pub fn reload(&mut self) {
        if let Some(req) = self.loader.load_initial() {
            self.status = "Reloading…".into();
            self.list_state.select(None);
            *self.list_state.offset_mut() = 0;
            self.outbox.push(req);
        }
    }

    // -- navigation ----------------------------------------------------------

    fn len(&self) -> usize {
        self.loader.items().len()
    }

    pub fn select_next(&mut self) {
        self.select_by(1);
    }

    pub fn select_previous(&mut self) {
        self.select_back_by(1);
    }

    pub fn page_down(&mut self) {
        self.select_by(self.page_jump());
    }

    pub fn page_up(&mut self) {
        self.select_back_by(self.page_jump());
    }

    pub fn select_first(&mut self) {
        if self.len() > 0 {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if self.len() > 0 {
            self.list_state.select(Some(self.len() - 1));
        }
    }

    fn page_jump(&self) -> usize {
        if self.visible_rows == 0 {
            DEFAULT_PAGE_JUMP
        } else {
            self.visible_rows
        }
    }

    fn select_by(&mut self, step: usize) {
        if self.len() == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + step).min(self.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn select_back_by(&mut self, step: usize) {
        if self.len() == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(step),
            None => 0,
        };
        self.list_state.select(Some(i));
    }
}
