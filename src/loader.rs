//! Paginated feed loader.
//!
//! [`FeedLoader`] owns the [`FeedState`] of one session and decides which
//! page to fetch next.  It performs no I/O itself: [`load_initial`] and
//! [`load_more`] hand back a [`PageRequest`] (or `None` when the call is a
//! no-op) and the caller runs it, then reports the outcome through
//! [`complete`].  All three run on the UI thread, so the "is a fetch already
//! in flight?" check and the flag it guards can never race.
//!
//! ```text
//!            load_initial()                    complete(Ok | Err)
//!   Idle ─────────────────────► Loading ─────────────────────────► Idle
//!     ▲                                                             │
//!     └──────────── load_more()  (only while a cursor is set) ◄─────┘
//! ```
//!
//! Once a successful page comes back without a `next` relation the loader
//! is exhausted and [`load_more`] stays a no-op for the rest of the session.
//!
//! [`load_initial`]: FeedLoader::load_initial
//! [`load_more`]: FeedLoader::load_more
//! [`complete`]: FeedLoader::complete

use crate::source::{FetchError, Item, Page};

/// Items requested per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Which operation issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Page 1; replaces the item list on success.
    Initial,
    /// The page at the current cursor; appends on success.
    More,
}

/// A fetch the driver must perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Echoed back to [`FeedLoader::complete`] to match the response.
    pub id: u64,
    pub kind: LoadKind,
    pub url: String,
}

/// What [`FeedLoader::complete`] did with a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Items were stored.  `added` is the number of new items.
    Loaded { kind: LoadKind, added: usize, exhausted: bool },
    /// The fetch failed; items and cursor are as they were before it.
    Failed { kind: LoadKind, error: String },
    /// The response did not belong to the in-flight request and was dropped.
    Stale,
}

/// Session state rendered by the view.
///
/// `next_cursor` is only written by [`FeedLoader::complete`].
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    items: Vec<Item>,
    next_cursor: Option<String>,
    is_loading: bool,
}

impl FeedState {
    /// Items in fetch order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    id: u64,
    kind: LoadKind,
    url: String,
}

/// Fetch/pagination state machine for one session.
#[derive(Debug)]
pub struct FeedLoader {
    state: FeedState,
    first_page_url: String,
    page_size: usize,
    in_flight: Option<InFlight>,
    next_request_id: u64,
    pages_loaded: usize,
    generation: u64,
}

impl FeedLoader {
    /// `first_page_url` is the fully-built URL of page 1 (see
    /// [`crate::source::PageSource::first_page_url`]).
    pub fn new(first_page_url: impl Into<String>, page_size: usize) -> Self {
        Self {
            state: FeedState::default(),
            first_page_url: first_page_url.into(),
            page_size,
            in_flight: None,
            next_request_id: 0,
            pages_loaded: 0,
            generation: 0,
        }
    }

    pub fn items(&self) -> &[Item] {
        self.state.items()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.state.next_cursor()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Number of pages stored since the last successful initial load.
    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }

    /// Bumped by every successful [`complete`](Self::complete), including
    /// pages that add no items.  Distinguishes item lists that happen to
    /// have the same length.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once a page has loaded and no further page exists.
    pub fn is_exhausted(&self) -> bool {
        self.pages_loaded > 0 && self.state.next_cursor.is_none() && !self.state.is_loading
    }

    /// Request page 1.
    ///
    /// A no-op while any fetch is in flight.  Calling it again later starts
    /// a new session: the returned page replaces every stored item.
    pub fn load_initial(&mut self) -> Option<PageRequest> {
        if self.state.is_loading {
            tracing::debug!("load_initial ignored: fetch already in flight");
            return None;
        }
        let url = self.first_page_url.clone();
        Some(self.begin(LoadKind::Initial, url))
    }

    /// Request the page at the current cursor.
    ///
    /// A no-op when the feed is exhausted (or not loaded yet) or when a fetch
    /// is in flight, so duplicate triggers are harmless.
    pub fn load_more(&mut self) -> Option<PageRequest> {
        if self.state.is_loading {
            tracing::debug!("load_more ignored: fetch already in flight");
            return None;
        }
        let url = self.state.next_cursor.clone()?;
        Some(self.begin(LoadKind::More, url))
    }

    fn begin(&mut self, kind: LoadKind, url: String) -> PageRequest {
        let id = self.next_request_id;
        self.next_request_id += 1;
        self.state.is_loading = true;
        self.in_flight = Some(InFlight {
            id,
            kind,
            url: url.clone(),
        });
        tracing::info!(request = id, ?kind, %url, "fetching page");
        PageRequest { id, kind, url }
    }

    /// Apply the outcome of request `id`.
    ///
    /// `is_loading` is cleared on both the success and the failure path.  A
    /// failure never touches `items` or `next_cursor`, so the page that failed
    /// will be requested again by the next [`load_more`](Self::load_more).
    pub fn complete(&mut self, id: u64, result: Result<Page, FetchError>) -> Completion {
        let Some(in_flight) = self.in_flight.take_if(|f| f.id == id) else {
            tracing::warn!(request = id, "dropping response for a request that is not in flight");
            return Completion::Stale;
        };
        self.state.is_loading = false;

        match result {
            Ok(page) => {
                let added = page.items.len();
                self.generation += 1;
                self.state.next_cursor = page.next_cursor().map(str::to_owned);
                match in_flight.kind {
                    LoadKind::Initial => {
                        self.state.items = page.items;
                        self.pages_loaded = 1;
                    }
                    LoadKind::More => {
                        self.state.items.extend(page.items);
                        self.pages_loaded += 1;
                    }
                }
                let exhausted = self.state.next_cursor.is_none();
                tracing::info!(
                    request = id,
                    added,
                    total = self.state.items.len(),
                    exhausted,
                    "page loaded"
                );
                Completion::Loaded {
                    kind: in_flight.kind,
                    added,
                    exhausted,
                }
            }
            Err(e) => {
                tracing::error!(request = id, url = %in_flight.url, error = %e, "page fetch failed");
                Completion::Failed {
                    kind: in_flight.kind,
                    error: e.to_string(),
                }
            }
        }
    }
}
