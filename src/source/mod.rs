//! Paged data source abstraction.
//!
//! This module defines the [`PageSource`] trait, the [`Page`] a source
//! returns, and the [`FetchError`] it can fail with.  The concrete HTTP
//! implementation lives in [`http`].
//!
//! ## For contributors — adding a new source
//!
//! 1. Create a new file in this directory (e.g. `file.rs`).
//! 2. Define a struct and implement [`PageSource`] for it.
//! 3. Add `mod file;` below and re-export your struct in the `pub use` block.
//! 4. Construct an instance in `main.rs` and hand it to [`crate::fetch::spawn`].
//!
//! The loader, sentinel, and UI are all source-agnostic.

mod http;
mod item;

pub use http::HttpPageSource;
pub use item::Item;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::StatusCode;
use thiserror::Error;

use crate::link_header::{LinkMap, ParseError};

/// One fetch's worth of items plus pagination metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    /// Every relation advertised in the response's `Link` header.
    pub links: LinkMap,
    pub received_at: DateTime<Local>,
}

impl Page {
    pub fn new(items: Vec<Item>, links: LinkMap) -> Self {
        Self {
            items,
            links,
            received_at: Local::now(),
        }
    }

    /// URL of the following page, or `None` when this is the last one.
    pub fn next_cursor(&self) -> Option<&str> {
        self.links.next()
    }
}

/// Why a page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(StatusCode),

    #[error("invalid page body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid Link header: {0}")]
    Parse(#[from] ParseError),

    #[error("invalid page url {url:?}: {reason}")]
    Url { url: String, reason: String },

    /// The request never produced a result (the worker bailed out).
    #[error("fetch worker stopped before the request completed")]
    WorkerGone,
}

/// Trait that every paged source must implement.
///
/// Pages are fetched on the background worker started by
/// [`crate::fetch::spawn`], so implementations must be [`Send`] + [`Sync`].
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Human-readable label shown in the list title.
    fn name(&self) -> &str;

    /// URL of page 1 for the given page size.
    fn first_page_url(&self, page_size: usize) -> String;

    /// Fetch the page at `url` (either [`first_page_url`](Self::first_page_url)
    /// or a cursor taken from a previous page).
    async fn fetch_page(&self, url: &str) -> Result<Page, FetchError>;
}
