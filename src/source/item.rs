//! The record type returned by a paged resource.
//!
//! An `Item` is mostly opaque: the loader never looks inside it, and the
//! view only needs something to display.  The one required field is `url`,
//! the display reference.  Fields known from the reference photo resource
//! (`id`, `albumId`, `title`, `thumbnailUrl`) are decoded when present and
//! everything else is kept verbatim in [`Item::extra`].

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Identifier of an item as the server sent it.
///
/// Some servers number their records, others use string keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{n}"),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

/// A single record from a page.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: Option<ItemId>,

    #[serde(default)]
    pub album_id: Option<u64>,

    #[serde(default)]
    pub title: Option<String>,

    /// Display reference.  The only field every item must carry.
    pub url: String,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    /// Any fields not listed above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Item {
    /// Minimal item with only a display reference.
    #[cfg(test)]
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            id: None,
            album_id: None,
            title: None,
            url: url.into(),
            thumbnail_url: None,
            extra: Map::new(),
        }
    }

    /// Text shown for this item: the title, or the URL when untitled.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}
