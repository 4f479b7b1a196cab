//! `Link` response header parsing.
//!
//! Paged endpoints advertise their neighbours in a header such as
//!
//! ```text
//! Link: <http://host/items?_page=2&_limit=50>; rel="next", <http://host/items?_page=5&_limit=50>; rel="last"
//! ```
//!
//! [`parse_link_header`] turns that into a [`LinkMap`] keyed by relation
//! name.  The loader only ever looks at [`LinkMap::next`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]*)>").expect("link url pattern is valid"));
static REL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"rel="([^"]*)""#).expect("link rel pattern is valid"));

/// A malformed entry in a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("link entry has no <url>: {entry:?}")]
    MissingUrl { entry: String },

    #[error("link entry has no rel=\"...\": {entry:?}")]
    MissingRel { entry: String },

    #[error("Link header is not visible ASCII")]
    InvalidEncoding,
}

/// How to treat entries that fail to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// The first malformed entry fails the whole header.
    #[default]
    Strict,
    /// Malformed entries are logged and skipped.
    Lenient,
}

/// Relation name → target URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMap(HashMap<String, String>);

impl LinkMap {
    pub fn get(&self, rel: &str) -> Option<&str> {
        self.0.get(rel).map(String::as_str)
    }

    /// The `next` relation, i.e. the pagination cursor.
    pub fn next(&self) -> Option<&str> {
        self.get("next")
    }
}

/// Parse a `Link` header value in strict mode.
///
/// An absent or blank header is not an error: it yields an empty map, which
/// the loader reads as "no next page".
pub fn parse_link_header(header: Option<&str>) -> Result<LinkMap, ParseError> {
    parse_link_header_with(header, Strictness::Strict)
}

/// Parse a `Link` header value with the given [`Strictness`].
///
/// Entries are separated by commas.  A `rel` value may name several
/// relations separated by whitespace (`rel="next last"`); each gets its own
/// map entry.  When a relation repeats, the later entry wins.  Blank
/// segments (e.g. from a trailing comma) are ignored in both modes.
pub fn parse_link_header_with(
    header: Option<&str>,
    strictness: Strictness,
) -> Result<LinkMap, ParseError> {
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return Ok(LinkMap::default());
    };

    let mut links = HashMap::new();
    for entry in header.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        match parse_entry(entry) {
            Ok((url, rels)) => {
                for rel in rels.split_whitespace() {
                    links.insert(rel.to_string(), url.to_string());
                }
            }
            Err(e) => match strictness {
                Strictness::Strict => return Err(e),
                Strictness::Lenient => tracing::warn!(error = %e, "skipping malformed link entry"),
            },
        }
    }

    Ok(LinkMap(links))
}

fn parse_entry(entry: &str) -> Result<(&str, &str), ParseError> {
    let url = URL_RE
        .captures(entry)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ParseError::MissingUrl {
            entry: entry.to_string(),
        })?;
    let rel = REL_RE
        .captures(entry)
        .and_then(|c| c.get(1))
        .ok_or_else(|| ParseError::MissingRel {
            entry: entry.to_string(),
        })?;
    Ok((url.as_str(), rel.as_str()))
}
