//! HTTP page source.
//!
//! Talks to a json-server style endpoint:
//!
//! ```text
//! GET <base-url>?_page=<n>&_limit=<page size>
//! ```
//!
//! The body is a JSON array of [`Item`]s and the `Link` response header
//! carries the pagination relations.  Parsing is split out into
//! [`HttpPageSource::parse_page`] so tests can exercise it without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, LINK};
use reqwest::{Client, Url};

use super::{FetchError, Item, Page, PageSource};
use crate::link_header::{parse_link_header_with, ParseError, Strictness};

/// A paged JSON resource reached over HTTP.
pub struct HttpPageSource {
    /// Base URL of the collection, without paging parameters.
    pub base: Url,
    /// A human-readable label shown in the list title.
    pub label: String,
    client: Client,
    timeout: Duration,
    delay: Duration,
    strictness: Strictness,
}

impl HttpPageSource {
    /// Request timeout used unless [`with_timeout`](Self::with_timeout) says otherwise.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base: Url, label: impl Into<String>) -> Self {
        Self {
            base,
            label: label.into(),
            client: Client::new(),
            timeout: Self::DEFAULT_TIMEOUT,
            delay: Duration::ZERO,
            strictness: Strictness::Strict,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sleep this long before every request.  Handy for watching the
    /// loading placeholders against a local server.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Text of a raw `Link` header value.
    ///
    /// A value that is not visible ASCII cannot be parsed.  Strict mode fails
    /// the page; lenient mode treats the header as absent (so the page ends
    /// the feed) and warns.
    pub fn link_header_text(
        value: Option<&HeaderValue>,
        strictness: Strictness,
    ) -> Result<Option<&str>, ParseError> {
        let Some(value) = value else {
            return Ok(None);
        };
        match (value.to_str(), strictness) {
            (Ok(text), _) => Ok(Some(text)),
            (Err(_), Strictness::Strict) => Err(ParseError::InvalidEncoding),
            (Err(_), Strictness::Lenient) => {
                tracing::warn!("ignoring non-ASCII Link header");
                Ok(None)
            }
        }
    }

    /// Build a [`Page`] from an already-received `Link` header and body.
    ///
    /// This is a pure function (no I/O).
    pub fn parse_page(
        link_header: Option<&str>,
        body: &[u8],
        strictness: Strictness,
    ) -> Result<Page, FetchError> {
        let links = parse_link_header_with(link_header, strictness)?;
        let items: Vec<Item> = serde_json::from_slice(body)?;
        Ok(Page::new(items, links))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn first_page_url(&self, page_size: usize) -> String {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("_page", "1")
            .append_pair("_limit", &page_size.to_string());
        url.into()
    }

    async fn fetch_page(&self, url: &str) -> Result<Page, FetchError> {
        let url = Url::parse(url).map_err(|e| FetchError::Url {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let link_header =
            Self::link_header_text(response.headers().get(LINK), self.strictness)?
                .map(str::to_owned);

        let body = response.bytes().await?;
        Self::parse_page(link_header.as_deref(), &body, self.strictness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"[
        {"albumId": 1, "id": 1, "title": "accusamus beatae", "url": "https://via.placeholder.com/600/92c952"},
        {"albumId": 1, "id": 2, "title": "reprehenderit est", "url": "https://via.placeholder.com/600/771796"}
    ]"#;

    fn source() -> HttpPageSource {
        HttpPageSource::new(
            Url::parse("http://127.0.0.1:3000/photos-short-list").unwrap(),
            "photos",
        )
    }

    #[test]
    fn first_page_url_carries_paging_params() {
        assert_eq!(
            source().first_page_url(50),
            "http://127.0.0.1:3000/photos-short-list?_page=1&_limit=50"
        );
    }

    #[test]
    fn first_page_url_keeps_existing_query() {
        let src = HttpPageSource::new(Url::parse("http://h/photos?albumId=2").unwrap(), "p");
        assert_eq!(src.first_page_url(10), "http://h/photos?albumId=2&_page=1&_limit=10");
    }

    #[test]
    fn parse_page_extracts_items_and_cursor() {
        let page = HttpPageSource::parse_page(
            Some(r#"<http://h/p?_page=2&_limit=2>; rel="next", <http://h/p?_page=5&_limit=2>; rel="last""#),
            BODY.as_bytes(),
            Strictness::Strict,
        )
        .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].label(), "accusamus beatae");
        assert_eq!(page.next_cursor(), Some("http://h/p?_page=2&_limit=2"));
        assert_eq!(page.links.get("last"), Some("http://h/p?_page=5&_limit=2"));
    }

    #[test]
    fn parse_page_without_link_header_is_last_page() {
        let page = HttpPageSource::parse_page(None, BODY.as_bytes(), Strictness::Strict).unwrap();
        assert_eq!(page.next_cursor(), None);
    }

    #[test]
    fn parse_page_rejects_malformed_link_in_strict_mode() {
        let err = HttpPageSource::parse_page(Some("<http://h/2>"), BODY.as_bytes(), Strictness::Strict)
            .unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn non_ascii_link_header_fails_in_strict_mode() {
        let value = HeaderValue::from_bytes(b"<http://h/p?q=\xe9>; rel=\"next\"").unwrap();
        let err = HttpPageSource::link_header_text(Some(&value), Strictness::Strict).unwrap_err();
        assert_eq!(err, ParseError::InvalidEncoding);

        let fetch_err = FetchError::from(err);
        assert!(matches!(fetch_err, FetchError::Parse(ParseError::InvalidEncoding)));
    }

    #[test]
    fn non_ascii_link_header_is_skipped_in_lenient_mode() {
        let value = HeaderValue::from_bytes(b"<http://h/p?q=\xe9>; rel=\"next\"").unwrap();
        let text = HttpPageSource::link_header_text(Some(&value), Strictness::Lenient).unwrap();
        assert_eq!(text, None);
    }

    #[test]
    fn ascii_link_header_passes_through() {
        let value = HeaderValue::from_static(r#"<http://h/2>; rel="next""#);
        for strictness in [Strictness::Strict, Strictness::Lenient] {
            assert_eq!(
                HttpPageSource::link_header_text(Some(&value), strictness).unwrap(),
                Some(r#"<http://h/2>; rel="next""#)
            );
        }
        assert_eq!(HttpPageSource::link_header_text(None, Strictness::Strict).unwrap(), None);
    }

    #[test]
    fn parse_page_rejects_non_array_body() {
        let err = HttpPageSource::parse_page(None, br#"{"url": "x"}"#, Strictness::Strict).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn fetch_page_rejects_invalid_url() {
        let err = source().fetch_page("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Url { .. }));
    }

    #[test]
    fn name_returns_label() {
        assert_eq!(source().name(), "photos");
    }
}
