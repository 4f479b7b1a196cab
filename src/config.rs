//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::link_header::Strictness;
use crate::loader::DEFAULT_PAGE_SIZE;

/// Collection browsed when no URL is given (a local json-server).
pub const DEFAULT_URL: &str = "http://127.0.0.1:3000/photos-short-list";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported url scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("page size must be at least 1")]
    ZeroPageSize,
}

/// Terminal client for paged JSON resources.
#[derive(Parser, Debug, Clone)]
#[command(name = "pagescroll")]
#[command(
    about = "Browse a paged JSON resource, loading the next page as the end of the list scrolls into view"
)]
pub struct Config {
    /// Base URL of the collection (paging parameters are appended)
    #[arg(env = "PAGESCROLL_URL", default_value = DEFAULT_URL)]
    pub url: String,

    /// Items per page
    #[arg(short, long, env = "PAGESCROLL_LIMIT", default_value_t = DEFAULT_PAGE_SIZE)]
    pub limit: usize,

    /// Title shown above the list (defaults to the URL path)
    #[arg(long, env = "PAGESCROLL_LABEL")]
    pub label: Option<String>,

    /// Artificial delay before every request, in milliseconds
    #[arg(long, env = "PAGESCROLL_DELAY_MS", default_value_t = 0)]
    pub delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, env = "PAGESCROLL_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Skip malformed Link header entries instead of failing the page
    #[arg(long, env = "PAGESCROLL_LENIENT_LINKS", default_value_t = false)]
    pub lenient_links: bool,

    /// Where tracing output goes (the terminal belongs to the UI)
    #[arg(long, env = "PAGESCROLL_LOG_FILE", default_value = "pagescroll.log")]
    pub log_file: PathBuf,
}

impl Config {
    /// Check the values clap cannot check and return the parsed base URL.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.limit == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        let url = Url::parse(&self.url).map_err(|e| ConfigError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn display_label(&self, base: &Url) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| format!("{}{}", base.host_str().unwrap_or_default(), base.path()))
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn strictness(&self) -> Strictness {
        if self.lenient_links {
            Strictness::Lenient
        } else {
            Strictness::Strict
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(std::iter::once("pagescroll").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&[]);
        assert_eq!(config.url, DEFAULT_URL);
        assert_eq!(config.limit, 50);
        assert_eq!(config.delay(), Duration::ZERO);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.strictness(), Strictness::Strict);
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "https://example.com/api/photos",
            "--limit",
            "20",
            "--delay-ms",
            "2000",
            "--lenient-links",
        ]);
        assert_eq!(config.limit, 20);
        assert_eq!(config.delay(), Duration::from_secs(2));
        assert_eq!(config.strictness(), Strictness::Lenient);

        let url = config.validate().unwrap();
        assert_eq!(config.display_label(&url), "example.com/api/photos");
    }

    #[test]
    fn explicit_label_wins() {
        let config = parse(&["--label", "Photos"]);
        let url = config.validate().unwrap();
        assert_eq!(config.display_label(&url), "Photos");
    }

    #[test]
    fn zero_limit_is_rejected() {
        let config = parse(&["--limit", "0"]);
        assert!(matches!(config.validate(), Err(ConfigError::ZeroPageSize)));
    }

    #[test]
    fn bad_urls_are_rejected() {
        assert!(matches!(
            parse(&["not a url"]).validate(),
            Err(ConfigError::InvalidUrl { .. })
        ));
        assert!(matches!(
            parse(&["ftp://example.com/x"]).validate(),
            Err(ConfigError::UnsupportedScheme(s)) if s == "ftp"
        ));
    }
}
