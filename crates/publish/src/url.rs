//! Result URL construction.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::error::PublishError;
use crate::upload::ContentId;

/// URL state keys that describe a previous share; dropped from result URLs.
///
/// A republished report gets a clean link: any existing share pointer in the
/// viewer state is discarded rather than merged.
pub const SHARE_KEYS: &[&str] = &["report", "gist", "jsonurl", "share"];

/// RFC 3986 unreserved characters pass through; everything else is escaped.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Ordered key/value view state carried into the result URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlState {
    pairs: Vec<(String, String)>,
}

impl UrlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parses a `key=value` pair; the value may be empty, the key may not.
    pub fn parse_pair(s: &str) -> Option<(String, String)> {
        let (key, value) = s.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        Some((key.to_string(), value.to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for UrlState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = UrlState::new();
        for (k, v) in iter {
            state.insert(k, v);
        }
        state
    }
}

/// Turns a content identifier plus view state into a shareable URL.
pub trait UrlBuilder: Send + Sync {
    fn build_result_url(&self, id: &ContentId, state: &UrlState) -> Result<String, PublishError>;
}

/// Builds `{base}/{id}` with non-share view state in the fragment.
#[derive(Debug, Clone)]
pub struct ViewerUrlBuilder {
    base: String,
}

impl ViewerUrlBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }
}

impl UrlBuilder for ViewerUrlBuilder {
    fn build_result_url(&self, id: &ContentId, state: &UrlState) -> Result<String, PublishError> {
        if self.base.is_empty() {
            return Err(PublishError::ResultUrl("viewer base URL is empty".into()));
        }
        if id.as_str().is_empty() {
            return Err(PublishError::ResultUrl("content id is empty".into()));
        }

        let mut url = format!(
            "{}/{}",
            self.base,
            utf8_percent_encode(id.as_str(), UNRESERVED)
        );

        let fragment: Vec<String> = state
            .iter()
            .filter(|(k, _)| !SHARE_KEYS.contains(k))
            .map(|(k, v)| {
                format!(
                    "{}={}",
                    utf8_percent_encode(k, UNRESERVED),
                    utf8_percent_encode(v, UNRESERVED)
                )
            })
            .collect();
        if !fragment.is_empty() {
            url.push('#');
            url.push_str(&fragment.join("&"));
        }
        Ok(url)
    }
}
