//! Opaque pagination token for connected-program lists: `"<date> <url>"`.

use crate::{errors::Error, Result};

/// Position in a connected-program list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationCursor {
    pub date: i32,
    pub url: String,
}

impl PaginationCursor {
    pub fn new(date: i32, url: impl Into<String>) -> Self {
        Self {
            date,
            url: url.into(),
        }
    }

    /// Decode a token. The empty token is the start of the list (`None`); any
    /// other token is a position, even one that decodes to `(0, "")`.
    ///
    /// The token is split at the first space; everything after it is the url,
    /// which may itself be empty or contain spaces.
    pub fn decode(token: &str) -> Result<Option<Self>> {
        if token.is_empty() {
            return Ok(None);
        }
        let (date, url) = token.split_once(' ').unwrap_or((token, ""));
        let date = date
            .parse::<i32>()
            .map_err(|_| Error::Validation("Invalid offset specified".to_string()))?;
        Ok(Some(Self::new(date, url)))
    }
}

pub fn encode(date: i32, url: &str) -> String {
    format!("{date} {url}")
}
