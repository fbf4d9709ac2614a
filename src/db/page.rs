//! Opaque keyset pagination tokens.
//!
//! A token is the URL-safe base64 encoding of the JSON-serialized key of the
//! last row on the previous page. Scans continue strictly after that key.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{Result, SkratimeError};

/// Key of the last row returned on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageKey {
    /// Primary key of the last row.
    pub id: String,
    /// Partition the scan was restricted to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl PageKey {
    /// Key for an unpartitioned scan.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category_id: None,
        }
    }

    /// Key for a scan within one category.
    pub fn in_category(id: impl Into<String>, category_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category_id: Some(category_id.into()),
        }
    }
}

/// One page of a keyset scan.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Rows on this page.
    pub items: Vec<T>,
    /// Key to resume from, present only when more rows follow.
    pub last_key: Option<PageKey>,
}

impl<T> Page<T> {
    /// Build a page from `limit + 1` fetched rows.
    ///
    /// The extra row only signals that another page exists and is dropped.
    pub fn from_overfetch(mut rows: Vec<T>, limit: usize, key_of: impl Fn(&T) -> PageKey) -> Self {
        let has_more = rows.len() > limit;
        rows.truncate(limit);
        let last_key = if has_more { rows.last().map(key_of) } else { None };
        Self {
            items: rows,
            last_key,
        }
    }

    /// Encoded token for the next page.
    pub fn next_token(&self) -> Option<String> {
        self.last_key.as_ref().map(encode_page_token)
    }

    /// Map the items, keeping the pagination key.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            last_key: self.last_key,
        }
    }
}

/// Encode a page key as an opaque token.
pub fn encode_page_token(key: &PageKey) -> String {
    // Serializing a struct of strings cannot fail.
    let json = serde_json::to_vec(key).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Decode an opaque token back into a page key.
pub fn decode_page_token(token: &str) -> Result<PageKey> {
    let invalid = || SkratimeError::Validation("Invalid pagination token".to_string());

    let bytes = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| invalid())?;
    let key: PageKey = serde_json::from_slice(&bytes).map_err(|_| invalid())?;
    if key.id.is_empty() {
        return Err(invalid());
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let key = PageKey::in_category("abc", "cat-1");
        let token = encode_page_token(&key);
        assert!(!token.contains('='));
        assert_eq!(decode_page_token(&token).unwrap(), key);
    }

    #[test]
    fn test_decode_garbage_token() {
        assert!(matches!(
            decode_page_token("not base64 !!"),
            Err(SkratimeError::Validation(_))
        ));
        let not_json = URL_SAFE_NO_PAD.encode(b"hello");
        assert!(decode_page_token(&not_json).is_err());
        let empty_id = URL_SAFE_NO_PAD.encode(br#"{"id":""}"#);
        assert!(decode_page_token(&empty_id).is_err());
    }

    #[test]
    fn test_page_from_overfetch() {
        let rows = vec!["a", "b", "c"];
        let page = Page::from_overfetch(rows, 2, |r| PageKey::new(*r));
        assert_eq!(page.items, vec!["a", "b"]);
        assert_eq!(page.last_key, Some(PageKey::new("b")));
        assert!(page.next_token().is_some());

        let rows = vec!["a", "b"];
        let page = Page::from_overfetch(rows, 2, |r| PageKey::new(*r));
        assert_eq!(page.items.len(), 2);
        assert!(page.last_key.is_none());
    }
}
