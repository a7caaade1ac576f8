//! Cursor-linked page envelope.
//!
//! The backend addresses pages with opaque, directly fetchable references
//! (`{"$ref": "https://..."}`). References are stored and replayed verbatim and
//! are never parsed or assembled locally.

use serde::{Deserialize, Serialize};

/// Opaque, server-issued address of one page of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageRef(String);

impl PageRef {
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for PageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Link object as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    #[serde(rename = "$ref")]
    pub href: PageRef,
}

/// One page of a collection together with its neighbouring cursors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub first: PageLink,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

impl<T> Page<T> {
    pub fn first_ref(&self) -> &PageRef {
        &self.first.href
    }

    /// Reference to the following page, `None` on the last page.
    pub fn next_ref(&self) -> Option<&PageRef> {
        self.next.as_ref().map(|link| &link.href).filter(|r| !r.is_empty())
    }

    /// Reference to the preceding page, `None` on the first page.
    pub fn prev_ref(&self) -> Option<&PageRef> {
        self.prev.as_ref().map(|link| &link.href).filter(|r| !r.is_empty())
    }
}
