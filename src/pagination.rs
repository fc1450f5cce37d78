use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::document::{decode_page, DecodeError};
use crate::models::{Page, PostSummary};

#[derive(Debug, Error)]
pub enum InvalidPageError {
    #[error("page payload has no `results` list")]
    MissingItems,
    #[error("page item {index} is not a post: {source}")]
    Item {
        index: usize,
        #[source]
        source: DecodeError,
    },
}

/// The accumulated listing: every page fetched so far, in arrival order,
/// plus the cursor of the next page
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaginationState {
    items: Vec<PostSummary>,
    next_cursor: Option<String>,
}

impl PaginationState {
    /// Creates the state from the first page of a listing session
    pub fn new(initial: Page) -> Self {
        Self {
            items: initial.items,
            next_cursor: initial.next_cursor,
        }
    }

    /// Returns a new state with `page.items` appended after the current items
    /// The cursor is replaced by the page's cursor, never merged.
    /// Items are neither de-duplicated nor re-sorted.
    pub fn append_page(&self, page: Page) -> PaginationState {
        let mut items = Vec::with_capacity(self.items.len() + page.items.len());
        items.extend_from_slice(&self.items);
        items.extend(page.items);

        PaginationState {
            items,
            next_cursor: page.next_cursor,
        }
    }

    /// Decodes a raw search response and appends it
    /// A malformed payload leaves `self` untouched and returns the error.
    pub fn append_raw(&self, payload: &Value) -> Result<PaginationState, InvalidPageError> {
        let page = decode_page(payload)?;
        Ok(self.append_page(page))
    }

    pub fn items(&self) -> &[PostSummary] {
        &self.items
    }

    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }

    /// Whether a "load more" action should still be offered
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
