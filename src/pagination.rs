//! Numeric cursor pagination over offset/limit sources.
//!
//! The cursor handed to clients is the offset of the first item of the next
//! page. A page that came back full is assumed to have a successor, so a
//! result count that is an exact multiple of the limit ends with one empty
//! page.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 50;

/// `cursor`/`limit` as they arrive in a query string.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

/// A validated `(offset, limit)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub cursor: u32,
    pub limit: u32,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            cursor: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl CursorQuery {
    pub fn new(cursor: Option<i64>, limit: Option<i64>) -> Self {
        Self { cursor, limit }
    }

    pub fn window(&self) -> Result<PageWindow> {
        let cursor = match self.cursor {
            None => 0,
            Some(c) => u32::try_from(c)
                .map_err(|_| AppError::Validation("cursor must be a non-negative integer".into()))?,
        };
        let limit = match self.limit {
            None => DEFAULT_LIMIT,
            Some(l) if (1..=MAX_LIMIT as i64).contains(&l) => l as u32,
            Some(_) => {
                return Err(AppError::Validation(format!(
                    "limit must be between 1 and {MAX_LIMIT}"
                )));
            }
        };
        Ok(PageWindow { cursor, limit })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<u32>,
}

impl<T> CursorPage<T> {
    /// Builds the page for `items` fetched with `window`.
    pub fn from_window(items: Vec<T>, window: PageWindow) -> Self {
        let next_cursor = next_cursor(window.cursor, window.limit, items.len());
        Self { items, next_cursor }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// `Some(cursor + returned)` when the page came back full, `None` otherwise.
pub fn next_cursor(cursor: u32, limit: u32, returned: usize) -> Option<u32> {
    if returned == limit as usize {
        Some(cursor.saturating_add(limit))
    } else {
        None
    }
}

/// Fetches one window through `fetch(limit, offset)` and wraps it in a page.
pub async fn paginate<T, F, Fut>(window: PageWindow, fetch: F) -> Result<CursorPage<T>>
where
    F: FnOnce(u32, u32) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let items = fetch(window.limit, window.cursor).await?;
    Ok(CursorPage::from_window(items, window))
}
