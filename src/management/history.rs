use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::{
    db::{SearchHistoryRepository, models::SearchHistoryRow},
    error::{AppError, Result},
    pagination::{CursorPage, PageWindow},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHistoryDto {
    pub id: i64,
    pub user_id: i64,
    pub query: String,
    pub created_at: DateTime<Utc>,
}

impl From<SearchHistoryRow> for SearchHistoryDto {
    fn from(row: SearchHistoryRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            query: row.query,
            created_at: row.created_at,
        }
    }
}

/// Per-user search history.
#[derive(Clone)]
pub struct HistoryManager {
    history: SearchHistoryRepository,
}

impl HistoryManager {
    pub fn new(history: SearchHistoryRepository) -> Self {
        Self { history }
    }

    /// Stores the trimmed query. Blank queries are skipped and storage
    /// failures are only logged, so a search never fails because of this.
    pub async fn record(&self, user_id: i64, query: &str) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        if let Err(err) = self.history.insert(user_id, query).await {
            warn!(user_id, error = %err, "failed to record search history");
        }
    }

    /// Search history of `user_id`, newest first.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Signed-in user
    /// * `window` - Offset cursor and page size
    ///
    /// # Returns
    ///
    /// One page of entries. `next_cursor` is set when the page came back full.
    pub async fn list(&self, user_id: i64, window: PageWindow) -> Result<CursorPage<SearchHistoryDto>> {
        let rows = self
            .history
            .list(user_id, window.limit as i64, window.cursor as i64)
            .await?;
        Ok(CursorPage::from_window(rows, window).map(SearchHistoryDto::from))
    }

    /// `NotFound` unless the entry exists and belongs to `user_id`.
    pub async fn remove(&self, user_id: i64, id: i64) -> Result<()> {
        if self.history.delete(user_id, id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("search history entry not found".into()))
        }
    }

    /// Removes every entry of `user_id` and returns how many there were.
    pub async fn clear(&self, user_id: i64) -> Result<u64> {
        self.history.clear(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::management::test_support::{pool, user};

    #[tokio::test]
    async fn test_record_trims_and_skips_blank() {
        let pool = pool().await;
        let ana = user(&pool, "Ana").await;
        let history = HistoryManager::new(SearchHistoryRepository::new(pool.clone()));

        history.record(ana, "  lofi beats ").await;
        history.record(ana, "   ").await;

        let page = history.list(ana, PageWindow::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].query, "lofi beats");
        assert_eq!(page.next_cursor, None);
    }

    #[tokio::test]
    async fn test_list_pages_newest_first() {
        let pool = pool().await;
        let ana = user(&pool, "Ana").await;
        let history = HistoryManager::new(SearchHistoryRepository::new(pool.clone()));
        for query in ["one", "two", "three"] {
            history.record(ana, query).await;
        }

        let first = history
            .list(ana, PageWindow { cursor: 0, limit: 2 })
            .await
            .unwrap();
        assert_eq!(
            first.items.iter().map(|h| h.query.as_str()).collect::<Vec<_>>(),
            vec!["three", "two"]
        );
        assert_eq!(first.next_cursor, Some(2));

        let second = history
            .list(ana, PageWindow { cursor: 2, limit: 2 })
            .await
            .unwrap();
        assert_eq!(second.items[0].query, "one");
        assert_eq!(second.next_cursor, None);
    }

    #[tokio::test]
    async fn test_remove_and_clear_are_scoped() {
        let pool = pool().await;
        let ana = user(&pool, "Ana").await;
        let bea = user(&pool, "Bea").await;
        let history = HistoryManager::new(SearchHistoryRepository::new(pool.clone()));
        history.record(ana, "one").await;
        history.record(ana, "two").await;
        history.record(bea, "three").await;

        let entry = history.list(ana, PageWindow::default()).await.unwrap().items[0].id;
        assert!(matches!(
            history.remove(bea, entry).await,
            Err(AppError::NotFound(_))
        ));
        history.remove(ana, entry).await.unwrap();

        assert_eq!(history.clear(ana).await.unwrap(), 1);
        assert_eq!(
            history.list(bea, PageWindow::default()).await.unwrap().items.len(),
            1
        );
    }
}
