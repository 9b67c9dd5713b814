use chrono::Utc;
use sqlx::{SqlitePool, query, query_as};

use crate::{
    db::models::UserRow,
    error::{AppError, Result},
};

/// Users and the hashed bearer tokens that identify them.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Creates the user and its first session in one transaction.
    /// A taken email is a `Conflict`.
    pub async fn insert_with_session(
        &self,
        name: &str,
        email: &str,
        token_hash: &str,
    ) -> Result<UserRow> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let id = query("INSERT INTO users (name, email, created_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::conflict_on_unique(e, "email already registered"))?
            .last_insert_rowid();

        query("INSERT INTO sessions (token_hash, user_id, created_at) VALUES (?, ?, ?)")
            .bind(token_hash)
            .bind(id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(UserRow {
            id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: now,
        })
    }

    /// Looks a user up by id; `None` when there is no such user.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        let user = query_as::<_, UserRow>(
            "SELECT id, name, email, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    /// Resolves a session to its user.
    ///
    /// # Arguments
    ///
    /// * `token_hash` - Hash of the bearer token, see [`crate::utils::hash_session_token`]
    ///
    /// # Returns
    ///
    /// The user owning the session, or `None` for an unknown token.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let user = users
    ///     .find_by_token_hash(&hash_session_token(bearer))
    ///     .await?
    ///     .ok_or_else(|| AppError::Unauthorized("invalid token".into()))?;
    /// ```
    pub async fn find_by_token_hash(&self, token_hash: &str) -> Result<Option<UserRow>> {
        let user = query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.name, u.email, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
