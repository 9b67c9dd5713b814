use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    db::{UserRepository, models::UserRow},
    error::{AppError, Result},
    utils::{generate_session_token, hash_session_token},
};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            created_at: row.created_at,
        }
    }
}

/// A new user together with the only copy of its bearer token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub user: UserProfile,
    pub token: String,
}

/// Registration and bearer token authentication.
#[derive(Clone)]
pub struct UsersManager {
    users: UserRepository,
}

impl UsersManager {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    /// Registers a user and opens their first session.
    ///
    /// # Arguments
    ///
    /// * `request` - Name and email. The email is trimmed and lowercased first.
    ///
    /// # Returns
    ///
    /// The profile and the plain session token. Only the token's hash is stored,
    /// so this is the one time it can be handed out. `Validation` for a blank
    /// name or malformed email, `Conflict` when the email is taken.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let registration = users.register(&RegisterUser {
    ///     name: "Ana".into(),
    ///     email: "ana@example.com".into(),
    /// }).await?;
    /// let me = users.authenticate(&registration.token).await?;
    /// assert_eq!(me.id, registration.user.id);
    /// ```
    pub async fn register(&self, request: &RegisterUser) -> Result<Registration> {
        let name = request.name.trim();
        let email = request.email.trim().to_lowercase();
        if name.is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        if !is_plausible_email(&email) {
            return Err(AppError::Validation("email is not valid".into()));
        }

        let token = generate_session_token();
        let user = self
            .users
            .insert_with_session(name, &email, &hash_session_token(&token))
            .await?;
        info!(user_id = user.id, "registered user");

        Ok(Registration {
            user: user.into(),
            token,
        })
    }

    /// Resolves a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> Result<UserProfile> {
        self.users
            .find_by_token_hash(&hash_session_token(token))
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::Unauthorized("invalid bearer token".into()))
    }

    /// `NotFound` when there is no user with this id.
    pub async fn get(&self, id: i64) -> Result<UserProfile> {
        self.users
            .find_by_id(id)
            .await?
            .map(UserProfile::from)
            .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
