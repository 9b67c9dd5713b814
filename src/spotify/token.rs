use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::{
    error::{AppError, Result},
    spotify::http::{HttpError, RetryingHttpClient},
    types::TokenResponse,
};

/// Lifetime assumed when the token endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN: u64 = 3600;

/// Bearer credential for the catalog API. Replaced wholesale on refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Holds the process-wide catalog token and refreshes it through the
/// client-credentials grant once it has expired.
///
/// Callers that miss the cache at the same time wait on the same refresh
/// instead of each issuing an exchange.
#[derive(Debug)]
pub struct TokenCache {
    http: RetryingHttpClient,
    token_url: Option<String>,
    credentials: Option<ClientCredentials>,
    current: Mutex<Option<BearerToken>>,
}

impl TokenCache {
    pub fn new(
        http: RetryingHttpClient,
        token_url: Option<String>,
        credentials: Option<ClientCredentials>,
    ) -> Self {
        Self {
            http,
            token_url,
            credentials,
            current: Mutex::new(None),
        }
    }

    /// Starts the cache with an already issued token.
    pub fn with_token(self, token: BearerToken) -> Self {
        Self {
            current: Mutex::new(Some(token)),
            ..self
        }
    }

    pub async fn get_token(&self) -> Result<BearerToken> {
        let mut current = self.current.lock().await;
        if let Some(token) = current.as_ref() {
            if token.is_valid_at(Utc::now()) {
                return Ok(token.clone());
            }
        }

        let token = self.exchange().await?;
        *current = Some(token.clone());
        Ok(token)
    }

    async fn exchange(&self) -> Result<BearerToken> {
        let (Some(token_url), Some(credentials)) = (&self.token_url, &self.credentials) else {
            return Err(AppError::Configuration(
                "SPOTIFY_CLIENT_ID, SPOTIFY_CLIENT_SECRET and SPOTIFY_TOKEN_URL must be set"
                    .to_string(),
            ));
        };

        let response = self
            .http
            .execute(|client| {
                client
                    .post(token_url)
                    .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
                    .form(&[("grant_type", "client_credentials")])
            })
            .await
            .map_err(|err| match err {
                HttpError::Status { status, body } => AppError::UpstreamAuth {
                    status: Some(status.as_u16()),
                    body,
                },
                HttpError::Transport(err) => AppError::UpstreamAuth {
                    status: None,
                    body: err.to_string(),
                },
            })?;

        let payload: TokenResponse =
            response
                .json()
                .await
                .map_err(|err| AppError::UpstreamAuth {
                    status: None,
                    body: format!("malformed token response: {err}"),
                })?;

        let value = payload
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::UpstreamAuth {
                status: None,
                body: "token response did not contain an access token".to_string(),
            })?;

        let expires_in = payload.expires_in.unwrap_or(DEFAULT_EXPIRES_IN).max(1);
        let expires_at = Utc::now() + Duration::seconds(expires_in as i64);
        info!(%expires_at, "obtained catalog access token");

        Ok(BearerToken { value, expires_at })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Client;

    use super::*;
    use crate::spotify::http::RetryPolicy;

    fn http() -> RetryingHttpClient {
        RetryingHttpClient::new(Client::new(), RetryPolicy::default())
    }

    #[test]
    fn test_token_validity_window() {
        let now = Utc::now();
        let token = BearerToken {
            value: "abc".into(),
            expires_at: now + Duration::seconds(10),
        };
        assert!(token.is_valid_at(now));
        assert!(!token.is_valid_at(now + Duration::seconds(10)));
        assert!(!token.is_valid_at(now + Duration::seconds(11)));
    }

    #[tokio::test]
    async fn test_cached_token_is_returned_without_exchange() {
        // no credentials configured: any exchange attempt would fail
        let token = BearerToken {
            value: "cached".into(),
            expires_at: Utc::now() + Duration::minutes(30),
        };
        let cache = TokenCache::new(http(), None, None).with_token(token.clone());

        assert_eq!(cache.get_token().await.unwrap(), token);
        assert_eq!(cache.get_token().await.unwrap(), token);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_configuration_error() {
        let cache = TokenCache::new(http(), Some("http://127.0.0.1:9/token".into()), None);
        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_expired_token_triggers_exchange() {
        let expired = BearerToken {
            value: "stale".into(),
            expires_at: Utc::now() - Duration::seconds(1),
        };
        let cache = TokenCache::new(http(), None, None).with_token(expired);

        // the exchange is attempted, and fails on the missing configuration
        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }
}
