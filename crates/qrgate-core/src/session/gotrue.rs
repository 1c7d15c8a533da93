//! GoTrue (Supabase auth) REST provider.
//!
//! Talks to `{url}/auth/v1/*` with the project's anon key, persists the issued
//! session through a [`SessionStore`] and broadcasts its own session changes.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::provider::{IdentityProvider, SessionBroadcaster, SessionSubscription};
use super::store::SessionStore;
use super::{
    AuthError, PendingConfirmation, Session, SessionChange, SessionEvent, User, now_secs,
};
use crate::config::Config;

/// User-Agent sent with every auth request.
pub const USER_AGENT: &str = concat!("qrgate/", env!("CARGO_PKG_VERSION"));

/// Lifetime assumed when the token response carries no expiry.
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

pub struct GoTrueProvider {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    store: SessionStore,
    broadcaster: SessionBroadcaster,
}

impl GoTrueProvider {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        timeout: Duration,
        store: SessionStore,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            store,
            broadcaster: SessionBroadcaster::new(),
        })
    }

    /// Builds a provider from the `[auth]` config section.
    ///
    /// # Errors
    /// Returns an error if the auth URL is missing or invalid.
    pub fn from_config(config: &Config, store: SessionStore) -> Result<Self> {
        let url = config.auth_url()?;
        Self::new(url.as_str(), config.anon_key(), config.request_timeout(), store)
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn broadcaster(&self) -> &SessionBroadcaster {
        &self.broadcaster
    }

    /// Exchanges the refresh token for a new session and stores it.
    ///
    /// # Errors
    /// Returns the provider error; the stored session is left untouched.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let response = self
            .post(
                "token?grant_type=refresh_token",
                &serde_json::json!({ "refresh_token": refresh_token }),
                None,
            )
            .await?;
        let session = read_session(response).await?;

        self.persist(&session);
        self.broadcaster.broadcast(&SessionChange::new(
            SessionEvent::TokenRefreshed,
            Some(session.clone()),
        ));
        tracing::debug!(user = %session.user.id, "session refreshed");
        Ok(session)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        bearer: Option<&str>,
    ) -> Result<reqwest::Response, AuthError> {
        let url = self.endpoint(path);
        tracing::debug!(%url, "auth request");

        let mut request = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request
            .send()
            .await
            .map_err(|err| AuthError::Network(format!("Failed to reach auth server: {err}")))
    }

    fn persist(&self, session: &Session) {
        if let Err(err) = self.store.save(session) {
            tracing::warn!(error = %format!("{err:#}"), "failed to persist session");
        }
    }

    fn forget(&self) {
        if let Err(err) = self.store.clear() {
            tracing::warn!(error = %format!("{err:#}"), "failed to clear stored session");
        }
    }
}

impl IdentityProvider for GoTrueProvider {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let response = self
            .post(
                "token?grant_type=password",
                &serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::InvalidCredentials(error_message(status, &body)));
        }
        let session = read_session(response).await?;

        self.persist(&session);
        self.broadcaster.broadcast(&SessionChange::new(
            SessionEvent::SignedIn,
            Some(session.clone()),
        ));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<PendingConfirmation, AuthError> {
        let response = self
            .post(
                "signup",
                &serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await?;
        let body: Value = read_json(response).await?;

        // Confirmation-required projects return the user itself, auto-confirm
        // projects nest it under "user" next to tokens we do not use.
        let user = body.get("user").unwrap_or(&body);
        let user_id = user.get("id").and_then(Value::as_str).map(str::to_string);

        Ok(PendingConfirmation {
            email: email.to_string(),
            user_id,
        })
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .post("recover", &serde_json::json!({ "email": email }), None)
            .await?;
        check_status(response).await.map(|_| ())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let stored = self.store.load().unwrap_or_else(|err| {
            tracing::warn!(error = %format!("{err:#}"), "ignoring unreadable session");
            None
        });

        if let Some(session) = stored {
            let response = self
                .post(
                    "logout",
                    &serde_json::json!({}),
                    Some(&session.access_token),
                )
                .await?;
            let status = response.status();
            // Already revoked or unknown token: the session is gone either way.
            if status != StatusCode::UNAUTHORIZED && status != StatusCode::NOT_FOUND {
                check_status(response).await?;
            }
        }

        self.forget();
        self.broadcaster
            .broadcast(&SessionChange::new(SessionEvent::SignedOut, None));
        Ok(())
    }

    async fn get_current_session(&self) -> Result<Option<Session>, AuthError> {
        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "discarding unreadable session");
                self.forget();
                None
            }
        };
        let Some(session) = stored else {
            return Ok(None);
        };
        if !session.is_expired() {
            return Ok(Some(session));
        }

        tracing::debug!(user = %session.user.id, "stored session expired, refreshing");
        match self.refresh_session(&session.refresh_token).await {
            Ok(refreshed) => Ok(Some(refreshed)),
            Err(AuthError::Network(msg)) => Err(AuthError::Network(msg)),
            Err(err) => {
                tracing::info!(error = %err, "refresh rejected, discarding session");
                self.forget();
                Ok(None)
            }
        }
    }

    fn subscribe(&self) -> SessionSubscription {
        self.broadcaster.subscribe()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    expires_at: Option<u64>,
    user: User,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = self.expires_at.unwrap_or_else(|| {
            now_secs() + self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS)
        });
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

/// Picks the human-readable message out of a GoTrue error body.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error_description.or(b.msg).or(b.message).or(b.error))
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Auth request failed ({status})"))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    if status == StatusCode::TOO_MANY_REQUESTS {
        Err(AuthError::RateLimited(message))
    } else {
        Err(AuthError::Provider(message))
    }
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AuthError> {
    check_status(response)
        .await?
        .json()
        .await
        .map_err(|err| AuthError::Provider(format!("Unexpected auth response: {err}")))
}

async fn read_session(response: reqwest::Response) -> Result<Session, AuthError> {
    read_json::<TokenResponse>(response)
        .await
        .map(TokenResponse::into_session)
}
