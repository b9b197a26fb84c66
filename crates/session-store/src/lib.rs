//! # Session store
//!
//! Maps a chat-platform user id to the Deepseek session obtained by logging in. Sessions live only in
//! memory and are lost on restart. Each user has at most one session; per-key atomicity comes from
//! [`DashMap`]'s entry API, so concurrent logins for the same user cannot both win.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use deepseek_client::{mask_token, ApiError, ChatHandle, DeepseekApi};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

/// Authenticated context of one user against the remote API.
#[derive(Clone)]
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub token: String,
    pub account_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("token", &mask_token(&self.token))
            .field("account_id", &self.account_id)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Result of a registration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// A verification code was e-mailed; register again with the code.
    VerificationPending,
    Registered,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("You are already logged in")]
    AlreadyLoggedIn,

    #[error("You are not logged in")]
    NotLoggedIn,

    /// Invalid credentials or verification code, as reported by the API.
    #[error("{0}")]
    Auth(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// Remote rejections during login/registration are authentication failures; transport errors stay as they are.
fn auth_error(e: ApiError) -> SessionError {
    match e {
        ApiError::Remote { message, .. } if !message.is_empty() => SessionError::Auth(message),
        ApiError::Remote { code, .. } => SessionError::Auth(format!("rejected with code {code}")),
        other => SessionError::Api(other),
    }
}

/// Shared store of sessions, passed by `Arc` to the handlers.
pub struct SessionStore {
    api: Arc<dyn DeepseekApi>,
    sessions: DashMap<i64, Session>,
}

impl SessionStore {
    pub fn new(api: Arc<dyn DeepseekApi>) -> Self {
        Self {
            api,
            sessions: DashMap::new(),
        }
    }

    /// API client used for all account calls; the relay borrows it to open streams.
    pub fn api(&self) -> &Arc<dyn DeepseekApi> {
        &self.api
    }

    pub fn get(&self, user_id: i64) -> Option<Session> {
        self.sessions.get(&user_id).map(|s| s.value().clone())
    }

    pub fn is_logged_in(&self, user_id: i64) -> bool {
        self.sessions.contains_key(&user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Logs in and stores the session. Rejected with [`SessionError::AlreadyLoggedIn`] if the user has one.
    #[instrument(skip(self, password))]
    pub async fn login(&self, user_id: i64, email: &str, password: &str) -> Result<Session> {
        if self.is_logged_in(user_id) {
            return Err(SessionError::AlreadyLoggedIn);
        }
        let data = self.api.login(email, password).await.map_err(auth_error)?;
        let session = Session {
            user_id,
            email: data.user.email.unwrap_or_else(|| email.to_string()),
            token: data.user.token,
            account_id: data.user.id,
            created_at: Utc::now(),
        };

        // A concurrent login may have finished while we were waiting on the API.
        match self.sessions.entry(user_id) {
            Entry::Occupied(_) => Err(SessionError::AlreadyLoggedIn),
            Entry::Vacant(slot) => {
                slot.insert(session.clone());
                info!(user_id, token = %mask_token(&session.token), "Session created");
                Ok(session)
            }
        }
    }

    /// Without `code`, asks the API to e-mail one; with `code`, completes the registration.
    #[instrument(skip(self, password, code))]
    pub async fn register(
        &self,
        user_id: i64,
        email: &str,
        password: &str,
        code: Option<&str>,
    ) -> Result<RegisterOutcome> {
        if self.is_logged_in(user_id) {
            return Err(SessionError::AlreadyLoggedIn);
        }
        match code {
            None => {
                self.api
                    .request_verification_code(email)
                    .await
                    .map_err(auth_error)?;
                Ok(RegisterOutcome::VerificationPending)
            }
            Some(code) => {
                self.api
                    .register(email, code, password)
                    .await
                    .map_err(auth_error)?;
                info!(user_id, "Account registered");
                Ok(RegisterOutcome::Registered)
            }
        }
    }

    /// Removes the session; [`SessionError::NotLoggedIn`] if there is none.
    #[instrument(skip(self))]
    pub fn logout(&self, user_id: i64) -> Result<Session> {
        let (_, session) = self
            .sessions
            .remove(&user_id)
            .ok_or(SessionError::NotLoggedIn)?;
        info!(user_id, "Session removed");
        Ok(session)
    }

    /// Starts a fresh remote conversation for the user.
    #[instrument(skip(self))]
    pub async fn new_chat(&self, user_id: i64) -> Result<ChatHandle> {
        let token = self
            .get(user_id)
            .map(|s| s.token)
            .ok_or(SessionError::NotLoggedIn)?;
        Ok(self.api.new_chat(&token).await?)
    }
}
