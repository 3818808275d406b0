//! Identity gateway.
//!
//! Login is delegated to an [`IdentityProvider`] (GitHub in production). A
//! successful login upserts the user into the [`UserRegistry`] and issues an
//! opaque session token carried in a cookie. Routes that need a signed-in
//! user ask a [`Gatekeeper`]; the content core never sees any of this.
//!
//! ## Login flow
//!
//! ```text
//! GET /auth/github            → state issued, redirect to provider
//! provider                    → GET /auth/github/callback?code=…&state=…
//! callback                    → state consumed, code exchanged for a profile,
//!                               user upserted, session cookie set
//! GET /auth/logout            → session dropped, cookie cleared
//! ```
//!
//! States are single-use and expire after a few minutes, so a callback can't
//! be replayed or forged from another site.

pub mod github;
pub mod session;
pub mod users;

use crate::config::AuthConfig;
use session::SessionStore;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;
pub use users::{User, UserRegistry};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("GitHub login is not configured")]
    NotConfigured,
    #[error("Login state is missing, expired or already used")]
    StateMismatch,
    #[error("Identity provider error: {0}")]
    Provider(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Random source unavailable: {0}")]
    Entropy(String),
    #[error("User registry {path}: {message}")]
    Registry { path: PathBuf, message: String },
}

/// The parts of a request the gatekeeper looks at.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session_token: Option<String>,
}

impl RequestContext {
    /// Build from a raw `Cookie` header.
    pub fn from_cookie_header(header: Option<&str>, cookie_name: &str) -> Self {
        Self {
            session_token: session_token(header, cookie_name),
        }
    }
}

/// Decides whether a request comes from a signed-in user.
pub trait Gatekeeper {
    fn is_authenticated(&self, request: &RequestContext) -> bool;
}

/// Profile returned by the identity provider after a code exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: u64,
    pub username: String,
    pub avatar: String,
    pub email: String,
}

/// An OAuth-style identity provider.
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is sent to, carrying `state` for the callback check.
    fn authorize_url(&self, state: &str) -> String;
    /// Trade an authorization code for the user's profile.
    fn exchange(&self, code: &str) -> Result<Profile, AuthError>;
}

/// Extract the value of cookie `name` from a `Cookie` header.
pub fn session_token(header: Option<&str>, name: &str) -> Option<String> {
    header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

pub struct Auth {
    provider: Option<Box<dyn IdentityProvider>>,
    sessions: SessionStore,
    users: UserRegistry,
    cookie_name: String,
    session_seconds: i64,
}

impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth")
            .field("enabled", &self.is_enabled())
            .field("cookie_name", &self.cookie_name)
            .finish_non_exhaustive()
    }
}

impl Auth {
    pub fn new(
        provider: Option<Box<dyn IdentityProvider>>,
        config: &AuthConfig,
        users: UserRegistry,
    ) -> Self {
        let days = i64::from(config.session_days);
        Self {
            provider,
            sessions: SessionStore::new(chrono::Duration::days(days)),
            users,
            cookie_name: config.session_cookie.clone(),
            session_seconds: days * 24 * 60 * 60,
        }
    }

    /// GitHub-backed gateway from config. Without credentials login is
    /// disabled and every protected route redirects.
    pub fn from_config(config: &AuthConfig, root: &Path) -> Result<Self, AuthError> {
        let provider: Option<Box<dyn IdentityProvider>> = if config.is_configured() {
            Some(Box::new(github::GitHub::new(config)?))
        } else {
            info!("GitHub credentials not set, login disabled");
            None
        };
        let users = match &config.users_file {
            Some(file) => UserRegistry::open(root.join(file))?,
            None => UserRegistry::in_memory(),
        };
        Ok(Self::new(provider, config, users))
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    /// Start a login: issue a state and return the provider URL.
    pub fn begin_login(&self) -> Result<String, AuthError> {
        let provider = self.provider.as_ref().ok_or(AuthError::NotConfigured)?;
        let state = self.sessions.issue_state()?;
        Ok(provider.authorize_url(&state))
    }

    /// Finish a login. Returns the new session token.
    pub fn complete_login(&self, code: &str, state: &str) -> Result<String, AuthError> {
        let provider = self.provider.as_ref().ok_or(AuthError::NotConfigured)?;
        if !self.sessions.consume_state(state) {
            return Err(AuthError::StateMismatch);
        }
        let profile = provider.exchange(code)?;
        let user = self.users.upsert(profile)?;
        info!(user = %user.username, id = user.github_id, "signed in");
        self.sessions.create(user.github_id)
    }

    /// Drop the session, if any. Returns whether one existed.
    pub fn logout(&self, token: Option<&str>) -> bool {
        token.is_some_and(|t| self.sessions.destroy(t))
    }

    /// The user behind a session token.
    pub fn user_for(&self, token: &str) -> Option<User> {
        self.sessions.user_id(token).and_then(|id| self.users.get(id))
    }

    /// `Set-Cookie` value carrying a fresh session.
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie_name, self.session_seconds
        )
    }

    /// `Set-Cookie` value removing the session cookie.
    pub fn clear_cookie(&self) -> String {
        format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", self.cookie_name)
    }
}

impl Gatekeeper for Auth {
    fn is_authenticated(&self, request: &RequestContext) -> bool {
        request
            .session_token
            .as_deref()
            .is_some_and(|t| self.sessions.user_id(t).is_some())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Provider that accepts one code and returns a fixed profile.
    pub struct FakeProvider {
        pub code: String,
        pub profile: Profile,
    }

    impl IdentityProvider for FakeProvider {
        fn authorize_url(&self, state: &str) -> String {
            format!("https://provider.test/authorize?state={state}")
        }

        fn exchange(&self, code: &str) -> Result<Profile, AuthError> {
            if code == self.code {
                Ok(self.profile.clone())
            } else {
                Err(AuthError::Provider("bad_verification_code".into()))
            }
        }
    }

    pub fn octocat() -> Profile {
        Profile {
            id: 583231,
            username: "octocat".into(),
            avatar: "https://avatars.githubusercontent.com/u/583231".into(),
            email: "octocat@github.com".into(),
        }
    }

    pub fn fake_auth() -> Auth {
        let provider = FakeProvider {
            code: "good-code".into(),
            profile: octocat(),
        };
        Auth::new(
            Some(Box::new(provider)),
            &AuthConfig::default(),
            UserRegistry::in_memory(),
        )
    }

    pub fn state_from(url: &str) -> String {
        url.rsplit("state=").next().unwrap_or_default().to_string()
    }
}
