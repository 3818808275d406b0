//! GitHub OAuth provider.
//!
//! Blocking reqwest client: the server handles one request at a time, and
//! the token exchange happens inside the callback request.

use super::{AuthError, IdentityProvider, Profile};
use crate::config::AuthConfig;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const USER_URL: &str = "https://api.github.com/user";
pub const EMAILS_URL: &str = "https://api.github.com/user/emails";
pub const SCOPE: &str = "user:email";

const USER_AGENT: &str = concat!("lectern/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct GitHub {
    client_id: String,
    client_secret: String,
    callback_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    avatar_url: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

impl GitHub {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            callback_url: config.callback_url.clone(),
            http,
        })
    }

    fn access_token(&self, code: &str) -> Result<String, AuthError> {
        let response: TokenResponse = self
            .http
            .post(TOKEN_URL)
            .header(ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.callback_url.as_str()),
            ])
            .send()?
            .error_for_status()?
            .json()?;
        response.access_token.ok_or_else(|| {
            AuthError::Provider(
                response
                    .error_description
                    .or(response.error)
                    .unwrap_or_else(|| "no access token in response".to_string()),
            )
        })
    }

    fn user(&self, token: &str) -> Result<GitHubUser, AuthError> {
        Ok(self
            .http
            .get(USER_URL)
            .bearer_auth(token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()?
            .error_for_status()?
            .json()?)
    }

    /// Primary verified address, falling back to the first listed one.
    fn primary_email(&self, token: &str) -> Result<Option<String>, AuthError> {
        let emails: Vec<GitHubEmail> = self
            .http
            .get(EMAILS_URL)
            .bearer_auth(token)
            .header(ACCEPT, "application/vnd.github+json")
            .send()?
            .error_for_status()?
            .json()?;
        Ok(choose_email(&emails))
    }
}

fn choose_email(emails: &[GitHubEmail]) -> Option<String> {
    emails
        .iter()
        .find(|e| e.primary && e.verified)
        .or_else(|| emails.first())
        .map(|e| e.email.clone())
}

impl IdentityProvider for GitHub {
    fn authorize_url(&self, state: &str) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&scope={}&state={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.callback_url),
            urlencoding::encode(SCOPE),
            urlencoding::encode(state),
        )
    }

    fn exchange(&self, code: &str) -> Result<Profile, AuthError> {
        let token = self.access_token(code)?;
        let user = self.user(&token)?;
        debug!(login = %user.login, "fetched GitHub profile");

        let email = match user.email {
            Some(email) => email,
            None => {
                let primary = self.primary_email(&token).unwrap_or_else(|err| {
                    warn!(login = %user.login, error = %err, "could not fetch email");
                    None
                });
                primary.unwrap_or_default()
            }
        };
        Ok(Profile {
            id: user.id,
            username: user.login,
            avatar: user.avatar_url.unwrap_or_default(),
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github() -> GitHub {
        let config = AuthConfig {
            client_id: "Iv1.abc".into(),
            client_secret: "secret".into(),
            ..AuthConfig::default()
        };
        GitHub::new(&config).unwrap()
    }

    #[test]
    fn authorize_url_carries_client_scope_and_state() {
        let url = github().authorize_url("s1");
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=Iv1.abc"));
        assert!(url.contains("scope=user%3Aemail"));
        assert!(url.contains("state=s1"));
    }

    #[test]
    fn authorize_url_encodes_callback() {
        let url = github().authorize_url("s1");
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A7676%2Fauth%2Fgithub%2Fcallback"
        ));
    }

    #[test]
    fn token_error_response_parses() {
        let body = r#"{"error":"bad_verification_code","error_description":"The code passed is incorrect or expired."}"#;
        let parsed: TokenResponse = serde_json::from_str(body).unwrap();
        assert!(parsed.access_token.is_none());
        assert_eq!(parsed.error.as_deref(), Some("bad_verification_code"));
    }

    #[test]
    fn user_payload_parses_with_null_email() {
        let body = r#"{"id":1,"login":"octocat","avatar_url":"https://a/u/1","email":null,"name":"The Octocat"}"#;
        let user: GitHubUser = serde_json::from_str(body).unwrap();
        assert_eq!(user.login, "octocat");
        assert!(user.email.is_none());
    }

    #[test]
    fn primary_verified_email_wins() {
        let body = r#"[
            {"email":"old@example.com","primary":false,"verified":true},
            {"email":"octocat@github.com","primary":true,"verified":true}
        ]"#;
        let emails: Vec<GitHubEmail> = serde_json::from_str(body).unwrap();
        assert_eq!(choose_email(&emails).as_deref(), Some("octocat@github.com"));
    }

    #[test]
    fn unverified_primary_falls_back_to_first() {
        let body = r#"[
            {"email":"first@example.com","primary":false,"verified":false},
            {"email":"octocat@github.com","primary":true,"verified":false}
        ]"#;
        let emails: Vec<GitHubEmail> = serde_json::from_str(body).unwrap();
        assert_eq!(choose_email(&emails).as_deref(), Some("first@example.com"));
        assert_eq!(choose_email(&[]), None);
    }
}
