//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content root (the lesson repository being served) and is optional:
//! stock defaults are used for every key it does not mention.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! title = "Lectern"
//!
//! [content]
//! doc_extensions = ["md"]          # Rendered as markdown
//! code_extensions = ["dart"]       # Rendered as escaped code blocks
//! metadata_extension = "txt"       # Sidecar holding a gist URL for a code file
//! code_language = "dart"           # Language label on code blocks
//! exclude = [".git", "node_modules", "website", "GETTING_STARTED.md", ".github"]
//! root_exclude = ["README.md"]     # Hidden from the tree at the top level only
//! default_document = "README.md"   # Shown when no path is selected
//! highlight_theme = "InspiredGitHub"
//!
//! [server]
//! interface = "127.0.0.1"
//! port = 7676
//! max_port_retries = 10
//!
//! [quiz]
//! dir = "Quiz"
//!
//! [auth]
//! client_id = ""
//! client_secret = ""
//! callback_url = "http://localhost:7676/auth/github/callback"
//! session_cookie = "lectern_session"
//! session_days = 14
//! # users_file = "users.json"
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```
//!
//! ## Environment Overrides
//!
//! `PORT`, `GITHUB_CLIENT_ID`, `GITHUB_CLIENT_SECRET` and `GITHUB_CALLBACK_URL`
//! override the matching keys after the file is merged, so secrets never need
//! to live in the repository.
//!
//! Unknown keys are rejected to catch typos early.

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site title used in page headers and the fullscreen fallback title.
    pub title: String,
    /// What the content tree contains and how files are classified.
    pub content: ContentConfig,
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Quiz question location.
    pub quiz: QuizConfig,
    /// GitHub login and session settings.
    pub auth: AuthConfig,
    /// Log level and format.
    pub logging: LoggingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Lectern".to_string(),
            content: ContentConfig::default(),
            server: ServerConfig::default(),
            quiz: QuizConfig::default(),
            auth: AuthConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let content = &self.content;
        if content.doc_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "content.doc_extensions must not be empty".into(),
            ));
        }
        if content.code_extensions.is_empty() {
            return Err(ConfigError::Validation(
                "content.code_extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = content
            .doc_extensions
            .iter()
            .find(|ext| content.code_extensions.contains(ext))
        {
            return Err(ConfigError::Validation(format!(
                "extension '{ext}' is listed as both documentation and code"
            )));
        }
        if content.metadata_extension.is_empty()
            || content.code_extensions.contains(&content.metadata_extension)
        {
            return Err(ConfigError::Validation(
                "content.metadata_extension must be non-empty and differ from code extensions"
                    .into(),
            ));
        }
        if content.default_document.trim().is_empty() {
            return Err(ConfigError::Validation(
                "content.default_document must not be empty".into(),
            ));
        }
        if self.server.max_port_retries == 0 {
            return Err(ConfigError::Validation(
                "server.max_port_retries must be at least 1".into(),
            ));
        }
        if self.auth.session_days == 0 {
            return Err(ConfigError::Validation(
                "auth.session_days must be at least 1".into(),
            ));
        }
        if self.auth.session_cookie.is_empty()
            || !self
                .auth
                .session_cookie
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ConfigError::Validation(
                "auth.session_cookie must be a non-empty token of [A-Za-z0-9_-]".into(),
            ));
        }
        Ok(())
    }

    /// Apply environment overrides on top of the merged file config.
    ///
    /// Takes a lookup function rather than reading the process environment
    /// directly so callers (and tests) decide where values come from.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Validation(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(id) = lookup("GITHUB_CLIENT_ID") {
            self.auth.client_id = id;
        }
        if let Some(secret) = lookup("GITHUB_CLIENT_SECRET") {
            self.auth.client_secret = secret;
        }
        if let Some(url) = lookup("GITHUB_CALLBACK_URL") {
            self.auth.callback_url = url;
        }
        Ok(())
    }
}

/// Content tree settings: file classification and the exclusion denylist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// Extensions (without dot) rendered as markdown documentation.
    pub doc_extensions: Vec<String>,
    /// Extensions (without dot) rendered as source code.
    pub code_extensions: Vec<String>,
    /// Extension of the sidecar file next to a code file holding its gist URL.
    pub metadata_extension: String,
    /// Language label put on rendered code blocks.
    pub code_language: String,
    /// Entry names excluded at every level of the tree.
    pub exclude: Vec<String>,
    /// Entry names excluded only directly under the content root.
    pub root_exclude: Vec<String>,
    /// Document rendered when a lookup carries no path.
    pub default_document: String,
    /// syntect theme used for fenced code blocks in markdown.
    pub highlight_theme: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            doc_extensions: vec!["md".to_string()],
            code_extensions: vec!["dart".to_string()],
            metadata_extension: "txt".to_string(),
            code_language: "dart".to_string(),
            exclude: vec![
                ".git".to_string(),
                "node_modules".to_string(),
                "website".to_string(),
                "GETTING_STARTED.md".to_string(),
                ".github".to_string(),
            ],
            root_exclude: vec!["README.md".to_string()],
            default_document: "README.md".to_string(),
            highlight_theme: "InspiredGitHub".to_string(),
        }
    }
}

impl ContentConfig {
    /// Whether an entry named `name` is hidden from the tree.
    pub fn is_excluded(&self, name: &str, at_root: bool) -> bool {
        self.exclude.iter().any(|x| x == name)
            || (at_root && self.root_exclude.iter().any(|x| x == name))
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Interface address to bind.
    pub interface: String,
    /// First port to try.
    pub port: u16,
    /// How many consecutive ports to try when the first is taken.
    pub max_port_retries: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            interface: "127.0.0.1".to_string(),
            port: 7676,
            max_port_retries: 10,
        }
    }
}

/// Quiz settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuizConfig {
    /// Directory (relative to the content root) holding one subdirectory per quiz type.
    pub dir: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            dir: "Quiz".to_string(),
        }
    }
}

/// GitHub OAuth application and session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    /// Name of the session cookie.
    pub session_cookie: String,
    /// Session lifetime in days.
    pub session_days: u32,
    /// JSON file the user registry is persisted to. In-memory only when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users_file: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            callback_url: "http://localhost:7676/auth/github/callback".to_string(),
            session_cookie: "lectern_session".to_string(),
            session_days: 14,
            users_file: None,
        }
    }
}

impl AuthConfig {
    /// GitHub login is available only with both client credentials present.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no `config.toml`.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the content root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Lectern Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Place this file in the root of the
# repository being served. Unknown keys will cause an error.

# Site title shown in the header.
title = "Lectern"

# ---------------------------------------------------------------------------
# Content tree
# ---------------------------------------------------------------------------
[content]
# Extensions rendered as markdown.
doc_extensions = ["md"]

# Extensions rendered as source code.
code_extensions = ["dart"]

# A code file `two_sum.dart` may have a sidecar `two_sum.txt` whose content is
# a gist URL. The last URL segment becomes the embedded gist id.
metadata_extension = "txt"

# Language label put on rendered code blocks.
code_language = "dart"

# Entries hidden at every level of the tree.
exclude = [".git", "node_modules", "website", "GETTING_STARTED.md", ".github"]

# Entries hidden only at the top level (a nested README.md stays visible).
root_exclude = ["README.md"]

# Document shown when no path is selected.
default_document = "README.md"

# syntect theme for fenced code blocks.
highlight_theme = "InspiredGitHub"

# ---------------------------------------------------------------------------
# HTTP server
# ---------------------------------------------------------------------------
[server]
interface = "127.0.0.1"
# Overridden by the PORT environment variable.
port = 7676
# Consecutive ports tried when the first one is taken.
max_port_retries = 10

# ---------------------------------------------------------------------------
# Quizzes
# ---------------------------------------------------------------------------
[quiz]
# One subdirectory per quiz type, each holding *.json question files.
dir = "Quiz"

# ---------------------------------------------------------------------------
# GitHub login
# ---------------------------------------------------------------------------
[auth]
# Overridden by GITHUB_CLIENT_ID / GITHUB_CLIENT_SECRET / GITHUB_CALLBACK_URL.
client_id = ""
client_secret = ""
callback_url = "http://localhost:7676/auth/github/callback"
session_cookie = "lectern_session"
session_days = 14
# Persist known users between restarts.
# users_file = "users.json"

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# RUST_LOG takes precedence when set.
level = "info"
# "text" or "json"
format = "text"
"##
}
