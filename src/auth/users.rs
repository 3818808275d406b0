//! Registry of users who have signed in.
//!
//! Keyed by the provider's numeric id. Optionally persisted as a JSON array
//! so accounts survive restarts; the whole file is rewritten on every change.

use super::{AuthError, Profile};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub github_id: u64,
    pub username: String,
    pub avatar: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct UserRegistry {
    users: RwLock<BTreeMap<u64, User>>,
    file: Option<PathBuf>,
}

impl UserRegistry {
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Registry persisted at `path`, loading existing users if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        let users = match fs::read_to_string(&path) {
            Ok(text) => {
                let list: Vec<User> =
                    serde_json::from_str(&text).map_err(|e| registry_error(&path, e))?;
                list.into_iter().map(|u| (u.github_id, u)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(registry_error(&path, e)),
        };
        debug!(file = %path.display(), users = users.len(), "opened user registry");
        Ok(Self {
            users: RwLock::new(users),
            file: Some(path),
        })
    }

    /// Record a sign-in. Known users get their last login refreshed; new
    /// users are created from the profile.
    pub fn upsert(&self, profile: Profile) -> Result<User, AuthError> {
        self.upsert_at(profile, Utc::now())
    }

    /// The change is rolled back when the registry file can't be written.
    fn upsert_at(&self, profile: Profile, now: DateTime<Utc>) -> Result<User, AuthError> {
        let mut users = self.users.write();
        let user = match users.get(&profile.id) {
            Some(existing) => User {
                last_login: now,
                ..existing.clone()
            },
            None => User {
                github_id: profile.id,
                username: profile.username,
                avatar: profile.avatar,
                email: profile.email,
                created_at: now,
                last_login: now,
            },
        };
        let previous = users.insert(user.github_id, user.clone());
        if let Err(err) = self.persist(&users) {
            match previous {
                Some(previous) => users.insert(previous.github_id, previous),
                None => users.remove(&user.github_id),
            };
            return Err(err);
        }
        Ok(user)
    }

    pub fn get(&self, id: u64) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(&self, users: &BTreeMap<u64, User>) -> Result<(), AuthError> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        let list: Vec<&User> = users.values().collect();
        let json = serde_json::to_string_pretty(&list).map_err(|e| registry_error(path, e))?;
        fs::write(path, json).map_err(|e| registry_error(path, e))
    }
}

fn registry_error(path: &Path, err: impl std::fmt::Display) -> AuthError {
    AuthError::Registry {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
