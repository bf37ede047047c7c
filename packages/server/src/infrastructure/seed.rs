//! Seed data loader.
//!
//! Reads users and their bearer tokens from a JSON file:
//!
//! ```json
//! {"users": [{"id": "u1", "name": "Aiko", "token": "aiko-token"}]}
//! ```

use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{UserId, UserProfile, ValueObjectError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid user id in seed file: {0}")]
    InvalidUser(#[from] ValueObjectError),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedUser {
    id: String,
    name: String,
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    banned: bool,
    #[serde(default)]
    ban_reason: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    users: Vec<SeedUser>,
}

/// Users and token table loaded from a seed file
#[derive(Debug, Default)]
pub struct Seed {
    pub users: Vec<UserProfile>,
    pub tokens: HashMap<String, UserId>,
}

impl Seed {
    pub fn from_json(json: &str) -> Result<Self, SeedError> {
        let file: SeedFile = serde_json::from_str(json)?;
        let mut seed = Seed::default();
        for entry in file.users {
            let id = UserId::new(entry.id)?;
            if let Some(token) = entry.token {
                seed.tokens.insert(token, id.clone());
            }
            seed.users.push(UserProfile {
                id,
                name: entry.name,
                avatar: entry.avatar,
                banned: entry.banned,
                ban_reason: entry.ban_reason,
            });
        }
        Ok(seed)
    }

    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}
