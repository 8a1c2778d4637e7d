//! User directory model.
//!
//! Credentials are not modeled here; authentication is owned by an external
//! provider and core only keeps profile rows that follows can point at.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type UserId = Uuid;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]{1,150}$").expect("valid username regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Persisted user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Epoch ms registration timestamp.
    pub date_joined: i64,
}

impl Display for User {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl NewUser {
    /// Returns a trimmed copy or the first violated invariant.
    pub fn normalized(&self) -> Result<Self, UserValidationError> {
        let username = self.username.trim();
        if !USERNAME_RE.is_match(username) {
            return Err(UserValidationError::InvalidUsername(self.username.clone()));
        }
        let email = self.email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(UserValidationError::InvalidEmail(self.email.clone()));
        }
        let first_name = required(&self.first_name, "first_name")?;
        let last_name = required(&self.last_name, "last_name")?;
        Ok(Self {
            username: username.to_string(),
            email: email.to_string(),
            first_name,
            last_name,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, UserValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UserValidationError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidUsername(String),
    InvalidEmail(String),
    MissingField(&'static str),
}

impl Display for UserValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername(value) => write!(
                f,
                "username `{value}` must be 1-150 letters, digits or @/./+/-/_"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::MissingField(field) => write!(f, "`{field}` is required"),
        }
    }
}

impl Error for UserValidationError {}
