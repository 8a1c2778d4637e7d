//! User registration use-case service.
//!
//! # Invariants
//! - Registration requires `first_name` and `last_name`.
//! - Registration is refused while `AppSettings::registration_open` is false.

use crate::model::user::{NewUser, User, UserId, UserValidationError};
use crate::repo::settings_repo::SettingsRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum UserServiceError {
    Invalid(UserValidationError),
    RegistrationClosed,
    UsernameTaken(String),
    NotFound(String),
    Repo(RepoError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(err) => write!(f, "{err}"),
            Self::RegistrationClosed => write!(f, "registration is closed"),
            Self::UsernameTaken(name) => {
                write!(f, "a user with that username already exists: {name}")
            }
            Self::NotFound(name) => write!(f, "user not found: {name}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for UserServiceError {
    fn from(value: UserValidationError) -> Self {
        Self::Invalid(value)
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateUsername(name) => Self::UsernameTaken(name),
            other => Self::Repo(other),
        }
    }
}

/// User directory facade.
pub struct UserService<U: UserRepository, S: SettingsRepository> {
    users: U,
    settings: S,
}

impl<U: UserRepository, S: SettingsRepository> UserService<U, S> {
    pub fn new(users: U, settings: S) -> Self {
        Self { users, settings }
    }

    /// Registers one user profile.
    pub fn register(&self, input: &NewUser) -> Result<User, UserServiceError> {
        if !self.settings.load()?.registration_open {
            return Err(UserServiceError::RegistrationClosed);
        }
        let normalized = input.normalized()?;
        let user = self.users.create_user(&normalized)?;
        info!(
            "event=user_register module=user status=ok user={}",
            user.id
        );
        Ok(user)
    }

    pub fn get(&self, id: UserId) -> Result<User, UserServiceError> {
        self.users
            .get_user(id)?
            .ok_or_else(|| UserServiceError::NotFound(id.to_string()))
    }

    /// Loads one user by username.
    pub fn get_by_username(&self, username: &str) -> Result<User, UserServiceError> {
        self.users
            .get_by_username(username)?
            .ok_or_else(|| UserServiceError::NotFound(username.to_string()))
    }
}
