//! Doctor accounts.
//!
//! Credentials are stored and compared in plaintext; the lab runs this as a
//! closed prototype and the owner hands passwords out in person.

use serde::{Deserialize, Serialize};

use dentlab_core::{DomainError, DomainResult, Entity, UserId};

/// A doctor account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    /// Unique, compared case-insensitively. Cases reference this name.
    pub name: String,
    pub password: String,
    pub welcome_message: String,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub password: String,
    #[serde(default)]
    pub welcome_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub welcome_message: Option<String>,
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().chars().count() < 2 {
        return Err(DomainError::validation(
            "user name must be at least 2 characters",
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> DomainResult<()> {
    if password.is_empty() {
        return Err(DomainError::validation("password is required"));
    }
    Ok(())
}

impl User {
    /// Build a new account. The welcome message defaults to `Welcome, <name>`.
    pub fn create(id: UserId, new_user: NewUser) -> DomainResult<Self> {
        validate_name(&new_user.name)?;
        validate_password(&new_user.password)?;

        let name = new_user.name.trim().to_string();
        let welcome_message = new_user
            .welcome_message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Welcome, {name}"));

        Ok(Self {
            id,
            name,
            password: new_user.password,
            welcome_message,
        })
    }

    /// Apply an edit. Name uniqueness is checked by the caller against the
    /// other accounts (see [`ensure_unique_name`]).
    pub fn apply_patch(&mut self, patch: UserPatch) -> DomainResult<()> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(password) = &patch.password {
            validate_password(password)?;
        }

        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(message) = patch.welcome_message {
            self.welcome_message = message.trim().to_string();
        }
        Ok(())
    }

    /// Case-insensitive name and exact password.
    pub fn matches_credentials(&self, name: &str, password: &str) -> bool {
        names_match(&self.name, name) && self.password == password
    }
}

/// Case-insensitive name comparison, ignoring surrounding whitespace.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Reject `name` if another account (other than `except`) already uses it,
/// ignoring case.
pub fn ensure_unique_name<'a, I>(users: I, name: &str, except: Option<UserId>) -> DomainResult<()>
where
    I: IntoIterator<Item = &'a User>,
{
    let taken = users
        .into_iter()
        .filter(|u| Some(u.id) != except)
        .any(|u| names_match(&u.name, name));
    if taken {
        return Err(DomainError::conflict(match except {
            Some(_) => "this username is already taken",
            None => "a user with this name already exists",
        }));
    }
    Ok(())
}

pub fn find_by_credentials<'a, I>(users: I, name: &str, password: &str) -> Option<&'a User>
where
    I: IntoIterator<Item = &'a User>,
{
    users
        .into_iter()
        .find(|u| u.matches_credentials(name, password))
}
