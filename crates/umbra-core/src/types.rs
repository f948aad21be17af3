//! Shared types used across the Umbra application.
//!
//! This module defines common newtypes that provide type safety and clear
//! domain modeling for handles and platform identifiers.

use crate::error::UmbraError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for the username (or email local part) being searched.
///
/// Handles must be 1-64 characters of letters, digits, dots, underscores,
/// or hyphens. Validation happens at construction, so every `Handle` held
/// by the scanner is known to be probe-safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Handle(String);

impl Handle {
    /// Create a new `Handle` from a string.
    ///
    /// # Errors
    /// Returns error if the handle is empty, too long, or contains
    /// characters outside `[A-Za-z0-9._-]`.
    pub fn new(handle: impl Into<String>) -> Result<Self, UmbraError> {
        let handle = handle.into();
        Self::validate(&handle)?;
        Ok(Self(handle))
    }

    /// Derive a `Handle` from an email address.
    ///
    /// Takes the local part before the first `@` and applies normal handle
    /// validation to it.
    ///
    /// # Errors
    /// Returns error if the address has no local part or the derived handle
    /// is invalid.
    pub fn from_email(email: &str) -> Result<Self, UmbraError> {
        let local = email.split('@').next().unwrap_or_default();
        if local.is_empty() {
            return Err(UmbraError::Validation(format!(
                "cannot derive handle from email '{email}': empty local part"
            )));
        }
        Self::new(local)
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate handle format: `[A-Za-z0-9._-]`, 1-64 chars.
    fn validate(handle: &str) -> Result<(), UmbraError> {
        static HANDLE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = HANDLE_REGEX
            .get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]{1,64}$").expect("valid regex"));

        if regex.is_match(handle) {
            Ok(())
        } else {
            Err(UmbraError::Validation(format!(
                "invalid handle: must be 1-64 characters of letters, digits, '.', '_' or '-', got '{handle}'"
            )))
        }
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for platform identifiers with validation.
///
/// Platform IDs must be lowercase alphanumeric with hyphens, 2-50 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformId(String);

impl PlatformId {
    /// Create a new `PlatformId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self, UmbraError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate platform ID format: lowercase alphanumeric with hyphens, 2-50 chars.
    fn validate(id: &str) -> Result<(), UmbraError> {
        static PLATFORM_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = PLATFORM_REGEX
            .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,48}[a-z0-9]$").expect("valid regex"));

        if id.len() < 2 || id.len() > 50 {
            return Err(UmbraError::Validation(format!(
                "invalid platform ID: must be 2-50 characters, got {} characters",
                id.len()
            )));
        }

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(UmbraError::Validation(format!(
                "invalid platform ID: must be lowercase alphanumeric with hyphens, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
