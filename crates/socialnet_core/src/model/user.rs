//! User account record.

use super::{require_max_chars, require_non_empty, ModelValidationError};
use serde::{Deserialize, Serialize};

pub const USER_ID_MAX_CHARS: usize = 30;
pub const EMAIL_MAX_CHARS: usize = 1000;
pub const FIRST_NAME_MAX_CHARS: usize = 30;
pub const LAST_NAME_MAX_CHARS: usize = 100;

/// One user account. Serialized with the storage column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Primary key; never changes once stored.
    pub user_id: String,
    #[serde(rename = "user_email")]
    pub email: String,
    #[serde(rename = "user_name")]
    pub first_name: String,
    #[serde(rename = "user_last_name")]
    pub last_name: String,
}

impl User {
    pub fn new(
        user_id: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Checks key presence and column length limits.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty("user_id", &self.user_id)?;
        require_max_chars("user_id", &self.user_id, USER_ID_MAX_CHARS)?;
        require_max_chars("email", &self.email, EMAIL_MAX_CHARS)?;
        require_max_chars("first_name", &self.first_name, FIRST_NAME_MAX_CHARS)?;
        require_max_chars("last_name", &self.last_name, LAST_NAME_MAX_CHARS)?;
        Ok(())
    }
}
