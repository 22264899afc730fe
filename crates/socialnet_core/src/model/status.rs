//! Status message record owned by a user.

use super::{require_max_chars, require_non_empty, ModelValidationError};
use serde::{Deserialize, Serialize};

pub const STATUS_TEXT_MAX_CHARS: usize = 1000;

/// One status message. `owner_user_id` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub status_id: String,
    #[serde(rename = "user_id")]
    pub owner_user_id: String,
    pub status_text: String,
}

impl Status {
    pub fn new(
        status_id: impl Into<String>,
        owner_user_id: impl Into<String>,
        status_text: impl Into<String>,
    ) -> Self {
        Self {
            status_id: status_id.into(),
            owner_user_id: owner_user_id.into(),
            status_text: status_text.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        require_non_empty("status_id", &self.status_id)?;
        require_non_empty("user_id", &self.owner_user_id)?;
        require_max_chars("status_text", &self.status_text, STATUS_TEXT_MAX_CHARS)?;
        Ok(())
    }
}
