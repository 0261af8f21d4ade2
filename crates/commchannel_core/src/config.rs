//! Externally supplied validation constants.
//!
//! # Responsibility
//! - Carry the email pattern and field length bounds the channel actions
//!   enforce before persistence.
//!
//! # Invariants
//! - Defaults match the column lengths and email pattern of the original
//!   schema; hosts may override them via deserialized configuration.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default email pattern: one `@`, no spaces, a dot in the host part.
pub const DEFAULT_EMAIL_REGEX: &str = "^[^@ ]*@[^@ ]*\\.[^@ ]*$";

const DEFAULT_MAX_EMAIL_LEN: usize = 254;
const DEFAULT_MAX_PURPOSE_LEN: usize = 254;
const DEFAULT_MAX_DESCRIPTION_LEN: usize = 254;
const DEFAULT_MAX_NUMBER_LEN: usize = 40;
const DEFAULT_MAX_ADDRESS_FIELD_LEN: usize = 254;

/// Validation constants consumed by [`crate::service::channel_actions::ChannelActions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Pattern an email address must match.
    pub email_regex: String,
    /// Maximum email address length.
    pub max_email_len: usize,
    /// Maximum purpose length.
    pub max_purpose_len: usize,
    /// Maximum description length.
    pub max_description_len: usize,
    /// Maximum phone/fax number length.
    pub max_number_len: usize,
    /// Maximum length of each postal address field.
    pub max_address_field_len: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            email_regex: DEFAULT_EMAIL_REGEX.to_string(),
            max_email_len: DEFAULT_MAX_EMAIL_LEN,
            max_purpose_len: DEFAULT_MAX_PURPOSE_LEN,
            max_description_len: DEFAULT_MAX_DESCRIPTION_LEN,
            max_number_len: DEFAULT_MAX_NUMBER_LEN,
            max_address_field_len: DEFAULT_MAX_ADDRESS_FIELD_LEN,
        }
    }
}

impl ChannelConfig {
    /// Compiles the configured email pattern.
    ///
    /// # Errors
    /// Returns the regex error when the configured pattern is invalid, so a
    /// broken host configuration surfaces at service construction rather
    /// than on first use.
    pub fn compile_email_regex(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.email_regex)
    }
}
