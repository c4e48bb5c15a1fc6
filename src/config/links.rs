use crate::services::short_code::{MAX_CODE_LENGTH, MIN_CODE_LENGTH};
use serde::Deserialize;

/// Link allocation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LinksConfig {
    /// Length of randomly generated short codes
    pub short_code_length: usize,

    /// Attempts per code length before the allocator grows the length
    pub short_code_max_attempts: u32,

    /// Public base URL for short links. Derived from the listen address when unset.
    pub base_url: Option<String>,

    /// Whether only http:// and https:// targets are accepted
    pub strict_url_validation: bool,
}

impl LinksConfig {
    /// Validate link configuration values
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&self.short_code_length) {
            return Err(format!(
                "SHORT_CODE_LENGTH must be between {} and {}",
                MIN_CODE_LENGTH, MAX_CODE_LENGTH
            ));
        }

        if self.short_code_max_attempts < 1 || self.short_code_max_attempts > 100 {
            return Err("SHORT_CODE_MAX_ATTEMPTS must be between 1 and 100".to_string());
        }

        if let Some(base_url) = &self.base_url {
            url::Url::parse(base_url).map_err(|e| format!("Invalid BASE_URL: {}", e))?;
        }

        Ok(())
    }
}
