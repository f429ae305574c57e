use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::{FormError, FormOptions};
use crate::picker::DEFAULT_ACCEPT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid registration config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid field pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid registration config: {0}")]
    Invalid(&'static str),
    #[error("form store rejected the registration schema: {0}")]
    Store(#[from] FormError),
}

/// Tunables of the registration form. Every key is optional in TOML.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    pub username_max_len: usize,
    pub password_max_len: usize,
    pub mobile_digits: usize,
    pub genders: Vec<String>,
    pub districts: Vec<String>,
    pub accept: Vec<String>,
    pub success_message: String,
    pub notice_auto_hide_ms: u64,
    pub form: FormOptions,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            username_max_len: 10,
            password_max_len: 6,
            mobile_digits: 10,
            genders: ["male", "female", "other"].map(String::from).to_vec(),
            districts: ["coimbatore", "salem", "erode"].map(String::from).to_vec(),
            accept: DEFAULT_ACCEPT.map(String::from).to_vec(),
            success_message: "Form submitted successfully".to_string(),
            notice_auto_hide_ms: 6_000,
            form: FormOptions::default(),
        }
    }
}

impl RegistrationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        if self.genders.is_empty() {
            return Err(ConfigError::Invalid("at least one gender option is required"));
        }
        if self.districts.is_empty() {
            return Err(ConfigError::Invalid("at least one district is required"));
        }
        if self.districts.iter().chain(&self.genders).any(String::is_empty) {
            return Err(ConfigError::Invalid(
                "empty option values are reserved for \"not selected\"",
            ));
        }
        if self.mobile_digits == 0 {
            return Err(ConfigError::Invalid("mobile_digits must be positive"));
        }
        Ok(())
    }

    pub fn notice_auto_hide(&self) -> Duration {
        Duration::from_millis(self.notice_auto_hide_ms)
    }
}
