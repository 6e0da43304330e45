//! Backend connection configuration.

use crate::error::BackendError;

/// Connection settings for the hosted API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Base URL of the hosted project, without a trailing slash.
    pub base_url: String,
    /// The publishable (anonymous) API key.
    pub anon_key: String,
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            anon_key: anon_key.into(),
        }
    }

    /// Read `BOMBEIRO_API_URL` and `BOMBEIRO_API_KEY` from the environment.
    pub fn from_env() -> Result<Self, BackendError> {
        let base_url = std::env::var("BOMBEIRO_API_URL")
            .map_err(|_| BackendError::Network("BOMBEIRO_API_URL is not set".to_string()))?;
        let anon_key = std::env::var("BOMBEIRO_API_KEY")
            .map_err(|_| BackendError::Network("BOMBEIRO_API_KEY is not set".to_string()))?;
        Ok(Self::new(base_url, anon_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_slash() {
        let cfg = BackendConfig::new("https://project.example.co/", "anon");
        assert_eq!(cfg.base_url, "https://project.example.co");
    }
}
