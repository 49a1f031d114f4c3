//! Mutable session context owned by a client instance.
//!
//! Holds the base URL, the bearer token from the last successful login, the
//! default website id and hostname, and the tracking switch. The token can
//! only be set from inside the crate, after a login response was parsed.

use crate::error::{Result, UmamiError};

/// Coarse state of a session, derived from which fields are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No base URL.
    Unconfigured,
    /// Base URL set, no token.
    Configured,
    /// Base URL set and a token held.
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    base_url: Option<String>,
    auth_token: Option<String>,
    default_website_id: Option<String>,
    default_hostname: Option<String>,
    tracking_enabled: bool,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            base_url: None,
            auth_token: None,
            default_website_id: None,
            default_hostname: None,
            tracking_enabled: true,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the instance location, e.g. `https://analytics.example.com`,
    /// without the `/api` suffix.
    ///
    /// Surrounding whitespace and one trailing slash are removed.
    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(UmamiError::Validation("URL must not be empty.".to_string()));
        }
        let Some(rest) = trimmed
            .strip_prefix("http://")
            .or_else(|| trimmed.strip_prefix("https://"))
        else {
            return Err(UmamiError::Validation(
                "The url must start with the HTTP scheme (http:// or https://).".to_string(),
            ));
        };
        if rest.trim_end_matches('/').is_empty() {
            return Err(UmamiError::Validation(
                "The url must name a host after the scheme.".to_string(),
            ));
        }
        let normalized = trimmed.strip_suffix('/').unwrap_or(trimmed);
        self.base_url = Some(normalized.to_string());
        Ok(())
    }

    pub fn set_default_website_id(&mut self, website_id: &str) {
        self.default_website_id = Some(website_id.to_string());
    }

    pub fn set_default_hostname(&mut self, hostname: &str) {
        self.default_hostname = Some(hostname.to_string());
    }

    pub fn enable_tracking(&mut self) {
        self.tracking_enabled = true;
    }

    pub fn disable_tracking(&mut self) {
        self.tracking_enabled = false;
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth_token.is_some()
    }

    pub fn state(&self) -> SessionState {
        match (&self.base_url, &self.auth_token) {
            (None, _) => SessionState::Unconfigured,
            (Some(_), None) => SessionState::Configured,
            (Some(_), Some(_)) => SessionState::Authenticated,
        }
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn default_website_id(&self) -> Option<&str> {
        self.default_website_id.as_deref()
    }

    pub fn default_hostname(&self) -> Option<&str> {
        self.default_hostname.as_deref()
    }

    pub fn tracking_enabled(&self) -> bool {
        self.tracking_enabled
    }

    pub(crate) fn store_token(&mut self, token: String) {
        self.auth_token = Some(token);
    }
}
