//! Precondition checks run before any request is built.
//!
//! None of these touch the network; they only look at their arguments and
//! the current `Session`.

use crate::error::{Result, UmamiError};
use crate::session::Session;

/// Fails with `OperationNotAllowed` when the session lacks the base URL or
/// token the operation needs. The URL is checked first.
pub fn validate_state(session: &Session, require_url: bool, require_auth: bool) -> Result<()> {
    if require_url && session.base_url().is_none() {
        return Err(UmamiError::OperationNotAllowed(
            "URL Base must be set to proceed.".to_string(),
        ));
    }
    if require_auth && !session.is_logged_in() {
        return Err(UmamiError::OperationNotAllowed(
            "You must login before proceeding.".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_login(username: &str, password: &str) -> Result<()> {
    if username.is_empty() {
        return Err(UmamiError::Validation("Username cannot be empty.".to_string()));
    }
    if password.is_empty() {
        return Err(UmamiError::Validation("Password cannot be empty.".to_string()));
    }
    Ok(())
}

/// Checks the resolved fields of an event or page view.
///
/// `event_name` is `None` for page views, which have no name to check.
pub fn validate_event_fields(
    event_name: Option<&str>,
    hostname: Option<&str>,
    website_id: Option<&str>,
) -> Result<()> {
    if is_blank(hostname) {
        return Err(UmamiError::Validation(
            "The hostname must be set, either as a parameter or via set_default_hostname()."
                .to_string(),
        ));
    }
    if is_blank(website_id) {
        return Err(UmamiError::Validation(
            "The website_id must be set, either as a parameter or via set_default_website_id()."
                .to_string(),
        ));
    }
    if let Some(name) = event_name {
        if name.trim().is_empty() {
            return Err(UmamiError::Validation("The event_name is required.".to_string()));
        }
    }
    Ok(())
}

/// Stats and active-user lookups need a website id from the argument or the
/// session default.
pub fn validate_website_id(website_id: Option<&str>) -> Result<()> {
    if is_blank(website_id) {
        return Err(UmamiError::Validation(
            "The website_id must be set, either as a parameter or via set_default_website_id()."
                .to_string(),
        ));
    }
    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}
