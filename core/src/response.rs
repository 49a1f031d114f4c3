//! Response mappers: status classification and JSON decoding.
//!
//! Every `parse_*` function first maps a non-2xx status to
//! `UmamiError::Http`, then decodes the body into its typed record.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, UmamiError};
use crate::http::HttpResponse;
use crate::types::{
    ActiveUsers, LoginResponse, TokenStatus, TokenVerification, WebsiteStats, WebsitesResponse,
};

/// Map a non-2xx status to `UmamiError::Http`.
pub fn check_success(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        return Ok(());
    }
    log::warn!(target: "umami", "server answered HTTP {}", response.status);
    Err(UmamiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    check_success(response)?;
    serde_json::from_str(&response.body).map_err(|e| UmamiError::Deserialization(e.to_string()))
}

pub fn parse_login(response: &HttpResponse) -> Result<LoginResponse> {
    decode(response)
}

pub fn parse_websites(response: &HttpResponse) -> Result<WebsitesResponse> {
    decode(response)
}

pub fn parse_website_stats(response: &HttpResponse) -> Result<WebsiteStats> {
    decode(response)
}

pub fn parse_active_users(response: &HttpResponse) -> Result<u64> {
    decode::<ActiveUsers>(response).map(|active| active.x)
}

/// The collect endpoint answers with an opaque session token that this
/// client has no use for; only the status matters.
pub fn parse_send(response: &HttpResponse) -> Result<()> {
    check_success(response)
}

pub fn parse_heartbeat(response: &HttpResponse) -> bool {
    response.is_success()
}

pub fn parse_token_status(response: &HttpResponse) -> TokenStatus {
    if !response.is_success() {
        return TokenStatus::Rejected {
            status: response.status,
        };
    }
    let mut fields = match serde_json::from_str::<Value>(&response.body) {
        Ok(Value::Object(fields)) => fields,
        Ok(_) => return TokenStatus::Malformed("expected a JSON object".to_string()),
        Err(e) => return TokenStatus::Malformed(e.to_string()),
    };
    match fields.remove("username") {
        Some(username) => TokenStatus::Valid(TokenVerification {
            username: match username {
                Value::String(name) => name,
                other => other.to_string(),
            },
            fields,
        }),
        None => TokenStatus::Malformed("response has no username".to_string()),
    }
}
