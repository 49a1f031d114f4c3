//! Request builders.
//!
//! # Design
//! Each operation has a `build_*` method on `Session` that validates its
//! inputs against the session, resolves defaults and returns a complete
//! `HttpRequest`. Builders never touch the network, so every precondition
//! failure surfaces before a transport is involved.
//!
//! Defaulted fields resolve in this order: explicit argument, session
//! default, literal default. Empty and whitespace-only strings count as
//! absent.

use serde::Serialize;
use serde_json::Map;

use crate::error::{Result, UmamiError};
use crate::http::{HttpMethod, HttpRequest};
use crate::session::Session;
use crate::types::{EventEnvelope, EventOptions, EventPayload, PageViewOptions, StatsQuery};
use crate::validate::{
    validate_event_fields, validate_login, validate_state, validate_website_id,
};

/// API paths relative to the base URL.
pub mod paths {
    pub const LOGIN: &str = "/api/auth/login";
    pub const VERIFY: &str = "/api/auth/verify";
    pub const WEBSITES: &str = "/api/websites";
    pub const HEARTBEAT: &str = "/api/heartbeat";
    pub const EVENTS: &str = "/api/send";
}

/// Sent on event and page-view calls. The collect endpoint silently drops
/// requests whose agent does not look like a browser.
pub const EVENT_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0";

pub const DEFAULT_SCREEN: &str = "1920x1080";
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_REFERRER: &str = "";
pub const DEFAULT_EVENT_URL: &str = "/";

/// Sent on every call that is not event ingestion.
pub fn library_user_agent() -> String {
    format!(
        "Umami-Client v{} / Rust / {}",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

#[derive(Serialize)]
struct Credentials<'a> {
    username: &'a str,
    password: &'a str,
}

impl Session {
    pub fn build_login(&self, username: &str, password: &str) -> Result<HttpRequest> {
        validate_state(self, true, false)?;
        validate_login(username, password)?;

        let body = to_json(&Credentials { username, password })?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(paths::LOGIN),
            query: Vec::new(),
            headers: with_json_content(self.library_headers(false)),
            body: Some(body),
        })
    }

    pub fn build_websites(&self) -> Result<HttpRequest> {
        validate_state(self, true, true)?;
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(paths::WEBSITES),
            query: Vec::new(),
            headers: self.library_headers(true),
            body: None,
        })
    }

    pub fn build_website_stats(&self, stats: &StatsQuery) -> Result<HttpRequest> {
        validate_state(self, true, true)?;
        let website_id = self.resolve_website_id(stats.website_id.as_deref())?;

        let mut query = vec![
            ("startAt".to_string(), stats.start_at.timestamp_millis().to_string()),
            ("endAt".to_string(), stats.end_at.timestamp_millis().to_string()),
        ];
        query.extend(
            stats
                .filters()
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key.to_string(), v.to_string()))),
        );

        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(&format!("{}/{website_id}/stats", paths::WEBSITES)),
            query,
            headers: self.library_headers(true),
            body: None,
        })
    }

    pub fn build_active_users(&self, website_id: Option<&str>) -> Result<HttpRequest> {
        validate_state(self, true, true)?;
        let website_id = self.resolve_website_id(website_id)?;
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint(&format!("{}/{website_id}/active", paths::WEBSITES)),
            query: Vec::new(),
            headers: self.library_headers(true),
            body: None,
        })
    }

    /// Token verification goes out with the browser agent, like event calls.
    pub fn build_verify_token(&self) -> Result<HttpRequest> {
        validate_state(self, true, true)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(paths::VERIFY),
            query: Vec::new(),
            headers: self.bearer_headers(EVENT_USER_AGENT.to_string()),
            body: None,
        })
    }

    pub fn build_heartbeat(&self) -> Result<HttpRequest> {
        validate_state(self, true, false)?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(paths::HEARTBEAT),
            query: Vec::new(),
            headers: self.library_headers(false),
            body: None,
        })
    }

    /// Builds a custom event. Login is not required; a held token is sent
    /// along anyway.
    pub fn build_event(&self, event_name: &str, options: &EventOptions) -> Result<HttpRequest> {
        validate_state(self, true, false)?;
        let website_id = present(options.website_id.as_deref()).or(self.default_website_id());
        let hostname = present(options.hostname.as_deref()).or(self.default_hostname());
        validate_event_fields(Some(event_name), hostname, website_id)?;

        let payload = EventPayload {
            hostname: hostname.unwrap_or_default().to_string(),
            language: or_literal(&options.language, DEFAULT_LANGUAGE),
            referrer: or_literal(&options.referrer, DEFAULT_REFERRER),
            screen: or_literal(&options.screen, DEFAULT_SCREEN),
            title: or_literal(&options.title, event_name),
            url: or_literal(&options.url, DEFAULT_EVENT_URL),
            website: website_id.unwrap_or_default().to_string(),
            name: Some(event_name.to_string()),
            data: Some(options.custom_data.clone().unwrap_or_else(Map::new)),
            ip: ip_override(options.ip_address.as_deref()),
        };
        self.collect_request(payload, EVENT_USER_AGENT.to_string())
    }

    /// Builds a page view: an event without a name or custom data.
    pub fn build_page_view(
        &self,
        page_title: &str,
        url: &str,
        options: &PageViewOptions,
    ) -> Result<HttpRequest> {
        validate_state(self, true, false)?;
        let website_id = present(options.website_id.as_deref()).or(self.default_website_id());
        let hostname = present(options.hostname.as_deref()).or(self.default_hostname());
        validate_event_fields(None, hostname, website_id)?;

        let payload = EventPayload {
            hostname: hostname.unwrap_or_default().to_string(),
            language: or_literal(&options.language, DEFAULT_LANGUAGE),
            referrer: or_literal(&options.referrer, DEFAULT_REFERRER),
            screen: or_literal(&options.screen, DEFAULT_SCREEN),
            title: page_title.to_string(),
            url: url.to_string(),
            website: website_id.unwrap_or_default().to_string(),
            name: None,
            data: None,
            ip: ip_override(options.ip_address.as_deref()),
        };
        let user_agent = or_literal(&options.user_agent, EVENT_USER_AGENT);
        self.collect_request(payload, user_agent)
    }

    fn collect_request(&self, payload: EventPayload, user_agent: String) -> Result<HttpRequest> {
        let envelope = EventEnvelope {
            payload,
            kind: "event".to_string(),
        };
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint(paths::EVENTS),
            query: Vec::new(),
            headers: with_json_content(self.bearer_headers(user_agent)),
            body: Some(to_json(&envelope)?),
        })
    }

    fn resolve_website_id<'a>(&'a self, explicit: Option<&'a str>) -> Result<&'a str> {
        let website_id = present(explicit).or(self.default_website_id());
        validate_website_id(website_id)?;
        Ok(website_id.unwrap_or_default())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url().unwrap_or_default())
    }

    fn library_headers(&self, authenticated: bool) -> Vec<(String, String)> {
        if authenticated {
            self.bearer_headers(library_user_agent())
        } else {
            vec![("User-Agent".to_string(), library_user_agent())]
        }
    }

    fn bearer_headers(&self, user_agent: String) -> Vec<(String, String)> {
        let mut headers = vec![("User-Agent".to_string(), user_agent)];
        if let Some(token) = self.auth_token() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn or_literal(value: &Option<String>, literal: &str) -> String {
    present(value.as_deref()).unwrap_or(literal).to_string()
}

fn ip_override(ip: Option<&str>) -> Option<String> {
    ip.map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
}

fn with_json_content(mut headers: Vec<(String, String)>) -> Vec<(String, String)> {
    headers.push(("content-type".to_string(), "application/json".to_string()));
    headers
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| UmamiError::Serialization(e.to_string()))
}

/// Parses a request body produced by a builder, for inspection in tests.
#[cfg(test)]
pub(crate) fn body_json(request: &HttpRequest) -> serde_json::Value {
    request
        .body
        .as_deref()
        .map(|b| serde_json::from_str(b).unwrap())
        .unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn configured() -> Session {
        let mut session = Session::new();
        session.set_base_url("http://localhost:3000/").unwrap();
        session
    }

    fn authenticated() -> Session {
        let mut session = configured();
        session.store_token("T".to_string());
        session
    }

    fn with_defaults() -> Session {
        let mut session = configured();
        session.set_default_website_id("W");
        session.set_default_hostname("H");
        session
    }

    #[test]
    fn login_sends_credentials_as_json_object() {
        let req = configured().build_login("admin", "secret").unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/api/auth/login");
        assert_eq!(body_json(&req), json!({"username": "admin", "password": "secret"}));
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert!(req.header("authorization").is_none());
        assert_eq!(req.header("user-agent"), Some(library_user_agent().as_str()));
    }

    #[test]
    fn login_requires_base_url() {
        let err = Session::new().build_login("admin", "secret").unwrap_err();
        assert!(matches!(err, UmamiError::OperationNotAllowed(_)));
    }

    #[test]
    fn library_user_agent_names_client_and_version() {
        let agent = library_user_agent();
        assert!(agent.starts_with(&format!("Umami-Client v{} / Rust", env!("CARGO_PKG_VERSION"))));
    }

    #[test]
    fn authenticated_requests_carry_bearer_token() {
        let req = authenticated().build_websites().unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/api/websites");
        assert_eq!(req.header("authorization"), Some("Bearer T"));
        assert!(req.body.is_none());
    }

    #[test]
    fn authenticated_builders_reject_anonymous_session() {
        let mut session = configured();
        session.set_default_website_id("W");
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let results = [
            session.build_websites(),
            session.build_website_stats(&StatsQuery::new(start, start)),
            session.build_active_users(Some("W")),
            session.build_verify_token(),
        ];
        for result in results {
            assert!(matches!(result, Err(UmamiError::OperationNotAllowed(_))));
        }
    }

    #[test]
    fn stats_converts_dates_to_millis_and_skips_unset_filters() {
        let mut session = authenticated();
        session.set_default_website_id("W");
        let query = StatsQuery {
            url: Some("/pricing".to_string()),
            country: Some("DE".to_string()),
            ..StatsQuery::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            )
        };
        let req = session.build_website_stats(&query).unwrap();

        assert_eq!(req.url, "http://localhost:3000/api/websites/W/stats");
        assert_eq!(req.query_param("startAt"), Some("1704067200000"));
        assert_eq!(req.query_param("endAt"), Some("1704153600000"));
        assert_eq!(req.query_param("url"), Some("/pricing"));
        assert_eq!(req.query_param("country"), Some("DE"));
        let keys: Vec<&str> = req.query.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["startAt", "endAt", "url", "country"]);
    }

    #[test]
    fn stats_explicit_website_overrides_default() {
        let mut session = authenticated();
        session.set_default_website_id("W");
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let query = StatsQuery {
            website_id: Some("other".to_string()),
            ..StatsQuery::new(start, start)
        };
        let req = session.build_website_stats(&query).unwrap();
        assert_eq!(req.url, "http://localhost:3000/api/websites/other/stats");
    }

    #[test]
    fn active_users_needs_a_website_id() {
        let err = authenticated().build_active_users(None).unwrap_err();
        assert!(matches!(err, UmamiError::Validation(_)));

        let mut session = authenticated();
        session.set_default_website_id("W");
        let req = session.build_active_users(None).unwrap();
        assert_eq!(req.url, "http://localhost:3000/api/websites/W/active");
    }

    #[test]
    fn verify_uses_browser_agent() {
        let req = authenticated().build_verify_token().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/api/auth/verify");
        assert_eq!(req.header("user-agent"), Some(EVENT_USER_AGENT));
        assert_eq!(req.header("authorization"), Some("Bearer T"));
    }

    #[test]
    fn heartbeat_needs_only_url() {
        let req = configured().build_heartbeat().unwrap();
        assert_eq!(req.url, "http://localhost:3000/api/heartbeat");
        assert!(req.header("authorization").is_none());
        assert!(Session::new().build_heartbeat().is_err());
    }

    #[test]
    fn event_uses_session_defaults_and_literal_defaults() {
        let req = with_defaults()
            .build_event("Signup", &EventOptions::default())
            .unwrap();
        assert_eq!(req.url, "http://localhost:3000/api/send");
        assert_eq!(req.header("user-agent"), Some(EVENT_USER_AGENT));
        assert!(req.header("authorization").is_none());

        let body = body_json(&req);
        assert_eq!(body["type"], "event");
        assert_eq!(
            body["payload"],
            json!({
                "hostname": "H",
                "language": "en-US",
                "referrer": "",
                "screen": "1920x1080",
                "title": "Signup",
                "url": "/",
                "website": "W",
                "name": "Signup",
                "data": {}
            })
        );
    }

    #[test]
    fn event_explicit_arguments_override_defaults() {
        let mut data = Map::new();
        data.insert("plan".to_string(), json!("pro"));
        let options = EventOptions {
            website_id: Some("W2".to_string()),
            hostname: Some("H2".to_string()),
            title: Some("Purchase".to_string()),
            url: Some("/checkout".to_string()),
            custom_data: Some(data),
            screen: Some("390x844".to_string()),
            ..EventOptions::default()
        };
        let body = body_json(&with_defaults().build_event("Purchase-Course", &options).unwrap());
        let payload = &body["payload"];
        assert_eq!(payload["website"], "W2");
        assert_eq!(payload["hostname"], "H2");
        assert_eq!(payload["title"], "Purchase");
        assert_eq!(payload["url"], "/checkout");
        assert_eq!(payload["screen"], "390x844");
        assert_eq!(payload["data"]["plan"], "pro");
    }

    #[test]
    fn blank_arguments_fall_back_to_defaults() {
        let options = EventOptions {
            website_id: Some("  ".to_string()),
            hostname: Some(" ".to_string()),
            title: Some("\t".to_string()),
            ..EventOptions::default()
        };
        let body = body_json(&with_defaults().build_event("Signup", &options).unwrap());
        let payload = &body["payload"];
        assert_eq!(payload["website"], "W");
        assert_eq!(payload["hostname"], "H");
        assert_eq!(payload["title"], "Signup");

        let mut session = authenticated();
        session.set_default_website_id("W");
        let req = session.build_active_users(Some(" ")).unwrap();
        assert!(req.url.ends_with("/api/websites/W/active"));
    }

    #[test]
    fn event_includes_ip_only_when_non_blank() {
        let session = with_defaults();
        let blank = EventOptions {
            ip_address: Some("  ".to_string()),
            ..EventOptions::default()
        };
        let body = body_json(&session.build_event("e", &blank).unwrap());
        assert!(body["payload"].get("ip").is_none());

        let real = EventOptions {
            ip_address: Some("127.100.200.1".to_string()),
            ..EventOptions::default()
        };
        let body = body_json(&session.build_event("e", &real).unwrap());
        assert_eq!(body["payload"]["ip"], "127.100.200.1");
    }

    #[test]
    fn event_sends_token_when_held() {
        let mut session = authenticated();
        session.set_default_website_id("W");
        session.set_default_hostname("H");
        let req = session.build_event("e", &EventOptions::default()).unwrap();
        assert_eq!(req.header("authorization"), Some("Bearer T"));
    }

    #[test]
    fn event_validation_failures() {
        let err = configured().build_event("e", &EventOptions::default()).unwrap_err();
        assert!(matches!(err, UmamiError::Validation(msg) if msg.contains("hostname")));

        let err = with_defaults().build_event(" ", &EventOptions::default()).unwrap_err();
        assert!(matches!(err, UmamiError::Validation(msg) if msg.contains("event_name")));

        let err = Session::new().build_event("e", &EventOptions::default()).unwrap_err();
        assert!(matches!(err, UmamiError::OperationNotAllowed(_)));
    }

    #[test]
    fn page_view_has_no_name_or_data() {
        let req = with_defaults()
            .build_page_view("Account Details", "/account/details", &PageViewOptions::default())
            .unwrap();
        let payload = &body_json(&req)["payload"];
        assert_eq!(payload["title"], "Account Details");
        assert_eq!(payload["url"], "/account/details");
        assert_eq!(payload["website"], "W");
        assert!(payload.get("name").is_none());
        assert!(payload.get("data").is_none());
        assert_eq!(req.header("user-agent"), Some(EVENT_USER_AGENT));
    }

    #[test]
    fn page_view_user_agent_can_be_overridden() {
        let options = PageViewOptions {
            user_agent: Some("Mozilla/5.0 (iPhone)".to_string()),
            ..PageViewOptions::default()
        };
        let req = with_defaults().build_page_view("Home", "/", &options).unwrap();
        assert_eq!(req.header("user-agent"), Some("Mozilla/5.0 (iPhone)"));
    }

    #[test]
    fn page_view_requires_website() {
        let mut session = configured();
        session.set_default_hostname("H");
        let err = session
            .build_page_view("Home", "/", &PageViewOptions::default())
            .unwrap_err();
        assert!(matches!(err, UmamiError::Validation(msg) if msg.contains("website_id")));
    }
}
