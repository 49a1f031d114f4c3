//! Wire records and per-operation option structs.
//!
//! # Design
//! Response records mirror the Umami JSON schema with camelCase wire names
//! mapped onto snake_case fields. Optional fields decode to `None` when the
//! server omits them. Server timestamps stay strings, since their format
//! differs between Umami versions and databases. These types are defined independently from the
//! mock-server crate; the integration tests catch schema drift.
//!
//! The option structs replace keyword-style parameter lists: every field is
//! optional and falls back first to the session default (where one exists)
//! and then to the literal defaults in `request.rs`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An Umami user account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub role: String,
    pub created_at: String,
    pub is_admin: bool,
}

/// Body of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// Body of `/api/auth/verify`. Only `username` is guaranteed; its presence
/// is what makes a verification successful. Everything else the server
/// sends is kept untyped in `fields`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenVerification {
    pub username: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebsiteTeam {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebsiteUser {
    pub id: String,
    pub username: String,
}

/// Link between a website and a team that shares it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeamWebsite {
    pub id: String,
    pub team_id: String,
    pub website_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub team: WebsiteTeam,
}

/// A website registered in Umami.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub domain: String,
    #[serde(default)]
    pub share_id: Option<Value>,
    #[serde(default)]
    pub reset_at: Option<Value>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub team_website: Vec<TeamWebsite>,
    #[serde(default)]
    pub user: Option<WebsiteUser>,
}

/// One page of the website listing. The wire field `data` holds the sites.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebsitesResponse {
    #[serde(rename = "data")]
    pub websites: Vec<Website>,
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    #[serde(default)]
    pub order_by: Option<String>,
}

/// A metric for the requested period and the period before it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Metric {
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub prev: i64,
}

/// Summary statistics for one website. Metrics the server leaves out
/// decode as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WebsiteStats {
    pub pageviews: Metric,
    pub visitors: Metric,
    pub visits: Metric,
    pub bounces: Metric,
    pub totaltime: Metric,
}

/// Body of `/api/websites/{id}/active`. Newer servers name the count
/// `visitors`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActiveUsers {
    #[serde(default, alias = "visitors")]
    pub x: u64,
}

/// The `payload` object sent to the collect endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventPayload {
    pub hostname: String,
    pub language: String,
    pub referrer: String,
    pub screen: String,
    pub title: String,
    pub url: String,
    pub website: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
}

/// Envelope around an `EventPayload`; `type` is always `"event"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventEnvelope {
    pub payload: EventPayload,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Optional arguments for a custom event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventOptions {
    /// Overrides the session's default hostname.
    pub hostname: Option<String>,
    /// Simulated page URL. Defaults to `/`.
    pub url: Option<String>,
    /// Overrides the session's default website id.
    pub website_id: Option<String>,
    /// Defaults to the event name.
    pub title: Option<String>,
    /// Extra properties attached to the event. Defaults to `{}`.
    pub custom_data: Option<Map<String, Value>>,
    pub referrer: Option<String>,
    pub language: Option<String>,
    pub screen: Option<String>,
    /// The real client IP when events are sent on a visitor's behalf.
    pub ip_address: Option<String>,
}

/// Optional arguments for a page view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageViewOptions {
    pub hostname: Option<String>,
    pub website_id: Option<String>,
    pub referrer: Option<String>,
    pub language: Option<String>,
    pub screen: Option<String>,
    /// Replaces the browser user agent. Umami drops non-browser agents.
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Parameters of a website statistics query.
///
/// Filters left as `None` are not sent at all.
///
/// ```
/// # use chrono::{TimeZone, Utc};
/// # use umami_client::StatsQuery;
/// let query = StatsQuery {
///     url: Some("/pricing".to_string()),
///     ..StatsQuery::new(
///         Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///         Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
///     )
/// };
/// assert!(query.country.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsQuery {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub website_id: Option<String>,
    pub url: Option<String>,
    pub referrer: Option<String>,
    pub title: Option<String>,
    pub query: Option<String>,
    pub event: Option<String>,
    pub host: Option<String>,
    pub os: Option<String>,
    pub browser: Option<String>,
    pub device: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

impl StatsQuery {
    pub fn new(start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> Self {
        StatsQuery {
            start_at,
            end_at,
            website_id: None,
            url: None,
            referrer: None,
            title: None,
            query: None,
            event: None,
            host: None,
            os: None,
            browser: None,
            device: None,
            country: None,
            region: None,
            city: None,
        }
    }

    /// The filters in wire order, paired with their query parameter names.
    pub(crate) fn filters(&self) -> [(&'static str, Option<&str>); 12] {
        [
            ("url", self.url.as_deref()),
            ("referrer", self.referrer.as_deref()),
            ("title", self.title.as_deref()),
            ("query", self.query.as_deref()),
            ("event", self.event.as_deref()),
            ("host", self.host.as_deref()),
            ("os", self.os.as_deref()),
            ("browser", self.browser.as_deref()),
            ("device", self.device.as_deref()),
            ("country", self.country.as_deref()),
            ("region", self.region.as_deref()),
            ("city", self.city.as_deref()),
        ]
    }
}

/// Outcome of a token check against the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// The server confirmed the token and named its user.
    Valid(TokenVerification),
    /// The server answered with a non-2xx status, usually 401 for an
    /// expired token.
    Rejected { status: u16 },
    /// No response was received.
    Unreachable(String),
    /// A 2xx response whose body was not a verification record.
    Malformed(String),
}

impl TokenStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, TokenStatus::Valid(_))
    }
}
