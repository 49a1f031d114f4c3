//! Client for the Umami web analytics HTTP API.
//!
//! # Overview
//! Log in, list websites, read statistics and active users, probe server
//! health and token validity, and send custom events and page views from a
//! server process, without a browser.
//!
//! # Design
//! - `UmamiClient` owns a per-instance `Session` (base URL, token, default
//!   website id and hostname, tracking switch) and a transport.
//! - Every operation is split into `Session::build_*` (validate and produce
//!   an `HttpRequest`), one transport call, and `response::parse_*`
//!   (classify and decode the `HttpResponse`). Preconditions always fail
//!   before any I/O.
//! - Each operation has a blocking form and an `_async` form over the
//!   `Transport` / `AsyncTransport` seams. `HttpTransport` implements both.
//! - Logging goes through the `log` facade under the `umami` target.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod session;
pub mod transport;
pub mod types;
pub mod validate;

pub use client::UmamiClient;
pub use config::ClientConfig;
pub use error::{Result, UmamiError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::{library_user_agent, EVENT_USER_AGENT};
pub use session::{Session, SessionState};
pub use transport::{AsyncTransport, HttpTransport, Transport};
pub use types::{
    ActiveUsers, EventEnvelope, EventOptions, EventPayload, LoginResponse, Metric,
    PageViewOptions, StatsQuery, TeamWebsite, TokenStatus, TokenVerification, User, Website,
    WebsiteStats, WebsiteTeam, WebsiteUser, WebsitesResponse,
};
