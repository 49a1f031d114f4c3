//! The operation facade.
//!
//! # Design
//! `UmamiClient` owns one `Session` and one transport. Every operation runs
//! the same pipeline: a `Session::build_*` method validates and builds the
//! request, the transport executes it, and a `response::parse_*` function
//! maps the result. Each operation exists in a blocking form (requires
//! `T: Transport`) and an `_async` form (requires `T: AsyncTransport`);
//! both issue exactly one request and differ only in how the caller waits.
//!
//! Mutating operations take `&mut self`, so two logins or a login racing a
//! default change cannot interleave on one client. Independent sessions
//! are independent clients.

use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};
use crate::response::{
    parse_active_users, parse_heartbeat, parse_login, parse_send, parse_token_status,
    parse_website_stats, parse_websites,
};
use crate::session::{Session, SessionState};
use crate::transport::{AsyncTransport, HttpTransport, Transport};
use crate::types::{
    EventOptions, LoginResponse, PageViewOptions, StatsQuery, TokenStatus, Website, WebsiteStats,
};
use crate::validate::validate_state;

/// Client for one Umami instance.
///
/// ```no_run
/// # use umami_client::{EventOptions, UmamiClient};
/// # fn run() -> umami_client::Result<()> {
/// let mut client = UmamiClient::new();
/// client.set_base_url("https://analytics.example.com")?;
/// client.set_website_id("978435e2-7ba1-4337-9860-ec31ece2db60");
/// client.set_hostname("example.com");
///
/// client.new_event("Purchase-Course", &EventOptions::default())?;
///
/// client.login("admin", "umami")?;
/// for site in client.websites()? {
///     println!("{} {}", site.id, site.domain);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct UmamiClient<T = HttpTransport> {
    session: Session,
    transport: T,
}

impl UmamiClient<HttpTransport> {
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }
}

impl Default for UmamiClient<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> UmamiClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self::from_parts(Session::new(), transport)
    }

    pub(crate) fn from_parts(session: Session, transport: T) -> Self {
        UmamiClient { session, transport }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// See [`Session::set_base_url`].
    pub fn set_base_url(&mut self, url: &str) -> Result<()> {
        self.session.set_base_url(url)
    }

    pub fn set_website_id(&mut self, website_id: &str) {
        self.session.set_default_website_id(website_id);
    }

    pub fn set_hostname(&mut self, hostname: &str) {
        self.session.set_default_hostname(hostname);
    }

    /// Resume sending events and page views. This is the initial state.
    pub fn enable(&mut self) {
        self.session.enable_tracking();
    }

    /// Stop sending events and page views. Calls are still validated but
    /// return `Ok(())` without a request.
    pub fn disable(&mut self) {
        self.session.disable_tracking();
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_logged_in()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    fn store_login(&mut self, response: &HttpResponse) -> Result<LoginResponse> {
        let login = parse_login(response)?;
        self.session.store_token(login.token.clone());
        log::debug!(target: "umami", "logged in as {}", login.user.username);
        Ok(login)
    }

    /// `None` when tracking is off and the request must be dropped.
    fn tracked(&self, request: HttpRequest) -> Option<HttpRequest> {
        if self.session.tracking_enabled() {
            Some(request)
        } else {
            log::debug!(target: "umami", "tracking disabled, not sending event");
            None
        }
    }

    /// The local half of `verify_token`: URL set and a token held.
    fn has_token(&self) -> bool {
        validate_state(&self.session, true, true).is_ok()
    }
}

impl<T: Transport> UmamiClient<T> {
    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse> {
        log::debug!(target: "umami", "{} {}", request.method.as_str(), request.url);
        self.transport.execute(request)
    }

    /// Logs in and keeps the returned token for later calls.
    pub fn login(&mut self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = self.session.build_login(username, password)?;
        let response = self.dispatch(&request)?;
        self.store_login(&response)
    }

    /// All websites visible to the logged-in user.
    pub fn websites(&self) -> Result<Vec<Website>> {
        let request = self.session.build_websites()?;
        parse_websites(&self.dispatch(&request)?).map(|page| page.websites)
    }

    pub fn website_stats(&self, query: &StatsQuery) -> Result<WebsiteStats> {
        let request = self.session.build_website_stats(query)?;
        parse_website_stats(&self.dispatch(&request)?)
    }

    /// Visitors currently on the site. `None` uses the default website id.
    pub fn active_users(&self, website_id: Option<&str>) -> Result<u64> {
        let request = self.session.build_active_users(website_id)?;
        parse_active_users(&self.dispatch(&request)?)
    }

    /// True only when the held token is confirmed valid. Every failure,
    /// including an unreachable server, reads as `false`; use
    /// [`UmamiClient::check_token`] to tell them apart.
    ///
    /// With `check_server == false` only the local session is consulted.
    pub fn verify_token(&self, check_server: bool) -> bool {
        if !self.has_token() {
            return false;
        }
        if !check_server {
            return true;
        }
        self.check_token().map_or(false, |status| status.is_valid())
    }

    /// Asks the server about the held token.
    ///
    /// Fails only when the session has no URL or no token; server and
    /// network outcomes are reported through [`TokenStatus`].
    pub fn check_token(&self) -> Result<TokenStatus> {
        let request = self.session.build_verify_token()?;
        Ok(match self.dispatch(&request) {
            Ok(response) => parse_token_status(&response),
            Err(e) => TokenStatus::Unreachable(e.to_string()),
        })
    }

    /// True if the server answered the heartbeat with a 2xx.
    pub fn heartbeat(&self) -> bool {
        self.session
            .build_heartbeat()
            .and_then(|request| self.dispatch(&request))
            .map_or(false, |response| parse_heartbeat(&response))
    }

    /// Sends a custom event. Login is not required.
    pub fn new_event(&self, event_name: &str, options: &EventOptions) -> Result<()> {
        let request = self.session.build_event(event_name, options)?;
        let Some(request) = self.tracked(request) else {
            return Ok(());
        };
        parse_send(&self.dispatch(&request)?)
    }

    /// Sends a page view, as the tracker script would on page load.
    pub fn new_page_view(
        &self,
        page_title: &str,
        url: &str,
        options: &PageViewOptions,
    ) -> Result<()> {
        let request = self.session.build_page_view(page_title, url, options)?;
        let Some(request) = self.tracked(request) else {
            return Ok(());
        };
        parse_send(&self.dispatch(&request)?)
    }
}

impl<T: AsyncTransport + Sync> UmamiClient<T> {
    async fn dispatch_async(&self, request: HttpRequest) -> Result<HttpResponse> {
        log::debug!(target: "umami", "{} {}", request.method.as_str(), request.url);
        self.transport.execute_async(request).await
    }

    pub async fn login_async(&mut self, username: &str, password: &str) -> Result<LoginResponse> {
        let request = self.session.build_login(username, password)?;
        let response = self.dispatch_async(request).await?;
        self.store_login(&response)
    }

    pub async fn websites_async(&self) -> Result<Vec<Website>> {
        let request = self.session.build_websites()?;
        parse_websites(&self.dispatch_async(request).await?).map(|page| page.websites)
    }

    pub async fn website_stats_async(&self, query: &StatsQuery) -> Result<WebsiteStats> {
        let request = self.session.build_website_stats(query)?;
        parse_website_stats(&self.dispatch_async(request).await?)
    }

    pub async fn active_users_async(&self, website_id: Option<&str>) -> Result<u64> {
        let request = self.session.build_active_users(website_id)?;
        parse_active_users(&self.dispatch_async(request).await?)
    }

    pub async fn verify_token_async(&self, check_server: bool) -> bool {
        if !self.has_token() {
            return false;
        }
        if !check_server {
            return true;
        }
        self.check_token_async()
            .await
            .map_or(false, |status| status.is_valid())
    }

    pub async fn check_token_async(&self) -> Result<TokenStatus> {
        let request = self.session.build_verify_token()?;
        Ok(match self.dispatch_async(request).await {
            Ok(response) => parse_token_status(&response),
            Err(e) => TokenStatus::Unreachable(e.to_string()),
        })
    }

    pub async fn heartbeat_async(&self) -> bool {
        let Ok(request) = self.session.build_heartbeat() else {
            return false;
        };
        self.dispatch_async(request)
            .await
            .map_or(false, |response| parse_heartbeat(&response))
    }

    pub async fn new_event_async(&self, event_name: &str, options: &EventOptions) -> Result<()> {
        let request = self.session.build_event(event_name, options)?;
        let Some(request) = self.tracked(request) else {
            return Ok(());
        };
        parse_send(&self.dispatch_async(request).await?)
    }

    pub async fn new_page_view_async(
        &self,
        page_title: &str,
        url: &str,
        options: &PageViewOptions,
    ) -> Result<()> {
        let request = self.session.build_page_view(page_title, url, options)?;
        let Some(request) = self.tracked(request) else {
            return Ok(());
        };
        parse_send(&self.dispatch_async(request).await?)
    }
}
