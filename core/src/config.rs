//! Builder for a configured client.

use crate::client::UmamiClient;
use crate::error::Result;
use crate::session::Session;
use crate::transport::HttpTransport;

/// Configuration for [`UmamiClient`].
///
/// Collects the session settings up front; the base URL is validated when
/// the client is built.
///
/// ```
/// # use umami_client::ClientConfig;
/// let client = ClientConfig::new()
///     .base_url("https://analytics.example.com/")
///     .website_id("978435e2-7ba1-4337-9860-ec31ece2db60")
///     .hostname("example.com")
///     .to_client()
///     .unwrap();
/// assert_eq!(client.session().base_url(), Some("https://analytics.example.com"));
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Option<String>,
    website_id: Option<String>,
    hostname: Option<String>,
    tracking_enabled: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: None,
            website_id: None,
            hostname: None,
            tracking_enabled: true,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location of the Umami instance, without `/api`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Website used when an operation is not given one.
    pub fn website_id(mut self, website_id: impl Into<String>) -> Self {
        self.website_id = Some(website_id.into());
        self
    }

    /// Hostname used when an event is not given one.
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Turn event sending off, e.g. in development environments.
    pub fn tracking_enabled(mut self, enabled: bool) -> Self {
        self.tracking_enabled = enabled;
        self
    }

    pub fn to_client(self) -> Result<UmamiClient> {
        self.to_client_with_transport(HttpTransport::new())
    }

    pub fn to_client_with_transport<T>(self, transport: T) -> Result<UmamiClient<T>> {
        let mut session = Session::new();
        if let Some(url) = &self.base_url {
            session.set_base_url(url)?;
        }
        if let Some(website_id) = &self.website_id {
            session.set_default_website_id(website_id);
        }
        if let Some(hostname) = &self.hostname {
            session.set_default_hostname(hostname);
        }
        if !self.tracking_enabled {
            session.disable_tracking();
        }
        Ok(UmamiClient::from_parts(session, transport))
    }
}
