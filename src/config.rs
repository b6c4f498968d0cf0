//! Endpoint configuration

use crate::client_response_error::ClientResponseError;
use std::env;
use std::time::Duration;
use url::Url;

/// Default header carrying the application id.
pub const DEFAULT_APP_ID_HEADER: &str = "X-Application-Id";

/// Default header carrying the application client key.
pub const DEFAULT_CLIENT_KEY_HEADER: &str = "X-Application-Client-Key";

/// Default length, in bytes, of an encoded query string before reads switch
/// to a POST with a JSON body.
pub const DEFAULT_MAX_QUERY_LENGTH: usize = 2048;

/// Where the application credentials go on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialPlacement {
    /// Two request headers.
    Headers {
        app_id_header: String,
        client_key_header: String,
    },
    /// Two query string parameters.
    QueryParams {
        app_id_param: String,
        client_key_param: String,
    },
}

impl CredentialPlacement {
    /// Headers with the default names.
    pub fn headers() -> Self {
        Self::Headers {
            app_id_header: DEFAULT_APP_ID_HEADER.to_string(),
            client_key_header: DEFAULT_CLIENT_KEY_HEADER.to_string(),
        }
    }

    /// Query parameters named `appId` and `appClientKey`.
    pub fn query_params() -> Self {
        Self::QueryParams {
            app_id_param: "appId".to_string(),
            client_key_param: "appClientKey".to_string(),
        }
    }
}

impl Default for CredentialPlacement {
    fn default() -> Self {
        Self::headers()
    }
}

/// Connection settings shared by every call a [`Client`](crate::Client) makes.
///
/// Setters store values verbatim. Nothing is checked until a request is
/// about to be sent, at which point [`Config::validate`] runs.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    url: String,
    app_id: String,
    app_client_key: String,
    allow_untrusted_certificate: bool,
    timeout: Option<Duration>,
    credentials: CredentialPlacement,
    max_query_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::new(),
            app_id: String::new(),
            app_client_key: String::new(),
            allow_untrusted_certificate: false,
            timeout: None,
            credentials: CredentialPlacement::default(),
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
        }
    }
}

impl Config {
    /// Creates a configuration with the base URL and credentials set.
    pub fn new(url: &str, app_id: &str, app_client_key: &str) -> Self {
        let mut config = Self::default();
        config.set_url(url);
        config.set_app_id(app_id, app_client_key);
        config
    }

    /// Loads a configuration from `BAASKIT_*` environment variables.
    ///
    /// Unset variables keep their defaults; the result may still be
    /// incomplete.
    pub fn from_env() -> Result<Self, ClientResponseError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ClientResponseError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BAASKIT_URL") {
            config.set_url(&url);
        }

        config.set_app_id(
            &lookup("BAASKIT_APP_ID").unwrap_or_default(),
            &lookup("BAASKIT_APP_CLIENT_KEY").unwrap_or_default(),
        );

        if let Some(flag) = lookup("BAASKIT_ALLOW_UNTRUSTED_CERTIFICATE") {
            config.set_allow_untrusted_certificate(parse_flag(&flag).ok_or_else(|| {
                ClientResponseError::configuration(format!(
                    "BAASKIT_ALLOW_UNTRUSTED_CERTIFICATE is not a boolean: {flag:?}"
                ))
            })?);
        }

        if let Some(secs) = lookup("BAASKIT_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientResponseError::configuration(format!(
                    "BAASKIT_TIMEOUT_SECS is not a number of seconds: {secs:?}"
                ))
            })?;
            config.set_timeout(Some(Duration::from_secs(secs)));
        }

        Ok(config)
    }

    /// Sets the server URL used for all subsequent calls,
    /// e.g. `http://yourserver.com/v1`.
    pub fn set_url(&mut self, url: &str) {
        self.url = url.to_string();
    }

    /// Returns the server URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sets the application id and client key sent with every call.
    pub fn set_app_id(&mut self, app_id: &str, app_client_key: &str) {
        self.app_id = app_id.to_string();
        self.app_client_key = app_client_key.to_string();
    }

    /// Returns the application id.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Returns the application client key.
    pub fn app_client_key(&self) -> &str {
        &self.app_client_key
    }

    /// Sets whether untrusted TLS certificates are accepted. Useful for
    /// testing; not recommended for production use.
    pub fn set_allow_untrusted_certificate(&mut self, allow: bool) {
        self.allow_untrusted_certificate = allow;
    }

    /// Returns whether untrusted TLS certificates are accepted.
    pub fn allow_untrusted_certificate(&self) -> bool {
        self.allow_untrusted_certificate
    }

    /// Sets the total request timeout. `None` keeps the transport default.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Overall request timeout. `None` keeps the transport default.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sets where the credentials are placed on the wire.
    pub fn set_credential_placement(&mut self, placement: CredentialPlacement) {
        self.credentials = placement;
    }

    /// Where the app id and client key are sent on each request.
    pub fn credential_placement(&self) -> &CredentialPlacement {
        &self.credentials
    }

    /// Sets the encoded query string length above which reads are sent as POST.
    pub fn set_max_query_length(&mut self, len: usize) {
        self.max_query_length = len;
    }

    /// Longest encoded query string sent on a GET before reads switch to POST.
    pub fn max_query_length(&self) -> usize {
        self.max_query_length
    }

    /// Checks that the base URL and credentials are present and that the URL
    /// can carry path segments. Returns the parsed base URL.
    pub fn validate(&self) -> Result<Url, ClientResponseError> {
        if self.url.trim().is_empty() {
            return Err(ClientResponseError::configuration("the server url is not set"));
        }
        if self.app_id.is_empty() {
            return Err(ClientResponseError::configuration("the application id is not set"));
        }
        if self.app_client_key.is_empty() {
            return Err(ClientResponseError::configuration(
                "the application client key is not set",
            ));
        }

        let url = Url::parse(self.url.trim())?;
        if url.cannot_be_a_base() {
            return Err(ClientResponseError::configuration(format!(
                "the server url cannot carry a path: {}",
                self.url
            )));
        }

        Ok(url)
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url)
            .field("app_id", &self.app_id)
            .field("app_client_key", &"********")
            .field("allow_untrusted_certificate", &self.allow_untrusted_certificate)
            .field("timeout", &self.timeout)
            .field("credentials", &self.credentials)
            .field("max_query_length", &self.max_query_length)
            .finish()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
