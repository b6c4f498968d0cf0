//! BaaSKit Client

use crate::client_response_error::ClientResponseError;
use crate::config::{Config, CredentialPlacement};
use crate::services::{CollectionService, CrudService};
use crate::tools::dtos::{ApiResponse, DeleteSummary, Document, Query, UpdateSummary};
use crate::tools::options::{
    serialize_query_params, DeleteObjectsOptions, GetObjectsOptions, SendOptions,
    UpdateObjectsOptions,
};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("baaskit-rust/", env!("CARGO_PKG_VERSION"));

/// A configuration together with the HTTP client built for it.
struct Endpoint {
    config: Config,
    http_client: reqwest::Client,
}

impl Endpoint {
    fn new(config: Config) -> Result<Self, ClientResponseError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);

        if config.allow_untrusted_certificate() {
            warn!(url = config.url(), "accepting untrusted TLS certificates");
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| {
            ClientResponseError::configuration(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

/// A successful (2xx) response whose body has not been decoded yet.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// The request URL, without credentials.
    pub url: String,
    /// The HTTP status, always in the 2xx range.
    pub status: u16,
    /// The response body as text; may be empty.
    pub body: String,
}

impl RawResponse {
    /// Decodes the body as JSON, keeping the status on failure.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ClientResponseError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ClientResponseError::decode(&self.url, self.status, format!("JSON error: {}", e))
        })
    }

    /// Decodes the body as JSON, or returns the default value when the body
    /// is empty. A non-empty body that is not JSON is a decode error.
    pub fn json_or_default<T: DeserializeOwned + Default>(&self) -> Result<T, ClientResponseError> {
        if self.body.trim().is_empty() {
            return Ok(T::default());
        }
        self.json()
    }
}

/// BaaSKit client for making API requests.
///
/// The configuration is read once per request, so [`Client::configure`] never
/// affects requests that are already in flight.
pub struct Client {
    endpoint: RwLock<Arc<Endpoint>>,
}

impl Client {
    /// Creates a new client. The configuration may be incomplete; operations
    /// then fail with a configuration error without touching the network.
    pub fn new(config: Config) -> Result<Arc<Self>, ClientResponseError> {
        Ok(Arc::new(Self {
            endpoint: RwLock::new(Arc::new(Endpoint::new(config)?)),
        }))
    }

    /// Creates a new client from `BAASKIT_*` environment variables.
    pub fn from_env() -> Result<Arc<Self>, ClientResponseError> {
        Self::new(Config::from_env()?)
    }

    fn snapshot(&self) -> Arc<Endpoint> {
        let guard = self.endpoint.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Returns a copy of the current configuration.
    pub fn config(&self) -> Config {
        self.snapshot().config.clone()
    }

    /// Updates the configuration and rebuilds the HTTP client.
    ///
    /// On error the previous configuration stays in place.
    pub fn configure<F: FnOnce(&mut Config)>(&self, update: F) -> Result<(), ClientResponseError> {
        let mut guard = self.endpoint.write().unwrap_or_else(PoisonError::into_inner);
        let mut config = guard.config.clone();
        update(&mut config);
        *guard = Arc::new(Endpoint::new(config)?);
        Ok(())
    }

    /// Builds the full URL for the given path segments. Each segment is
    /// percent-encoded as a single path component.
    pub fn build_url(&self, segments: &[&str]) -> Result<Url, ClientResponseError> {
        let base = self.snapshot().config.validate()?;
        join_segments(base, segments)
    }

    /// Returns the CollectionService for the specified collection.
    pub fn collection(self: &Arc<Self>, name: &str) -> CollectionService {
        CollectionService::new(Arc::clone(self), name)
    }

    /// Inserts a new document into a collection and returns its object id.
    pub async fn insert_object(
        self: &Arc<Self>,
        collection: &str,
        document: Document,
    ) -> Result<ApiResponse<String>, ClientResponseError> {
        self.collection(collection).insert_object(document).await
    }

    /// Gets a document by its object id.
    pub async fn get_object(
        self: &Arc<Self>,
        collection: &str,
        object_id: &str,
    ) -> Result<ApiResponse<Document>, ClientResponseError> {
        self.collection(collection).get_object(object_id).await
    }

    /// Gets the documents matching a query.
    pub async fn get_objects(
        self: &Arc<Self>,
        collection: &str,
        query: Query,
        options: GetObjectsOptions,
    ) -> Result<ApiResponse<Vec<Document>>, ClientResponseError> {
        self.collection(collection).get_objects(query, options).await
    }

    /// Gets the number of documents matching a query.
    pub async fn get_object_count(
        self: &Arc<Self>,
        collection: &str,
        query: Query,
    ) -> Result<ApiResponse<u64>, ClientResponseError> {
        self.collection(collection).get_object_count(query).await
    }

    /// Updates a document by its object id.
    pub async fn update_object(
        self: &Arc<Self>,
        collection: &str,
        object_id: &str,
        document: Document,
    ) -> Result<ApiResponse<()>, ClientResponseError> {
        self.collection(collection)
            .update_object(object_id, document)
            .await
    }

    /// Updates the documents matching a query.
    pub async fn update_objects(
        self: &Arc<Self>,
        collection: &str,
        query: Query,
        document: Document,
        options: UpdateObjectsOptions,
    ) -> Result<ApiResponse<UpdateSummary>, ClientResponseError> {
        self.collection(collection)
            .update_objects(query, document, options)
            .await
    }

    /// Deletes a document by its object id.
    pub async fn delete_object(
        self: &Arc<Self>,
        collection: &str,
        object_id: &str,
    ) -> Result<ApiResponse<()>, ClientResponseError> {
        self.collection(collection).delete_object(object_id).await
    }

    /// Deletes the documents matching a query.
    pub async fn delete_objects(
        self: &Arc<Self>,
        collection: &str,
        query: Query,
        options: DeleteObjectsOptions,
    ) -> Result<ApiResponse<DeleteSummary>, ClientResponseError> {
        self.collection(collection)
            .delete_objects(query, options)
            .await
    }

    /// Sends an API HTTP request to the given path segments.
    ///
    /// Non-2xx responses become protocol errors; the body of a 2xx response
    /// is returned undecoded.
    pub async fn send(
        &self,
        segments: &[&str],
        mut options: SendOptions,
    ) -> Result<RawResponse, ClientResponseError> {
        let endpoint = self.snapshot();
        let config = &endpoint.config;
        let base = config.validate()?;

        let mut query_string = serialize_query_params(&options.query);
        let mut path: Vec<&str> = segments.to_vec();

        if query_string.len() > config.max_query_length() {
            if let Some(segment) = options.query_overflow.as_deref() {
                debug!(
                    len = query_string.len(),
                    "query string too long, sending parameters as a JSON body"
                );
                path.push(segment);
                options.method = Method::POST;
                let params: serde_json::Map<String, serde_json::Value> = options
                    .query
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                options.body = Some(params.into());
                query_string.clear();
            }
        }

        let mut url = join_segments(base, &path)?;
        if !query_string.is_empty() {
            url.set_query(Some(&query_string));
        }
        let display_url = url.to_string();

        let mut request_url = url;
        let mut headers = reqwest::header::HeaderMap::new();

        match config.credential_placement() {
            CredentialPlacement::Headers {
                app_id_header,
                client_key_header,
            } => {
                headers.insert(header_name(app_id_header)?, header_value(config.app_id())?);
                headers.insert(
                    header_name(client_key_header)?,
                    header_value(config.app_client_key())?,
                );
            }
            CredentialPlacement::QueryParams {
                app_id_param,
                client_key_param,
            } => {
                request_url
                    .query_pairs_mut()
                    .append_pair(app_id_param, config.app_id())
                    .append_pair(client_key_param, config.app_client_key());
            }
        }

        for (key, value) in &options.headers {
            headers.insert(header_name(key)?, header_value(value)?);
        }

        let mut request_builder = endpoint
            .http_client
            .request(options.method.clone(), request_url)
            .headers(headers);

        if let Some(body) = &options.body {
            request_builder = request_builder.json(body);
        }

        debug!(method = %options.method, url = %display_url, "sending request");
        let started = Instant::now();

        let response = request_builder.send().await.map_err(|e| {
            let mut err = ClientResponseError::from(e);
            err.url = display_url.clone();
            err
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            let mut err = ClientResponseError::from(e);
            err.url = display_url.clone();
            err.status = status;
            err
        })?;

        debug!(
            method = %options.method,
            url = %display_url,
            status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received response"
        );

        if !(200..300).contains(&status) {
            return Err(ClientResponseError::from_response(&display_url, status, &body));
        }

        Ok(RawResponse {
            url: display_url,
            status,
            body,
        })
    }
}

fn join_segments(mut url: Url, segments: &[&str]) -> Result<Url, ClientResponseError> {
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|_| ClientResponseError::configuration("the server url cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn header_name(name: &str) -> Result<HeaderName, ClientResponseError> {
    HeaderName::from_str(name).map_err(|_| {
        ClientResponseError::configuration(format!("invalid header name: {:?}", name))
    })
}

fn header_value(value: &str) -> Result<HeaderValue, ClientResponseError> {
    HeaderValue::from_str(value)
        .map_err(|_| ClientResponseError::configuration("header value contains invalid characters"))
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.snapshot().config)
            .finish()
    }
}
