//! HTTP data source for `GET` list endpoints.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::DataSource;
use crate::error::ApiError;
use crate::model::Entity;
use crate::query::FetchedPage;
use crate::query::QueryParams;

/// Fetches pages from a paginated JSON list endpoint.
///
/// Cheap to clone (uses `Arc` internally).
///
/// # Example
///
/// ```ignore
/// let source = HttpDataSource::<User>::builder()
///     .endpoint("https://api.example.com/users")?
///     .timeout(Duration::from_secs(10))
///     .build()?;
/// ```
pub struct HttpDataSource<E> {
    inner: Arc<HttpDataSourceInner>,
    _entity: PhantomData<fn() -> E>,
}

struct HttpDataSourceInner {
    endpoint: Url,
    http_client: Client,
    timeout: Option<Duration>,
}

impl<E> Clone for HttpDataSource<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> HttpDataSource<E> {
    /// Creates a new builder.
    pub fn builder() -> HttpDataSourceBuilder<E, Missing> {
        HttpDataSourceBuilder::new()
    }

    /// The list endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Full request URL for a set of parameters.
    pub fn request_url(&self, params: &QueryParams) -> Url {
        let mut url = self.inner.endpoint.clone();
        url.query_pairs_mut().extend_pairs(params.to_query_pairs());
        url
    }
}

#[async_trait]
impl<E: Entity> DataSource<E> for HttpDataSource<E> {
    async fn fetch_page(&self, params: &QueryParams) -> Result<FetchedPage<E>, ApiError> {
        let url = self.request_url(params);

        let mut request = self
            .inner
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.classify(e))?;

        if !status.is_success() {
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            return Err(ApiError::http(status.as_u16(), message));
        }

        serde_json::from_str(&body).map_err(|e| ApiError::parse_with_body(e.to_string(), body))
    }
}

impl<E> HttpDataSource<E> {
    fn classify(&self, error: reqwest::Error) -> ApiError {
        match self.inner.timeout {
            Some(timeout) if error.is_timeout() => ApiError::Timeout(timeout),
            _ => ApiError::Network(error),
        }
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for [`HttpDataSource`]. The endpoint is required at compile time.
pub struct HttpDataSourceBuilder<E, Endpoint> {
    endpoint: Endpoint,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> HttpDataSourceBuilder<E, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            endpoint: Missing,
            timeout: None,
            connect_timeout: None,
            http_client: None,
            _entity: PhantomData,
        }
    }

    /// Sets the list endpoint, e.g. `https://api.example.com/users`.
    pub fn endpoint(self, endpoint: &str) -> Result<HttpDataSourceBuilder<E, Set<Url>>, ApiError> {
        let url = Url::parse(endpoint).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        Ok(self.endpoint_url(url))
    }

    /// Sets the list endpoint from a parsed URL.
    pub fn endpoint_url(self, endpoint: Url) -> HttpDataSourceBuilder<E, Set<Url>> {
        HttpDataSourceBuilder {
            endpoint: Set(endpoint),
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            _entity: PhantomData,
        }
    }
}

impl<E> Default for HttpDataSourceBuilder<E, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, U> HttpDataSourceBuilder<E, U> {
    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout. Ignored when a custom client is supplied.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Uses a custom HTTP client.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }
}

impl<E> HttpDataSourceBuilder<E, Set<Url>> {
    /// Builds the data source.
    pub fn build(self) -> Result<HttpDataSource<E>, ApiError> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let mut builder = Client::builder();
                if let Some(timeout) = self.connect_timeout {
                    builder = builder.connect_timeout(timeout);
                }
                builder.build()?
            }
        };

        Ok(HttpDataSource {
            inner: Arc::new(HttpDataSourceInner {
                endpoint: self.endpoint.0,
                http_client,
                timeout: self.timeout,
            }),
            _entity: PhantomData,
        })
    }
}
