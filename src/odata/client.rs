//! OData client module
//!
//! Request proxy for the Microsoft Dynamics 365 Web API. Every call
//! acquires a bearer token from the injected [`TokenSource`], attaches the
//! OData protocol headers and maps non-success responses to
//! [`ProxyError::Upstream`] without retrying.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::auth::{TokenCache, TokenSource};
use crate::config::Config;
use crate::entities::CrmEntity;

use super::query::{resource_path, QueryOptions};
use super::API_VERSION;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Request proxy errors
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("authentication failed: {0}")]
    Auth(#[from] crate::auth::AuthError),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream request failed (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("failed to parse response: {0}")]
    Parse(String),
}

/// One page of an OData collection response
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ODataPage<T> {
    #[serde(rename = "@odata.context")]
    pub context: Option<String>,

    /// Absolute URL of the next page, when the server truncated the result.
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,

    /// Total count, present when the query asked for `$count=true`.
    #[serde(rename = "@odata.count")]
    pub count: Option<i64>,

    #[serde(default)]
    pub value: Vec<T>,
}

/// HTTP client for the D365 Web API
///
/// Holds the organization base URL and a [`TokenSource`]; the service root
/// is pinned to Web API [`API_VERSION`]. Cheap to share behind an `Arc`.
pub struct CrmClient {
    base_url: String,
    service_root: String,
    http_client: Client,
    token_source: Arc<dyn TokenSource>,
}

impl std::fmt::Debug for CrmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrmClient")
            .field("base_url", &self.base_url)
            .field("service_root", &self.service_root)
            .finish_non_exhaustive()
    }
}

impl CrmClient {
    /// Create a client with the default HTTP configuration.
    ///
    /// `base_url` is the organization URL, e.g.
    /// `https://org.crm.dynamics.com`; the `/api/data/v9.2/` service root
    /// is appended internally.
    pub fn new(token_source: Arc<dyn TokenSource>, base_url: &str) -> Self {
        Self::with_http_client(token_source, base_url, default_http_client(None))
    }

    /// Create a client plus its token cache from loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let token_source: Arc<dyn TokenSource> = Arc::new(TokenCache::from_config(config));
        Self::with_http_client(
            token_source,
            &config.base_url,
            default_http_client(config.timeout_secs),
        )
    }

    /// Create a client with a caller-supplied `reqwest` client.
    pub fn with_http_client(
        token_source: Arc<dyn TokenSource>,
        base_url: &str,
        http_client: Client,
    ) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let service_root = format!("{}/api/data/{}/", base_url, API_VERSION);

        Self {
            base_url,
            service_root,
            http_client,
            token_source,
        }
    }

    /// Organization base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Service root URL, e.g. `https://org.crm.dynamics.com/api/data/v9.2/`.
    pub fn service_root(&self) -> &str {
        &self.service_root
    }

    /// Resolve a relative resource against the service root.
    ///
    /// Absolute URLs (paging links returned by the server) pass through.
    fn url_for(&self, resource: &str) -> String {
        if resource.starts_with("https://") || resource.starts_with("http://") {
            resource.to_string()
        } else {
            format!("{}{}", self.service_root, resource)
        }
    }

    /// Send one request with the OData protocol headers attached.
    ///
    /// Any non-2xx answer becomes [`ProxyError::Upstream`] with the status
    /// and the upstream body preserved. There is no retry; callers see the
    /// first failure as-is.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Response, ProxyError> {
        let token = self.token_source.get_token().await?;

        let mut request = self
            .http_client
            .request(method.clone(), url)
            .header("Authorization", format!("Bearer {}", token))
            .header("Accept", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0");

        // Guard updates against accidental upserts.
        if method == Method::PATCH {
            request = request.header("If-Match", "*");
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Upstream returned {}: {}", status, body);
            return Err(upstream_error(status, body));
        }

        Ok(response)
    }

    /// Proxy an arbitrary request to the Web API.
    ///
    /// `resource` is a relative path like `contacts?$top=5` or an absolute
    /// paging URL. Returns the parsed JSON body, or `Value::Null` for
    /// bodyless 204 responses.
    pub async fn request(
        &self,
        method: Method,
        resource: &str,
        body: Option<Value>,
    ) -> Result<Value, ProxyError> {
        let url = self.url_for(resource);
        tracing::debug!("{} {}", method, url);

        let response = self.execute(method, &url, body.as_ref()).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| ProxyError::Parse(e.to_string()))
    }

    /// Fetch one page of a collection and deserialize the records.
    async fn get_page<T: DeserializeOwned>(&self, url: &str) -> Result<ODataPage<T>, ProxyError> {
        let response = self.execute(Method::GET, url, None).await?;
        let page: ODataPage<T> = response
            .json()
            .await
            .map_err(|e| ProxyError::Parse(e.to_string()))?;

        tracing::debug!(
            "Fetched {} records, next page: {}",
            page.value.len(),
            page.next_link.is_some()
        );

        Ok(page)
    }

    /// List records of a collection as raw JSON.
    pub async fn list_raw(
        &self,
        collection: &str,
        options: &QueryOptions,
    ) -> Result<ODataPage<Value>, ProxyError> {
        let url = self.url_for(&resource_path(collection, None, options));
        self.get_page(&url).await
    }

    /// Follow a `@odata.nextLink` from a previous page.
    pub async fn next_page_raw(&self, next_link: &str) -> Result<ODataPage<Value>, ProxyError> {
        self.get_page(next_link).await
    }

    /// Retrieve a single record by id as raw JSON.
    pub async fn retrieve_raw(
        &self,
        collection: &str,
        id: &str,
        options: &QueryOptions,
    ) -> Result<Value, ProxyError> {
        let url = self.url_for(&resource_path(collection, Some(id), options));
        let response = self.execute(Method::GET, &url, None).await?;
        response
            .json()
            .await
            .map_err(|e| ProxyError::Parse(e.to_string()))
    }

    /// Create a record from a raw JSON payload, returning the new id.
    pub async fn create_raw(&self, collection: &str, body: &Value) -> Result<String, ProxyError> {
        self.create_inner(collection, body, None).await
    }

    /// Apply a partial update from a raw JSON payload.
    pub async fn update_raw(
        &self,
        collection: &str,
        id: &str,
        body: &Value,
    ) -> Result<(), ProxyError> {
        let url = self.url_for(&resource_path(collection, Some(id), &QueryOptions::default()));
        self.execute(Method::PATCH, &url, Some(body)).await?;
        Ok(())
    }

    /// Delete a record by id.
    pub async fn delete_raw(&self, collection: &str, id: &str) -> Result<(), ProxyError> {
        let url = self.url_for(&resource_path(collection, Some(id), &QueryOptions::default()));
        self.execute(Method::DELETE, &url, None).await?;
        Ok(())
    }

    /// List records of a typed entity.
    pub async fn list<E: CrmEntity>(
        &self,
        options: &QueryOptions,
    ) -> Result<ODataPage<E>, ProxyError> {
        let url = self.url_for(&resource_path(E::COLLECTION, None, options));
        self.get_page(&url).await
    }

    /// Follow a paging link, deserializing into a typed entity.
    pub async fn next_page<E: CrmEntity>(&self, next_link: &str) -> Result<ODataPage<E>, ProxyError> {
        self.get_page(next_link).await
    }

    /// Retrieve a typed record by id.
    pub async fn retrieve<E: CrmEntity>(
        &self,
        id: &str,
        options: &QueryOptions,
    ) -> Result<E, ProxyError> {
        let url = self.url_for(&resource_path(E::COLLECTION, Some(id), options));
        let response = self.execute(Method::GET, &url, None).await?;
        response
            .json()
            .await
            .map_err(|e| ProxyError::Parse(e.to_string()))
    }

    /// Create a typed record, returning the new id.
    pub async fn create<E: CrmEntity>(&self, entity: &E) -> Result<String, ProxyError> {
        let body = serde_json::to_value(entity).map_err(|e| ProxyError::Parse(e.to_string()))?;
        self.create_inner(E::COLLECTION, &body, Some(E::ID_FIELD)).await
    }

    /// Apply a typed partial update. Fields left `None` are not sent.
    pub async fn update<E: CrmEntity>(&self, id: &str, entity: &E) -> Result<(), ProxyError> {
        let body = serde_json::to_value(entity).map_err(|e| ProxyError::Parse(e.to_string()))?;
        self.update_raw(E::COLLECTION, id, &body).await
    }

    /// Delete a typed record by id.
    pub async fn delete<E: CrmEntity>(&self, id: &str) -> Result<(), ProxyError> {
        self.delete_raw(E::COLLECTION, id).await
    }

    async fn create_inner(
        &self,
        collection: &str,
        body: &Value,
        id_field: Option<&str>,
    ) -> Result<String, ProxyError> {
        let url = self.url_for(collection);
        let response = self.execute(Method::POST, &url, Some(body)).await?;

        let headers = response.headers().clone();
        let response_body = if response.status() == StatusCode::NO_CONTENT {
            Value::Null
        } else {
            response.json().await.unwrap_or(Value::Null)
        };

        extract_entity_id(&headers, &response_body, id_field)
    }
}

fn default_http_client(timeout_secs: Option<u64>) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)))
        .build()
        .expect("failed to build HTTP client")
}

fn upstream_error(status: StatusCode, body: String) -> ProxyError {
    ProxyError::Upstream {
        status: status.as_u16(),
        body,
    }
}

/// Pull the new record id out of a create response.
///
/// D365 answers a create with 204 No Content plus an `OData-EntityId`
/// header of the form `<service root>/contacts(<guid>)`. With
/// `return=representation` the id is in the body instead, under the
/// entity's primary key attribute.
fn extract_entity_id(
    headers: &HeaderMap,
    body: &Value,
    id_field: Option<&str>,
) -> Result<String, ProxyError> {
    for header in ["OData-EntityId", "Location"] {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            if let Some(id) = id_from_entity_url(value) {
                return Ok(id);
            }
        }
    }

    if let Some(field) = id_field {
        if let Some(id) = body.get(field).and_then(Value::as_str) {
            return Ok(id.to_string());
        }
    }

    Err(ProxyError::Parse(
        "create response carried no entity id".to_string(),
    ))
}

/// Extract the key between the final parentheses of an entity URL.
fn id_from_entity_url(url: &str) -> Option<String> {
    let start = url.rfind('(')?;
    let end = url.rfind(')')?;
    if start + 1 < end {
        Some(url[start + 1..end].to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticToken;
    use reqwest::header::HeaderValue;

    fn client() -> CrmClient {
        CrmClient::new(
            Arc::new(StaticToken::new("token")),
            "https://org.crm.dynamics.com",
        )
    }

    #[test]
    fn test_service_root_is_pinned_to_api_version() {
        assert_eq!(
            client().service_root(),
            "https://org.crm.dynamics.com/api/data/v9.2/"
        );
    }

    #[test]
    fn test_trailing_slash_on_base_url_is_normalized() {
        let client = CrmClient::new(
            Arc::new(StaticToken::new("token")),
            "https://org.crm.dynamics.com/",
        );
        assert_eq!(client.base_url(), "https://org.crm.dynamics.com");
        assert_eq!(
            client.service_root(),
            "https://org.crm.dynamics.com/api/data/v9.2/"
        );
    }

    #[test]
    fn test_url_for_relative_resource() {
        assert_eq!(
            client().url_for("contacts?$top=5"),
            "https://org.crm.dynamics.com/api/data/v9.2/contacts?$top=5"
        );
    }

    #[test]
    fn test_url_for_passes_absolute_links_through() {
        let link = "https://org.crm.dynamics.com/api/data/v9.2/contacts?$skiptoken=abc";
        assert_eq!(client().url_for(link), link);
    }

    #[test]
    fn test_upstream_error_keeps_status_and_body() {
        let err = upstream_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"token expired"}}"#.to_string(),
        );
        match &err {
            ProxyError::Upstream { status, body } => {
                assert_eq!(*status, 401);
                assert!(body.contains("token expired"));
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
        assert!(err.to_string().contains("status 401"));
    }

    #[test]
    fn test_auth_error_converts_to_proxy_error() {
        let auth_err = crate::auth::AuthError::Parse("bad json".to_string());
        let err: ProxyError = auth_err.into();
        assert!(matches!(err, ProxyError::Auth(_)));
    }

    #[test]
    fn test_id_from_entity_url() {
        assert_eq!(
            id_from_entity_url(
                "https://org.crm.dynamics.com/api/data/v9.2/contacts(3fa85f64-5717-4562-b3fc-2c963f66afa6)"
            ),
            Some("3fa85f64-5717-4562-b3fc-2c963f66afa6".to_string())
        );
        assert_eq!(id_from_entity_url("no parentheses here"), None);
        assert_eq!(id_from_entity_url("empty()"), None);
    }

    #[test]
    fn test_extract_entity_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::HeaderName::from_static("odata-entityid"),
            HeaderValue::from_static(
                "https://org.crm.dynamics.com/api/data/v9.2/leads(11111111-2222-3333-4444-555555555555)",
            ),
        );

        let id = extract_entity_id(&headers, &Value::Null, Some("leadid")).unwrap();
        assert_eq!(id, "11111111-2222-3333-4444-555555555555");
    }

    #[test]
    fn test_extract_entity_id_falls_back_to_body() {
        let body = serde_json::json!({
            "contactid": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "firstname": "Jane",
        });

        let id = extract_entity_id(&HeaderMap::new(), &body, Some("contactid")).unwrap();
        assert_eq!(id, "3fa85f64-5717-4562-b3fc-2c963f66afa6");
    }

    #[test]
    fn test_extract_entity_id_errors_when_absent() {
        let result = extract_entity_id(&HeaderMap::new(), &Value::Null, None);
        assert!(matches!(result, Err(ProxyError::Parse(_))));
    }

    #[test]
    fn test_odata_page_deserializes_annotations() {
        let json = r#"{
            "@odata.context": "https://org.crm.dynamics.com/api/data/v9.2/$metadata#contacts",
            "@odata.count": 42,
            "@odata.nextLink": "https://org.crm.dynamics.com/api/data/v9.2/contacts?$skiptoken=abc",
            "value": [{"contactid": "3fa85f64-5717-4562-b3fc-2c963f66afa6"}]
        }"#;

        let page: ODataPage<Value> = serde_json::from_str(json).unwrap();
        assert_eq!(page.count, Some(42));
        assert!(page.next_link.is_some());
        assert_eq!(page.value.len(), 1);
    }

    #[test]
    fn test_odata_page_tolerates_missing_value() {
        let page: ODataPage<Value> = serde_json::from_str("{}").unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
        assert!(page.count.is_none());
    }
}
