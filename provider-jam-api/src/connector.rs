//! Collections API connector implementation
//!
//! Implements `CollectionSource`, `RecordSource` and `TransferService` over
//! the collections REST API.

use async_trait::async_trait;
use bridge_traits::collections::{
    Collection, CollectionId, CollectionSource, RecordPage, RecordSource, TransferRequest,
    TransferResult, TransferService,
};
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::JamApiError;
use crate::types::{
    AddCompaniesRequest, AddCompaniesResponse, CollectionMetadata, CollectionPageResponse,
    ErrorBody,
};

/// Attempts for read requests
const MAX_READ_ATTEMPTS: u32 = 3;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Collections API connector
///
/// # Features
///
/// - Collection listing and paginated record listing with exponential backoff
///   on 429/5xx and transport failures
/// - Single-attempt transfer requests (a replayed PUT could double-count)
/// - Server error bodies mapped onto `BridgeError::NotFound` / `Rejected`
///
/// # Example
///
/// ```ignore
/// use provider_jam_api::JamApiConnector;
/// use bridge_traits::collections::CollectionSource;
///
/// let connector = JamApiConnector::new(http_client, "http://localhost:8000");
/// let collections = connector.list_collections().await?;
/// ```
pub struct JamApiConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// Base URL without trailing slash
    base_url: String,
}

impl JamApiConnector {
    /// Create a new connector
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client implementation
    /// * `base_url` - API root, e.g. `http://localhost:8000`
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.base_url, path))
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT)
    }

    /// Map a non-success response onto the provider error taxonomy
    fn status_error(response: &HttpResponse) -> JamApiError {
        let message = serde_json::from_slice::<ErrorBody>(&response.body)
            .map(|body| body.detail.into_message())
            .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).to_string());

        match response.status {
            404 => JamApiError::NotFound(message),
            400 | 422 => JamApiError::Rejected {
                status_code: response.status,
                message,
            },
            status_code => JamApiError::ApiError {
                status_code,
                message,
            },
        }
    }

    fn parse<T: DeserializeOwned>(response: &HttpResponse, what: &str) -> Result<T> {
        serde_json::from_slice(&response.body).map_err(|e| {
            JamApiError::ParseError(format!("Failed to parse {}: {}", what, e)).into()
        })
    }

    /// Execute a GET with retry logic
    ///
    /// Implements exponential backoff for rate limiting and transient errors.
    #[instrument(skip(self), fields(path = %path))]
    async fn get_with_retry(&self, path: &str, max_attempts: u32) -> Result<HttpResponse> {
        let mut attempt = 0;

        loop {
            let request = self.request(HttpMethod::Get, path);

            match self.http_client.execute(request).await {
                Ok(response) if response.is_success() => {
                    debug!("API request succeeded: status={}", response.status);
                    return Ok(response);
                }
                Ok(response) if response.status == 429 || response.is_server_error() => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        warn!(
                            "API request failed after {} attempts: status={}",
                            max_attempts, response.status
                        );
                        return Err(Self::status_error(&response).into());
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): status={}, retrying in {}ms",
                        attempt, max_attempts, response.status, backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
                Ok(response) => {
                    // Client error - don't retry
                    warn!("API request failed: status={}", response.status);
                    return Err(Self::status_error(&response).into());
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        warn!("API request failed after {} attempts: {}", max_attempts, e);
                        return Err(e);
                    }

                    let backoff_ms = 100u64 * 2u64.pow(attempt);
                    warn!(
                        "API request failed (attempt {}/{}): {}, retrying in {}ms",
                        attempt, max_attempts, e, backoff_ms
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                }
            }
        }
    }
}

#[async_trait]
impl CollectionSource for JamApiConnector {
    #[instrument(skip(self))]
    async fn list_collections(&self) -> Result<Vec<Collection>> {
        let response = self.get_with_retry("/collections", MAX_READ_ATTEMPTS).await?;
        let metadata: Vec<CollectionMetadata> = Self::parse(&response, "collection list")?;

        info!("Listed {} collections", metadata.len());
        Ok(metadata.into_iter().map(Collection::from).collect())
    }
}

#[async_trait]
impl RecordSource for JamApiConnector {
    #[instrument(skip(self), fields(collection_id = %collection_id))]
    async fn list_records(
        &self,
        collection_id: &CollectionId,
        offset: u32,
        limit: u32,
    ) -> Result<RecordPage> {
        let path = format!(
            "/collections/{}?offset={}&limit={}",
            urlencoding::encode(collection_id.as_str()),
            offset,
            limit
        );

        let response = self.get_with_retry(&path, MAX_READ_ATTEMPTS).await?;
        let page: CollectionPageResponse = Self::parse(&response, "collection page")?;

        debug!(
            records = page.companies.len(),
            total = page.total,
            "Fetched collection page"
        );
        Ok(page.into())
    }
}

#[async_trait]
impl TransferService for JamApiConnector {
    #[instrument(skip(self, request), fields(
        origin = %request.origin_collection_id,
        destination = %request.destination_collection_id,
        count = request.record_ids.len()
    ))]
    async fn move_records(&self, request: &TransferRequest) -> Result<TransferResult> {
        let http_request = self
            .request(HttpMethod::Put, "/collections/add-companies")
            .json(&AddCompaniesRequest::from(request))?;

        let response = self.http_client.execute(http_request).await?;
        if !response.is_success() {
            warn!("Transfer request failed: status={}", response.status);
            return Err(Self::status_error(&response).into());
        }

        let body: AddCompaniesResponse = Self::parse(&response, "transfer response")?;
        info!(
            records_added = body.companies_added,
            already_present = body.companies_already_in_destination,
            "{}",
            body.message
        );
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::BridgeError;
    use bytes::Bytes;
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        HttpClient {}

        #[async_trait]
        impl HttpClient for HttpClient {
            async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
        }
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    #[tokio::test]
    async fn test_list_collections_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.url, "http://localhost:8000/collections");
            assert_eq!(req.method, HttpMethod::Get);
            Ok(response(
                200,
                r#"[{"id": "c1", "collection_name": "My List"},
                    {"id": "c2", "collection_name": "Liked Companies List"}]"#,
            ))
        });

        let connector = JamApiConnector::new(Arc::new(mock_http), "http://localhost:8000/");
        let collections = connector.list_collections().await.unwrap();

        assert_eq!(collections.len(), 2);
        assert_eq!(collections[0].id, CollectionId::new("c1"));
        assert_eq!(collections[1].name, "Liked Companies List");
    }

    #[tokio::test]
    async fn test_list_records_builds_query() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(
                req.url,
                "http://localhost:8000/collections/c1?offset=25&limit=25"
            );
            Ok(response(
                200,
                r#"{"id": "c1", "collection_name": "My List",
                    "companies": [{"id": 26, "company_name": "Acme", "liked": false}],
                    "total": 26}"#,
            ))
        });

        let connector = JamApiConnector::new(Arc::new(mock_http), "http://localhost:8000");
        let page = connector
            .list_records(&CollectionId::new("c1"), 25, 25)
            .await
            .unwrap();

        assert_eq!(page.total, 26);
        assert_eq!(page.records[0].id, 26);
        assert_eq!(page.records[0].name, "Acme");
    }

    #[tokio::test]
    async fn test_read_retries_on_server_error() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();

        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(503, "unavailable")));
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(response(200, "[]")));

        let connector = JamApiConnector::new(Arc::new(mock_http), "http://localhost:8000");
        let collections = connector.list_collections().await.unwrap();

        assert!(collections.is_empty());
    }

    #[tokio::test]
    async fn test_read_gives_up_after_max_attempts() {
        let mut mock_http = MockHttpClient::new();

        mock_http
            .expect_execute()
            .times(MAX_READ_ATTEMPTS as usize)
            .returning(|_| Ok(response(503, r#"{"detail": "busy"}"#)));

        let connector = JamApiConnector::new(Arc::new(mock_http), "http://localhost:8000");
        let err = connector
            .list_records(&CollectionId::new("c1"), 0, 25)
            .await
            .unwrap_err();

        assert!(matches!(err, BridgeError::OperationFailed(_)));
    }

    #[tokio::test]
    async fn test_move_records_single_attempt() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|req| {
            assert_eq!(req.method, HttpMethod::Put);
            assert!(req.url.ends_with("/collections/add-companies"));
            let body: serde_json::Value =
                serde_json::from_slice(req.body.as_ref().unwrap()).unwrap();
            assert_eq!(body["company_ids"], serde_json::json!([1, 2, 3]));
            Ok(response(500, r#"{"detail": "Failed to move companies"}"#))
        });

        let connector = JamApiConnector::new(Arc::new(mock_http), "http://localhost:8000");
        let request = TransferRequest::new(vec![1, 2, 3], "a".into(), "b".into());
        let err = connector.move_records(&request).await.unwrap_err();

        assert!(matches!(err, BridgeError::OperationFailed(_)));
    }

    #[tokio::test]
    async fn test_move_records_success() {
        let mut mock_http = MockHttpClient::new();

        mock_http.expect_execute().times(1).returning(|_| {
            Ok(response(
                200,
                r#"{"message": "Successfully moved 2 companies to destination collection",
                    "companies_added": 2, "companies_already_in_destination": 1}"#,
            ))
        });

        let connector = JamApiConnector::new(Arc::new(mock_http), "http://localhost:8000");
        let request = TransferRequest::new(vec![1, 2, 3], "a".into(), "b".into());
        let result = connector.move_records(&request).await.unwrap();

        assert_eq!(result, TransferResult::new(2, 1));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let mut mock_http = MockHttpClient::new();
        let mut seq = mockall::Sequence::new();

        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(response(
                    404,
                    r#"{"detail": "Destination collection b not found"}"#,
                ))
            });
        mock_http
            .expect_execute()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(response(
                    422,
                    r#"{"detail": [{"loc": ["body", "company_ids"], "msg": "company_ids must be unique", "type": "value_error"}]}"#,
                ))
            });

        let connector = JamApiConnector::new(Arc::new(mock_http), "http://localhost:8000");
        let request = TransferRequest::new(vec![1], "a".into(), "b".into());

        match connector.move_records(&request).await {
            Err(BridgeError::NotFound(msg)) => assert!(msg.contains("Destination collection b")),
            other => panic!("expected NotFound, got {:?}", other),
        }
        match connector.move_records(&request).await {
            Err(BridgeError::Rejected(msg)) => assert_eq!(msg, "company_ids must be unique"),
            other => panic!("expected Rejected, got {:?}", other),
        }
    }
}
