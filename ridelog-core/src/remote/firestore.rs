//! HTTP client for a Firestore-compatible document collection.
//!
//! Talks to the Firestore REST API (or its emulator):
//! - list:   `GET    {documents}/{collection}?pageSize=..&pageToken=..`
//! - create: `POST   {documents}/{collection}`
//! - update: `PATCH  {documents}/{collection}/{id}` (no update mask, so the
//!   whole document is replaced)
//! - delete: `DELETE {documents}/{collection}/{id}`
//! - query:  `POST   {documents}:runQuery`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};

use super::document::{area_query, encode_fields, ErrorBody, ListResponse, QueryResult, RawDocument};
use super::{require_id, RideCollection, RIDES_COLLECTION};
use crate::error::{RemoteError, SyncError};
use crate::models::{Ride, RideDetails};
use crate::ride_id::RideId;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";

const PAGE_SIZE: &str = "300";

/// Connection settings for [`FirestoreCollection`].
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    /// Scheme and host, e.g. `https://firestore.googleapis.com` or
    /// `http://localhost:8080` for the emulator
    pub base_url: String,
    pub collection: String,
    /// Web API key, sent as the `key` query parameter
    pub api_key: Option<String>,
    /// OAuth/ID token, sent as a bearer token
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            collection: RIDES_COLLECTION.to_string(),
            api_key: None,
            auth_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// `{base}/v1/projects/{project}/databases/{database}/documents`
    pub fn documents_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.project_id,
            self.database
        )
    }
}

/// Ride collection stored in Firestore.
#[derive(Debug, Clone)]
pub struct FirestoreCollection {
    http: Client,
    documents_url: String,
    collection: String,
    api_key: Option<String>,
    auth_token: Option<String>,
}

impl FirestoreCollection {
    pub fn new(config: FirestoreConfig) -> Result<Self, RemoteError> {
        if config.project_id.trim().is_empty() {
            return Err(RemoteError::NotConfigured(
                "set firestore.project_id in the config file or RIDELOG_PROJECT_ID".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        Ok(Self {
            http,
            documents_url: config.documents_url(),
            collection: config.collection,
            api_key: config.api_key,
            auth_token: config.auth_token,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.documents_url, self.collection)
    }

    fn document_url(&self, id: &RideId) -> String {
        format!(
            "{}/{}",
            self.collection_url(),
            urlencoding::encode(id.as_str())
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(key) = &self.api_key {
            builder = builder.query(&[("key", key)]);
        }
        if let Some(token) = &self.auth_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send a request and turn non-success statuses into errors carrying
    /// the server's message.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, RemoteError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error.message)
            .unwrap_or_else(|_| format!("Server returned status {}", status));
        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn fetch_all(&self) -> Result<Vec<Ride>, RemoteError> {
        let mut rides = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut builder = self
                .request(Method::GET, &self.collection_url())
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }

            let page: ListResponse = self.send(builder).await?.json().await?;
            rides.extend(decode_documents(page.documents));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(rides)
    }

    async fn insert(&self, details: &RideDetails) -> Result<Ride, RemoteError> {
        let builder = self
            .request(Method::POST, &self.collection_url())
            .json(&encode_fields(details));
        let document: RawDocument = self.send(builder).await?.json().await?;
        let id = RideId::from_document_name(&document.name)
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        Ok(details.clone().into_ride(id))
    }

    async fn replace(&self, id: &RideId, details: &RideDetails) -> Result<(), RemoteError> {
        let builder = self
            .request(Method::PATCH, &self.document_url(id))
            .json(&encode_fields(details));
        self.send(builder).await?;
        Ok(())
    }

    async fn remove(&self, id: &RideId) -> Result<(), RemoteError> {
        self.send(self.request(Method::DELETE, &self.document_url(id)))
            .await?;
        Ok(())
    }

    async fn query_area(&self, area: &str) -> Result<Vec<Ride>, RemoteError> {
        let url = format!("{}:runQuery", self.documents_url);
        let builder = self
            .request(Method::POST, &url)
            .json(&area_query(&self.collection, area));
        let results: Vec<QueryResult> = self.send(builder).await?.json().await?;
        Ok(decode_documents(
            results.into_iter().filter_map(|r| r.document),
        ))
    }
}

/// Decode documents, skipping any that do not hold a valid ride.
fn decode_documents(documents: impl IntoIterator<Item = RawDocument>) -> Vec<Ride> {
    documents
        .into_iter()
        .filter_map(|doc| {
            let name = doc.name.clone();
            doc.into_ride()
                .inspect_err(|e| tracing::warn!("Skipping document {}: {}", name, e))
                .ok()
        })
        .collect()
}

#[async_trait]
impl RideCollection for FirestoreCollection {
    async fn list_all(&self) -> Result<Vec<Ride>, RemoteError> {
        tracing::debug!("Listing {}", self.collection_url());
        self.fetch_all()
            .await
            .inspect_err(|e| tracing::error!("Error getting rides: {}", e))
    }

    async fn create(&self, details: &RideDetails) -> Result<Ride, RemoteError> {
        self.insert(details)
            .await
            .inspect_err(|e| tracing::error!("Error adding ride: {}", e))
    }

    async fn update_by_id(&self, ride: &Ride) -> Result<(), SyncError> {
        let id = require_id(ride, "update")?;
        self.replace(id, &ride.details)
            .await
            .inspect_err(|e| tracing::error!("Error updating ride {}: {}", id, e))?;
        Ok(())
    }

    async fn delete_by_id(&self, id: &RideId) -> Result<(), RemoteError> {
        self.remove(id)
            .await
            .inspect_err(|e| tracing::error!("Error deleting ride {}: {}", id, e))
    }

    async fn list_by_area(&self, area: &str) -> Result<Vec<Ride>, RemoteError> {
        self.query_area(area)
            .await
            .inspect_err(|e| tracing::error!("Error getting rides for area {}: {}", area, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, RouteType};
    use axum::{
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const DOCS: &str = "/v1/projects/demo/databases/(default)/documents";

    /// Requests seen by the fake server, as `(method, path, body)`.
    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<(String, String, Value)>>>,
        headers: Arc<Mutex<Vec<HeaderMap>>>,
    }

    impl Recorder {
        fn record(&self, method: &str, path: String, body: Value, headers: HeaderMap) {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), path, body));
            self.headers.lock().unwrap().push(headers);
        }

        fn calls(&self) -> Vec<(String, String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn doc(id: &str, area: &str, trail: &str) -> Value {
        let details = RideDetails::new(area, trail, Difficulty::Intermediate, RouteType::Loop)
            .with_distance("10 miles")
            .with_elevation("1,200 ft")
            .with_rating(4);
        let mut body = encode_fields(&details);
        body["name"] = json!(format!("projects/demo/databases/(default)/documents/rides/{}", id));
        body
    }

    async fn list_rides(
        State(rec): State<Recorder>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> Json<Value> {
        rec.record("GET", "rides".into(), json!(params), headers);
        match params.get("pageToken").map(String::as_str) {
            None => Json(json!({
                "documents": [doc("r1", "Everstoke", "Ridge Loop")],
                "nextPageToken": "page-2"
            })),
            Some(_) => Json(json!({
                "documents": [
                    doc("r2", "Pine Hollow", "Creek Run"),
                    {"name": "projects/demo/databases/(default)/documents/rides/bad", "fields": {}}
                ]
            })),
        }
    }

    async fn create_ride(
        State(rec): State<Recorder>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        rec.record("POST", "rides".into(), body.clone(), headers);
        let mut created = body;
        created["name"] = json!("projects/demo/databases/(default)/documents/rides/abc123");
        Json(created)
    }

    async fn patch_ride(
        State(rec): State<Recorder>,
        Path(id): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        rec.record("PATCH", id, body.clone(), headers);
        Json(body)
    }

    async fn delete_ride(
        State(rec): State<Recorder>,
        Path(id): Path<String>,
        headers: HeaderMap,
    ) -> Json<Value> {
        rec.record("DELETE", id, Value::Null, headers);
        Json(json!({}))
    }

    async fn run_query(
        State(rec): State<Recorder>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        rec.record("POST", ":runQuery".into(), body, headers);
        Json(json!([
            {"document": doc("r1", "Everstoke", "Ridge Loop"), "readTime": "2024-01-01T00:00:00Z"},
            {"readTime": "2024-01-01T00:00:00Z"}
        ]))
    }

    async fn denied() -> (StatusCode, Json<Value>) {
        (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {
                "code": 403,
                "message": "Missing or insufficient permissions.",
                "status": "PERMISSION_DENIED"
            }})),
        )
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn fake_firestore() -> (FirestoreCollection, Recorder) {
        let rec = Recorder::default();
        let router = Router::new()
            .route(
                &format!("{}/rides", DOCS),
                get(list_rides).post(create_ride),
            )
            .route(
                &format!("{}/rides/{{id}}", DOCS),
                axum::routing::patch(patch_ride).delete(delete_ride),
            )
            .route(&format!("{}:runQuery", DOCS), post(run_query))
            .with_state(rec.clone());
        let base_url = serve(router).await;

        let mut config = FirestoreConfig::new("demo").with_base_url(base_url);
        config.api_key = Some("test-key".to_string());
        config.auth_token = Some("token-1".to_string());
        (FirestoreCollection::new(config).unwrap(), rec)
    }

    fn ridge_loop() -> RideDetails {
        RideDetails::new("Everstoke", "Ridge Loop", Difficulty::Easy, RouteType::Loop)
            .with_distance("5 miles")
            .with_elevation("500 ft")
            .with_rating(4)
            .with_time_to_drive("20 minutes")
    }

    #[test]
    fn test_documents_url() {
        let config = FirestoreConfig::new("demo").with_base_url("http://localhost:8080/");
        assert_eq!(
            config.documents_url(),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents"
        );
    }

    #[test]
    fn test_missing_project_is_not_configured() {
        let err = FirestoreCollection::new(FirestoreConfig::new("  ")).unwrap_err();
        assert!(matches!(err, RemoteError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_list_all_follows_pages_and_skips_bad_documents() {
        let (client, rec) = fake_firestore().await;

        let rides = client.list_all().await.unwrap();
        let trails: Vec<_> = rides.iter().map(|r| r.details.trail_name.as_str()).collect();
        assert_eq!(trails, vec!["Ridge Loop", "Creek Run"]);
        assert_eq!(rides[0].id.as_ref().unwrap().as_str(), "r1");

        let calls = rec.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].2["pageSize"], "300");
        assert_eq!(calls[0].2["key"], "test-key");
        assert_eq!(calls[1].2["pageToken"], "page-2");
    }

    #[tokio::test]
    async fn test_create_returns_assigned_id() {
        let (client, rec) = fake_firestore().await;

        let ride = client.create(&ridge_loop()).await.unwrap();
        assert_eq!(ride.id.unwrap().as_str(), "abc123");
        assert_eq!(ride.details, ridge_loop());

        let calls = rec.calls();
        assert_eq!(calls[0].0, "POST");
        assert_eq!(calls[0].2["fields"]["trailName"]["stringValue"], "Ridge Loop");

        let headers = rec.headers.lock().unwrap();
        assert_eq!(headers[0]["authorization"], "Bearer token-1");
    }

    #[tokio::test]
    async fn test_update_sends_full_document() {
        let (client, rec) = fake_firestore().await;

        let ride = ridge_loop().with_notes("muddy").into_ride(RideId::parse("abc123").unwrap());
        client.update_by_id(&ride).await.unwrap();

        let calls = rec.calls();
        assert_eq!(calls[0].0, "PATCH");
        assert_eq!(calls[0].1, "abc123");
        assert_eq!(calls[0].2["fields"]["notes"]["stringValue"], "muddy");
        assert_eq!(calls[0].2["fields"].as_object().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_update_without_id_makes_no_request() {
        let (client, rec) = fake_firestore().await;

        let err = client
            .update_by_id(&Ride::unsaved(ridge_loop()))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(rec.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let (client, rec) = fake_firestore().await;

        client
            .delete_by_id(&RideId::parse("abc123").unwrap())
            .await
            .unwrap();
        assert_eq!(rec.calls()[0].0, "DELETE");
        assert_eq!(rec.calls()[0].1, "abc123");
    }

    #[tokio::test]
    async fn test_list_by_area_uses_structured_query() {
        let (client, rec) = fake_firestore().await;

        let rides = client.list_by_area("Everstoke").await.unwrap();
        assert_eq!(rides.len(), 1);
        assert_eq!(rides[0].details.area, "Everstoke");

        let body = &rec.calls()[0].2;
        assert_eq!(
            body["structuredQuery"]["where"]["fieldFilter"]["value"]["stringValue"],
            "Everstoke"
        );
    }

    #[tokio::test]
    async fn test_error_message_comes_from_server() {
        let router = Router::new().route(&format!("{}/rides", DOCS), get(denied));
        let base_url = serve(router).await;
        let client = FirestoreCollection::new(FirestoreConfig::new("demo").with_base_url(base_url))
            .unwrap();

        let err = client.list_all().await.unwrap_err();
        assert_eq!(
            err,
            RemoteError::Status {
                status: 403,
                message: "Missing or insufficient permissions.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_error_without_body_reports_status() {
        let router = Router::new().route(
            &format!("{}/rides", DOCS),
            get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base_url = serve(router).await;
        let client = FirestoreCollection::new(FirestoreConfig::new("demo").with_base_url(base_url))
            .unwrap();

        let err = client.list_all().await.unwrap_err();
        assert!(err.to_string().starts_with("Server returned status 503"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = FirestoreCollection::new(
            FirestoreConfig::new("demo").with_base_url(format!("http://{}", addr)),
        )
        .unwrap();
        let err = client.list_all().await.unwrap_err();
        assert!(matches!(err, RemoteError::Http(_)));
    }
}
