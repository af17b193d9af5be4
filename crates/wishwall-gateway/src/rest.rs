use reqwest::{Client, RequestBuilder, Response};
use tracing::debug;
use url::Url;

use wishwall_types::api::{ApiErrorBody, DISPLAY_COLUMNS, RemoteRecord};
use wishwall_types::{Entry, RemoteError, RemoteErrorKind};

use crate::classify::{classify_response, classify_transport, describe};
use crate::{RemoteStore, Subscription, realtime};

/// Connection settings for a hosted PostgREST + realtime backend.
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: Url,
    pub api_key: String,
    pub table: String,
}

impl RestConfig {
    pub fn new(base_url: &str, api_key: &str, table: &str) -> Result<Self, RemoteError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| RemoteError::new(RemoteErrorKind::Other, format!("invalid backend URL: {}", e)))?;

        // Url::join replaces the last path segment unless the base ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            table: table.to_string(),
        })
    }

    pub fn table_url(&self) -> Result<Url, RemoteError> {
        self.base_url
            .join(&format!("rest/v1/{}", self.table))
            .map_err(|e| RemoteError::new(RemoteErrorKind::Other, format!("invalid table URL: {}", e)))
    }
}

/// Remote store speaking the PostgREST HTTP dialect, with live updates over
/// the realtime websocket.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    config: RestConfig,
}

impl RestBackend {
    pub fn new(config: RestConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &RestConfig {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    fn insert_request(&self, entry: &Entry) -> Result<RequestBuilder, RemoteError> {
        let rows = [RemoteRecord::from(entry)];
        Ok(self
            .client
            .post(self.config.table_url()?)
            .header("Prefer", "return=minimal")
            .json(&rows))
    }

    fn query_request(&self, room_id: &str) -> Result<RequestBuilder, RemoteError> {
        let filter = format!("eq.{}", room_id);
        Ok(self.client.get(self.config.table_url()?).query(&[
            ("select", DISPLAY_COLUMNS),
            ("room_id", filter.as_str()),
            ("order", "created_at.desc"),
        ]))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| RemoteError::new(classify_transport(&e), e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.bytes().await.unwrap_or_default();
        Err(error_from_body(status, &body))
    }
}

/// Classify a non-success reply. Bodies that are not PostgREST JSON still
/// classify by status alone.
fn error_from_body(status: u16, body: &[u8]) -> RemoteError {
    let body: ApiErrorBody = serde_json::from_slice(body).unwrap_or_default();
    RemoteError::new(classify_response(status, &body), describe(status, &body))
}

impl RemoteStore for RestBackend {
    async fn insert(&self, entry: &Entry) -> Result<(), RemoteError> {
        self.send(self.insert_request(entry)?).await?;
        debug!("Inserted wish {} into {}", entry.id, self.config.table);
        Ok(())
    }

    async fn query_by_room(&self, room_id: &str) -> Result<Vec<Entry>, RemoteError> {
        let response = self.send(self.query_request(room_id)?).await?;

        let rows: Vec<RemoteRecord> = response.json().await.map_err(|e| {
            RemoteError::new(RemoteErrorKind::Other, format!("undecodable room listing: {}", e))
        })?;

        Ok(rows.into_iter().map(Entry::from).collect())
    }

    async fn subscribe(&self, room_id: &str) -> Result<Subscription, RemoteError> {
        realtime::subscribe(&self.config, room_id).await
    }
}
