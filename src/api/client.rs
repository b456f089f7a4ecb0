use super::logging::{debug_payload_enabled, emit_debug_payload};
use super::Transport;
use crate::config::Config;
use crate::types::{Thread, ThreadWithMessages};
use crate::util::is_local_endpoint_url;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::pin::Pin;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// HTTP transport against the assistant backend's `/threads` routes.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
        })
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.api_url)
            .with_context(|| format!("invalid API URL '{}'", self.api_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("API URL '{}' cannot be a base", self.api_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<R: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<R> {
        let response = request
            .send()
            .await
            .map_err(|error| map_api_request_error(error, url.as_str()))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, url.as_str()))?;

        response
            .json::<R>()
            .await
            .with_context(|| format!("unexpected response body from '{url}'"))
    }
}

#[async_trait]
impl Transport for ApiClient {
    async fn list_threads(&self) -> Result<Vec<Thread>> {
        let url = self.endpoint(&["threads"])?;
        self.send_json(self.http.get(url.clone()), &url).await
    }

    async fn create_thread(&self, title: &str) -> Result<Thread> {
        let url = self.endpoint(&["threads"])?;
        let payload = json!({ "title": title });
        if debug_payload_enabled() {
            emit_debug_payload(url.as_str(), &payload);
        }
        self.send_json(self.http.post(url.clone()).json(&payload), &url)
            .await
    }

    async fn fetch_thread(&self, thread_id: &str) -> Result<ThreadWithMessages> {
        let url = self.endpoint(&["threads", thread_id])?;
        self.send_json(self.http.get(url.clone()), &url).await
    }

    async fn rename_thread(&self, thread_id: &str, title: &str) -> Result<Thread> {
        let url = self.endpoint(&["threads", thread_id])?;
        let payload = json!({ "title": title });
        if debug_payload_enabled() {
            emit_debug_payload(url.as_str(), &payload);
        }
        self.send_json(self.http.patch(url.clone()).json(&payload), &url)
            .await
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        let url = self.endpoint(&["threads", thread_id])?;
        self.http
            .delete(url.clone())
            .send()
            .await
            .map_err(|error| map_api_request_error(error, url.as_str()))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, url.as_str()))?;
        Ok(())
    }

    async fn send_query(&self, thread_id: &str, query: &str) -> Result<ByteStream> {
        let url = self.endpoint(&["threads", thread_id, "query", "stream"])?;
        let payload = json!({ "query": query });
        if debug_payload_enabled() {
            emit_debug_payload(url.as_str(), &payload);
        }

        let response = self
            .http
            .post(url.clone())
            .header("accept", "text/event-stream")
            .json(&payload)
            .send()
            .await
            .map_err(|error| map_api_request_error(error, url.as_str()))?
            .error_for_status()
            .map_err(|error| map_api_request_error(error, url.as_str()))?;

        let request_url_for_stream = url.to_string();
        let stream = response.bytes_stream().map(move |item| {
            item.map_err(|error| map_api_request_error(error, &request_url_for_stream))
        });
        Ok(Box::pin(stream))
    }
}

fn map_api_request_error(error: reqwest::Error, request_url: &str) -> anyhow::Error {
    if error.is_connect() && is_local_endpoint_url(request_url) {
        return anyhow!(
            "cannot reach local API endpoint '{}': {}. Start the assistant backend or update CLINCHAT_API_URL.",
            request_url,
            error
        );
    }
    if error.is_connect() {
        return anyhow!("cannot reach API endpoint '{}': {}", request_url, error);
    }
    if error.is_timeout() {
        return anyhow!("API request to '{}' timed out: {}", request_url, error);
    }
    if let Some(status) = error.status() {
        return anyhow!(
            "API endpoint '{}' returned HTTP {}: {}",
            request_url,
            status,
            error
        );
    }
    anyhow!("API request to '{}' failed: {}", request_url, error)
}
