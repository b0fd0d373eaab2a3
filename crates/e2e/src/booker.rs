//! Booking API client

use async_trait::async_trait;
use bookcheck_common::BookingPayload;
use reqwest::header::{ACCEPT, COOKIE};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::BookerConfig;
use crate::error::E2eResult;

/// Status code and decoded body of one API call.
///
/// Non-JSON bodies (restful-booker answers `Created` to ping and delete)
/// are kept as a JSON string.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn from_text(status: u16, text: String) -> Self {
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(_) => Value::String(text),
        };
        Self { status, body }
    }
}

/// Operations of the booking API used by the lifecycle test
#[async_trait]
pub trait BookingApi: Send + Sync {
    async fn ping(&self) -> E2eResult<ApiResponse>;

    /// `POST /auth`, returns `{"token": ...}` on success
    async fn auth(&self, username: &str, password: &str) -> E2eResult<ApiResponse>;

    /// `POST /booking`, returns `{"bookingid": n, "booking": {...}}`
    async fn create(&self, payload: &BookingPayload) -> E2eResult<ApiResponse>;

    async fn get(&self, id: u64) -> E2eResult<ApiResponse>;

    async fn update(&self, id: u64, token: &str, payload: &BookingPayload) -> E2eResult<ApiResponse>;

    async fn delete(&self, id: u64, token: &str) -> E2eResult<ApiResponse>;
}

/// reqwest-backed [`BookingApi`]
pub struct BookerClient {
    client: reqwest::Client,
    config: BookerConfig,
}

impl BookerClient {
    pub fn new(config: BookerConfig) -> E2eResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &BookerConfig {
        &self.config
    }

    async fn send(&self, label: &str, request: reqwest::RequestBuilder) -> E2eResult<ApiResponse> {
        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(%label, status, bytes = text.len(), "booking API response");
        Ok(ApiResponse::from_text(status, text))
    }

    fn token_cookie(token: &str) -> String {
        format!("token={}", token)
    }
}

#[async_trait]
impl BookingApi for BookerClient {
    async fn ping(&self) -> E2eResult<ApiResponse> {
        self.send("ping", self.client.get(self.config.url("/ping"))).await
    }

    async fn auth(&self, username: &str, password: &str) -> E2eResult<ApiResponse> {
        let body = json!({ "username": username, "password": password });
        self.send("auth", self.client.post(self.config.url("/auth")).json(&body))
            .await
    }

    async fn create(&self, payload: &BookingPayload) -> E2eResult<ApiResponse> {
        self.send(
            "create",
            self.client.post(self.config.url("/booking")).json(payload),
        )
        .await
    }

    async fn get(&self, id: u64) -> E2eResult<ApiResponse> {
        let url = self.config.url(&format!("/booking/{}", id));
        self.send("get", self.client.get(url)).await
    }

    async fn update(&self, id: u64, token: &str, payload: &BookingPayload) -> E2eResult<ApiResponse> {
        let url = self.config.url(&format!("/booking/{}", id));
        let request = self
            .client
            .put(url)
            .header(COOKIE, Self::token_cookie(token))
            .json(payload);
        self.send("update", request).await
    }

    async fn delete(&self, id: u64, token: &str) -> E2eResult<ApiResponse> {
        let url = self.config.url(&format!("/booking/{}", id));
        let request = self
            .client
            .delete(url)
            .header(COOKIE, Self::token_cookie(token));
        self.send("delete", request).await
    }
}
