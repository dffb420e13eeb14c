use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::ApiError;
use crate::models::{PageResponse, Sort};

/// Every endpoint of the task service lives under this prefix
pub const API_PREFIX: &str = "api";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// What to send: method, optional JSON body and query parameters
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Vec<u8>>,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post() -> Self {
        Self {
            method: Method::Post,
            ..Self::default()
        }
    }

    pub fn post_json<B: Serialize + ?Sized>(body: &B) -> Result<Self, ApiError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| ApiError::Client(format!("could not encode request body: {}", e)))?;
        Ok(Self {
            method: Method::Post,
            body: Some(bytes),
            query: Vec::new(),
        })
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// The service's response envelope `{success, code, message, data}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: Option<T>) -> Self {
        Self {
            success: true,
            code: None,
            message: None,
            data,
        }
    }

    /// Failure text for a `success = false` envelope
    pub fn failure_message(&self) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => match self.code {
                Some(code) => format!("Request failed with code {}", code),
                None => "Request failed".to_string(),
            },
        }
    }
}

/// A page as the UI consumes it: all fields present.
/// `success` is always `true`; failures never become a `PageData`.
#[derive(Debug, Clone, PartialEq)]
pub struct PageData<T> {
    pub success: bool,
    pub list: Vec<T>,
    pub total: u64,
    pub current: u32,
    pub page_size: u32,
}

impl<T> Default for PageData<T> {
    fn default() -> Self {
        Self {
            success: true,
            list: Vec::new(),
            total: 0,
            current: 1,
            page_size: 10,
        }
    }
}

/// Normalize a possibly absent or partial server page
pub fn convert_page_data<T>(page: Option<PageResponse<T>>) -> PageData<T> {
    let defaults = PageData::default();
    match page {
        None => defaults,
        Some(page) => PageData {
            success: true,
            list: page.list.unwrap_or_default(),
            total: page.total.unwrap_or(defaults.total),
            current: page.current.unwrap_or(defaults.current),
            page_size: page.page_size.unwrap_or(defaults.page_size),
        },
    }
}

/// Order clause for the list endpoints, e.g. `dueDate ASC`
pub fn order_by(sort: Option<&Sort>) -> Option<String> {
    sort.map(|sort| format!("{} {}", sort.field.column(), sort.order.token()))
}

/// Turn a response body into an envelope. Bodies that are not wrapped in
/// `{success, ...}` are treated as successful payloads.
pub fn decode_envelope<T: DeserializeOwned>(path: &str, body: &str) -> Result<ApiEnvelope<T>, ApiError> {
    let decode_err = |e: serde_json::Error| ApiError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    };

    if body.trim().is_empty() {
        return Ok(ApiEnvelope::ok(None));
    }

    let value: Value = serde_json::from_str(body).map_err(decode_err)?;
    let is_envelope = value
        .as_object()
        .is_some_and(|object| object.get("success").is_some_and(Value::is_boolean));

    if is_envelope {
        serde_json::from_value(value).map_err(decode_err)
    } else if value.is_null() {
        Ok(ApiEnvelope::ok(None))
    } else {
        let data = serde_json::from_value(value).map_err(decode_err)?;
        Ok(ApiEnvelope::ok(Some(data)))
    }
}

/// Shared HTTP gateway to the task service
#[derive(Clone)]
pub struct RequestClient {
    base_url: String,
    client: Client,
}

impl RequestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for a service path such as `tasks/listTasks`
    pub fn endpoint(&self, path: &str) -> String {
        let suffix = path.trim_start_matches('/');
        format!("{}/{}/{}", self.base_url, API_PREFIX, suffix)
    }

    fn build(&self, path: &str, options: RequestOptions) -> Result<RequestBuilder, ApiError> {
        let endpoint = self.endpoint(path);
        let url = if options.query.is_empty() {
            Url::parse(&endpoint)
        } else {
            Url::parse_with_params(&endpoint, &options.query)
        }
        .map_err(|e| ApiError::Client(format!("invalid URL {}: {}", endpoint, e)))?;

        let mut request = match options.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        if let Some(body) = options.body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body);
        }
        Ok(request)
    }

    /// Send a request and decode the envelope without judging `success`
    pub async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let method = options.method;
        let request = self.build(path, options)?;
        debug!(?method, path, "sending request");

        let response = request.send().await.map_err(|e| ApiError::Transport {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Transport {
            path: path.to_string(),
            message: format!("could not read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(ApiError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        decode_envelope(path, &body)
    }

    /// Strict mode: any failure, including `success = false`, is an error
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Option<T>, ApiError> {
        let envelope = self.send::<T>(path, options).await?;
        if envelope.success {
            Ok(envelope.data)
        } else {
            Err(ApiError::Reported(envelope.failure_message()))
        }
    }

    /// Best-effort mode: failures are logged and yield `None`
    pub async fn try_fetch<T: DeserializeOwned>(&self, path: &str, options: RequestOptions) -> Option<T> {
        match self.fetch(path, options).await {
            Ok(data) => data,
            Err(e) => {
                warn!(path, error = %e, "request failed, using empty result");
                None
            }
        }
    }
}
