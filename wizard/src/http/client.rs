//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};
use url::Url;

use openapi_client::models::ErrorResponse;

use crate::errors::WizardError;

/// HTTP client for the marketplace API
pub struct HttpClient {
    client: Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, WizardError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| WizardError::ConfigError(format!("Invalid base URL {}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(WizardError::ConfigError(format!(
                "Base URL cannot carry a path: {}",
                base_url
            )));
        }

        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            base_url,
            auth_token: None,
        })
    }

    /// Attach a bearer token to every request
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Build an endpoint URL from path segments, escaping each one
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, WizardError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| WizardError::ConfigError(format!("Invalid base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, url: Url, fallback: &str) -> Result<T, WizardError> {
        debug!("GET {}", url);
        let request = self.authorize(self.client.get(url.clone()));
        self.execute(request, "GET", &url, fallback).await
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: Url,
        body: &B,
        extra_headers: &[(&str, &str)],
        fallback: &str,
    ) -> Result<T, WizardError> {
        debug!("POST {}", url);
        let mut request = self.authorize(self.client.post(url.clone()).json(body));
        for (name, value) in extra_headers {
            request = request.header(*name, *value);
        }
        self.execute(request, "POST", &url, fallback).await
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => request,
        }
    }

    /// Send a request and decode a 2xx JSON body.
    ///
    /// Transport and decoding failures become `NetworkError`; non-2xx
    /// responses become `SubmissionError` carrying the server's `message` (or
    /// `error`) field, else `fallback`.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: &str,
        url: &Url,
        fallback: &str,
    ) -> Result<T, WizardError> {
        let response = request.send().await.map_err(|e| {
            error!("HTTP {} {} failed: {}", method, url, e);
            WizardError::NetworkError(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("HTTP {} {} failed: {} - {}", method, url, status, body);
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|b| b.user_message().map(str::to_string))
                .unwrap_or_else(|| fallback.to_string());
            return Err(WizardError::SubmissionError(message));
        }

        response.json::<T>().await.map_err(|e| {
            error!("HTTP {} {} returned an unreadable body: {}", method, url, e);
            WizardError::NetworkError(format!("Malformed response: {}", e))
        })
    }
}
