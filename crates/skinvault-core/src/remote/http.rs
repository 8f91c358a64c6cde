//! HTTP binding of the remote authority.

use reqwest::StatusCode;

use super::wire::{
    ApiErrorBody, CaseDetailPayload, CaseSummaryPayload, InventoryResponse, OfflineDrawRequest,
    OpenCaseRequest, OpenCaseResponse,
};
use super::{RemoteAuthority, RemoteDraw, RemoteInventory};
use crate::config::{normalize_base_url, ClientConfig};
use crate::error::{Error, Result};
use crate::models::{CaseDetail, CaseSummary, PendingOperation};
use crate::util::{compact_text, millis_to_rfc3339, normalize_text_option};

/// Remote authority reached over the case-opening REST API.
#[derive(Clone)]
pub struct HttpRemoteAuthority {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpRemoteAuthority {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpRemoteAuthority")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl HttpRemoteAuthority {
    /// Build a client from a validated configuration.
    ///
    /// Fails when the configuration has no API base URL.
    pub fn new(config: &ClientConfig, access_token: Option<String>) -> Result<Self> {
        let base_url = config
            .api_base_url
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("api_base_url is not configured".to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|error| Error::InvalidInput(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            base_url: normalize_base_url(base_url)?,
            access_token: normalize_text_option(access_token),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }
}

impl RemoteAuthority for HttpRemoteAuthority {
    async fn liveness_probe(&self) -> Result<()> {
        self.send(self.client.get(self.url("/cases/ping"))).await?;
        Ok(())
    }

    async fn submit_draw(&self, case_id: &str, user_id: &str) -> Result<RemoteDraw> {
        let path = format!("/cases/{}/open", urlencoding::encode(case_id));
        let response = self
            .send(
                self.client
                    .post(self.url(&path))
                    .json(&OpenCaseRequest { user_id }),
            )
            .await?;
        let payload = response.json::<OpenCaseResponse>().await?;
        Ok(payload.into_remote_draw(case_id))
    }

    async fn commit_offline_draw(&self, op: &PendingOperation) -> Result<()> {
        let path = format!("/cases/{}/sync", urlencoding::encode(&op.case_id));
        self.send(
            self.client
                .post(self.url(&path))
                .header("Idempotency-Key", op.op_id.to_string())
                .json(&OfflineDrawRequest::from(op)),
        )
        .await?;
        Ok(())
    }

    async fn fetch_inventory(&self, user_id: &str, since: Option<i64>) -> Result<RemoteInventory> {
        let mut path = format!("/users/{}/inventory", urlencoding::encode(user_id));
        if let Some(since) = since {
            path.push_str("?since=");
            path.push_str(&urlencoding::encode(&millis_to_rfc3339(since)));
        }
        let response = self.send(self.client.get(self.url(&path))).await?;
        let payload = response.json::<InventoryResponse>().await?;
        Ok(payload.into())
    }

    async fn fetch_cases(&self) -> Result<Vec<CaseSummary>> {
        let response = self.send(self.client.get(self.url("/cases"))).await?;
        let payload = response.json::<Vec<CaseSummaryPayload>>().await?;
        Ok(payload.into_iter().map(Into::into).collect())
    }

    async fn fetch_case(&self, case_id: &str) -> Result<CaseDetail> {
        let path = format!("/cases/{}", urlencoding::encode(case_id));
        let response = self.send(self.client.get(self.url(&path))).await?;
        let payload = response.json::<CaseDetailPayload>().await?;
        Ok(payload.into())
    }
}

/// Map a non-success HTTP status to the error taxonomy.
///
/// 401 never drops queued work; 408, 429 and 5xx are transient; any other
/// client error is a permanent rejection.
fn classify_failure(status: StatusCode, body: &str) -> Error {
    let message = parse_api_error(status, body);
    if status == StatusCode::UNAUTHORIZED {
        tracing::warn!("Remote rejected credentials: {message}");
        Error::Unauthorized
    } else if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        Error::NetworkUnavailable(message)
    } else {
        Error::RemoteRejected(message)
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message() {
            return format!("{} ({})", message, status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> ClientConfig {
        ClientConfig {
            api_base_url: Some(url.to_string()),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn new_requires_base_url() {
        assert!(HttpRemoteAuthority::new(&ClientConfig::default(), None).is_err());
        assert!(HttpRemoteAuthority::new(&config("api.example.com"), None).is_err());

        let remote = HttpRemoteAuthority::new(&config("https://api.example.com/"), None).unwrap();
        assert_eq!(remote.base_url(), "https://api.example.com");
    }

    #[test]
    fn debug_redacts_token() {
        let remote = HttpRemoteAuthority::new(
            &config("https://api.example.com"),
            Some("secret".to_string()),
        )
        .unwrap();
        let debug = format!("{remote:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn unauthorized_is_retryable() {
        let error = classify_failure(StatusCode::UNAUTHORIZED, r#"{"message":"jwt expired"}"#);
        assert!(matches!(error, Error::Unauthorized));
        assert!(error.is_retryable());
    }

    #[test]
    fn server_errors_count_as_unavailable() {
        assert!(classify_failure(StatusCode::BAD_GATEWAY, "").is_network());
        assert!(classify_failure(StatusCode::TOO_MANY_REQUESTS, "").is_network());
    }

    #[test]
    fn client_errors_are_rejections() {
        let error = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"statusCode":400,"message":"Skin not found","error":"Bad Request"}"#,
        );
        match error {
            Error::RemoteRejected(message) => assert_eq!(message, "Skin not found (400)"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_api_error_falls_back_to_status() {
        assert_eq!(parse_api_error(StatusCode::FORBIDDEN, "  "), "HTTP 403");
        assert_eq!(
            parse_api_error(StatusCode::FORBIDDEN, "nope"),
            "nope (403)"
        );
    }
}
