//! REST collection endpoint over HTTP.
//!
//! # Security Note - Logging
//!
//! The API token is held in a `SecretBox` and only exposed while building the
//! `Authorization` header, which is marked sensitive. The `RedactedHeader`
//! wrapper formats as `[REDACTED]` so the token never shows up in logs.

use std::fmt;
use std::marker::PhantomData;
use std::time::Duration;

use reqwest::header::{self, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretBox};
use url::Url;

use crate::config::Config;
use crate::error::{DarshanError, FieldErrors, Result};
use crate::remote::{ListParams, ListResponse, Paginated, RemoteApi};
use crate::types::{ItemId, Resource};

/// Wrapper for sensitive header values that redacts the value when formatted.
struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn bearer(token: &str) -> Self {
        Self {
            value: format!("Bearer {token}"),
        }
    }

    fn as_header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.value)
            .map_err(|_| DarshanError::Config("API token contains invalid characters".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Collection endpoint for `T` at `{base_url}{T::PATH}`.
pub struct HttpApi<T> {
    client: Client,
    base_url: Url,
    token: Option<SecretBox<String>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Resource> HttpApi<T> {
    /// Create a client for `base_url` with a total request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url)?,
            token: None,
            _marker: PhantomData,
        })
    }

    /// Create a client from the `api` section of the configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.api_base_url().ok_or_else(|| {
            DarshanError::Config(
                "API base URL not configured. Set DARSHAN_API_URL or run: darshan config set api.base_url <url>"
                    .to_string(),
            )
        })?;
        let api = Self::new(&base_url, Duration::from_secs(config.api.timeout_secs))?;
        Ok(match config.api_token() {
            Some(token) => api.with_token(&token),
            None => api,
        })
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(SecretBox::new(Box::new(token.to_string())));
        self
    }

    fn collection_url(&self) -> Result<Url> {
        Ok(self.base_url.join(T::PATH)?)
    }

    fn item_url(&self, id: ItemId) -> Result<Url> {
        Ok(self.collection_url()?.join(&format!("{id}/"))?)
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder> {
        let mut builder = self
            .client
            .request(method, url)
            .header(header::ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = &self.token {
            let auth_header = RedactedHeader::bearer(token.expose_secret());
            builder = builder.header(header::AUTHORIZATION, auth_header.as_header_value()?);
        }
        Ok(builder)
    }

    /// Send a request and turn non-success statuses into typed errors.
    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%status, collection = T::NAME, "request rejected");
        Err(status_error(status, &body, what))
    }

    async fn decode<R: serde::de::DeserializeOwned>(response: Response) -> Result<R> {
        response
            .json::<R>()
            .await
            .map_err(|e| DarshanError::Api(format!("invalid {} response: {e}", T::NAME)))
    }
}

impl<T: Resource> RemoteApi<T> for HttpApi<T> {
    async fn list(&self, params: &ListParams) -> Result<Paginated<T>> {
        let request = self
            .request(Method::GET, self.collection_url()?)?
            .query(&params.query_pairs());
        let response = self.send(request, T::NAME).await?;
        let body: ListResponse<T> = Self::decode(response).await?;
        Ok(body.into())
    }

    async fn create(&self, draft: &T::Draft) -> Result<T> {
        let request = self.request(Method::POST, self.collection_url()?)?.json(draft);
        let response = self.send(request, T::NAME).await?;
        Self::decode(response).await
    }

    async fn update(&self, id: ItemId, patch: &T::Patch) -> Result<T> {
        let request = self.request(Method::PATCH, self.item_url(id)?)?.json(patch);
        let response = self.send(request, &format!("{} {id}", T::NAME)).await?;
        Self::decode(response).await
    }

    async fn delete(&self, id: ItemId) -> Result<()> {
        let request = self.request(Method::DELETE, self.item_url(id)?)?;
        self.send(request, &format!("{} {id}", T::NAME)).await?;
        Ok(())
    }
}

/// Parse `base_url`, ensuring a trailing slash so relative joins append.
fn normalize_base_url(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let mut url = Url::parse(trimmed)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn transport_error(err: reqwest::Error) -> DarshanError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        tracing::warn!(error = %err, "request failed before a response");
        DarshanError::Network(err.to_string())
    } else {
        DarshanError::Http(err)
    }
}

/// Map an error status and its body onto a typed error.
fn status_error(status: StatusCode, body: &str, what: &str) -> DarshanError {
    let (detail, fields) = parse_error_body(body);
    match status.as_u16() {
        400 | 422 => DarshanError::Validation {
            message: detail.unwrap_or_else(|| "invalid input".to_string()),
            fields,
        },
        404 => DarshanError::NotFound(what.to_string()),
        code @ 500..=599 => DarshanError::RemoteServer {
            status: code,
            message: detail
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_default(),
        },
        code => DarshanError::Api(match detail {
            Some(detail) => format!("HTTP {code}: {detail}"),
            None => format!("HTTP {code}"),
        }),
    }
}

/// Split an error body into a general message and per-field messages.
///
/// Recognizes `{"detail": "..."}`, `{"non_field_errors": [...]}` and
/// `{"field": ["msg", ...]}` / `{"field": "msg"}` objects.
fn parse_error_body(body: &str) -> (Option<String>, FieldErrors) {
    let mut fields = FieldErrors::new();
    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) else {
        let text = body.trim();
        let detail = (!text.is_empty() && text.len() <= 200).then(|| text.to_string());
        return (detail, fields);
    };

    let mut detail = None;
    for (key, value) in map {
        let messages: Vec<String> = match value {
            serde_json::Value::String(s) => vec![s],
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => continue,
        };
        match key.as_str() {
            "detail" | "message" | "error" | "non_field_errors" => {
                if detail.is_none() {
                    detail = Some(messages.join(" "));
                }
            }
            _ if !messages.is_empty() => {
                fields.insert(key, messages);
            }
            _ => {}
        }
    }
    (detail, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::PujaService;

    #[test]
    fn test_redacted_header_display() {
        let header = RedactedHeader::bearer("secret-token-12345");
        assert_eq!(format!("{header}"), "[REDACTED]");
        assert!(!format!("{header:?}").contains("secret"));
        assert!(header.as_header_value().unwrap().is_sensitive());
    }

    #[test]
    fn test_collection_and_item_urls() {
        let api =
            HttpApi::<PujaService>::new("https://example.com/api", Duration::from_secs(5)).unwrap();
        assert_eq!(
            api.collection_url().unwrap().as_str(),
            "https://example.com/api/puja/services/"
        );
        assert_eq!(
            api.item_url(ItemId(42)).unwrap().as_str(),
            "https://example.com/api/puja/services/42/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpApi::<PujaService>::new("not a url", Duration::from_secs(5))
            .err()
            .unwrap();
        assert!(matches!(err, DarshanError::Url(_)));
    }

    #[test]
    fn test_validation_status_collects_field_errors() {
        let body = r#"{"title": ["This field may not be blank."], "price": "Must be positive."}"#;
        let err = status_error(StatusCode::BAD_REQUEST, body, "service");
        match &err {
            DarshanError::Validation { fields, .. } => {
                assert_eq!(fields["title"], vec!["This field may not be blank."]);
                assert_eq!(fields["price"], vec!["Must be positive."]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(err.user_message(), "price: Must be positive.");
    }

    #[test]
    fn test_unprocessable_status_is_validation() {
        let err = status_error(StatusCode::UNPROCESSABLE_ENTITY, "", "service");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_not_found_status() {
        let err = status_error(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#, "service 7");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.user_message(), "service 7 no longer exists.");
    }

    #[test]
    fn test_server_status_uses_generic_message() {
        let err = status_error(StatusCode::BAD_GATEWAY, "<html>upstream</html>", "service");
        assert!(matches!(err, DarshanError::RemoteServer { status: 502, .. }));
        assert_eq!(err.user_message(), "Server error, please try again later.");
    }

    #[test]
    fn test_other_client_status_is_api_error() {
        let err = status_error(StatusCode::FORBIDDEN, r#"{"detail": "No access."}"#, "service");
        match err {
            DarshanError::Api(message) => assert_eq!(message, "HTTP 403: No access."),
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_body_detail_and_non_field() {
        let (detail, fields) = parse_error_body(r#"{"non_field_errors": ["Duplicate title."]}"#);
        assert_eq!(detail.as_deref(), Some("Duplicate title."));
        assert!(fields.is_empty());

        let (detail, fields) = parse_error_body("");
        assert!(detail.is_none());
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let api = HttpApi::<PujaService>::new("http://127.0.0.1:9/api/", Duration::from_secs(2))
            .unwrap();
        let err = api.list(&ListParams::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert_eq!(err.user_message(), "Network error, please check your connection.");
    }
}
