//! Reqwest-backed transport shared by every backend resource.
//!
//! This adapter owns transport details only: URL building, bearer tokens,
//! timeout and HTTP error mapping, and JSON decoding. Resource mapping lives
//! in the port implementations.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::domain::ports::{AccessTokenSource, BackendError};

const DEFAULT_USER_AGENT: &str = "clubhub/0.1";

/// Backend REST adapter implementing every backend resource port.
#[derive(Clone)]
pub struct RestBackend {
    client: Client,
    base_url: Url,
    tokens: Arc<dyn AccessTokenSource>,
}

impl std::fmt::Debug for RestBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackend")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl RestBackend {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let backend = RestBackend::new(base_url, Duration::from_secs(30), tokens);
    /// assert!(backend.is_ok() || backend.is_err());
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        timeout: Duration,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    /// Base URL requests are resolved against.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `segments` against the base URL, percent-encoding each one.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                BackendError::rejected(0_u16, format!("base URL {} cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match self.tokens.access_token() {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Send `builder` and decode a successful JSON body into `T`.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, BackendError> {
        let response = builder.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let url = response.url().path().to_owned();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let mapped = map_status_error(status, body.as_ref());
            if status.is_server_error() {
                error!(path = %url, status = status.as_u16(), error = %mapped, "backend request failed");
            } else {
                debug!(path = %url, status = status.as_u16(), error = %mapped, "backend refused request");
            }
            return Err(mapped);
        }
        decode(body.as_ref())
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        self.execute(self.request(Method::GET, url).query(query))
            .await
    }

    /// GET that treats 404 and a JSON `null` body as absence.
    pub(crate) async fn get_optional<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Option<T>, BackendError> {
        match self.get::<Option<T>>(segments, &[]).await {
            Err(BackendError::NotFound { .. }) => Ok(None),
            other => other,
        }
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        body: &B,
    ) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        self.execute(self.request(method, url).json(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<T, BackendError> {
        let url = self.endpoint(segments)?;
        self.execute(self.request(Method::DELETE, url)).await
    }
}

pub(crate) fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, BackendError> {
    serde_json::from_slice(body).map_err(|error| {
        BackendError::decode(format!(
            "invalid backend JSON payload: {error} (body: {})",
            body_preview(body)
        ))
    })
}

fn map_transport_error(error: reqwest::Error) -> BackendError {
    error!(error = %error, "backend transport failure");
    BackendError::connection(error.to_string())
}

pub(crate) fn map_status_error(status: StatusCode, body: &[u8]) -> BackendError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::CONFLICT => BackendError::conflict(message),
        StatusCode::NOT_FOUND => BackendError::not_found(message),
        StatusCode::UNAUTHORIZED => BackendError::unauthorized(message),
        StatusCode::FORBIDDEN => BackendError::forbidden(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            BackendError::connection(message)
        }
        _ if status.is_client_error() => BackendError::rejected(status.as_u16(), message),
        _ => BackendError::server(status.as_u16(), message),
    }
}

pub(crate) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network transport helpers.

    use super::*;
    use crate::domain::ports::NoAccessToken;
    use rstest::rstest;

    fn backend(base: &str) -> RestBackend {
        RestBackend::new(
            Url::parse(base).expect("base URL"),
            Duration::from_secs(5),
            Arc::new(NoAccessToken),
        )
        .expect("client builds")
    }

    #[rstest]
    #[case::conflict(StatusCode::CONFLICT, "Conflict")]
    #[case::not_found(StatusCode::NOT_FOUND, "NotFound")]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, "Unauthorized")]
    #[case::forbidden(StatusCode::FORBIDDEN, "Forbidden")]
    #[case::gateway_timeout(StatusCode::GATEWAY_TIMEOUT, "Connection")]
    #[case::bad_request(StatusCode::BAD_REQUEST, "Rejected")]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "Server")]
    fn maps_http_statuses_to_expected_port_errors(
        #[case] status: StatusCode,
        #[case] expected: &str,
    ) {
        let error = map_status_error(status, b"{\"message\":\"nope\"}");
        let matched = match expected {
            "Conflict" => matches!(error, BackendError::Conflict { .. }),
            "NotFound" => matches!(error, BackendError::NotFound { .. }),
            "Unauthorized" => matches!(error, BackendError::Unauthorized { .. }),
            "Forbidden" => matches!(error, BackendError::Forbidden { .. }),
            "Connection" => matches!(error, BackendError::Connection { .. }),
            "Rejected" => matches!(error, BackendError::Rejected { status: 400, .. }),
            "Server" => matches!(error, BackendError::Server { status: 500, .. }),
            _ => panic!("unsupported test expectation: {expected}"),
        };
        assert!(matched, "{status} should map to {expected}, got {error:?}");
    }

    #[test]
    fn body_previews_are_compacted_and_truncated() {
        let long = format!("a   b\n{}", "x".repeat(400));
        let preview = body_preview(long.as_bytes());
        assert!(preview.starts_with("a b x"));
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 163);
    }

    #[rstest]
    #[case::bare("http://localhost:5000", "http://localhost:5000/users/ann@example.com")]
    #[case::trailing_slash("http://localhost:5000/api/", "http://localhost:5000/api/users/ann@example.com")]
    fn endpoints_append_encoded_segments(#[case] base: &str, #[case] expected: &str) {
        let url = backend(base)
            .endpoint(&["users", "ann@example.com"])
            .expect("endpoint builds");
        assert_eq!(url.as_str(), expected);
    }

    #[test]
    fn segments_cannot_escape_their_path() {
        let url = backend("http://localhost:5000")
            .endpoint(&["clubs", "a/b?c"])
            .expect("endpoint builds");
        assert_eq!(url.as_str(), "http://localhost:5000/clubs/a%2Fb%3Fc");
    }

    #[test]
    fn undecodable_bodies_become_decode_errors() {
        let error = decode::<Vec<u32>>(b"<html>").expect_err("not JSON");
        assert!(matches!(error, BackendError::Decode { .. }));
    }
}
