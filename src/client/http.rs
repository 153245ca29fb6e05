//! HTTP client trait the session engine talks to the service through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// HTTP request to be sent by an HTTP client.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// The URL to send the request to.
    pub url: String,
    /// The HTTP method and optional body.
    pub method: HttpMethod,
}

/// HTTP method with optional body for POST requests.
#[derive(Debug, Clone)]
pub enum HttpMethod {
    /// HTTP GET request.
    Get,
    /// HTTP POST request with body and content type.
    Post { body: Vec<u8>, content_type: String },
}

/// HTTP response from an HTTP client.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Low-level HTTP client trait.
///
/// This trait is a pure HTTP interface with no knowledge of the session
/// protocol. Dropping the returned future must abort the request.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// The error type returned by this HTTP client.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send an HTTP request and return the response.
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, Self::Error>;
}

/// HTTP status of a service response with its resolved meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportStatus {
    pub code: u16,
    pub message: String,
}

impl TransportStatus {
    pub fn new(code: u16) -> Self {
        Self {
            code,
            message: resolve_http_status(code),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 200
    }
}

/// Human readable meaning of an HTTP status.
///
/// The service uses a few non-standard codes whose meaning differs from
/// anything the generic reason phrases say; those are resolved first.
pub fn resolve_http_status(code: u16) -> String {
    match code {
        471 => "No suitable account of requested type found, but user has some other accounts."
            .to_string(),
        472 => "Person should view Smart-ID app or Smart-ID self-service portal now.".to_string(),
        480 => "The client is too old and not supported any more.".to_string(),
        580 => "System is under maintenance, retry again later.".to_string(),
        _ => http::StatusCode::from_u16(code)
            .ok()
            .and_then(|status| status.canonical_reason())
            .map(str::to_string)
            .unwrap_or_else(|| format!("unknown status {code}")),
    }
}
