//! Session state machine: open a session, poll it until the service reports a
//! terminal state, hand the final response to verification.
//!
//! ```text
//! Created ──► Polling ──► Complete
//!    │           │
//!    └───────────┴──────► Abandoned (caller cancelled / deadline passed)
//! ```
//!
//! Polls are retried without limit. The only way out of a session the
//! service never completes is the caller's [`CancelSignal`], which also
//! aborts the request in flight.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::cancel::CancelSignal;
use super::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, TransportStatus};
use super::ClientConfig;
use crate::definitions::{
    AuthRequest, CertificateLevel, HashAlgorithm, Interaction, SessionHandle, SessionStatus,
};
use crate::error::{Error, Result};
use crate::verification::SessionResponse;

pub const POLL_TIMEOUT_MIN_MS: u32 = 1_000;
pub const POLL_TIMEOUT_MAX_MS: u32 = 120_000;
/// Halfway between the bounds the service accepts.
pub const POLL_TIMEOUT_DEFAULT_MS: u32 = 60_500;

const CONTENT_TYPE_JSON: &str = "application/json";

/// Where a session was when it was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum SessionPhase {
    #[strum(serialize = "opening the session")]
    Opening,
    #[strum(serialize = "polling")]
    Polling,
}

/// Bound the long-poll hint to what the service accepts.
pub fn clamp_poll_timeout(ms: u32) -> u32 {
    ms.clamp(POLL_TIMEOUT_MIN_MS, POLL_TIMEOUT_MAX_MS)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequestBody<'a> {
    #[serde(rename = "relyingPartyUUID")]
    relying_party_uuid: &'a str,
    relying_party_name: &'a str,
    certificate_level: &'a CertificateLevel,
    hash: String,
    hash_type: HashAlgorithm,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    capabilities: Vec<String>,
    allowed_interactions_order: Vec<Interaction>,
}

#[derive(Debug, Deserialize)]
struct SessionCreated {
    #[serde(rename = "sessionID")]
    session_id: String,
}

/// Drives sessions against the service through an [`HttpClient`].
pub struct SessionEngine<H> {
    config: Arc<ClientConfig>,
    http: Arc<H>,
}

impl<H> Clone for SessionEngine<H> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            http: self.http.clone(),
        }
    }
}

impl<H: HttpClient> SessionEngine<H> {
    pub fn new(config: Arc<ClientConfig>, http: Arc<H>) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    /// Open a session and poll it until the service reports a terminal state.
    pub async fn run(&self, request: &AuthRequest, cancel: &CancelSignal) -> Result<SessionResponse> {
        let handle = self.open_session(request, cancel).await?;
        self.poll_until_complete(&handle, cancel).await
    }

    /// Open a session on the request's endpoint.
    ///
    /// Only status 200 counts as success; any other status is rejected with
    /// the resolved meaning of that status.
    pub async fn open_session(
        &self,
        request: &AuthRequest,
        cancel: &CancelSignal,
    ) -> Result<SessionHandle> {
        request.validate()?;

        let url = format!(
            "{}{}/{}/{}",
            self.config.api_url, request.endpoint, request.auth_type, request.identifier
        );
        let body = SessionRequestBody {
            relying_party_uuid: request
                .relying_party_uuid
                .as_deref()
                .unwrap_or(&self.config.relying_party_uuid),
            relying_party_name: request
                .relying_party_name
                .as_deref()
                .unwrap_or(&self.config.relying_party_name),
            certificate_level: &request.certificate_level,
            hash: request.hash.to_base64(),
            hash_type: request.hash.algorithm(),
            nonce: request.nonce.as_deref(),
            capabilities: request.capabilities.clone(),
            allowed_interactions_order: request.interactions(),
        };
        let body = serde_json::to_vec(&body).map_err(|e| Error::Encode(e.to_string()))?;

        tracing::debug!("opening {} session", request.endpoint);
        let response = self
            .send(
                SessionPhase::Opening,
                cancel,
                HttpRequest {
                    url,
                    method: HttpMethod::Post {
                        body,
                        content_type: CONTENT_TYPE_JSON.to_string(),
                    },
                },
            )
            .await?;

        let status = TransportStatus::new(response.status);
        if !status.is_ok() {
            tracing::warn!("session was not opened: {} {}", status.code, status.message);
            return Err(Error::ServiceRejected {
                status: status.code,
                message: status.message,
            });
        }

        let created: SessionCreated =
            serde_json::from_slice(&response.body).map_err(|e| Error::Decode(e.to_string()))?;
        if created.session_id.is_empty() {
            return Err(Error::Decode("empty session id".into()));
        }

        tracing::info!("opened session {}", created.session_id);
        Ok(SessionHandle::new(
            created.session_id,
            request.hash.clone(),
            request.certificate_level.clone(),
        ))
    }

    /// One long-poll request for the session status.
    ///
    /// A body that decodes as a session status is returned whatever the HTTP
    /// status. A non-2xx response without one is rejected.
    pub async fn poll_once(
        &self,
        handle: &SessionHandle,
        cancel: &CancelSignal,
    ) -> Result<SessionResponse> {
        let url = format!(
            "{}session/{}?timeoutMs={}",
            self.config.api_url,
            handle.session_id(),
            clamp_poll_timeout(self.config.poll_timeout_ms)
        );
        let response = self
            .send(
                SessionPhase::Polling,
                cancel,
                HttpRequest {
                    url,
                    method: HttpMethod::Get,
                },
            )
            .await?;

        let transport = TransportStatus::new(response.status);
        let status = match serde_json::from_slice::<SessionStatus>(&response.body) {
            Ok(status) => status,
            Err(_) if !response.is_success() => {
                return Err(Error::ServiceRejected {
                    status: transport.code,
                    message: transport.message,
                })
            }
            Err(e) => return Err(Error::Decode(e.to_string())),
        };

        tracing::debug!(
            "session {} state '{}' (HTTP {})",
            handle.session_id(),
            status.state.as_str(),
            transport.code
        );
        Ok(SessionResponse::new(handle.clone(), transport, status))
    }

    /// Poll until the service reports a terminal state or `cancel` fires.
    pub async fn poll_until_complete(
        &self,
        handle: &SessionHandle,
        cancel: &CancelSignal,
    ) -> Result<SessionResponse> {
        let mut attempts: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(self.abandoned(SessionPhase::Polling, handle));
            }
            attempts += 1;
            let response = self.poll_once(handle, cancel).await?;
            if response.status.is_terminal() {
                tracing::info!(
                    "session {} complete after {attempts} poll(s)",
                    handle.session_id()
                );
                return Ok(response);
            }
        }
    }

    async fn send(
        &self,
        phase: SessionPhase,
        cancel: &CancelSignal,
        request: HttpRequest,
    ) -> Result<HttpResponse> {
        let exchange = async {
            self.http
                .request(request)
                .await
                .map_err(|e| Error::Transport(e.to_string()))
        };
        self.until_cancelled(phase, cancel, exchange).await
    }

    /// Run `fut` unless `cancel` fires first, in which case `fut` is dropped.
    async fn until_cancelled<T>(
        &self,
        phase: SessionPhase,
        cancel: &CancelSignal,
        fut: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("session abandoned while {phase}");
                Err(Error::Abandoned { phase })
            }
            result = fut => result,
        }
    }

    fn abandoned(&self, phase: SessionPhase, handle: &SessionHandle) -> Error {
        tracing::info!("session {} abandoned while {phase}", handle.session_id());
        Error::Abandoned { phase }
    }
}
