//! Client for the remote identity service.
//!
//! [`Client`] offers three ways to run a session, all over the same
//! [`SessionEngine`]:
//!
//! - `authenticate` / `sign`: async, resolves once the session is terminal.
//! - `spawn_authenticate` / `spawn_sign`: starts the session on the current
//!   Tokio runtime and returns a [`PendingSession`] to wait on or abandon.
//! - `authenticate_blocking` / `sign_blocking`: runs the session to
//!   completion on a private runtime, for callers without one.
//!
//! Each takes a [`CancelSignal`]. Polling does not stop on its own while the
//! service keeps reporting `RUNNING`.

use std::sync::Arc;
#[cfg(feature = "reqwest")]
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

pub mod cancel;
pub mod engine;
pub mod http;
#[cfg(feature = "reqwest")]
pub mod reqwest_client;

pub use cancel::{CancelHandle, CancelSignal};
pub use engine::{SessionEngine, SessionPhase};
pub use self::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, TransportStatus};
#[cfg(feature = "reqwest")]
pub use reqwest_client::ReqwestClient;

use crate::definitions::{AuthRequest, Endpoint, SessionHandle};
use crate::error::{Error, Result};
use crate::verification::SessionResponse;

/// Demo environment of the service.
pub const DEMO_API_URL: &str = "https://sid.demo.sk.ee/smart-id-rp/v2/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Base URL of the relying party API.
    pub api_url: String,
    /// Long-poll hint sent with every status request, in milliseconds.
    /// Clamped to `[1000, 120000]`.
    pub poll_timeout_ms: u32,
    /// Used for requests that do not name a relying party.
    #[serde(rename = "relyingPartyUUID")]
    pub relying_party_uuid: String,
    /// Used for requests that do not name a relying party.
    pub relying_party_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEMO_API_URL.to_string(),
            poll_timeout_ms: engine::POLL_TIMEOUT_DEFAULT_MS,
            relying_party_uuid: String::new(),
            relying_party_name: String::new(),
        }
    }
}

impl ClientConfig {
    /// Append the trailing slash routes are joined on and clamp the poll hint.
    pub fn normalized(mut self) -> Self {
        if !self.api_url.ends_with('/') {
            self.api_url.push('/');
        }
        self.poll_timeout_ms = engine::clamp_poll_timeout(self.poll_timeout_ms);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn api_url(mut self, api_url: impl Into<String>) -> Self {
        self.config.api_url = api_url.into();
        self
    }

    pub fn poll_timeout_ms(mut self, poll_timeout_ms: u32) -> Self {
        self.config.poll_timeout_ms = poll_timeout_ms;
        self
    }

    pub fn relying_party(mut self, uuid: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.relying_party_uuid = uuid.into();
        self.config.relying_party_name = name.into();
        self
    }

    /// Build a client that talks through `http`.
    pub fn build_with<H: HttpClient>(self, http: H) -> Client<H> {
        let config = self.config.normalized();
        Client {
            engine: SessionEngine::new(Arc::new(config), Arc::new(http)),
        }
    }

    /// Build a client on [`ReqwestClient`], with a request timeout that
    /// outlasts the long-poll hint.
    #[cfg(feature = "reqwest")]
    pub fn build(self) -> Result<Client<ReqwestClient>> {
        let poll = Duration::from_millis(engine::clamp_poll_timeout(self.config.poll_timeout_ms).into());
        let timeout = reqwest_client::DEFAULT_TIMEOUT.max(poll + Duration::from_secs(10));
        let http = ReqwestClient::with_timeout(timeout)
            .map_err(|e| Error::Transport(format!("{e:#}")))?;
        Ok(self.build_with(http))
    }
}

pub struct Client<H> {
    engine: SessionEngine<H>,
}

impl<H> Clone for Client<H> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

#[cfg(feature = "reqwest")]
impl Client<ReqwestClient> {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<H: HttpClient> Client<H> {
    pub fn config(&self) -> &ClientConfig {
        self.engine.config()
    }

    pub fn engine(&self) -> &SessionEngine<H> {
        &self.engine
    }

    pub fn http(&self) -> &H {
        self.engine.http()
    }

    pub async fn authenticate(
        &self,
        request: AuthRequest,
        cancel: &CancelSignal,
    ) -> Result<SessionResponse> {
        let request = request.with_endpoint(Endpoint::Authentication);
        self.engine.run(&request, cancel).await
    }

    /// Same as [`Client::authenticate`] on the signature endpoint.
    pub async fn sign(&self, request: AuthRequest, cancel: &CancelSignal) -> Result<SessionResponse> {
        let request = request.with_endpoint(Endpoint::Signature);
        self.engine.run(&request, cancel).await
    }

    pub async fn open_session(
        &self,
        request: &AuthRequest,
        cancel: &CancelSignal,
    ) -> Result<SessionHandle> {
        self.engine.open_session(request, cancel).await
    }

    pub async fn poll_until_complete(
        &self,
        handle: &SessionHandle,
        cancel: &CancelSignal,
    ) -> Result<SessionResponse> {
        self.engine.poll_until_complete(handle, cancel).await
    }

    /// Run `authenticate` to completion on a private current-thread runtime.
    ///
    /// Fails with [`Error::Runtime`] when called from inside a runtime.
    pub fn authenticate_blocking(
        &self,
        request: AuthRequest,
        cancel: &CancelSignal,
    ) -> Result<SessionResponse> {
        block_on(self.authenticate(request, cancel))
    }

    pub fn sign_blocking(
        &self,
        request: AuthRequest,
        cancel: &CancelSignal,
    ) -> Result<SessionResponse> {
        block_on(self.sign(request, cancel))
    }
}

impl<H: HttpClient + 'static> Client<H> {
    /// Start an authentication session on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn spawn_authenticate(&self, request: AuthRequest, cancel: CancelSignal) -> PendingSession {
        self.spawn(request.with_endpoint(Endpoint::Authentication), cancel)
    }

    /// Start a signing session on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn spawn_sign(&self, request: AuthRequest, cancel: CancelSignal) -> PendingSession {
        self.spawn(request.with_endpoint(Endpoint::Signature), cancel)
    }

    fn spawn(&self, request: AuthRequest, cancel: CancelSignal) -> PendingSession {
        let engine = self.engine.clone();
        PendingSession {
            task: tokio::spawn(async move { engine.run(&request, &cancel).await }),
        }
    }
}

fn block_on<F: std::future::Future<Output = Result<SessionResponse>>>(
    fut: F,
) -> Result<SessionResponse> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(Error::Runtime(
            "blocking call made from within an async runtime".into(),
        ));
    }
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Runtime(e.to_string()))?
        .block_on(fut)
}

/// A session running in the background.
#[derive(Debug)]
pub struct PendingSession {
    task: JoinHandle<Result<SessionResponse>>,
}

impl PendingSession {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the session. The request in flight, if any, is dropped.
    pub fn abandon(self) {
        self.task.abort();
    }

    pub async fn wait(self) -> Result<SessionResponse> {
        self.task
            .await
            .map_err(|e| Error::TaskFailed(e.to_string()))?
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn config_normalization() {
        let config = ClientConfig {
            api_url: "https://sid.example/v2".into(),
            poll_timeout_ms: 500,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.api_url, "https://sid.example/v2/");
        assert_eq!(config.poll_timeout_ms, 1_000);

        let default = ClientConfig::default().normalized();
        assert_eq!(default, ClientConfig::default());
        assert_eq!(default.poll_timeout_ms, 60_500);
    }

    #[test]
    fn config_from_json() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"apiUrl":"https://rp.example/","relyingPartyUUID":"uuid","relyingPartyName":"RP"}"#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://rp.example/");
        assert_eq!(config.relying_party_uuid, "uuid");
        assert_eq!(config.relying_party_name, "RP");
        assert_eq!(config.poll_timeout_ms, 60_500);
    }

    #[cfg(feature = "reqwest")]
    #[test]
    fn reqwest_timeout_outlasts_poll_hint() {
        let client = Client::builder().poll_timeout_ms(120_000).build().unwrap();
        assert_eq!(client.http().timeout(), Duration::from_secs(130));

        let client = Client::builder().poll_timeout_ms(1_000).build().unwrap();
        assert_eq!(client.http().timeout(), Duration::from_secs(30));
    }
}
