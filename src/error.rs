use crate::client::engine::SessionPhase;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the session exchange itself.
///
/// A session that completes with a negative outcome is not an error here;
/// it is reported by [`crate::verification::SessionResponse::validate`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("service rejected the request ({status}): {message}")]
    ServiceRejected { status: u16, message: String },
    #[error("could not decode service response: {0}")]
    Decode(String),
    #[error("could not encode request: {0}")]
    Encode(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("session abandoned while {phase}")]
    Abandoned { phase: SessionPhase },
    #[error("runtime error: {0}")]
    Runtime(String),
    #[error("session task failed: {0}")]
    TaskFailed(String),
}

impl Error {
    pub fn is_abandoned(&self) -> bool {
        matches!(self, Self::Abandoned { .. })
    }
}
