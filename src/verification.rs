//! Turning a terminal session response into a trusted assertion.
//!
//! [`SessionResponse::validate`] checks, stopping at the first failure:
//!
//! 1. the session reached a terminal state,
//! 2. the end result is `OK`,
//! 3. the signature verifies over the commitment with the certificate key,
//! 4. [`Certificate::is_expired`] is false,
//! 5. [`Certificate::is_not_yet_active`] is false,
//! 6. the certificate level equals the level the session was opened with.
//!
//! Root-of-trust verification is a separate step,
//! [`SessionResponse::validate_with_trust`], since trust roots are supplied
//! per call.

use std::fmt;

use serde::Serialize;

use crate::client::http::TransportStatus;
use crate::definitions::x509::{ChainError, TrustAnchorRegistry, ValidationOptions};
use crate::definitions::{
    Certificate, CertificateLevel, EndResult, Identity, SessionHandle, SessionStatus,
};

/// Why a completed session does not count as a success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FailureReason {
    /// The end result code reported by the service.
    EndResult(EndResult),
    /// No end result was reported; the meaning of the HTTP status instead.
    Status(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EndResult(code) => fmt::Display::fmt(code, f),
            Self::Status(message) => f.write_str(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("session is not complete")]
    SessionIncomplete,
    #[error("session failed: {0}")]
    UserOutcome(FailureReason),
    #[error("invalid signature")]
    SignatureInvalid,
    #[error("certificate has expired")]
    CertificateExpired,
    #[error("certificate is not yet active")]
    CertificateNotYetActive,
    #[error("certificate level {actual} does not match required level {required}")]
    CertificateLevelMismatch {
        required: CertificateLevel,
        actual: CertificateLevel,
    },
    #[error("certificate chain verification failed: {0}")]
    ChainVerification(#[from] ChainError),
}

/// Outcome of validating a session response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// The first check that failed.
    Invalid(ValidationError),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn reason(&self) -> Option<&ValidationError> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(reason),
        }
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            Self::Valid => Ok(()),
            Self::Invalid(reason) => Err(reason),
        }
    }
}

impl From<Result<(), ValidationError>> for Verdict {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self::Valid,
            Err(reason) => Self::Invalid(reason),
        }
    }
}

/// Final response of a session.
///
/// Composes the session it belongs to, the HTTP status of the last poll and
/// the session status the service reported.
#[derive(Debug, Clone)]
pub struct SessionResponse {
    pub handle: SessionHandle,
    pub transport: TransportStatus,
    pub status: SessionStatus,
}

impl SessionResponse {
    pub fn new(handle: SessionHandle, transport: TransportStatus, status: SessionStatus) -> Self {
        Self {
            handle,
            transport,
            status,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn is_success(&self) -> bool {
        self.status.end_result().is_some_and(EndResult::is_ok)
    }

    /// `None` when the end result is `OK`.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self.status.end_result() {
            Some(code) if code.is_ok() => None,
            Some(code) => Some(FailureReason::EndResult(code.clone())),
            None => Some(FailureReason::Status(self.transport.message.clone())),
        }
    }

    pub fn certificate(&self) -> Option<&Certificate> {
        self.status.cert.as_ref()
    }

    pub fn is_valid_signature(&self) -> bool {
        match (&self.status.signature, &self.status.cert) {
            (Some(signature), Some(cert)) => signature.verify(cert, self.handle.hash()),
            _ => false,
        }
    }

    pub fn validate(&self) -> Verdict {
        let verdict = Verdict::from(self.check());
        if let Verdict::Invalid(reason) = &verdict {
            tracing::warn!(
                "session {} is not valid: {reason}",
                self.handle.session_id()
            );
        }
        verdict
    }

    /// [`SessionResponse::validate`], then verify that the certificate
    /// chains to one of `trust_anchors`.
    pub fn validate_with_trust(
        &self,
        trust_anchors: &TrustAnchorRegistry,
        options: &ValidationOptions,
    ) -> Verdict {
        let verdict = Verdict::from(self.check().and_then(|()| {
            self.certificate()
                .ok_or(ValidationError::SignatureInvalid)?
                .verify_chain_with_options(trust_anchors, options)
                .map_err(ValidationError::from)
        }));
        if let Verdict::Invalid(reason) = &verdict {
            tracing::warn!(
                "session {} is not trusted: {reason}",
                self.handle.session_id()
            );
        }
        verdict
    }

    fn check(&self) -> Result<(), ValidationError> {
        if !self.is_terminal() {
            return Err(ValidationError::SessionIncomplete);
        }
        if let Some(reason) = self.failure_reason() {
            return Err(ValidationError::UserOutcome(reason));
        }
        if !self.is_valid_signature() {
            return Err(ValidationError::SignatureInvalid);
        }
        let cert = self
            .certificate()
            .ok_or(ValidationError::SignatureInvalid)?;
        if cert.is_expired() {
            return Err(ValidationError::CertificateExpired);
        }
        if cert.is_not_yet_active() {
            return Err(ValidationError::CertificateNotYetActive);
        }
        let required = self.handle.certificate_level();
        if !cert.matches_level(required) {
            return Err(ValidationError::CertificateLevelMismatch {
                required: required.clone(),
                actual: cert.level().clone(),
            });
        }
        Ok(())
    }

    /// Identity of the certificate subject, only for a successful session.
    pub fn identity(&self) -> Option<Identity> {
        if !self.is_success() {
            return None;
        }
        self.certificate()?.subject_identity().ok()
    }

    /// Identity of the certificate issuer, only for a successful session.
    pub fn issuer_identity(&self) -> Option<Identity> {
        if !self.is_success() {
            return None;
        }
        self.certificate()?.issuer_identity().ok()
    }
}
