//! Session identifiers and the domain outcome of a poll.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::certificate::{Certificate, CertificateLevel};
use super::hash::AuthHash;
use super::signature::Signature;

/// A session opened on the service.
///
/// Keeps the commitment and the required certificate level that were in
/// effect when the session was created, so that the final response can be
/// verified against them.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    session_id: String,
    hash: AuthHash,
    certificate_level: CertificateLevel,
}

impl SessionHandle {
    pub fn new(
        session_id: impl Into<String>,
        hash: AuthHash,
        certificate_level: CertificateLevel,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            hash,
            certificate_level,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn hash(&self) -> &AuthHash {
        &self.hash
    }

    pub fn certificate_level(&self) -> &CertificateLevel {
        &self.certificate_level
    }
}

/// Session state reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum SessionState {
    Running,
    Complete,
    /// No state in the response.
    #[default]
    Empty,
    Other(String),
}

impl SessionState {
    /// An explicit `COMPLETE` and an empty state are both terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Empty)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "RUNNING",
            Self::Complete => "COMPLETE",
            Self::Empty => "",
            Self::Other(state) => state,
        }
    }
}

impl From<String> for SessionState {
    fn from(state: String) -> Self {
        match state.as_str() {
            "RUNNING" => Self::Running,
            "COMPLETE" => Self::Complete,
            "" => Self::Empty,
            _ => Self::Other(state),
        }
    }
}

impl From<Option<String>> for SessionState {
    fn from(state: Option<String>) -> Self {
        state.map(Self::from).unwrap_or_default()
    }
}

impl From<SessionState> for String {
    fn from(state: SessionState) -> Self {
        state.as_str().to_string()
    }
}

/// Outcome code of a completed session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EndResult {
    Ok,
    UserRefused,
    UserRefusedCertChoice,
    UserRefusedDisplayTextAndPin,
    UserRefusedVcChoice,
    UserRefusedConfirmationMessage,
    UserRefusedConfirmationMessageWithVcChoice,
    WrongVc,
    Timeout,
    RequiredInteractionNotSupportedByApp,
    Other(String),
}

impl EndResult {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::UserRefused => "USER_REFUSED",
            Self::UserRefusedCertChoice => "USER_REFUSED_CERT_CHOICE",
            Self::UserRefusedDisplayTextAndPin => "USER_REFUSED_DISPLAYTEXTANDPIN",
            Self::UserRefusedVcChoice => "USER_REFUSED_VC_CHOICE",
            Self::UserRefusedConfirmationMessage => "USER_REFUSED_CONFIRMATIONMESSAGE",
            Self::UserRefusedConfirmationMessageWithVcChoice => {
                "USER_REFUSED_CONFIRMATIONMESSAGE_WITH_VC_CHOICE"
            }
            Self::WrongVc => "WRONG_VC",
            Self::Timeout => "TIMEOUT",
            Self::RequiredInteractionNotSupportedByApp => {
                "REQUIRED_INTERACTION_NOT_SUPPORTED_BY_APP"
            }
            Self::Other(code) => code,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<String> for EndResult {
    fn from(code: String) -> Self {
        match code.as_str() {
            "OK" => Self::Ok,
            "USER_REFUSED" => Self::UserRefused,
            "USER_REFUSED_CERT_CHOICE" => Self::UserRefusedCertChoice,
            "USER_REFUSED_DISPLAYTEXTANDPIN" => Self::UserRefusedDisplayTextAndPin,
            "USER_REFUSED_VC_CHOICE" => Self::UserRefusedVcChoice,
            "USER_REFUSED_CONFIRMATIONMESSAGE" => Self::UserRefusedConfirmationMessage,
            "USER_REFUSED_CONFIRMATIONMESSAGE_WITH_VC_CHOICE" => {
                Self::UserRefusedConfirmationMessageWithVcChoice
            }
            "WRONG_VC" => Self::WrongVc,
            "TIMEOUT" => Self::Timeout,
            "REQUIRED_INTERACTION_NOT_SUPPORTED_BY_APP" => {
                Self::RequiredInteractionNotSupportedByApp
            }
            _ => Self::Other(code),
        }
    }
}

impl From<EndResult> for String {
    fn from(result: EndResult) -> Self {
        result.as_str().to_string()
    }
}

impl fmt::Display for EndResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_result: Option<EndResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
}

/// Domain part of a session poll response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    #[serde(default)]
    pub state: SessionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<SessionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<Certificate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interaction_flow_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_ip_address: Option<String>,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// The end result code, treating an empty code as absent.
    pub fn end_result(&self) -> Option<&EndResult> {
        self.result
            .as_ref()
            .and_then(|result| result.end_result.as_ref())
            .filter(|code| !code.as_str().is_empty())
    }

    pub fn document_number(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|result| result.document_number.as_deref())
    }
}
