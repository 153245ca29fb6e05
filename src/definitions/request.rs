//! Authentication and signing requests.
//!
//! An [`AuthRequest`] names the person (by semantic identifier or document
//! number), carries the hash commitment they will sign, and lists the
//! interactions their app may use, most preferred first. Fields left empty
//! are filled with the service defaults when the session is opened.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

use super::certificate::CertificateLevel;
use super::hash::AuthHash;
use super::identity::SemanticIdentifier;
use crate::error::{Error, Result};

pub const DISPLAY_TEXT_60_MAX: usize = 60;
pub const DISPLAY_TEXT_200_MAX: usize = 200;
pub const DEFAULT_DISPLAY_TEXT: &str = "Welcome to Smart-ID!";

/// How the person is addressed in the request route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AuthType {
    /// By ETSI semantic identifier.
    #[default]
    Etsi,
    /// By document number.
    Document,
}

/// Service endpoint the session is opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, AsRefStr, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Endpoint {
    #[default]
    Authentication,
    Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    #[serde(rename = "displayTextAndPIN")]
    DisplayTextAndPin,
    #[serde(rename = "verificationCodeChoice")]
    VerificationCodeChoice,
    #[serde(rename = "confirmationMessage")]
    ConfirmationMessage,
    #[serde(rename = "confirmationMessageAndVerificationCodeChoice")]
    ConfirmationMessageAndVerificationCodeChoice,
}

/// One entry of the allowed interactions order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub interaction_type: InteractionType,
    #[serde(rename = "displayText60", skip_serializing_if = "Option::is_none")]
    pub display_text_60: Option<String>,
    #[serde(rename = "displayText200", skip_serializing_if = "Option::is_none")]
    pub display_text_200: Option<String>,
}

impl Interaction {
    fn short(interaction_type: InteractionType, text: impl Into<String>) -> Self {
        Self {
            interaction_type,
            display_text_60: Some(text.into()),
            display_text_200: None,
        }
    }

    fn long(interaction_type: InteractionType, text: impl Into<String>) -> Self {
        Self {
            interaction_type,
            display_text_60: None,
            display_text_200: Some(text.into()),
        }
    }

    pub fn display_text_and_pin(text: impl Into<String>) -> Self {
        Self::short(InteractionType::DisplayTextAndPin, text)
    }

    pub fn verification_code_choice(text: impl Into<String>) -> Self {
        Self::short(InteractionType::VerificationCodeChoice, text)
    }

    pub fn confirmation_message(text: impl Into<String>) -> Self {
        Self::long(InteractionType::ConfirmationMessage, text)
    }

    pub fn confirmation_message_and_verification_code_choice(text: impl Into<String>) -> Self {
        Self::long(
            InteractionType::ConfirmationMessageAndVerificationCodeChoice,
            text,
        )
    }

    /// Display texts are limited to 60 and 200 characters.
    pub fn validate(&self) -> Result<()> {
        check_len("displayText60", &self.display_text_60, DISPLAY_TEXT_60_MAX)?;
        check_len("displayText200", &self.display_text_200, DISPLAY_TEXT_200_MAX)
    }
}

impl Default for Interaction {
    fn default() -> Self {
        Self::display_text_and_pin(DEFAULT_DISPLAY_TEXT)
    }
}

fn check_len(field: &str, text: &Option<String>, max: usize) -> Result<()> {
    match text {
        Some(text) if text.chars().count() > max => Err(Error::InvalidRequest(format!(
            "{field} is longer than {max} characters"
        ))),
        _ => Ok(()),
    }
}

/// Request to authenticate or sign on behalf of one person.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Falls back to the client configuration when `None`.
    pub relying_party_uuid: Option<String>,
    /// Falls back to the client configuration when `None`.
    pub relying_party_name: Option<String>,
    pub certificate_level: CertificateLevel,
    pub hash: AuthHash,
    pub nonce: Option<String>,
    pub capabilities: Vec<String>,
    /// Defaults to a single `displayTextAndPIN` interaction when empty.
    pub allowed_interactions_order: Vec<Interaction>,
    pub auth_type: AuthType,
    /// Semantic identifier or document number, depending on `auth_type`.
    pub identifier: String,
    pub endpoint: Endpoint,
}

impl AuthRequest {
    /// A request with a freshly generated SHA-512 commitment.
    pub fn new(auth_type: AuthType, identifier: impl Into<String>) -> Self {
        Self {
            relying_party_uuid: None,
            relying_party_name: None,
            certificate_level: CertificateLevel::default(),
            hash: AuthHash::generate(Default::default()),
            nonce: None,
            capabilities: vec![],
            allowed_interactions_order: vec![],
            auth_type,
            identifier: identifier.into(),
            endpoint: Endpoint::default(),
        }
    }

    pub fn for_person(identifier: &SemanticIdentifier) -> Self {
        Self::new(AuthType::Etsi, identifier.to_string())
    }

    pub fn for_document(document_number: impl Into<String>) -> Self {
        Self::new(AuthType::Document, document_number)
    }

    pub fn with_hash(mut self, hash: AuthHash) -> Self {
        self.hash = hash;
        self
    }

    pub fn with_certificate_level(mut self, level: CertificateLevel) -> Self {
        self.certificate_level = level;
        self
    }

    pub fn with_relying_party(mut self, uuid: impl Into<String>, name: impl Into<String>) -> Self {
        self.relying_party_uuid = Some(uuid.into());
        self.relying_party_name = Some(name.into());
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Append an interaction to the allowed interactions order.
    pub fn with_interaction(mut self, interaction: Interaction) -> Self {
        self.allowed_interactions_order.push(interaction);
        self
    }

    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Code to show the person before polling starts.
    pub fn verification_code(&self) -> String {
        self.hash.verification_code()
    }

    /// The interactions that will be sent, with the default applied.
    pub fn interactions(&self) -> Vec<Interaction> {
        if self.allowed_interactions_order.is_empty() {
            vec![Interaction::default()]
        } else {
            self.allowed_interactions_order.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.identifier.trim().is_empty() {
            return Err(Error::InvalidRequest("identifier is empty".into()));
        }
        self.allowed_interactions_order
            .iter()
            .try_for_each(Interaction::validate)
    }
}
