//! Relying-party client for the Smart-ID remote identity service.
//!
//! A relying party sends a hash commitment to be signed on behalf of a
//! person. The service relays it to the person's app, waits for them to
//! confirm, and returns a signature with the certificate it was made with.
//! This crate opens the session, long-polls it to completion, and verifies
//! the response before any identity is read from it.
//!
//! ```ignore
//! use std::time::Duration;
//! use smartid::{AuthRequest, CancelSignal, Client, IdentifierType, SemanticIdentifier};
//!
//! let client = Client::builder()
//!     .relying_party("00000000-0000-0000-0000-000000000000", "DEMO")
//!     .build()?;
//! let person = SemanticIdentifier::new(IdentifierType::Pno, "EE", "30303039914");
//! let request = AuthRequest::for_person(&person);
//! println!("verification code: {}", request.verification_code());
//!
//! let response = client
//!     .authenticate(request, &CancelSignal::deadline(Duration::from_secs(180)))
//!     .await?;
//! response.validate().into_result()?;
//! let identity = response.identity();
//! ```

pub mod client;
pub mod definitions;
pub mod error;
pub mod verification;

pub use client::{
    CancelHandle, CancelSignal, Client, ClientBuilder, ClientConfig, HttpClient, PendingSession,
    SessionPhase,
};
#[cfg(feature = "reqwest")]
pub use client::ReqwestClient;
pub use definitions::{
    AuthHash, AuthRequest, AuthType, Certificate, CertificateLevel, EndResult, HashAlgorithm,
    IdentifierType, Identity, Interaction, SemanticIdentifier, SessionHandle, SessionState,
    SessionStatus, Signature, SignatureAlgorithm,
};
pub use definitions::x509::{ChainError, TrustAnchorRegistry, ValidationOptions};
pub use error::{Error, Result};
pub use verification::{FailureReason, SessionResponse, ValidationError, Verdict};
