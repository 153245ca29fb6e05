pub mod certificate;
pub mod hash;
pub mod identity;
pub mod request;
pub mod session;
pub mod signature;
pub mod x509;

pub use certificate::{Certificate, CertificateLevel};
pub use hash::{AuthHash, HashAlgorithm};
pub use identity::{IdentifierType, Identity, SemanticIdentifier};
pub use request::{AuthRequest, AuthType, Endpoint, Interaction, InteractionType};
pub use session::{EndResult, SessionHandle, SessionResult, SessionState, SessionStatus};
pub use signature::{Signature, SignatureAlgorithm};
