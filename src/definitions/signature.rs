use std::fmt;

use anyhow::{anyhow, Result};
use rsa::Pkcs1v15Sign;
use serde::{Deserialize, Serialize};
use sha2::{Sha256, Sha384, Sha512};

use super::certificate::Certificate;
use super::hash::AuthHash;
use super::x509::util::rsa_public_key;

/// Signing algorithm as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignatureAlgorithm {
    Sha256WithRsa,
    Sha384WithRsa,
    Sha512WithRsa,
    /// Any other algorithm name. Signatures with such an algorithm never verify.
    Other(String),
}

impl SignatureAlgorithm {
    fn unnamed() -> Self {
        Self::Other(String::new())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Sha256WithRsa => "sha256WithRSAEncryption",
            Self::Sha384WithRsa => "sha384WithRSAEncryption",
            Self::Sha512WithRsa => "sha512WithRSAEncryption",
            Self::Other(name) => name,
        }
    }

    fn padding(&self) -> Option<Pkcs1v15Sign> {
        match self {
            Self::Sha256WithRsa => Some(Pkcs1v15Sign::new::<Sha256>()),
            Self::Sha384WithRsa => Some(Pkcs1v15Sign::new::<Sha384>()),
            Self::Sha512WithRsa => Some(Pkcs1v15Sign::new::<Sha512>()),
            Self::Other(_) => None,
        }
    }
}

impl From<String> for SignatureAlgorithm {
    fn from(name: String) -> Self {
        match name.as_str() {
            "sha256WithRSAEncryption" => Self::Sha256WithRsa,
            "sha384WithRSAEncryption" => Self::Sha384WithRsa,
            "sha512WithRSAEncryption" => Self::Sha512WithRsa,
            _ => Self::Other(name),
        }
    }
}

impl From<SignatureAlgorithm> for String {
    fn from(algorithm: SignatureAlgorithm) -> Self {
        algorithm.as_str().to_string()
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signature over the hash commitment, returned with a completed session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Base64 encoded signature value.
    #[serde(default)]
    pub value: String,
    /// Absent in the reply means an unnamed algorithm, which never verifies.
    #[serde(default = "SignatureAlgorithm::unnamed")]
    pub algorithm: SignatureAlgorithm,
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl Signature {
    pub fn new(value: impl Into<String>, algorithm: SignatureAlgorithm) -> Self {
        Self {
            value: value.into(),
            algorithm,
        }
    }

    /// Check the signature as RSA PKCS#1 v1.5 over `hash`, using the public
    /// key of `certificate`.
    ///
    /// Every failure (bad base64, unknown algorithm, non-RSA key, mismatch)
    /// yields `false`.
    pub fn verify(&self, certificate: &Certificate, hash: &AuthHash) -> bool {
        match self.try_verify(certificate, hash) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("signature could not be validated: {e:#}");
                false
            }
        }
    }

    fn try_verify(&self, certificate: &Certificate, hash: &AuthHash) -> Result<()> {
        let padding = self
            .algorithm
            .padding()
            .ok_or_else(|| anyhow!("unsupported signature algorithm '{}'", self.algorithm))?;
        let signature = base64::decode(&self.value)?;
        let cert = certificate.parse()?;
        let key = rsa_public_key(cert)?;
        key.verify(padding, hash.as_bytes(), &signature)?;
        Ok(())
    }
}
