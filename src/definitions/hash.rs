//! Hash commitments that the end user is asked to sign.
//!
//! The relying party never sends the document itself. It sends a digest
//! ([`AuthHash`]) and shows the user a short verification code derived from
//! it, so the user can check that the request on their phone is the one the
//! relying party started.

use std::fmt;

use rand::{CryptoRng, RngCore};
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256, Sha384, Sha512};
use strum_macros::{AsRefStr, Display, EnumString};

/// How many random bytes are drawn before hashing a fresh commitment.
const ENTROPY_LEN: usize = 64;

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("{algorithm} digest must be {expected} bytes, got {actual}")]
    DigestLength {
        algorithm: HashAlgorithm,
        expected: usize,
        actual: usize,
    },
    #[error("hash is not valid base64: {0}")]
    Base64(String),
}

/// Digest algorithms accepted by the service for commitments.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, Default, Serialize,
)]
pub enum HashAlgorithm {
    #[strum(serialize = "SHA256")]
    #[serde(rename = "SHA256")]
    Sha256,
    #[strum(serialize = "SHA384")]
    #[serde(rename = "SHA384")]
    Sha384,
    #[default]
    #[strum(serialize = "SHA512")]
    #[serde(rename = "SHA512")]
    Sha512,
}

impl HashAlgorithm {
    /// Resolve an algorithm from its wire name (`SHA256`, `SHA384`, `SHA512`).
    pub fn from_name(name: &str) -> Result<Self, Error> {
        name.parse()
            .map_err(|_| Error::UnsupportedAlgorithm(name.to_string()))
    }

    /// Length in bytes of a digest produced by this algorithm.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

/// Digest sent to the service for authentication or signing.
///
/// The digest length always matches [`AuthHash::algorithm`].
#[derive(Clone, PartialEq, Eq)]
pub struct AuthHash {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl AuthHash {
    /// Generate a fresh commitment from 64 bytes of OS randomness.
    pub fn generate(algorithm: HashAlgorithm) -> Self {
        Self::generate_with_rng(algorithm, &mut rand::rngs::OsRng)
    }

    /// Resolve `name` and generate a fresh commitment with it.
    pub fn generate_named(name: &str) -> Result<Self, Error> {
        HashAlgorithm::from_name(name).map(Self::generate)
    }

    pub fn generate_with_rng<R>(algorithm: HashAlgorithm, rng: &mut R) -> Self
    where
        R: RngCore + CryptoRng,
    {
        let mut entropy = [0u8; ENTROPY_LEN];
        rng.fill_bytes(&mut entropy);
        Self::digest_of(algorithm, &entropy)
    }

    /// Hash arbitrary data, e.g. a document to be signed.
    pub fn digest_of(algorithm: HashAlgorithm, data: &[u8]) -> Self {
        Self {
            algorithm,
            digest: algorithm.digest(data),
        }
    }

    /// Wrap an existing digest, checking its length against `algorithm`.
    pub fn from_digest(algorithm: HashAlgorithm, digest: Vec<u8>) -> Result<Self, Error> {
        let expected = algorithm.digest_len();
        if digest.len() != expected {
            return Err(Error::DigestLength {
                algorithm,
                expected,
                actual: digest.len(),
            });
        }
        Ok(Self { algorithm, digest })
    }

    pub fn from_base64(algorithm: HashAlgorithm, encoded: &str) -> Result<Self, Error> {
        let digest = base64::decode(encoded).map_err(|e| Error::Base64(e.to_string()))?;
        Self::from_digest(algorithm, digest)
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.digest
    }

    /// Standard, padded base64 as sent on the wire.
    pub fn to_base64(&self) -> String {
        base64::encode(&self.digest)
    }

    /// Four digit code the user compares against the one shown in their app.
    ///
    /// Computed as the last two bytes of SHA-256 over the digest, read as a
    /// big-endian `u16`, modulo 10000.
    pub fn verification_code(&self) -> String {
        let sum = Sha256::digest(&self.digest);
        let tail = [sum[sum.len() - 2], sum[sum.len() - 1]];
        format!("{:04}", u16::from_be_bytes(tail) % 10000)
    }
}

impl AsRef<[u8]> for AuthHash {
    fn as_ref(&self) -> &[u8] {
        &self.digest
    }
}

impl fmt::Debug for AuthHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthHash")
            .field("algorithm", &self.algorithm)
            .field("verification_code", &self.verification_code())
            .finish()
    }
}

impl Serialize for AuthHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_base64())
    }
}

#[cfg(test)]
mod test {
    use hex_literal::hex;
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn generated_digest_matches_algorithm_size() {
        assert_eq!(AuthHash::generate(HashAlgorithm::Sha256).as_bytes().len(), 32);
        assert_eq!(AuthHash::generate(HashAlgorithm::Sha384).as_bytes().len(), 48);
        assert_eq!(AuthHash::generate(HashAlgorithm::Sha512).as_bytes().len(), 64);
    }

    #[test]
    fn generated_hashes_differ() {
        let a = AuthHash::generate(HashAlgorithm::Sha512);
        let b = AuthHash::generate(HashAlgorithm::Sha512);
        assert_ne!(a, b);
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let a = AuthHash::generate_with_rng(HashAlgorithm::Sha256, &mut StdRng::seed_from_u64(7));
        let b = AuthHash::generate_with_rng(HashAlgorithm::Sha256, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_algorithm_name_is_rejected() {
        assert_eq!(
            AuthHash::generate_named("SHA224").unwrap_err(),
            Error::UnsupportedAlgorithm("SHA224".into())
        );
        assert_eq!(
            AuthHash::generate_named("SHA384").unwrap().as_bytes().len(),
            48
        );
    }

    #[test]
    fn verification_code_regression_vector() {
        let hash = AuthHash::digest_of(HashAlgorithm::Sha512, &[0x41; 10]);
        assert_eq!(hash.verification_code(), "3174");
        assert_eq!(hash.verification_code(), hash.clone().verification_code());
    }

    #[test]
    fn verification_code_is_zero_padded() {
        let hash = AuthHash::from_digest(HashAlgorithm::Sha256, vec![0u8; 32]).unwrap();
        let code = hash.verification_code();
        assert_eq!(code.len(), 4);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn base64_round_trips() {
        let hash = AuthHash::generate(HashAlgorithm::Sha384);
        let decoded = AuthHash::from_base64(HashAlgorithm::Sha384, &hash.to_base64()).unwrap();
        assert_eq!(decoded.as_bytes(), hash.as_bytes());
    }

    #[test]
    fn base64_is_standard_alphabet_with_padding() {
        let hash = AuthHash::from_digest(
            HashAlgorithm::Sha256,
            hex!("fbfffefdfcfbfaf9f8f7f6f5f4f3f2f1f0efeeedecebeae9e8e7e6e5e4e3e2e1").to_vec(),
        )
        .unwrap();
        let encoded = hash.to_base64();
        assert!(encoded.starts_with("+//+"));
        assert!(encoded.ends_with('='));
        assert_eq!(serde_json::to_string(&hash).unwrap(), format!("\"{encoded}\""));
    }

    #[test]
    fn digest_length_is_checked() {
        let err = AuthHash::from_digest(HashAlgorithm::Sha512, vec![0; 32]).unwrap_err();
        assert_eq!(
            err,
            Error::DigestLength {
                algorithm: HashAlgorithm::Sha512,
                expected: 64,
                actual: 32
            }
        );
    }
}
