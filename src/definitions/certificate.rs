use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use x509_cert::name::Name;

use super::identity::Identity;
use super::x509::{
    validation::validity::validity_window, verify_chain, CertificateWithDer, ChainError,
    TrustAnchorRegistry, ValidationOptions,
};

/// Assurance tier asserted by the identity provider.
///
/// Levels are compared by equality only; there is no ordering between them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CertificateLevel {
    #[default]
    Qualified,
    Advanced,
    /// A level this crate does not know about, kept verbatim.
    Other(String),
}

impl CertificateLevel {
    fn unnamed() -> Self {
        Self::Other(String::new())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Qualified => "QUALIFIED",
            Self::Advanced => "ADVANCED",
            Self::Other(level) => level,
        }
    }
}

impl From<String> for CertificateLevel {
    fn from(level: String) -> Self {
        match level.as_str() {
            "QUALIFIED" => Self::Qualified,
            "ADVANCED" => Self::Advanced,
            _ => Self::Other(level),
        }
    }
}

impl From<CertificateLevel> for String {
    fn from(level: CertificateLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for CertificateLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("certificate could not be decoded: {0}")]
pub struct DecodeError(String);

/// Certificate returned by the service with a completed session.
///
/// The X.509 structure is decoded on first use and cached; the cache is
/// initialised at most once even when the value is shared between threads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Base64 encoded DER, as sent by the service.
    #[serde(default)]
    value: String,
    /// Absent in the reply means an unnamed level, which matches no request.
    #[serde(default = "CertificateLevel::unnamed")]
    certificate_level: CertificateLevel,
    #[serde(skip)]
    parsed: OnceLock<Result<CertificateWithDer, DecodeError>>,
}

impl Certificate {
    pub fn new(value: impl Into<String>, certificate_level: CertificateLevel) -> Self {
        Self {
            value: value.into(),
            certificate_level,
            parsed: OnceLock::new(),
        }
    }

    pub fn from_der(der: &[u8], certificate_level: CertificateLevel) -> Self {
        Self::new(base64::encode(der), certificate_level)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn level(&self) -> &CertificateLevel {
        &self.certificate_level
    }

    /// The decoded certificate. Decoding happens once; later calls return
    /// the cached result.
    pub fn parse(&self) -> Result<&x509_cert::Certificate, DecodeError> {
        self.parsed
            .get_or_init(|| {
                CertificateWithDer::from_base64(&self.value)
                    .map_err(|e| DecodeError(format!("{e:#}")))
            })
            .as_ref()
            .map(|cert| &cert.inner)
            .map_err(Clone::clone)
    }

    /// Returns `true` while the current time is *before* the `notBefore` bound.
    ///
    /// Note the naming: despite being called "expired", this is a check of
    /// the lower validity bound, and [`Certificate::is_not_yet_active`]
    /// checks the upper one. A certificate that cannot be decoded counts as
    /// expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(OffsetDateTime::now_utc())
    }

    pub fn is_expired_at(&self, at: OffsetDateTime) -> bool {
        match self.parse() {
            Ok(cert) => at < validity_window(cert).0,
            Err(_) => true,
        }
    }

    /// Returns `true` once the current time is *after* the `notAfter` bound.
    ///
    /// See [`Certificate::is_expired`] for the naming. A certificate that
    /// cannot be decoded counts as not active.
    pub fn is_not_yet_active(&self) -> bool {
        self.is_not_yet_active_at(OffsetDateTime::now_utc())
    }

    pub fn is_not_yet_active_at(&self, at: OffsetDateTime) -> bool {
        match self.parse() {
            Ok(cert) => at > validity_window(cert).1,
            Err(_) => true,
        }
    }

    /// Exact match against `required`; QUALIFIED does not satisfy ADVANCED.
    pub fn matches_level(&self, required: &CertificateLevel) -> bool {
        &self.certificate_level == required
    }

    /// Verify that this certificate chains to one of `trust_anchors`.
    pub fn verify_chain(&self, trust_anchors: &TrustAnchorRegistry) -> Result<(), ChainError> {
        self.verify_chain_with_options(trust_anchors, &ValidationOptions::default())
    }

    pub fn verify_chain_with_options(
        &self,
        trust_anchors: &TrustAnchorRegistry,
        options: &ValidationOptions,
    ) -> Result<(), ChainError> {
        let cert = self
            .parse()
            .map_err(|e| ChainError::CertificateDecode(e.0))?;
        verify_chain(cert, trust_anchors, options)
    }

    /// Load PEM trust roots from `paths` and verify the chain against them.
    pub fn verify_chain_with_paths<P: AsRef<Path>>(&self, paths: &[P]) -> Result<(), ChainError> {
        let trust_anchors = TrustAnchorRegistry::from_pem_files(paths)?;
        self.verify_chain(&trust_anchors)
    }

    pub fn subject(&self) -> Result<&Name, DecodeError> {
        self.parse().map(|cert| &cert.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> Result<&Name, DecodeError> {
        self.parse().map(|cert| &cert.tbs_certificate.issuer)
    }

    pub fn subject_identity(&self) -> Result<Identity, DecodeError> {
        self.subject().map(Identity::from_name)
    }

    pub fn issuer_identity(&self) -> Result<Identity, DecodeError> {
        self.issuer().map(Identity::from_name)
    }
}

#[cfg(test)]
mod test {
    use std::time::{Duration, SystemTime};

    use der::Encode;

    use super::*;
    use crate::definitions::x509::test::{issue_leaf, pki, validity, LEAF_NAME};

    fn wrap(cert: &x509_cert::Certificate, level: CertificateLevel) -> Certificate {
        Certificate::from_der(&cert.to_der().unwrap(), level)
    }

    #[test]
    fn parse_is_cached() {
        let pki = pki();
        let cert = wrap(&pki.leaf, CertificateLevel::Qualified);
        let first = cert.parse().unwrap() as *const _;
        let second = cert.parse().unwrap() as *const _;
        assert_eq!(first, second);
        assert_eq!(cert.parse().unwrap(), &pki.leaf);
    }

    #[test]
    fn parse_is_shared_between_threads() {
        let pki = pki();
        let cert = wrap(&pki.leaf, CertificateLevel::Qualified);
        let cert = &cert;
        // Raw pointers are not Send, so the addresses cross threads as usize.
        let addresses: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(move || cert.parse().unwrap() as *const x509_cert::Certificate as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let cached: *const x509_cert::Certificate = cert.parse().unwrap();
        assert!(addresses
            .iter()
            .all(|&address| std::ptr::eq(address as *const x509_cert::Certificate, cached)));
        assert_eq!(cert.parse().unwrap(), &pki.leaf);
    }

    #[test]
    fn missing_level_matches_no_request() {
        let cert: Certificate = serde_json::from_str(r#"{"value":"Zm9vYmFy"}"#).unwrap();
        assert_eq!(cert.level(), &CertificateLevel::Other(String::new()));
        assert!(!cert.matches_level(&CertificateLevel::Qualified));
        assert!(!cert.matches_level(&CertificateLevel::Advanced));

        let cert: Certificate = serde_json::from_str("{}").unwrap();
        assert_eq!(cert.value(), "");
        assert!(cert.parse().is_err());
    }

    #[test]
    fn undecodable_certificate_fails_closed() {
        let cert = Certificate::new("Zm9vYmFy", CertificateLevel::Qualified);
        assert!(cert.parse().is_err());
        assert!(cert.is_expired());
        assert!(cert.is_not_yet_active());
        assert!(matches!(
            cert.verify_chain(&TrustAnchorRegistry::new(vec![pki().root.clone()])),
            Err(ChainError::CertificateDecode(_))
        ));
    }

    #[test]
    fn current_certificate_passes_both_temporal_checks() {
        let cert = wrap(&pki().leaf, CertificateLevel::Qualified);
        assert!(!cert.is_expired());
        assert!(!cert.is_not_yet_active());
    }

    #[test]
    fn expired_checks_the_not_before_bound() {
        let pki = pki();
        let now = SystemTime::now();
        let future = issue_leaf(
            &pki.leaf_key,
            &pki.root_key,
            pki.root.tbs_certificate.subject.clone(),
            LEAF_NAME.parse().unwrap(),
            validity(
                now + Duration::from_secs(3600),
                now + Duration::from_secs(7200),
            ),
        );
        let cert = wrap(&future, CertificateLevel::Qualified);
        assert!(cert.is_expired());
        assert!(!cert.is_not_yet_active());
    }

    #[test]
    fn not_yet_active_checks_the_not_after_bound() {
        let pki = pki();
        let now = SystemTime::now();
        let past = issue_leaf(
            &pki.leaf_key,
            &pki.root_key,
            pki.root.tbs_certificate.subject.clone(),
            LEAF_NAME.parse().unwrap(),
            validity(
                now - Duration::from_secs(7200),
                now - Duration::from_secs(3600),
            ),
        );
        let cert = wrap(&past, CertificateLevel::Qualified);
        assert!(!cert.is_expired());
        assert!(cert.is_not_yet_active());
    }

    #[test]
    fn level_match_is_exact() {
        let qualified = wrap(&pki().leaf, CertificateLevel::Qualified);
        let advanced = wrap(&pki().leaf, CertificateLevel::Advanced);
        assert!(qualified.matches_level(&CertificateLevel::Qualified));
        assert!(!qualified.matches_level(&CertificateLevel::Advanced));
        assert!(!advanced.matches_level(&CertificateLevel::Qualified));
        assert!(advanced.matches_level(&CertificateLevel::Advanced));
    }

    #[test]
    fn deserializes_service_json() {
        let der = pki().leaf.to_der().unwrap();
        let json = format!(
            r#"{{"value":"{}","certificateLevel":"ADVANCED"}}"#,
            base64::encode(&der)
        );
        let cert: Certificate = serde_json::from_str(&json).unwrap();
        assert_eq!(cert.level(), &CertificateLevel::Advanced);
        assert_eq!(cert.subject().unwrap(), &pki().leaf.tbs_certificate.subject);

        let unknown: CertificateLevel = serde_json::from_str(r#""BASIC""#).unwrap();
        assert_eq!(unknown, CertificateLevel::Other("BASIC".into()));
    }

    #[test]
    fn chain_verification_uses_supplied_roots() {
        let pki = pki();
        let cert = wrap(&pki.leaf, CertificateLevel::Qualified);
        cert.verify_chain(&TrustAnchorRegistry::new(vec![pki.root.clone()]))
            .unwrap();
        assert!(cert
            .verify_chain(&TrustAnchorRegistry::new(vec![pki.other_root.clone()]))
            .is_err());
        assert_eq!(
            cert.verify_chain(&TrustAnchorRegistry::default()),
            Err(ChainError::NoTrustAnchors)
        );
        assert!(matches!(
            cert.verify_chain_with_paths(&["/nonexistent/root.pem"]),
            Err(ChainError::AnchorUnreadable(_))
        ));
    }
}
