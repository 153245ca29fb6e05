//! Root-of-trust verification for end-entity certificates.
//!
//! The path is built from the end-entity certificate straight to one of the
//! supplied trust anchors: either the certificate is itself an anchor, or an
//! anchor whose subject matches the certificate's issuer signed it. Both the
//! certificate and the anchor must be inside their validity windows, and an
//! anchor that carries a key usage extension must allow certificate signing.

use const_oid::AssociatedOid;
use der::Decode;
use self::signature::issuer_signed_subject;
use time::OffsetDateTime;
use validity::check_validity_period_at;
use x509_cert::{ext::pkix::KeyUsage, Certificate};

use super::{trust_anchor::TrustAnchorRegistry, util::common_name_or_unknown};

pub(super) mod signature;
pub mod validity;

/// Options for certificate chain validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// The time to use for validity period checks.
    /// If `None`, the current system time is used.
    pub validation_time: Option<OffsetDateTime>,
}

impl ValidationOptions {
    /// Get the validation time, defaulting to current time if not set.
    fn validation_time(&self) -> OffsetDateTime {
        self.validation_time.unwrap_or_else(OffsetDateTime::now_utc)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    #[error("no trust anchors were supplied")]
    NoTrustAnchors,
    #[error("trust anchor could not be loaded: {0}")]
    AnchorUnreadable(String),
    #[error("certificate could not be decoded: {0}")]
    CertificateDecode(String),
    #[error("certificate '{common_name}' is {error}")]
    Validity {
        common_name: String,
        error: validity::Error,
    },
    #[error("no trust anchor issued certificate '{0}'")]
    NoPathToAnchor(String),
}

/// Verify that `certificate` chains to one of `trust_anchors`.
pub fn verify_chain(
    certificate: &Certificate,
    trust_anchors: &TrustAnchorRegistry,
    options: &ValidationOptions,
) -> Result<(), ChainError> {
    if trust_anchors.is_empty() {
        return Err(ChainError::NoTrustAnchors);
    }

    let validation_time = options.validation_time();

    if let Some(error) = check_validity_period_at(certificate, validation_time)
        .into_iter()
        .next()
    {
        return Err(ChainError::Validity {
            common_name: common_name_or_unknown(certificate).to_string(),
            error,
        });
    }

    if is_trusted_certificate(certificate, trust_anchors, validation_time) {
        tracing::debug!(
            "certificate is itself a trust anchor: {}",
            common_name_or_unknown(certificate)
        );
        return Ok(());
    }

    let mut candidates = find_trust_anchor_candidates(certificate, trust_anchors, validation_time);

    let Some(anchor) = candidates.next() else {
        return Err(ChainError::NoPathToAnchor(
            common_name_or_unknown(certificate).to_string(),
        ));
    };

    tracing::debug!(
        "certificate '{}' chains to trust anchor '{}'",
        common_name_or_unknown(certificate),
        common_name_or_unknown(anchor)
    );

    Ok(())
}

/// Check if a certificate directly matches a trust anchor.
///
/// We match by subject name and public key (SPKI).
fn is_trusted_certificate(
    certificate: &Certificate,
    trust_anchors: &TrustAnchorRegistry,
    validation_time: OffsetDateTime,
) -> bool {
    trust_anchors
        .iter()
        .filter(|anchor| is_valid_anchor(anchor, validation_time))
        .any(|anchor| {
            anchor.tbs_certificate.subject == certificate.tbs_certificate.subject
                && anchor.tbs_certificate.subject_public_key_info
                    == certificate.tbs_certificate.subject_public_key_info
        })
}

fn find_trust_anchor_candidates<'a: 'b, 'b>(
    subject: &'a Certificate,
    trust_anchors: &'b TrustAnchorRegistry,
    validation_time: OffsetDateTime,
) -> impl Iterator<Item = &'b Certificate> {
    trust_anchors
        .iter()
        .filter(|candidate| candidate.tbs_certificate.subject == subject.tbs_certificate.issuer)
        .filter(|candidate| {
            let allowed = may_sign_certificates(candidate);
            if !allowed {
                tracing::warn!(
                    "trust anchor '{}' is not allowed to sign certificates",
                    common_name_or_unknown(candidate)
                );
            }
            allowed
        })
        .filter(|candidate| {
            let valid = issuer_signed_subject(subject, candidate);
            if !valid {
                tracing::warn!("issuer did not sign subject");
            }
            valid
        })
        .filter(move |candidate| is_valid_anchor(candidate, validation_time))
}

fn is_valid_anchor(anchor: &Certificate, validation_time: OffsetDateTime) -> bool {
    let errors = check_validity_period_at(anchor, validation_time);
    if !errors.is_empty() {
        tracing::warn!(
            "trust anchor '{}' is not valid: {errors:?}",
            common_name_or_unknown(anchor)
        );
    }
    errors.is_empty()
}

/// An anchor without a key usage extension is allowed to sign.
fn may_sign_certificates(anchor: &Certificate) -> bool {
    let Some(extension) = anchor
        .tbs_certificate
        .extensions
        .iter()
        .flatten()
        .find(|ext| ext.extn_id == KeyUsage::OID)
    else {
        return true;
    };

    match KeyUsage::from_der(extension.extn_value.as_bytes()) {
        Ok(key_usage) => key_usage.key_cert_sign(),
        Err(e) => {
            tracing::warn!("could not decode key usage extension: {e:?}");
            false
        }
    }
}
