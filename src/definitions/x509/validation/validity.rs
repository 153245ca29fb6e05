use time::OffsetDateTime;
use x509_cert::Certificate;

/// Check certificate validity period against a specific time.
pub fn check_validity_period_at(certificate: &Certificate, at: OffsetDateTime) -> Vec<Error> {
    let mut errors: Vec<Error> = vec![];
    let (not_before, not_after) = validity_window(certificate);

    if not_after < at {
        errors.push(Error::Expired);
    }
    if not_before > at {
        errors.push(Error::NotYetValid);
    }

    errors
}

/// The `(notBefore, notAfter)` bounds of the certificate.
pub fn validity_window(certificate: &Certificate) -> (OffsetDateTime, OffsetDateTime) {
    let validity = certificate.tbs_certificate.validity;
    (
        OffsetDateTime::from(validity.not_before.to_system_time()),
        OffsetDateTime::from(validity.not_after.to_system_time()),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("expired")]
    Expired,
    #[error("not yet valid")]
    NotYetValid,
}
