use anyhow::{anyhow, Result};
use const_oid::{
    db::rfc5912::{
        ECDSA_WITH_SHA_256, ECDSA_WITH_SHA_384, SHA_256_WITH_RSA_ENCRYPTION,
        SHA_384_WITH_RSA_ENCRYPTION, SHA_512_WITH_RSA_ENCRYPTION,
    },
    AssociatedOid,
};
use der::Encode;
use ecdsa::signature::Verifier;
use p256::NistP256;
use p384::NistP384;
use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256, Sha384, Sha512};
use x509_cert::Certificate;

use crate::definitions::x509::util::{public_key, rsa_public_key};

/// Check that the issuer certificate signed the subject certificate.
///
/// RSA PKCS#1 v1.5 with SHA-2 and ECDSA over P-256/P-384 are supported;
/// anything else is reported as not signed.
pub fn issuer_signed_subject(subject: &Certificate, issuer: &Certificate) -> bool {
    let tbs = match subject.tbs_certificate.to_der() {
        Ok(tbs) => tbs,
        Err(e) => {
            tracing::error!("failed to encode subject tbs: {e:?}");
            return false;
        }
    };

    let sig = subject.signature.raw_bytes();
    let algorithm = subject.signature_algorithm.oid;

    let result = if algorithm == SHA_256_WITH_RSA_ENCRYPTION {
        verify_rsa::<Sha256>(issuer, &tbs, sig)
    } else if algorithm == SHA_384_WITH_RSA_ENCRYPTION {
        verify_rsa::<Sha384>(issuer, &tbs, sig)
    } else if algorithm == SHA_512_WITH_RSA_ENCRYPTION {
        verify_rsa::<Sha512>(issuer, &tbs, sig)
    } else if algorithm == ECDSA_WITH_SHA_256 {
        verify_p256(issuer, &tbs, sig)
    } else if algorithm == ECDSA_WITH_SHA_384 {
        verify_p384(issuer, &tbs, sig)
    } else {
        Err(anyhow!("unsupported signature algorithm {algorithm}"))
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::info!("subject certificate signature could not be validated: {e:?}");
            false
        }
    }
}

fn verify_rsa<D>(issuer: &Certificate, message: &[u8], sig: &[u8]) -> Result<()>
where
    D: Digest + AssociatedOid,
{
    let key = rsa_public_key(issuer)?;
    let hashed = D::digest(message);
    key.verify(Pkcs1v15Sign::new::<D>(), &hashed, sig)?;
    Ok(())
}

fn verify_p256(issuer: &Certificate, message: &[u8], sig: &[u8]) -> Result<()> {
    let key: ecdsa::VerifyingKey<NistP256> = public_key(issuer)?;
    let sig = ecdsa::Signature::<NistP256>::from_der(sig)?;
    key.verify(message, &sig)?;
    Ok(())
}

fn verify_p384(issuer: &Certificate, message: &[u8], sig: &[u8]) -> Result<()> {
    let key: ecdsa::VerifyingKey<NistP384> = public_key(issuer)?;
    let sig = ecdsa::Signature::<NistP384>::from_der(sig)?;
    key.verify(message, &sig)?;
    Ok(())
}
