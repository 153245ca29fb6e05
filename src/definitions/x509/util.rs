use anyhow::{Context, Error};
use const_oid::{db::rfc4519::COMMON_NAME, AssociatedOid, ObjectIdentifier};
use der::{
    asn1::{Ia5StringRef, PrintableStringRef, TeletexStringRef, Utf8StringRef},
    referenced::OwnedToRef,
    Encode, Tag, Tagged,
};
use ecdsa::{PrimeCurve, VerifyingKey};
use elliptic_curve::{
    sec1::{FromEncodedPoint, ToEncodedPoint},
    AffinePoint, CurveArithmetic, FieldBytesSize, PublicKey,
};
use rsa::{pkcs8::DecodePublicKey, RsaPublicKey};
use sec1::point::ModulusSize;
use x509_cert::{attr::AttributeValue, name::Name, Certificate};

/// Get the EC public key from a certificate for verification.
pub fn public_key<C>(certificate: &Certificate) -> Result<VerifyingKey<C>, Error>
where
    C: AssociatedOid + CurveArithmetic + PrimeCurve,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    certificate
        .tbs_certificate
        .subject_public_key_info
        .owned_to_ref()
        .try_into()
        .map(|key: PublicKey<C>| key.into())
        .context("could not parse public key from PKCS8 SPKI")
}

/// Get the RSA public key from a certificate for verification.
pub fn rsa_public_key(certificate: &Certificate) -> Result<RsaPublicKey, Error> {
    let spki = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .context("could not encode SPKI")?;
    RsaPublicKey::from_public_key_der(&spki).context("could not parse RSA public key from SPKI")
}

/// Get the first CommonName of the X.509 certificate, or return "Unknown".
pub fn common_name_or_unknown(certificate: &Certificate) -> &str {
    name_values(&certificate.tbs_certificate.subject, COMMON_NAME)
        .next()
        .unwrap_or("Unknown")
}

/// All string values of attribute `oid` in `name`, in encoding order.
///
/// Values with a string type this crate cannot read are skipped.
pub fn name_values(name: &Name, oid: ObjectIdentifier) -> impl Iterator<Item = &str> {
    name.0
        .iter()
        .flat_map(|rdn| rdn.0.iter())
        .filter_map(move |attribute| {
            if attribute.oid == oid {
                attribute_value_to_str(&attribute.value)
            } else {
                None
            }
        })
}

pub fn attribute_value_to_str(av: &AttributeValue) -> Option<&str> {
    match av.tag() {
        Tag::PrintableString => PrintableStringRef::try_from(av).ok().map(|s| s.as_str()),
        Tag::Utf8String => Utf8StringRef::try_from(av).ok().map(|s| s.as_str()),
        Tag::Ia5String => Ia5StringRef::try_from(av).ok().map(|s| s.as_str()),
        Tag::TeletexString => TeletexStringRef::try_from(av).ok().map(|s| s.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use const_oid::db::rfc4519::COUNTRY_NAME;

    use super::*;

    #[test]
    fn reads_repeated_attributes_in_order() {
        let name: Name = "CN=second,CN=first,C=EE".parse().unwrap();
        let country: Vec<_> = name_values(&name, COUNTRY_NAME).collect();
        assert_eq!(country, vec!["EE"]);
        assert_eq!(name_values(&name, COMMON_NAME).count(), 2);
    }

    #[test]
    fn rsa_key_is_extracted_from_certificate() {
        let pki = super::super::test::pki();
        assert!(rsa_public_key(&pki.leaf).is_ok());
        assert!(public_key::<p256::NistP256>(&pki.leaf).is_err());
        assert_eq!(common_name_or_unknown(&pki.root), "TEST of SK ID Solutions EID-Q 2024R");
    }
}
