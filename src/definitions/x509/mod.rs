pub mod encoded;
pub mod trust_anchor;
pub mod util;
pub mod validation;

pub use encoded::CertificateWithDer;
pub use trust_anchor::TrustAnchorRegistry;
pub use validation::{verify_chain, ChainError, ValidationOptions};

#[cfg(test)]
pub(crate) mod test {
    use std::sync::OnceLock;
    use std::time::{Duration, SystemTime};

    use rand::random;
    use rsa::{pkcs1v15, RsaPrivateKey};
    use sha2::Sha256;
    use x509_cert::{
        builder::{Builder, CertificateBuilder, Profile},
        ext::pkix::{BasicConstraints, KeyUsage, KeyUsages},
        name::Name,
        spki::SubjectPublicKeyInfoOwned,
        time::{Time, Validity},
        Certificate,
    };

    pub(crate) const ROOT_NAME: &str = "CN=TEST of SK ID Solutions EID-Q 2024R,O=SK ID Solutions AS,C=EE";
    pub(crate) const LEAF_NAME: &str =
        "CN=TESTNUMBER OK,2.5.4.4=TESTNUMBER,2.5.4.42=OK,2.5.4.5=PNOEE-30303039914,C=EE";

    /// Keys and certificates shared by the unit tests. RSA key generation is
    /// slow, so it happens once per test binary.
    pub(crate) struct Pki {
        pub root_key: RsaPrivateKey,
        pub leaf_key: RsaPrivateKey,
        pub other_key: RsaPrivateKey,
        pub root: Certificate,
        pub leaf: Certificate,
        pub other_root: Certificate,
    }

    pub(crate) fn pki() -> &'static Pki {
        static PKI: OnceLock<Pki> = OnceLock::new();
        PKI.get_or_init(|| {
            let mut rng = rand::thread_rng();
            let root_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
            let leaf_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
            let other_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();

            let root = issue_root(&root_key, ROOT_NAME.parse().unwrap());
            let leaf = issue_leaf(
                &leaf_key,
                &root_key,
                root.tbs_certificate.subject.clone(),
                LEAF_NAME.parse().unwrap(),
                current_validity(),
            );
            let other_root = issue_root(&other_key, "CN=Other Root,C=LV".parse().unwrap());

            Pki {
                root_key,
                leaf_key,
                other_key,
                root,
                leaf,
                other_root,
            }
        })
    }

    pub(crate) fn validity(not_before: SystemTime, not_after: SystemTime) -> Validity {
        Validity {
            not_before: Time::try_from(not_before).unwrap(),
            not_after: Time::try_from(not_after).unwrap(),
        }
    }

    /// Started an hour ago, ends tomorrow.
    pub(crate) fn current_validity() -> Validity {
        let now = SystemTime::now();
        validity(
            now - Duration::from_secs(3600),
            now + Duration::from_secs(86400),
        )
    }

    pub(crate) fn issue_root(key: &RsaPrivateKey, name: Name) -> Certificate {
        let signer = pkcs1v15::SigningKey::<Sha256>::new(key.clone());
        let spki = SubjectPublicKeyInfoOwned::from_key(key.to_public_key()).unwrap();
        let now = SystemTime::now();

        let mut builder = CertificateBuilder::new(
            Profile::Manual { issuer: None },
            random::<u64>().into(),
            validity(
                now - Duration::from_secs(86400),
                now + Duration::from_secs(86400 * 365),
            ),
            name,
            spki,
            &signer,
        )
        .unwrap();

        builder
            .add_extension(&KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign))
            .unwrap();
        builder
            .add_extension(&BasicConstraints {
                ca: true,
                path_len_constraint: Some(0),
            })
            .unwrap();

        builder.build::<pkcs1v15::Signature>().unwrap()
    }

    pub(crate) fn issue_leaf(
        subject_key: &RsaPrivateKey,
        issuer_key: &RsaPrivateKey,
        issuer: Name,
        subject: Name,
        validity: Validity,
    ) -> Certificate {
        let signer = pkcs1v15::SigningKey::<Sha256>::new(issuer_key.clone());
        let spki = SubjectPublicKeyInfoOwned::from_key(subject_key.to_public_key()).unwrap();

        let mut builder = CertificateBuilder::new(
            Profile::Manual {
                issuer: Some(issuer),
            },
            random::<u64>().into(),
            validity,
            subject,
            spki,
            &signer,
        )
        .unwrap();

        builder
            .add_extension(&KeyUsage(KeyUsages::DigitalSignature.into()))
            .unwrap();

        builder.build::<pkcs1v15::Signature>().unwrap()
    }
}
