use std::collections::VecDeque;
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use der::Encode;
use rsa::{pkcs1v15, Pkcs1v15Sign, RsaPrivateKey};
use serde_json::{json, Value};
use sha2::{Sha256, Sha384, Sha512};
use x509_cert::{
    builder::{Builder, CertificateBuilder, Profile},
    ext::pkix::{BasicConstraints, KeyUsage, KeyUsages},
    name::Name,
    spki::SubjectPublicKeyInfoOwned,
    time::{Time, Validity},
    Certificate,
};

use smartid::client::{HttpClient, HttpRequest, HttpResponse};
use smartid::{AuthHash, CertificateLevel, EndResult, HashAlgorithm};

#[allow(dead_code)]
pub const PERSON: &str = "PNOEE-30303039914";
#[allow(dead_code)]
pub const SESSION_ID: &str = "de305d54-75b4-431b-adb2-eb6b9e546014";

pub struct Pki {
    pub root_key: RsaPrivateKey,
    pub leaf_key: RsaPrivateKey,
    pub root: Certificate,
    pub leaf: Certificate,
}

/// Root and end-entity certificate for the person, generated once per test binary.
pub fn pki() -> &'static Pki {
    static PKI: OnceLock<Pki> = OnceLock::new();
    PKI.get_or_init(|| {
        let mut rng = rand::thread_rng();
        let root_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let leaf_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
        let now = SystemTime::now();

        let root_name: Name = "CN=TEST of EID-SK 2016,O=AS Sertifitseerimiskeskus,C=EE"
            .parse()
            .unwrap();
        let root = issue(
            &root_key,
            &root_key,
            None,
            root_name.clone(),
            now - Duration::from_secs(86400),
            now + Duration::from_secs(86400 * 365),
            true,
        );
        let leaf = issue(
            &leaf_key,
            &root_key,
            Some(root_name),
            format!("CN=TESTNUMBER OK,2.5.4.4=TESTNUMBER,2.5.4.42=OK,2.5.4.5={PERSON},C=EE")
                .parse()
                .unwrap(),
            now - Duration::from_secs(3600),
            now + Duration::from_secs(86400),
            false,
        );

        Pki {
            root_key,
            leaf_key,
            root,
            leaf,
        }
    })
}

fn issue(
    subject_key: &RsaPrivateKey,
    issuer_key: &RsaPrivateKey,
    issuer: Option<Name>,
    subject: Name,
    not_before: SystemTime,
    not_after: SystemTime,
    ca: bool,
) -> Certificate {
    let signer = pkcs1v15::SigningKey::<Sha256>::new(issuer_key.clone());
    let spki = SubjectPublicKeyInfoOwned::from_key(subject_key.to_public_key()).unwrap();
    let validity = Validity {
        not_before: Time::try_from(not_before).unwrap(),
        not_after: Time::try_from(not_after).unwrap(),
    };

    let mut builder = CertificateBuilder::new(
        Profile::Manual { issuer },
        rand::random::<u64>().into(),
        validity,
        subject,
        spki,
        &signer,
    )
    .unwrap();

    if ca {
        builder
            .add_extension(&KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign))
            .unwrap();
        builder
            .add_extension(&BasicConstraints {
                ca: true,
                path_len_constraint: Some(0),
            })
            .unwrap();
    } else {
        builder
            .add_extension(&KeyUsage(KeyUsages::DigitalSignature.into()))
            .unwrap();
    }

    builder.build::<pkcs1v15::Signature>().unwrap()
}

/// Base64 signature by the person's key over `hash`, with the algorithm name
/// matching the commitment's digest.
pub fn sign(hash: &AuthHash) -> (String, &'static str) {
    let (padding, algorithm) = match hash.algorithm() {
        HashAlgorithm::Sha256 => (Pkcs1v15Sign::new::<Sha256>(), "sha256WithRSAEncryption"),
        HashAlgorithm::Sha384 => (Pkcs1v15Sign::new::<Sha384>(), "sha384WithRSAEncryption"),
        HashAlgorithm::Sha512 => (Pkcs1v15Sign::new::<Sha512>(), "sha512WithRSAEncryption"),
    };
    let signature = pki().leaf_key.sign(padding, hash.as_bytes()).unwrap();
    (base64::encode(signature), algorithm)
}

#[allow(dead_code)]
pub fn created_body() -> String {
    json!({ "sessionID": SESSION_ID }).to_string()
}

#[allow(dead_code)]
pub fn running_body() -> String {
    json!({ "state": "RUNNING" }).to_string()
}

/// A completed session signed over `hash` with the person's certificate.
#[allow(dead_code)]
pub fn complete_body(end_result: EndResult, hash: &AuthHash, level: CertificateLevel) -> String {
    let mut body = json!({
        "state": "COMPLETE",
        "result": {
            "endResult": end_result.as_str(),
            "documentNumber": format!("{PERSON}-MOCK-Q"),
        },
        "interactionFlowUsed": "displayTextAndPIN",
        "deviceIpAddress": "62.65.42.45",
    });
    if end_result.is_ok() {
        let (value, algorithm) = sign(hash);
        body["signature"] = json!({ "value": value, "algorithm": algorithm });
        body["cert"] = json!({
            "value": base64::encode(pki().leaf.to_der().unwrap()),
            "certificateLevel": level.as_str(),
        });
    }
    body.to_string()
}

#[derive(Debug, thiserror::Error)]
#[error("connection refused")]
pub struct Refused;

/// Replays scripted responses in order and records every request.
///
/// Once the script runs out, requests hang like a long poll the service
/// never answers.
#[derive(Default)]
pub struct ScriptedHttp {
    responses: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<HttpRequest>>,
}

#[allow(dead_code)]
impl ScriptedHttp {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = (u16, S)>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| (status, body.into()))
                    .collect(),
            ),
            requests: Mutex::default(),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    type Error = Refused;

    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, Self::Error> {
        self.requests.lock().unwrap().push(request);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some((status, body)) => Ok(HttpResponse {
                status,
                body: body.into_bytes(),
            }),
            None => std::future::pending().await,
        }
    }
}

#[allow(dead_code)]
pub fn request_body(request: &HttpRequest) -> Value {
    match &request.method {
        smartid::client::HttpMethod::Post { body, .. } => serde_json::from_slice(body).unwrap(),
        smartid::client::HttpMethod::Get => Value::Null,
    }
}
