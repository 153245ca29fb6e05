#![no_main]

use libfuzzer_sys::fuzz_target;
use smartid::client::TransportStatus;
use smartid::{AuthHash, CertificateLevel, HashAlgorithm, SessionHandle, SessionResponse, SessionStatus};

fuzz_target!(|data: &[u8]| {
    let Ok(status) = serde_json::from_slice::<SessionStatus>(data) else {
        return;
    };
    let handle = SessionHandle::new(
        "fuzz",
        AuthHash::digest_of(HashAlgorithm::Sha512, data),
        CertificateLevel::Qualified,
    );
    let response = SessionResponse::new(handle, TransportStatus::new(200), status);
    let _ = response.validate();
    let _ = response.identity();
});
