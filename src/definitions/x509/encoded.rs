use anyhow::{anyhow, Context, Result};
#[cfg(test)]
use x509_cert::der::Encode;
use x509_cert::{certificate::Certificate, der::Decode};

const PEM_PREAMBLE: &str = "-----BEGIN";

/// X.509 certificate with the DER representation held in memory.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CertificateWithDer {
    pub inner: Certificate,
    der: Vec<u8>,
}

impl CertificateWithDer {
    pub fn from_pem(bytes: &[u8]) -> Result<Self> {
        let bytes = pem_rfc7468::decode_vec(bytes)
            .map_err(|e| anyhow!("unable to parse certificate from PEM encoding: {e}"))?
            .1;
        CertificateWithDer::from_der(&bytes)
    }

    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let inner = Certificate::from_der(bytes)
            .context("unable to parse certificate from DER encoding")?;
        Ok(Self {
            inner,
            der: bytes.to_vec(),
        })
    }

    /// Decode the certificate value as the service returns it: bare base64
    /// DER, possibly wrapped across lines. PEM armour is accepted as well.
    pub fn from_base64(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.starts_with(PEM_PREAMBLE) {
            return Self::from_pem(trimmed.as_bytes());
        }
        let compact: String = trimmed.split_whitespace().collect();
        let der = base64::decode(compact).context("certificate value is not valid base64")?;
        Self::from_der(&der)
    }

    #[cfg(test)]
    pub fn from_cert(certificate: Certificate) -> Result<Self> {
        let der = certificate.to_der()?;
        Ok(Self {
            inner: certificate,
            der,
        })
    }

    #[cfg(test)]
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}
