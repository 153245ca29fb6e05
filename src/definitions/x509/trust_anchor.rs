use std::path::Path;

use x509_cert::Certificate;

use super::{encoded::CertificateWithDer, validation::ChainError};

/// Root certificates a response certificate may chain to.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorRegistry {
    pub anchors: Vec<Certificate>,
}

impl TrustAnchorRegistry {
    pub fn new(anchors: Vec<Certificate>) -> Self {
        Self { anchors }
    }

    /// Build a registry from PEM encoded certificates, one per item.
    pub fn from_pem_certificates<I, B>(pems: I) -> Result<Self, ChainError>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let anchors = pems
            .into_iter()
            .map(|pem| {
                CertificateWithDer::from_pem(pem.as_ref())
                    .map(|cert| cert.inner)
                    .map_err(|e| ChainError::AnchorUnreadable(format!("{e:#}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { anchors })
    }

    /// Read every file before decoding any of them. The first unreadable or
    /// undecodable path aborts the whole load.
    pub fn from_pem_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ChainError> {
        let contents = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                std::fs::read(path).map_err(|e| {
                    ChainError::AnchorUnreadable(format!("{}: {e}", path.display()))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!("read {} trust anchor file(s)", contents.len());
        Self::from_pem_certificates(contents)
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.anchors.iter()
    }
}
