//! CMS signing for WSAA
//!
//! WSAA takes the login ticket request wrapped in a PKCS#7 / CMS
//! SignedData structure with the content attached, DER encoded.

use std::path::Path;

use openssl::cms::{CMSOptions, CmsContentInfo};
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;

use crate::error::{CertError, Result};
use crate::metadata::CertMetadata;
use crate::normalize::{LABEL_CERTIFICATE, LABEL_PRIVATE_KEY, load_pem_file, normalize_pem};

/// Signer interface
///
/// Callers never see the private key; they hand over bytes and get a
/// signed CMS structure back.
pub trait CmsSigner: Send + Sync {
    /// Attached CMS SignedData over `content`, DER encoded
    fn sign(&self, content: &[u8]) -> Result<Vec<u8>>;

    /// Signing certificate (PEM)
    fn certificate_pem(&self) -> &str;
}

/// Software signer backed by OpenSSL
pub struct OpensslCmsSigner {
    cert: X509,
    key: PKey<Private>,
    cert_pem: String,
}

impl OpensslCmsSigner {
    /// Build from PEM strings; both are normalised first
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self> {
        let cert_pem = normalize_pem(cert_pem, LABEL_CERTIFICATE)?;
        let key_pem = normalize_pem(key_pem, LABEL_PRIVATE_KEY)?;

        let cert = X509::from_pem(cert_pem.as_bytes())
            .map_err(|e| CertError::InvalidCertificate(e.to_string()))?;
        let key = PKey::private_key_from_pem(key_pem.as_bytes())
            .map_err(|e| CertError::InvalidKey(e.to_string()))?;

        if !cert.public_key()?.public_eq(&key) {
            return Err(CertError::KeyMismatch);
        }

        Ok(Self {
            cert,
            key,
            cert_pem,
        })
    }

    /// Load certificate and key files
    pub fn from_files<P: AsRef<Path>>(cert_path: P, key_path: P) -> Result<Self> {
        let cert_pem = load_pem_file(cert_path, LABEL_CERTIFICATE)?;
        let key_pem = load_pem_file(key_path, LABEL_PRIVATE_KEY)?;
        Self::from_pem(&cert_pem, &key_pem)
    }

    pub fn metadata(&self) -> Result<CertMetadata> {
        CertMetadata::from_der(&self.cert.to_der()?)
    }
}

impl CmsSigner for OpensslCmsSigner {
    fn sign(&self, content: &[u8]) -> Result<Vec<u8>> {
        let cms = CmsContentInfo::sign(
            Some(&*self.cert),
            Some(&*self.key),
            None,
            Some(content),
            CMSOptions::BINARY,
        )?;
        let der = cms.to_der()?;
        tracing::debug!(content_len = content.len(), cms_len = der.len(), "CMS signed");
        Ok(der)
    }

    fn certificate_pem(&self) -> &str {
        &self.cert_pem
    }
}
