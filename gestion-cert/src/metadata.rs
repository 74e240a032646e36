use crate::error::{CertError, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use x509_parser::oid_registry::{OID_X509_COMMON_NAME, OID_X509_SERIALNUMBER};

/// Subject and validity data of an AFIP certificate
#[derive(Debug, Clone)]
pub struct CertMetadata {
    pub common_name: Option<String>,
    /// Subject `serialNumber` attribute; AFIP puts `CUIT nnnnnnnnnnn` here
    pub subject_serial: Option<String>,
    /// Certificate serial (hex)
    pub serial_number: String,
    pub fingerprint_sha256: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl CertMetadata {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let parsed = pem::parse(pem)?;
        if parsed.tag() != "CERTIFICATE" {
            return Err(CertError::InvalidCertificate(format!(
                "expected CERTIFICATE, got {}",
                parsed.tag()
            )));
        }
        Self::from_der(parsed.contents())
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let fingerprint_sha256 = hex::encode(Sha256::digest(der));

        let (_, x509) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| CertError::InvalidCertificate(format!("X509 parse error: {}", e)))?;

        let mut common_name = None;
        let mut subject_serial = None;
        for rdn in x509.subject().iter_rdn() {
            for attr in rdn.iter() {
                let value = attr.as_str().ok().map(|s| s.to_string());
                if attr.attr_type() == &OID_X509_COMMON_NAME {
                    common_name = value;
                } else if attr.attr_type() == &OID_X509_SERIALNUMBER {
                    subject_serial = value;
                }
            }
        }

        let serial_number = x509.tbs_certificate.serial.to_str_radix(16);
        let validity = x509.validity();

        Ok(Self {
            common_name,
            subject_serial,
            serial_number,
            fingerprint_sha256,
            not_before: to_utc(validity.not_before.timestamp())?,
            not_after: to_utc(validity.not_after.timestamp())?,
        })
    }

    /// Load metadata from a PEM certificate file
    pub fn from_pem_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let pem = fs::read_to_string(path)?;
        Self::from_pem(&pem)
    }

    /// Eleven-digit CUIT from the subject serial (`CUIT 20123456789`)
    pub fn cuit(&self) -> Option<u64> {
        let serial = self.subject_serial.as_deref()?;
        let digits = serial.trim().strip_prefix("CUIT")?.trim();
        if digits.len() != 11 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before <= now && now <= self.not_after
    }

    /// Verify if the fingerprint matches the expected SHA256 hex string (case-insensitive)
    pub fn verify_fingerprint(&self, expected_sha256_hex: &str) -> bool {
        self.fingerprint_sha256
            .eq_ignore_ascii_case(expected_sha256_hex)
    }
}

fn to_utc(timestamp: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| CertError::InvalidCertificate(format!("validity out of range: {timestamp}")))
}
