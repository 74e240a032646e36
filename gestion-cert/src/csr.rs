//! Key and CSR generation for a new AFIP certificate
//!
//! AFIP issues WSAA certificates from a PKCS#10 request whose subject
//! carries the organisation, an alias as common name and the taxpayer
//! CUIT in the `serialNumber` attribute.

use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509NameBuilder, X509ReqBuilder};

use crate::error::{CertError, Result};

const KEY_BITS: u32 = 2048;

/// Subject data for a certificate request
#[derive(Debug, Clone)]
pub struct CsrRequest {
    pub cuit: u64,
    pub organization: String,
    /// Certificate alias shown in the AFIP portal
    pub common_name: String,
}

/// Generate an RSA key and a signed CSR.
///
/// Returns `(key_pem, csr_pem)`; the key is PKCS#8.
pub fn generate_csr(req: &CsrRequest) -> Result<(String, String)> {
    if req.cuit.to_string().len() != 11 {
        return Err(CertError::InvalidCertificate(format!(
            "CUIT must have 11 digits: {}",
            req.cuit
        )));
    }

    let rsa = Rsa::generate(KEY_BITS)?;
    let key = PKey::from_rsa(rsa)?;

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_nid(Nid::COUNTRYNAME, "AR")?;
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, &req.organization)?;
    name.append_entry_by_nid(Nid::COMMONNAME, &req.common_name)?;
    name.append_entry_by_nid(Nid::SERIALNUMBER, &format!("CUIT {}", req.cuit))?;
    let name = name.build();

    let mut builder = X509ReqBuilder::new()?;
    builder.set_subject_name(&name)?;
    builder.set_pubkey(&key)?;
    builder.sign(&key, MessageDigest::sha256())?;
    let csr = builder.build();

    let key_pem = String::from_utf8(key.private_key_to_pem_pkcs8()?)
        .map_err(|e| CertError::InvalidKey(e.to_string()))?;
    let csr_pem = String::from_utf8(csr.to_pem()?)
        .map_err(|e| CertError::InvalidCertificate(e.to_string()))?;

    tracing::info!(cuit = req.cuit, common_name = %req.common_name, "Generated AFIP CSR");
    Ok((key_pem, csr_pem))
}
