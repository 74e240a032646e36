use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),
    #[error("PEM decode error: {0}")]
    Pem(#[from] pem::PemError),
    #[error("No PEM body found")]
    EmptyPem,
    #[error("Malformed PEM: {0}")]
    MalformedPem(String),
    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),
    #[error("Invalid key: {0}")]
    InvalidKey(String),
    #[error("Private key does not match the certificate")]
    KeyMismatch,
}

pub type Result<T> = std::result::Result<T, CertError>;
