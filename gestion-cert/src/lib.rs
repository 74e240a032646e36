//! Certificate handling for AFIP web services
//!
//! PEM clean-up, certificate metadata and the CMS signer WSAA needs.

mod csr;
mod error;
mod metadata;
mod normalize;
pub mod signer;

pub use csr::{CsrRequest, generate_csr};
pub use error::{CertError, Result};
pub use metadata::CertMetadata;
pub use normalize::{LABEL_CERTIFICATE, LABEL_PRIVATE_KEY, load_pem_file, normalize_pem};
pub use signer::{CmsSigner, OpensslCmsSigner};
