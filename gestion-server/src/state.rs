//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use afip_client::{AfipConfig, Environment, FileTicketStore, Wsfe};
use gestion_cert::{
    CertError, CertMetadata, CmsSigner, LABEL_CERTIFICATE, LABEL_PRIVATE_KEY, OpensslCmsSigner,
    load_pem_file,
};
use tokio::sync::Mutex;

use crate::config::{AfipSettings, BoxError, Config};
use crate::gemini::GeminiClient;
use crate::storage::Storage;

const AFIP_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    /// HS256 secret for bearer tokens
    pub jwt_secret: String,
    /// `None` when AFIP credentials are not configured
    pub afip: Option<Arc<Wsfe>>,
    /// `None` when no Gemini key is configured
    pub gemini: Option<GeminiClient>,
    /// Held while numbering and submitting a voucher, so two requests
    /// never claim the same number
    pub invoice_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// State with storage only; integrations are attached with the `with_*` builders
    pub fn new(storage: Storage, jwt_secret: impl Into<String>) -> Self {
        Self {
            storage,
            jwt_secret: jwt_secret.into(),
            afip: None,
            gemini: None,
            invoice_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_afip(mut self, wsfe: Arc<Wsfe>) -> Self {
        self.afip = Some(wsfe);
        self
    }

    pub fn with_gemini(mut self, client: GeminiClient) -> Self {
        self.gemini = Some(client);
        self
    }

    /// Open storage and connect the configured integrations
    pub fn from_config(config: &Config) -> Result<Self, BoxError> {
        let storage = Storage::open(config.database_path())?;
        tracing::info!(path = %config.database_path().display(), "Database opened");

        let mut state = Self::new(storage, config.jwt_secret.clone());

        match &config.afip {
            Some(settings) => state = state.with_afip(Arc::new(connect_afip(settings)?)),
            None => tracing::warn!("AFIP_CUIT not set; invoicing disabled"),
        }

        match &config.gemini {
            Some(settings) => {
                state = state.with_gemini(GeminiClient::new(settings)?);
                tracing::info!(model = %settings.model, "Gemini proxy enabled");
            }
            None => tracing::warn!("GEMINI_API_KEY not set; Gemini proxy disabled"),
        }

        Ok(state)
    }
}

/// Signer from inline PEM where given, otherwise from the configured files
fn load_signer(settings: &AfipSettings) -> Result<OpensslCmsSigner, CertError> {
    if settings.cert_pem.is_none() && settings.key_pem.is_none() {
        return OpensslCmsSigner::from_files(&settings.cert_path, &settings.key_path);
    }
    let cert_pem = match &settings.cert_pem {
        Some(pem) => pem.clone(),
        None => load_pem_file(&settings.cert_path, LABEL_CERTIFICATE)?,
    };
    let key_pem = match &settings.key_pem {
        Some(pem) => pem.clone(),
        None => load_pem_file(&settings.key_path, LABEL_PRIVATE_KEY)?,
    };
    OpensslCmsSigner::from_pem(&cert_pem, &key_pem)
}

fn connect_afip(settings: &AfipSettings) -> Result<Wsfe, BoxError> {
    let signer = load_signer(settings).map_err(|e| {
        format!(
            "AFIP credentials ({}, {}): {e}",
            settings.cert_path.display(),
            settings.key_path.display()
        )
    })?;

    let metadata: CertMetadata = signer.metadata()?;
    tracing::info!(
        common_name = metadata.common_name.as_deref().unwrap_or("-"),
        serial = %metadata.serial_number,
        not_after = %metadata.not_after,
        "AFIP certificate loaded"
    );
    if !metadata.is_valid_at(chrono::Utc::now()) {
        tracing::warn!(not_after = %metadata.not_after, "AFIP certificate is outside its validity period");
    }
    if let Some(cert_cuit) = metadata.cuit()
        && cert_cuit != settings.cuit
    {
        tracing::warn!(cert_cuit, configured_cuit = settings.cuit, "Certificate CUIT differs from AFIP_CUIT");
    }

    let config = AfipConfig::new(settings.cuit, Environment::from_flag(settings.production))
        .with_retries(settings.max_retries, AFIP_RETRY_DELAY);
    let signer: Arc<dyn CmsSigner> = Arc::new(signer);
    let store = Arc::new(FileTicketStore::new(settings.ticket_dir.clone()));
    Ok(afip_client::connect(&config, signer, store)?)
}
