//! WSAA login (`loginCms`)

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use gestion_cert::CmsSigner;
use serde::{Deserialize, Serialize};

use crate::env::AfipConfig;
use crate::error::{AfipError, Result};
use crate::soap;
use crate::tra::LoginTicketRequest;

const WSAA_NS: &str = "http://wsaa.view.sua.dvadac.desein.afip.gov";

/// Access ticket (TA) granted by WSAA
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTicket {
    pub token: String,
    pub sign: String,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessTicket {
    /// Usable for at least `margin` more
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at - margin > now
    }
}

// Credentials stay out of logs
impl fmt::Debug for AccessTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTicket")
            .field("token", &"<redacted>")
            .field("sign", &"<redacted>")
            .field("generated_at", &self.generated_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of fresh access tickets
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, service: &str) -> Result<AccessTicket>;
}

/// WSAA client
pub struct Wsaa {
    http: reqwest::Client,
    url: String,
    signer: Arc<dyn CmsSigner>,
}

impl Wsaa {
    pub fn new(config: &AfipConfig, signer: Arc<dyn CmsSigner>) -> Result<Self> {
        Ok(Self {
            http: config.http_client()?,
            url: config.endpoints.wsaa.clone(),
            signer,
        })
    }

    /// Signed, base64 encoded TRA for `service`
    fn signed_request(&self, service: &str) -> Result<String> {
        let tra = LoginTicketRequest::new(service, Utc::now());
        let cms = self.signer.sign(tra.to_xml().as_bytes())?;
        Ok(BASE64.encode(cms))
    }
}

#[async_trait]
impl Authenticator for Wsaa {
    async fn login(&self, service: &str) -> Result<AccessTicket> {
        let cms = self.signed_request(service)?;
        let body = format!("<wsaa:loginCms><wsaa:in0>{cms}</wsaa:in0></wsaa:loginCms>");
        let envelope = soap::envelope("wsaa", WSAA_NS, &body);

        tracing::info!(service, url = %self.url, "WSAA loginCms");
        let response = soap::post(&self.http, &self.url, "", envelope).await?;

        let ticket = parse_login_response(&response)?;
        tracing::info!(service, expires_at = %ticket.expires_at, "Access ticket granted");
        Ok(ticket)
    }
}

/// Read the escaped `loginTicketResponse` carried in `loginCmsReturn`
pub fn parse_login_response(xml: &str) -> Result<AccessTicket> {
    let escaped = soap::extract_tag(xml, "loginCmsReturn")
        .ok_or_else(|| AfipError::InvalidResponse("missing loginCmsReturn".into()))?;
    let ticket_xml = soap::xml_unescape(&escaped);

    let field = |name: &'static str| {
        soap::extract_tag(&ticket_xml, name)
            .map(|v| soap::xml_unescape(&v))
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AfipError::InvalidResponse(format!("missing {name} in login ticket")))
    };
    let time = |name: &'static str| -> Result<DateTime<Utc>> {
        let raw = field(name)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| AfipError::InvalidResponse(format!("bad {name} {raw:?}: {e}")))
    };

    Ok(AccessTicket {
        token: field("token")?,
        sign: field("sign")?,
        generated_at: time("generationTime")?,
        expires_at: time("expirationTime")?,
    })
}
