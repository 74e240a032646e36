//! WSFE v1 electronic invoicing
//!
//! Only the calls the invoice flow needs: `FEDummy`,
//! `FECompUltimoAutorizado` and `FECAESolicitar`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use chrono_tz::America::Argentina::Buenos_Aires;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use shared::models::{InvoiceOutcome, InvoiceRequest, InvoiceResult};

use crate::env::AfipConfig;
use crate::error::{AfipError, Result};
use crate::soap;
use crate::ticket::TicketManager;
use crate::wsaa::AccessTicket;

/// WSAA service id for WSFE
pub const SERVICE: &str = "wsfe";

const WSFE_NS: &str = "http://ar.gov.afip.dif.FEV1/";

/// `FEDummy` answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub app_server: String,
    pub db_server: String,
    pub auth_server: String,
}

impl ServerStatus {
    pub fn is_ok(&self) -> bool {
        [&self.app_server, &self.db_server, &self.auth_server]
            .iter()
            .all(|s| s.eq_ignore_ascii_case("OK"))
    }
}

/// WSFE client with ticket renewal and retries
pub struct Wsfe {
    http: reqwest::Client,
    url: String,
    cuit: u64,
    tickets: Arc<TicketManager>,
    max_retries: u32,
    retry_delay: Duration,
}

fn amount(value: Decimal) -> String {
    format!(
        "{:.2}",
        value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    )
}

fn afip_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn parse_afip_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y%m%d").ok()
}

fn today_in_argentina() -> NaiveDate {
    Utc::now().with_timezone(&Buenos_Aires).date_naive()
}

impl Wsfe {
    pub fn new(config: &AfipConfig, tickets: Arc<TicketManager>) -> Result<Self> {
        Ok(Self {
            http: config.http_client()?,
            url: config.endpoints.wsfe.clone(),
            cuit: config.cuit,
            tickets,
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    pub fn cuit(&self) -> u64 {
        self.cuit
    }

    fn auth_block(&self, ticket: &AccessTicket) -> String {
        format!(
            "<ar:Auth><ar:Token>{}</ar:Token><ar:Sign>{}</ar:Sign><ar:Cuit>{}</ar:Cuit></ar:Auth>",
            soap::xml_escape(&ticket.token),
            soap::xml_escape(&ticket.sign),
            self.cuit
        )
    }

    async fn post(&self, method: &str, body: &str) -> Result<String> {
        let envelope = soap::envelope("ar", WSFE_NS, body);
        let action = format!("{WSFE_NS}{method}");
        soap::post(&self.http, &self.url, &action, envelope).await
    }

    /// Retry transport failures of an idempotent call
    async fn with_transport_retry<F, Fut>(&self, method: &str, call: F) -> Result<String>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.retry_delay * attempt;
                    tracing::warn!(
                        method,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "WSFE transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }

    /// Authenticated call. A token/sign rejection renews the ticket and
    /// repeats the call once; AFIP refuses those before processing.
    async fn call_authenticated<B>(&self, method: &str, idempotent: bool, body: B) -> Result<String>
    where
        B: Fn(&str) -> String,
    {
        let mut ticket = self.tickets.ticket(SERVICE).await?;
        let mut renewed = false;
        loop {
            let envelope_body = body(&self.auth_block(&ticket));

            let response = if idempotent {
                self.with_transport_retry(method, || self.post(method, &envelope_body))
                    .await?
            } else {
                self.post(method, &envelope_body).await?
            };

            let errors = soap::parse_messages(&response, "Errors", "Err");
            let rejection = AfipError::Service(errors);
            if rejection.is_ticket_error() && !renewed {
                tracing::warn!(method, error = %rejection, "Access ticket rejected, logging in again");
                ticket = self.tickets.renew(SERVICE, &ticket).await?;
                renewed = true;
                continue;
            }
            return Ok(response);
        }
    }

    /// `FEDummy`: infrastructure status, no authentication
    pub async fn server_status(&self) -> Result<ServerStatus> {
        let response = self
            .with_transport_retry("FEDummy", || self.post("FEDummy", "<ar:FEDummy/>"))
            .await?;

        let field = |name: &str| soap::extract_tag(&response, name).unwrap_or_default();
        Ok(ServerStatus {
            app_server: field("AppServer"),
            db_server: field("DbServer"),
            auth_server: field("AuthServer"),
        })
    }

    /// `FECompUltimoAutorizado`: last authorised voucher number
    pub async fn last_voucher(&self, point_of_sale: u32, invoice_type: u16) -> Result<u64> {
        let response = self
            .call_authenticated("FECompUltimoAutorizado", true, |auth| {
                format!(
                    "<ar:FECompUltimoAutorizado>{auth}<ar:PtoVta>{point_of_sale}</ar:PtoVta><ar:CbteTipo>{invoice_type}</ar:CbteTipo></ar:FECompUltimoAutorizado>"
                )
            })
            .await?;

        let errors = soap::parse_messages(&response, "Errors", "Err");
        if !errors.is_empty() {
            return Err(AfipError::Service(errors));
        }

        let number = soap::extract_tag(&response, "CbteNro")
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| AfipError::InvalidResponse("missing CbteNro".into()))?;
        tracing::debug!(point_of_sale, invoice_type, number, "Last authorised voucher");
        Ok(number)
    }

    /// `FECAESolicitar` for a single voucher numbered `number`
    pub async fn request_cae(&self, req: &InvoiceRequest, number: u64) -> Result<InvoiceResult> {
        let detail = detail_request(req, number);
        let response = self
            .call_authenticated("FECAESolicitar", false, |auth| {
                format!(
                    "<ar:FECAESolicitar>{auth}<ar:FeCAEReq><ar:FeCabReq><ar:CantReg>1</ar:CantReg><ar:PtoVta>{}</ar:PtoVta><ar:CbteTipo>{}</ar:CbteTipo></ar:FeCabReq><ar:FeDetReq>{detail}</ar:FeDetReq></ar:FeCAEReq></ar:FECAESolicitar>",
                    req.point_of_sale, req.invoice_type
                )
            })
            .await?;

        let result = parse_cae_response(&response, req, number);
        match &result {
            Ok(r) => tracing::info!(
                point_of_sale = req.point_of_sale,
                invoice_type = req.invoice_type,
                voucher_number = r.voucher_number,
                cae_expiration = ?r.cae_expiration,
                observations = r.observations.len(),
                "Invoice authorised"
            ),
            Err(e) => tracing::warn!(
                point_of_sale = req.point_of_sale,
                invoice_type = req.invoice_type,
                voucher_number = number,
                error = %e,
                "Invoice not authorised"
            ),
        }
        result
    }

    /// Number the voucher after the last authorised one and request its CAE
    pub async fn create_next_voucher(&self, req: &InvoiceRequest) -> Result<InvoiceResult> {
        let last = self
            .last_voucher(req.point_of_sale, req.invoice_type)
            .await?;
        self.request_cae(req, last + 1).await
    }
}

/// `FECAEDetRequest` element, fields in WSDL order
fn detail_request(req: &InvoiceRequest, number: u64) -> String {
    let mut xml = String::from("<ar:FECAEDetRequest>");
    let mut push = |tag: &str, value: String| {
        xml.push_str(&format!("<ar:{tag}>{value}</ar:{tag}>"));
    };

    push("Concepto", req.concept.to_string());
    push("DocTipo", req.doc_type.to_string());
    push("DocNro", req.doc_number.to_string());
    push("CbteDesde", number.to_string());
    push("CbteHasta", number.to_string());
    push(
        "CbteFch",
        afip_date(req.invoice_date.unwrap_or_else(today_in_argentina)),
    );
    push("ImpTotal", amount(req.total_amount));
    push("ImpTotConc", amount(req.untaxed_amount));
    push("ImpNeto", amount(req.net_amount));
    push("ImpOpEx", amount(req.exempt_amount));
    push("ImpTrib", amount(req.tributes_amount));
    push("ImpIVA", amount(req.vat_amount));
    if let Some(from) = req.service_from {
        push("FchServDesde", afip_date(from));
    }
    if let Some(to) = req.service_to {
        push("FchServHasta", afip_date(to));
    }
    if let Some(due) = req.payment_due {
        push("FchVtoPago", afip_date(due));
    }
    push("MonId", soap::xml_escape(&req.currency_id));
    push("MonCotiz", req.currency_rate.normalize().to_string());
    if let Some(condition) = req.receiver_vat_condition {
        push("CondicionIVAReceptorId", condition.to_string());
    }

    if !req.vat.is_empty() {
        xml.push_str("<ar:Iva>");
        for line in &req.vat {
            xml.push_str(&format!(
                "<ar:AlicIva><ar:Id>{}</ar:Id><ar:BaseImp>{}</ar:BaseImp><ar:Importe>{}</ar:Importe></ar:AlicIva>",
                line.id,
                amount(line.base_amount),
                amount(line.amount)
            ));
        }
        xml.push_str("</ar:Iva>");
    }

    xml.push_str("</ar:FECAEDetRequest>");
    xml
}

/// Interpret a `FECAESolicitar` response
pub fn parse_cae_response(xml: &str, req: &InvoiceRequest, number: u64) -> Result<InvoiceResult> {
    let errors = soap::parse_messages(xml, "Errors", "Err");

    let Some(detail) = soap::extract_tag(xml, "FECAEDetResponse") else {
        return Err(if errors.is_empty() {
            AfipError::InvalidResponse("missing FECAEDetResponse".into())
        } else {
            AfipError::Service(errors)
        });
    };

    let observations = soap::parse_messages(&detail, "Observaciones", "Obs");
    let outcome = soap::extract_tag(&detail, "Resultado")
        .as_deref()
        .and_then(InvoiceOutcome::from_code)
        .ok_or_else(|| AfipError::InvalidResponse("missing Resultado".into()))?;

    let cae = soap::extract_tag(&detail, "CAE").unwrap_or_default();
    if outcome == InvoiceOutcome::Rejected || cae.is_empty() {
        return Err(AfipError::Rejected {
            observations,
            errors,
        });
    }

    let voucher_number = soap::extract_tag(&detail, "CbteDesde")
        .and_then(|n| n.parse().ok())
        .unwrap_or(number);

    Ok(InvoiceResult {
        point_of_sale: req.point_of_sale,
        invoice_type: req.invoice_type,
        voucher_number,
        cae,
        cae_expiration: soap::extract_tag(&detail, "CAEFchVto")
            .as_deref()
            .and_then(parse_afip_date),
        outcome,
        observations,
    })
}
