//! Electronic invoice models (AFIP WSFE)
//!
//! Field names follow WSFE semantics; the PascalCase AFIP names are
//! accepted as aliases (`PtoVta`, `CbteTipo`, `ImpTotal`, ...). No amount
//! consistency is checked here: AFIP is the validator.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_currency() -> String {
    "PES".to_string()
}

fn default_currency_rate() -> Decimal {
    Decimal::ONE
}

/// One VAT breakdown line (`AlicIva`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VatLine {
    /// AFIP rate id (3 = 0%, 4 = 10.5%, 5 = 21%, 6 = 27%, 8 = 5%, 9 = 2.5%)
    #[serde(alias = "Id")]
    pub id: u16,
    #[serde(alias = "BaseImp")]
    pub base_amount: Decimal,
    #[serde(alias = "Importe")]
    pub amount: Decimal,
}

/// Invoice submission payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRequest {
    #[serde(alias = "PtoVta")]
    pub point_of_sale: u32,
    /// 1 = Factura A, 6 = Factura B, 11 = Factura C, ...
    #[serde(alias = "CbteTipo")]
    pub invoice_type: u16,
    /// 1 = products, 2 = services, 3 = both
    #[serde(alias = "Concepto")]
    pub concept: u8,
    /// 80 = CUIT, 96 = DNI, 99 = final consumer
    #[serde(alias = "DocTipo")]
    pub doc_type: u16,
    #[serde(alias = "DocNro")]
    pub doc_number: u64,
    /// Defaults to today (Buenos Aires) when absent
    #[serde(default, alias = "CbteFch")]
    pub invoice_date: Option<NaiveDate>,
    #[serde(alias = "ImpNeto")]
    pub net_amount: Decimal,
    #[serde(default, alias = "ImpIVA")]
    pub vat_amount: Decimal,
    #[serde(default, alias = "ImpOpEx")]
    pub exempt_amount: Decimal,
    #[serde(default, alias = "ImpTotConc")]
    pub untaxed_amount: Decimal,
    #[serde(default, alias = "ImpTrib")]
    pub tributes_amount: Decimal,
    #[serde(alias = "ImpTotal")]
    pub total_amount: Decimal,
    #[serde(default, alias = "FchServDesde")]
    pub service_from: Option<NaiveDate>,
    #[serde(default, alias = "FchServHasta")]
    pub service_to: Option<NaiveDate>,
    #[serde(default, alias = "FchVtoPago")]
    pub payment_due: Option<NaiveDate>,
    #[serde(default = "default_currency", alias = "MonId")]
    pub currency_id: String,
    #[serde(default = "default_currency_rate", alias = "MonCotiz")]
    pub currency_rate: Decimal,
    #[serde(default, alias = "Iva")]
    pub vat: Vec<VatLine>,
    #[serde(default, alias = "CondicionIVAReceptorId")]
    pub receiver_vat_condition: Option<u16>,
}

/// An observation or error entry returned by WSFE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfipMessage {
    pub code: i64,
    pub message: String,
}

/// AFIP verdict for a voucher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceOutcome {
    /// `A`
    Approved,
    /// `R`
    Rejected,
    /// `P` (partially approved batch)
    Partial,
}

impl InvoiceOutcome {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "A" => Some(Self::Approved),
            "R" => Some(Self::Rejected),
            "P" => Some(Self::Partial),
            _ => None,
        }
    }
}

/// Result of a successful `FECAESolicitar`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResult {
    pub point_of_sale: u32,
    pub invoice_type: u16,
    pub voucher_number: u64,
    pub cae: String,
    pub cae_expiration: Option<NaiveDate>,
    pub outcome: InvoiceOutcome,
    #[serde(default)]
    pub observations: Vec<AfipMessage>,
}

/// Persisted invoice record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: String,
    pub request: InvoiceRequest,
    pub result: InvoiceResult,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_afip_field_names_deserialize() {
        let json = r#"{
            "PtoVta": 1,
            "CbteTipo": 6,
            "Concepto": 1,
            "DocTipo": 99,
            "DocNro": 0,
            "ImpNeto": "100.00",
            "ImpIVA": "21.00",
            "ImpOpEx": "0",
            "ImpTotal": "121.00",
            "Iva": [{"Id": 5, "BaseImp": "100.00", "Importe": "21.00"}]
        }"#;
        let req: InvoiceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.point_of_sale, 1);
        assert_eq!(req.invoice_type, 6);
        assert_eq!(req.doc_type, 99);
        assert_eq!(req.total_amount, Decimal::from_str("121.00").unwrap());
        assert_eq!(req.currency_id, "PES");
        assert_eq!(req.currency_rate, Decimal::ONE);
        assert_eq!(req.vat.len(), 1);
        assert_eq!(req.vat[0].id, 5);
        assert!(req.invoice_date.is_none());
    }

    #[test]
    fn test_outcome_codes() {
        assert_eq!(InvoiceOutcome::from_code("A"), Some(InvoiceOutcome::Approved));
        assert_eq!(InvoiceOutcome::from_code(" R "), Some(InvoiceOutcome::Rejected));
        assert_eq!(InvoiceOutcome::from_code("P"), Some(InvoiceOutcome::Partial));
        assert_eq!(InvoiceOutcome::from_code("X"), None);
    }
}
