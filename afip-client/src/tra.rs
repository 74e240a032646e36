//! Login ticket request (TRA)

use chrono::{DateTime, Duration, FixedOffset, Utc};
use chrono_tz::America::Argentina::Buenos_Aires;

/// Validity window on each side of the generation instant
const WINDOW_MINUTES: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginTicketRequest {
    pub unique_id: u32,
    pub generation_time: DateTime<FixedOffset>,
    pub expiration_time: DateTime<FixedOffset>,
    /// WSAA service id, e.g. `wsfe`
    pub service: String,
}

/// `uniqueId` is an `xsd:unsignedInt`; seconds since the epoch, wrapped
/// into range
fn unique_id(now: DateTime<Utc>) -> u32 {
    let wrapped = now.timestamp().rem_euclid(i64::from(u32::MAX) + 1);
    u32::try_from(wrapped).unwrap_or_default()
}

impl LoginTicketRequest {
    pub fn new(service: impl Into<String>, now: DateTime<Utc>) -> Self {
        let local = now.with_timezone(&Buenos_Aires).fixed_offset();
        Self {
            unique_id: unique_id(now),
            generation_time: local - Duration::minutes(WINDOW_MINUTES),
            expiration_time: local + Duration::minutes(WINDOW_MINUTES),
            service: service.into(),
        }
    }

    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><loginTicketRequest version="1.0"><header><uniqueId>{}</uniqueId><generationTime>{}</generationTime><expirationTime>{}</expirationTime></header><service>{}</service></loginTicketRequest>"#,
            self.unique_id,
            self.generation_time.format("%Y-%m-%dT%H:%M:%S%:z"),
            self.expiration_time.format("%Y-%m-%dT%H:%M:%S%:z"),
            crate::soap::xml_escape(&self.service),
        )
    }
}
