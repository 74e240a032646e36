//! Minimal SOAP 1.1 plumbing
//!
//! Envelopes are assembled as text and responses are read with tag
//! extraction; the handful of AFIP calls do not justify a schema binding.

use shared::models::AfipMessage;

use crate::error::{AfipError, Result};

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// Wrap `body` in a SOAP envelope declaring `prefix` → `namespace`
pub fn envelope(prefix: &str, namespace: &str, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="{SOAP_ENV_NS}" xmlns:{prefix}="{namespace}"><soapenv:Header/><soapenv:Body>{body}</soapenv:Body></soapenv:Envelope>"#
    )
}

pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Resolve the predefined entities and numeric character references
pub fn xml_unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Opening tag whose local name is `tag`, searching from `from`.
/// Returns `(content_start, qualified_name, self_closing)`.
fn find_open(xml: &str, tag: &str, from: usize) -> Option<(usize, String, bool)> {
    let mut pos = from;
    while let Some(rel) = xml[pos..].find('<') {
        let lt = pos + rel;
        let name_start = lt + 1;
        let name_len = xml[name_start..]
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(xml.len() - name_start);
        let name = &xml[name_start..name_start + name_len];

        let local = name.rsplit(':').next().unwrap_or(name);
        let is_markup = name.starts_with(['/', '?', '!']);
        if !is_markup && !name.is_empty() && local == tag {
            let gt = lt + xml[lt..].find('>')?;
            let self_closing = xml[..gt].ends_with('/');
            return Some((gt + 1, name.to_string(), self_closing));
        }
        pos = name_start;
    }
    None
}

/// Text content of the first element named `tag`, any namespace prefix.
///
/// Content is trimmed and returned raw (entities untouched).
pub fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let (start, name, self_closing) = find_open(xml, tag, 0)?;
    if self_closing {
        return Some(String::new());
    }
    let close = format!("</{name}>");
    let end = xml[start..].find(&close)?;
    Some(xml[start..start + end].trim().to_string())
}

/// Content of every element named `tag`, in document order
pub fn extract_all(xml: &str, tag: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some((start, name, self_closing)) = find_open(xml, tag, pos) {
        if self_closing {
            out.push(String::new());
            pos = start;
            continue;
        }
        let close = format!("</{name}>");
        let Some(end) = xml[start..].find(&close) else {
            break;
        };
        out.push(xml[start..start + end].trim().to_string());
        pos = start + end + close.len();
    }
    out
}

/// `(faultcode, faultstring)` when the response is a SOAP fault
pub fn parse_fault(xml: &str) -> Option<(String, String)> {
    let fault = extract_tag(xml, "Fault")?;
    let code = extract_tag(&fault, "faultcode").unwrap_or_default();
    let message = extract_tag(&fault, "faultstring").unwrap_or_default();
    Some((xml_unescape(&code), xml_unescape(&message)))
}

/// `<Code>/<Msg>` pairs of every `item` element inside `container`
pub fn parse_messages(xml: &str, container: &str, item: &str) -> Vec<AfipMessage> {
    let Some(block) = extract_tag(xml, container) else {
        return Vec::new();
    };
    extract_all(&block, item)
        .iter()
        .map(|entry| AfipMessage {
            code: extract_tag(entry, "Code")
                .and_then(|c| c.parse().ok())
                .unwrap_or_default(),
            message: xml_unescape(&extract_tag(entry, "Msg").unwrap_or_default()),
        })
        .collect()
}

/// POST an envelope and return the response text.
///
/// SOAP faults and non-success statuses become errors.
pub async fn post(
    client: &reqwest::Client,
    url: &str,
    action: &str,
    envelope: String,
) -> Result<String> {
    let response = client
        .post(url)
        .header("Content-Type", "text/xml; charset=utf-8")
        .header("SOAPAction", format!("\"{action}\""))
        .body(envelope)
        .send()
        .await?;

    let status = response.status();
    let body = response.text().await?;

    if let Some((code, message)) = parse_fault(&body) {
        return Err(AfipError::Fault { code, message });
    }
    if !status.is_success() {
        return Err(AfipError::HttpStatus {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_and_without_prefix() {
        let xml = "<a><estado>RECIBIDA</estado><ns2:token> abc </ns2:token></a>";
        assert_eq!(extract_tag(xml, "estado").as_deref(), Some("RECIBIDA"));
        assert_eq!(extract_tag(xml, "token").as_deref(), Some("abc"));
        assert_eq!(extract_tag(xml, "sign"), None);
    }

    #[test]
    fn test_extract_tag_with_attributes() {
        let xml = r#"<soap:Body><FEDummyResponse xmlns="http://ar.gov.afip.dif.FEV1/"><FEDummyResult><AppServer>OK</AppServer></FEDummyResult></FEDummyResponse></soap:Body>"#;
        let result = extract_tag(xml, "FEDummyResponse").unwrap();
        assert_eq!(extract_tag(&result, "AppServer").as_deref(), Some("OK"));
    }

    #[test]
    fn test_extract_does_not_match_longer_names() {
        let xml = "<CbteNroDesde>1</CbteNroDesde><CbteNro>7</CbteNro>";
        assert_eq!(extract_tag(xml, "CbteNro").as_deref(), Some("7"));
    }

    #[test]
    fn test_self_closing_tag_is_empty() {
        assert_eq!(extract_tag("<a><Obs/></a>", "Obs").as_deref(), Some(""));
        assert_eq!(extract_all("<a><Obs/><Obs>x</Obs></a>", "Obs"), vec!["", "x"]);
    }

    #[test]
    fn test_extract_all_in_order() {
        let xml = "<Errors><Err><Code>600</Code></Err><Err><Code>601</Code></Err></Errors>";
        let items = extract_all(xml, "Err");
        assert_eq!(items, vec!["<Code>600</Code>", "<Code>601</Code>"]);
    }

    #[test]
    fn test_parse_messages() {
        let xml = "<r><Errors><Err><Code>600</Code><Msg>ValidacionDeToken: No validaron las fechas del token GenTime, ExpTime, NowUTC: 1 &amp; 2</Msg></Err></Errors></r>";
        let messages = parse_messages(xml, "Errors", "Err");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].code, 600);
        assert!(messages[0].message.ends_with("1 & 2"));
        assert!(parse_messages(xml, "Observaciones", "Obs").is_empty());
    }

    #[test]
    fn test_unescape_entities() {
        assert_eq!(
            xml_unescape("&lt;token&gt;a&amp;b&quot;&apos;&#65;&#x42;&lt;/token&gt;"),
            "<token>a&b\"'AB</token>"
        );
        // Unknown or unterminated entities pass through
        assert_eq!(xml_unescape("a &foo; b & c"), "a &foo; b & c");
    }

    #[test]
    fn test_escape_unescape_inverse() {
        let raw = r#"<a b="c">Ñandú & 'd'</a>"#;
        assert_eq!(xml_unescape(&xml_escape(raw)), raw);
    }

    #[test]
    fn test_parse_fault() {
        let xml = r#"<soapenv:Envelope><soapenv:Body><soapenv:Fault><faultcode xmlns:ns1="http://xml.apache.org/axis/">ns1:coe.alreadyAuthenticated</faultcode><faultstring>El CEE ya posee un TA valido para el acceso al WSN solicitado</faultstring></soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;
        let (code, message) = parse_fault(xml).unwrap();
        assert_eq!(code, "ns1:coe.alreadyAuthenticated");
        assert!(message.starts_with("El CEE ya posee"));
        assert!(parse_fault("<ok/>").is_none());
    }

    #[test]
    fn test_envelope_shape() {
        let env = envelope("ar", "http://ar.gov.afip.dif.FEV1/", "<ar:FEDummy/>");
        assert!(env.contains(r#"xmlns:ar="http://ar.gov.afip.dif.FEV1/""#));
        assert!(env.contains("<soapenv:Body><ar:FEDummy/></soapenv:Body>"));
    }
}
