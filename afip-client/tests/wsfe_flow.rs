use std::sync::Arc;
use std::time::Duration;

use afip_client::{
    AccessTicket, AfipConfig, AfipError, Endpoints, Environment, FileTicketStore,
    MemoryTicketStore, TicketStore, WSFE_SERVICE, Wsfe, soap,
};
use chrono::Utc;
use gestion_cert::{CertError, CmsSigner};
use shared::models::{InvoiceOutcome, InvoiceRequest};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEV1: &str = "http://ar.gov.afip.dif.FEV1/";

/// Signs nothing; WSAA is mocked
struct FakeSigner;

impl CmsSigner for FakeSigner {
    fn sign(&self, content: &[u8]) -> Result<Vec<u8>, CertError> {
        Ok(content.to_vec())
    }

    fn certificate_pem(&self) -> &str {
        ""
    }
}

fn login_response(token: &str) -> String {
    let now = Utc::now();
    let ticket = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><loginTicketResponse version="1.0"><header><uniqueId>1</uniqueId><generationTime>{}</generationTime><expirationTime>{}</expirationTime></header><credentials><token>{token}</token><sign>sign-{token}</sign></credentials></loginTicketResponse>"#,
        now.to_rfc3339(),
        (now + chrono::Duration::hours(12)).to_rfc3339(),
    );
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><loginCmsResponse><loginCmsReturn>{}</loginCmsReturn></loginCmsResponse></soapenv:Body></soapenv:Envelope>"#,
        soap::xml_escape(&ticket)
    )
}

fn wsfe_response(method: &str, result: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><{method}Response xmlns="{FEV1}"><{method}Result>{result}</{method}Result></{method}Response></soap:Body></soap:Envelope>"#
    )
}

fn last_voucher_ok(number: u64) -> String {
    wsfe_response(
        "FECompUltimoAutorizado",
        &format!("<PtoVta>1</PtoVta><CbteTipo>6</CbteTipo><CbteNro>{number}</CbteNro>"),
    )
}

fn token_expired(method: &str) -> String {
    wsfe_response(
        method,
        "<Errors><Err><Code>600</Code><Msg>ValidacionDeToken: No validaron las fechas del token GenTime, ExpTime, NowUTC</Msg></Err></Errors>",
    )
}

fn cae_response(result: &str, number: u64, cae: &str, obs: &str) -> String {
    wsfe_response(
        "FECAESolicitar",
        &format!(
            "<FeCabResp><Cuit>20123456789</Cuit><PtoVta>1</PtoVta><CbteTipo>6</CbteTipo><Resultado>{result}</Resultado></FeCabResp><FeDetResp><FECAEDetResponse><Concepto>1</Concepto><CbteDesde>{number}</CbteDesde><CbteHasta>{number}</CbteHasta><Resultado>{result}</Resultado>{obs}<CAE>{cae}</CAE><CAEFchVto>20240520</CAEFchVto></FECAEDetResponse></FeDetResp>"
        ),
    )
}

fn action(name: &str) -> String {
    format!("\"{FEV1}{name}\"")
}

fn invoice() -> InvoiceRequest {
    serde_json::from_value(serde_json::json!({
        "PtoVta": 1,
        "CbteTipo": 6,
        "Concepto": 1,
        "DocTipo": 99,
        "DocNro": 0,
        "ImpNeto": "100",
        "ImpIVA": "21",
        "ImpTotal": "121",
        "Iva": [{"Id": 5, "BaseImp": "100", "Importe": "21"}]
    }))
    .unwrap()
}

fn client(server: &MockServer, store: Arc<dyn TicketStore>) -> Wsfe {
    let config = AfipConfig::new(20123456789, Environment::Testing)
        .with_endpoints(Endpoints {
            wsaa: format!("{}/wsaa", server.uri()),
            wsfe: format!("{}/wsfe", server.uri()),
        })
        .with_retries(2, Duration::ZERO);
    afip_client::connect(&config, Arc::new(FakeSigner), store).unwrap()
}

async fn mock_login(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/wsaa"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_response(token)))
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_last_voucher_reuses_ticket() {
    let server = MockServer::start().await;
    mock_login(&server, "T1", 1).await;
    Mock::given(method("POST"))
        .and(path("/wsfe"))
        .and(header("SOAPAction", action("FECompUltimoAutorizado").as_str()))
        .and(body_string_contains("<ar:Token>T1</ar:Token>"))
        .and(body_string_contains("<ar:Cuit>20123456789</ar:Cuit>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(last_voucher_ok(41)))
        .expect(2)
        .mount(&server)
        .await;

    let wsfe = client(&server, Arc::new(MemoryTicketStore::new()));
    assert_eq!(wsfe.last_voucher(1, 6).await.unwrap(), 41);
    assert_eq!(wsfe.last_voucher(1, 6).await.unwrap(), 41);
}

#[tokio::test]
async fn test_create_next_voucher() {
    let server = MockServer::start().await;
    mock_login(&server, "T1", 1).await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECompUltimoAutorizado").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(last_voucher_ok(41)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECAESolicitar").as_str()))
        .and(body_string_contains("<ar:CbteDesde>42</ar:CbteDesde>"))
        .and(body_string_contains("<ar:ImpTotal>121.00</ar:ImpTotal>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(cae_response(
            "A",
            42,
            "74191234567890",
            "",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let wsfe = client(&server, Arc::new(MemoryTicketStore::new()));
    let result = wsfe.create_next_voucher(&invoice()).await.unwrap();
    assert_eq!(result.voucher_number, 42);
    assert_eq!(result.cae, "74191234567890");
    assert_eq!(result.outcome, InvoiceOutcome::Approved);
    assert_eq!((result.point_of_sale, result.invoice_type), (1, 6));
}

#[tokio::test]
async fn test_expired_ticket_relogs_and_retries_once() {
    let server = MockServer::start().await;
    // First login hands out T1, every later one T2
    Mock::given(method("POST"))
        .and(path("/wsaa"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_response("T1")))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    mock_login(&server, "T2", 1).await;

    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECAESolicitar").as_str()))
        .and(body_string_contains("<ar:Token>T1</ar:Token>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(token_expired("FECAESolicitar")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECAESolicitar").as_str()))
        .and(body_string_contains("<ar:Token>T2</ar:Token>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(cae_response(
            "A",
            7,
            "74190000000001",
            "",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let wsfe = client(&server, Arc::new(MemoryTicketStore::new()));
    let result = wsfe.request_cae(&invoice(), 7).await.unwrap();
    assert_eq!(result.cae, "74190000000001");
}

#[tokio::test]
async fn test_persistent_ticket_error_is_surfaced() {
    let server = MockServer::start().await;
    mock_login(&server, "T1", 2).await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECompUltimoAutorizado").as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(token_expired("FECompUltimoAutorizado")),
        )
        .expect(2)
        .mount(&server)
        .await;

    let wsfe = client(&server, Arc::new(MemoryTicketStore::new()));
    let err = wsfe.last_voucher(1, 6).await.unwrap_err();
    assert!(err.is_ticket_error(), "unexpected error: {err}");
}

#[tokio::test]
async fn test_refused_relogin_keeps_valid_ticket() {
    let server = MockServer::start().await;
    let fault = r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><soapenv:Fault><faultcode>ns1:coe.alreadyAuthenticated</faultcode><faultstring>El CEE ya posee un TA valido para el acceso al WSN solicitado</faultstring></soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;
    Mock::given(method("POST"))
        .and(path("/wsaa"))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_response("T1")))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/wsaa"))
        .respond_with(ResponseTemplate::new(500).set_body_string(fault))
        .expect(1)
        .mount(&server)
        .await;

    // Code 600 for a reason other than expiry, then accepted
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECompUltimoAutorizado").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(wsfe_response(
            "FECompUltimoAutorizado",
            "<Errors><Err><Code>600</Code><Msg>ValidacionDeToken: No aparecio CUIT en lista de relaciones</Msg></Err></Errors>",
        )))
        .up_to_n_times(1)
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECompUltimoAutorizado").as_str()))
        .and(body_string_contains("<ar:Token>T1</ar:Token>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(last_voucher_ok(12)))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTicketStore::new());
    let wsfe = client(&server, store.clone());
    match wsfe.last_voucher(1, 6).await {
        Err(AfipError::Fault { code, .. }) => assert_eq!(code, "ns1:coe.alreadyAuthenticated"),
        other => panic!("expected SOAP fault, got {other:?}"),
    }

    let kept = store.load(WSFE_SERVICE).await.unwrap().expect("ticket kept");
    assert_eq!(kept.token, "T1");
    assert_eq!(wsfe.last_voucher(1, 6).await.unwrap(), 12);
}

#[tokio::test]
async fn test_transient_failure_retried_for_queries() {
    let server = MockServer::start().await;
    mock_login(&server, "T1", 1).await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECompUltimoAutorizado").as_str()))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECompUltimoAutorizado").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(last_voucher_ok(9)))
        .expect(1)
        .mount(&server)
        .await;

    let wsfe = client(&server, Arc::new(MemoryTicketStore::new()));
    assert_eq!(wsfe.last_voucher(1, 6).await.unwrap(), 9);
}

#[tokio::test]
async fn test_transient_failure_not_retried_for_cae_request() {
    let server = MockServer::start().await;
    mock_login(&server, "T1", 1).await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECAESolicitar").as_str()))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let wsfe = client(&server, Arc::new(MemoryTicketStore::new()));
    match wsfe.request_cae(&invoice(), 1).await {
        Err(AfipError::HttpStatus { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected HTTP 503, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rejection_is_surfaced_as_is() {
    let server = MockServer::start().await;
    mock_login(&server, "T1", 1).await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FECAESolicitar").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(cae_response(
            "R",
            3,
            "",
            "<Observaciones><Obs><Code>10016</Code><Msg>El numero o fecha del comprobante no se corresponde con el proximo a autorizar</Msg></Obs></Observaciones>",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let wsfe = client(&server, Arc::new(MemoryTicketStore::new()));
    match wsfe.request_cae(&invoice(), 3).await {
        Err(AfipError::Rejected { observations, .. }) => {
            assert_eq!(observations.len(), 1);
            assert_eq!(observations[0].code, 10016);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_wsaa_fault_is_reported() {
    let server = MockServer::start().await;
    let fault = r#"<?xml version="1.0" encoding="UTF-8"?><soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"><soapenv:Body><soapenv:Fault><faultcode>ns1:coe.alreadyAuthenticated</faultcode><faultstring>El CEE ya posee un TA valido para el acceso al WSN solicitado</faultstring></soapenv:Fault></soapenv:Body></soapenv:Envelope>"#;
    Mock::given(method("POST"))
        .and(path("/wsaa"))
        .respond_with(ResponseTemplate::new(500).set_body_string(fault))
        .expect(1)
        .mount(&server)
        .await;

    let wsfe = client(&server, Arc::new(MemoryTicketStore::new()));
    match wsfe.last_voucher(1, 6).await {
        Err(AfipError::Fault { code, .. }) => assert_eq!(code, "ns1:coe.alreadyAuthenticated"),
        other => panic!("expected SOAP fault, got {other:?}"),
    }
}

#[tokio::test]
async fn test_stored_ticket_skips_login() {
    let server = MockServer::start().await;
    mock_login(&server, "unused", 0).await;
    Mock::given(method("POST"))
        .and(body_string_contains("<ar:Token>STORED</ar:Token>"))
        .respond_with(ResponseTemplate::new(200).set_body_string(last_voucher_ok(5)))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileTicketStore::new(dir.path()));
    let now = Utc::now();
    store
        .save(
            WSFE_SERVICE,
            &AccessTicket {
                token: "STORED".into(),
                sign: "S".into(),
                generated_at: now,
                expires_at: now + chrono::Duration::hours(6),
            },
        )
        .await
        .unwrap();

    let wsfe = client(&server, store);
    assert_eq!(wsfe.last_voucher(1, 6).await.unwrap(), 5);
}

#[tokio::test]
async fn test_server_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("SOAPAction", action("FEDummy").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(wsfe_response(
            "FEDummy",
            "<AppServer>OK</AppServer><DbServer>OK</DbServer><AuthServer>OK</AuthServer>",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let wsfe = client(&server, Arc::new(MemoryTicketStore::new()));
    let status = wsfe.server_status().await.unwrap();
    assert!(status.is_ok());
}
