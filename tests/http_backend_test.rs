use pixtrack::domain::amount::Amount;
use pixtrack::domain::buyer::{Buyer, BuyerIdentity, Delivery};
use pixtrack::domain::intent::{CreateIntentRequest, IntentId};
use pixtrack::domain::ports::PaymentBackend;
use pixtrack::error::PaymentError;
use pixtrack::infrastructure::http::{HttpBackendConfig, HttpPaymentBackend};
use rust_decimal_macros::dec;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const CREATED: &str = r#"{
    "id": 1325087,
    "status": "pending",
    "status_detail": "pending_waiting_transfer",
    "point_of_interaction": {
        "transaction_data": {
            "qr_code_base64": "iVBORw0KGgo=",
            "qr_code": "00020126600014br.gov.bcb.pix",
            "ticket_url": "https://www.mercadopago.com.br/payments/1325087/ticket"
        }
    }
}"#;

type Seen = Arc<Mutex<Vec<(String, String)>>>;

/// Minimal payment server: answers each request line from a fixed table and
/// records `(request line, body)` pairs.
async fn spawn_server(route: fn(&str) -> (u16, &'static str)) -> (String, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/pix", listener.local_addr().unwrap());
    let seen: Seen = Arc::default();

    let log = seen.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let log = log.clone();
            tokio::spawn(handle(stream, route, log));
        }
    });

    (url, seen)
}

async fn handle(mut stream: TcpStream, route: fn(&str) -> (u16, &'static str), log: Seen) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let request_line = head.lines().next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    let (code, reply) = route(&request_line);
    log.lock().unwrap().push((request_line, body));

    let response = format!(
        "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        code,
        reply.len(),
        reply
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}

fn request(name: &str) -> CreateIntentRequest {
    let buyer = Buyer::try_from(&BuyerIdentity {
        name: name.to_string(),
        email: "maria@example.com".to_string(),
        tax_id: "123.456.789-00".to_string(),
        delivery: Delivery::Pickup,
    })
    .unwrap();
    CreateIntentRequest::new(Amount::new(dec!(45.00)).unwrap(), &buyer)
}

#[tokio::test]
async fn test_create_posts_sanitized_request() {
    let (url, seen) = spawn_server(|line| {
        if line.starts_with("POST /api/pix ") {
            (201, CREATED)
        } else {
            (500, "{}")
        }
    })
    .await;
    let backend = HttpPaymentBackend::new(HttpBackendConfig::new(url)).unwrap();

    let intent = backend.create_intent(&request("Maria")).await.unwrap();
    assert_eq!(intent.id, IntentId(1325087));
    assert_eq!(intent.payload.copy_paste_code, "00020126600014br.gov.bcb.pix");

    let seen = seen.lock().unwrap();
    let body: serde_json::Value = serde_json::from_str(&seen[0].1).unwrap();
    assert_eq!(body["firstName"], "Maria");
    assert_eq!(body["lastName"], "Cliente");
    assert_eq!(body["cpf"], "12345678900");
    assert_eq!(body["address"], "Retirada no Local");
    assert_eq!(body["amount"], 45.0);
}

#[tokio::test]
async fn test_create_rejected_by_server() {
    let (url, _) = spawn_server(|_| (500, r#"{"error":"boom"}"#)).await;
    let backend = HttpPaymentBackend::new(HttpBackendConfig::new(url)).unwrap();

    let result = backend.create_intent(&request("Maria")).await;
    assert!(matches!(result, Err(PaymentError::PaymentCreationFailed(_))));
}

#[tokio::test]
async fn test_status_mapping_over_http() {
    let (url, _) = spawn_server(|line| {
        if line.starts_with("GET /api/pix/1 ") {
            (200, r#"{"id":1,"status":"approved"}"#)
        } else if line.starts_with("GET /api/pix/2 ") {
            (200, r#"{"id":2}"#)
        } else if line.starts_with("GET /api/pix/3 ") {
            (503, "{}")
        } else {
            (404, "{}")
        }
    })
    .await;
    let backend = HttpPaymentBackend::new(HttpBackendConfig::new(url)).unwrap();

    assert_eq!(backend.query_status(IntentId(1)).await.unwrap(), "approved");
    assert_eq!(backend.query_status(IntentId(2)).await.unwrap(), "pending");
    assert!(matches!(
        backend.query_status(IntentId(3)).await,
        Err(PaymentError::TransientStatusQueryFailure(_))
    ));
    assert_eq!(backend.query_status(IntentId(99)).await.unwrap(), "pending");
}

#[tokio::test]
async fn test_unreachable_server() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/pix", listener.local_addr().unwrap());
    drop(listener);
    let backend = HttpPaymentBackend::new(HttpBackendConfig::new(url)).unwrap();

    assert!(matches!(
        backend.create_intent(&request("Maria")).await,
        Err(PaymentError::PaymentCreationFailed(_))
    ));
    assert!(matches!(
        backend.query_status(IntentId(1)).await,
        Err(PaymentError::TransientStatusQueryFailure(_))
    ));
}
