use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{Router, extract::State, http::StatusCode, routing::post};
use reqwest::Client;
use serde_json::{Value, json};
use sms_relay::{
    discord::DiscordClient,
    http::{ClientOptions, HttpClient},
    server::{self, ServerOptions},
};
use tokio::net::TcpListener;

type Received = Arc<Mutex<Vec<Value>>>;

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

/// Starts a fake Discord webhook and the relay pointing at it.
async fn start(webhook_status: u16, webhook_reply: &'static str) -> (SocketAddr, Received) {
    let received = Received::default();
    let webhook = Router::new()
        .route(
            "/api/webhooks/1/token",
            post(
                move |State(received): State<Received>, body: String| async move {
                    received.lock().unwrap().push(serde_json::from_str(&body).unwrap());
                    (StatusCode::from_u16(webhook_status).unwrap(), webhook_reply)
                },
            ),
        )
        .with_state(Arc::clone(&received));
    let webhook_addr = serve(webhook).await;

    let http = HttpClient::new(ClientOptions::default()).unwrap();
    let discord =
        DiscordClient::new(http, format!("http://{webhook_addr}/api/webhooks/1/token")).unwrap();
    let relay_addr = serve(server::router(discord, ServerOptions::default())).await;
    (relay_addr, received)
}

fn field_pairs(notification: &Value) -> Vec<(String, String)> {
    notification["embeds"][0]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| {
            (
                f["name"].as_str().unwrap().to_owned(),
                f["value"].as_str().unwrap().to_owned(),
            )
        })
        .collect()
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(n, v)| ((*n).to_owned(), (*v).to_owned()))
        .collect()
}

#[tokio::test]
async fn health_check_always_succeeds() {
    let (relay, _) = start(204, "").await;
    let resp = Client::new()
        .get(format!("http://{relay}/health-check"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["x-frame-options"], "SAMEORIGIN");
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], Value::Null);
}

#[tokio::test]
async fn flowroute_payload_is_relayed() {
    let (relay, received) = start(204, "").await;
    let payload = json!({
        "data": {
            "id": "mdr2-1",
            "type": "message",
            "attributes": {"from": "A", "to": "B", "body": "hi", "amount_nanodollars": 4000},
        }
    });
    let resp = Client::new()
        .post(format!("http://{relay}/flowroute"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "\"OK\"");

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["username"], "Flowroute Message Received!");
    assert_eq!(received[0]["embeds"][0]["color"], 65280);
    assert_eq!(
        field_pairs(&received[0]),
        owned(&[
            ("DATA.ID", "mdr2-1"),
            ("DATA.ATTRIBUTES.FROM", "A"),
            ("DATA.ATTRIBUTES.TO", "B"),
            ("DATA.ATTRIBUTES.BODY", "hi"),
            ("DATA.ATTRIBUTES.AMOUNT_NANODOLLARS", "4000"),
            ("DATA.TYPE", "message"),
        ])
    );
}

#[tokio::test]
async fn malformed_flowroute_payload_is_still_delivered() {
    let (relay, received) = start(200, "").await;
    let resp = Client::new()
        .post(format!("http://{relay}/flowroute"))
        .body("not json at all")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let received = received.lock().unwrap();
    assert_eq!(
        field_pairs(&received[0]),
        owned(&[("MESSAGE", "not json at all")])
    );
}

#[tokio::test]
async fn voipms_query_is_relayed_with_timestamp() {
    let (relay, received) = start(204, "").await;
    let resp = Client::new()
        .get(format!(
            "http://{relay}/voipms?to=B&from=A&message=hi&id=1&date=T1"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let received = received.lock().unwrap();
    assert_eq!(received[0]["username"], "Voipms Message Received!");
    assert_eq!(
        field_pairs(&received[0]),
        owned(&[
            ("ID", "1"),
            ("TIMESTAMP", "T1"),
            ("FROM", "A"),
            ("TO", "B"),
            ("MESSAGE", "hi"),
        ])
    );
}

#[tokio::test]
async fn voipms_missing_parameters_are_rejected() {
    let (relay, received) = start(204, "").await;
    let resp = Client::new()
        .get(format!("http://{relay}/voipms?to=B&from=&message=hi"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["missing"], json!(["from", "id", "date"]));
    assert!(received.lock().unwrap().is_empty());
}

#[tokio::test]
async fn webhook_rejection_is_surfaced() {
    let (relay, _) = start(500, "oops").await;
    let resp = Client::new()
        .post(format!("http://{relay}/flowroute"))
        .json(&json!({"id": "1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("oops"));
}
