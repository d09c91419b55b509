//! Router tests driven through `tower::ServiceExt::oneshot` against an
//! in-memory database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wrench_core::ShopProfile;
use wrench_db::{Database, DbConfig};
use wrench_server::{router, AppState};

const UNKNOWN_ID: &str = "6f9619ff-8b86-4d11-b42d-00c04fc964ff";

async fn app() -> Router {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    router(AppState::new(db, ShopProfile::default()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_item(app: &Router, name: &str, price: i64, quantity: i64) -> Value {
    let (status, item) = send_json(
        app,
        Method::POST,
        "/api/items",
        Some(json!({ "name": name, "price": price, "quantity": quantity })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    item
}

fn invoice_body(item: &Value, quantity: i64) -> Value {
    json!({
        "vin": "1HGCM82633A004352",
        "customer": { "name": "Dana Reyes", "phone": "555-0101" },
        "items": [{
            "item_id": item["id"],
            "name": item["name"],
            "quantity": quantity,
            "unit_price": item["price"]
        }],
        "discount": 10.0,
        "tax": 8.0
    })
}

async fn stock_of(app: &Router, name: &str) -> i64 {
    let (_, items) = send_json(app, Method::GET, &format!("/api/items/search?q={name}"), None).await;
    items[0]["quantity"].as_i64().unwrap()
}

#[tokio::test]
async fn health_reports_database() {
    let app = app().await;
    let (status, body) = send_json(&app, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn invoice_create_read_render_delete() {
    let app = app().await;
    let pads = create_item(&app, "Brake Pads", 5000, 5).await;

    let (status, created) =
        send_json(&app, Method::POST, "/api/invoices", Some(invoice_body(&pads, 2))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(created["invoice_number"].as_str().unwrap().starts_with("INV-"));
    assert_eq!(created["totals"]["subtotal"], 10000);
    assert_eq!(created["totals"]["grand_total"], 9720);
    assert_eq!(stock_of(&app, "Brake").await, 3);

    let id = created["id"].as_str().unwrap().to_string();

    let (status, resolved) = send_json(&app, Method::GET, &format!("/api/invoices/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["invoice"]["invoice_number"], created["invoice_number"]);
    assert_eq!(resolved["customer"]["name"], "Dana Reyes");
    assert_eq!(resolved["catalog"][0]["name"], "Brake Pads");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/invoices/{id}/html"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/invoices/{id}/pdf"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("inline"));
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));

    let (status, deleted) =
        send_json(&app, Method::DELETE, &format!("/api/invoices/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["stock_restored"], 1);
    assert_eq!(stock_of(&app, "Brake").await, 5);

    let (status, _) = send_json(&app, Method::GET, &format!("/api/invoices/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let app = app().await;

    let (status, body) =
        send_json(&app, Method::GET, &format!("/api/invoices/{UNKNOWN_ID}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) =
        send_json(&app, Method::DELETE, &format!("/api/invoices/{UNKNOWN_ID}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(&app, Method::GET, "/api/invoices/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn invalid_invoice_is_rejected_without_side_effects() {
    let app = app().await;
    let pads = create_item(&app, "Brake Pads", 5000, 5).await;

    let (status, body) =
        send_json(&app, Method::POST, "/api/invoices", Some(invoice_body(&pads, 0))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    assert_eq!(stock_of(&app, "Brake").await, 5);
    let (_, invoices) = send_json(&app, Method::GET, "/api/invoices", None).await;
    assert_eq!(invoices.as_array().unwrap().len(), 0);
    let (_, customers) = send_json(&app, Method::GET, "/api/customers", None).await;
    assert_eq!(customers.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn duplicate_item_name_conflicts() {
    let app = app().await;
    create_item(&app, "Oil Filter", 1200, 10).await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/items",
        Some(json!({ "name": "Oil Filter", "price": 1300 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn item_patch_sets_stock() {
    let app = app().await;
    let filter = create_item(&app, "Oil Filter", 1200, 10).await;
    let id = filter["id"].as_str().unwrap();

    let (status, item) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/items/{id}"),
        Some(json!({ "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(item["quantity"], 3);
    assert_eq!(item["price"], 1200);

    let (status, _) =
        send_json(&app, Method::PATCH, &format!("/api/items/{id}"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn payment_amendment_recomputes_total() {
    let app = app().await;
    let pads = create_item(&app, "Brake Pads", 5000, 5).await;
    let (_, created) =
        send_json(&app, Method::POST, "/api/invoices", Some(invoice_body(&pads, 2))).await;
    let id = created["id"].as_str().unwrap();

    let (status, invoice) = send_json(
        &app,
        Method::PATCH,
        &format!("/api/invoices/{id}/payment"),
        Some(json!({ "payment_status": "Unpaid", "refund_amount": 720, "refund_reason": "Late" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(invoice["payment_status"], "Unpaid");
    assert_eq!(invoice["totals"]["grand_total"], 9000);
}

#[tokio::test]
async fn settings_defaults_and_update() {
    let app = app().await;

    let (status, settings) = send_json(&app, Method::GET, "/api/settings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["tax"], 0.0);
    assert_eq!(settings["payment_method"], "Cash");

    let (status, settings) = send_json(
        &app,
        Method::PUT,
        "/api/settings",
        Some(json!({ "tax": 8.25, "payment_method": "Card" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["tax"], 8.25);
    assert_eq!(settings["payment_method"], "Card");

    let (status, _) =
        send_json(&app, Method::PUT, "/api/settings", Some(json!({ "discount": 150.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn fractional_tax_rate_is_kept() {
    let app = app().await;

    let (status, settings) =
        send_json(&app, Method::PUT, "/api/settings", Some(json!({ "tax": 8.875 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["tax"], 8.875);

    let labour = create_item(&app, "Labour", 10000, 0).await;
    let mut body = invoice_body(&labour, 1);
    body.as_object_mut().unwrap().remove("tax");
    body["discount"] = json!(0.0);

    let (status, created) = send_json(&app, Method::POST, "/api/invoices", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["totals"]["tax_amount"], 888);
    assert_eq!(created["totals"]["grand_total"], 10888);
}

#[tokio::test]
async fn invoice_search_matches_customer_name() {
    let app = app().await;
    let pads = create_item(&app, "Brake Pads", 5000, 5).await;
    send_json(&app, Method::POST, "/api/invoices", Some(invoice_body(&pads, 1))).await;

    let (status, hits) = send_json(&app, Method::GET, "/api/invoices/search?q=reyes", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (_, misses) = send_json(&app, Method::GET, "/api/invoices/search?q=nobody", None).await;
    assert_eq!(misses.as_array().unwrap().len(), 0);
}
