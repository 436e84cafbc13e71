mod common;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use common::{product, Harness};
use storefront::checkout::CheckoutSettings;
use storefront::domain::aggregates::{Order, OrderDraft, OrderLine};
use storefront::domain::value_objects::{Money, OrderNumber};
use storefront::http::{router, AppState, Backends};
use storefront::webhook::{signature::compute_signature, SignatureVerifier, SIGNATURE_HEADER};

const WEBHOOK_SECRET: &str = "whsec_test";

fn app(h: &Harness) -> Router {
    // Never connected: these routes do not reach PostgreSQL.
    let db = PgPoolOptions::new().connect_lazy("postgres://storefront@localhost/storefront_test").unwrap();
    let backends = Backends {
        content: h.content.clone(),
        payments: h.payments.clone(),
        installments: h.installments.clone(),
        events: h.events.clone(),
    };
    router(AppState::new(db, backends, CheckoutSettings::default(), SignatureVerifier::new(WEBHOOK_SECRET, 300)))
}

fn harness() -> Harness {
    let mut lamp = product("lamp", "25.00", 10);
    lamp.name = "Desk Lamp".into();
    Harness::new(vec![lamp, product("chair", "120.00", 0)])
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn as_user(mut req: Request<Body>, user_id: &str) -> Request<Body> {
    req.headers_mut().insert("x-user-id", user_id.parse().unwrap());
    req
}

fn placed_order(order_number: &str, user_id: &str) -> Order {
    Order::place(OrderDraft {
        order_number: OrderNumber::parse(order_number).unwrap(),
        checkout_session_id: format!("cs_{}", order_number),
        customer_id: None,
        user_id: user_id.into(),
        customer_name: "Ada".into(),
        email: "ada@example.com".into(),
        payment_intent_id: Some("pi_1".into()),
        subscription_id: None,
        products: vec![OrderLine { product_id: "lamp".into(), quantity: 1 }],
        total: Money::from_minor_units(2500, "usd"),
        amount_discount: Default::default(),
        address: None,
        installments: None,
        paid: true,
    })
    .unwrap()
}

fn signed_webhook(payload: &str, secret: &str) -> Request<Body> {
    let t = chrono::Utc::now().timestamp();
    let sig = compute_signature(secret, t, payload.as_bytes()).unwrap();
    Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/payments")
        .header(SIGNATURE_HEADER, format!("t={},v1={}", t, sig))
        .body(Body::from(payload.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app(&harness()), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_product_listing_paginates_and_searches() {
    let h = harness();
    let (status, body) = send(app(&h), get("/api/v1/products?per_page=1&page=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = send(app(&h), get("/api/v1/products?search=lamp")).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["_id"], "lamp");

    let (status, _) = send(app(&h), get("/api/v1/products?status=clearance")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_product_slug_is_404() {
    let (status, body) = send(app(&harness()), get("/api/v1/products/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_basket_quote_flags_stock_problems() {
    let req = post_json("/api/v1/basket/quote", json!({
        "items": [{ "product_id": "lamp", "quantity": 2 }, { "product_id": "chair", "quantity": 1 }]
    }));
    let (status, body) = send(app(&harness()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_count"], 3);
    assert_eq!(body["lines"].as_array().unwrap().len(), 2);
    assert_eq!(body["stock_problems"][0]["product_id"], "chair");
    assert_eq!(body["installment_options"], json!([3, 6, 12]));
}

#[tokio::test]
async fn test_checkout_requires_a_signed_in_user() {
    let req = post_json("/api/v1/checkout", json!({ "items": [{ "product_id": "lamp", "quantity": 1 }] }));
    let (status, body) = send(app(&harness()), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
}

#[tokio::test]
async fn test_webhook_rejects_bad_signature() {
    let h = harness();
    let payload = json!({ "id": "evt_1", "type": "customer.created", "data": { "object": {} } }).to_string();

    let (status, _) = send(app(&h), signed_webhook(&payload, "whsec_wrong")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unsigned = Request::builder()
        .method("POST")
        .uri("/api/v1/webhooks/payments")
        .body(Body::from(payload))
        .unwrap();
    let (status, _) = send(app(&h), unsigned).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_webhook_accepts_signed_event() {
    let h = harness();
    let payload = json!({ "id": "evt_2", "type": "customer.created", "data": { "object": { "id": "cus_1" } } }).to_string();
    let (status, body) = send(app(&h), signed_webhook(&payload, WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);
    assert_eq!(body["outcome"], "ignored:customer.created");
}

#[tokio::test]
async fn test_webhook_rejects_garbage_body_with_valid_signature() {
    let (status, _) = send(app(&harness()), signed_webhook("not json", WEBHOOK_SECRET)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_orders_are_scoped_to_their_owner() {
    let h = harness();
    let (status, body) = send(app(&h), Request::builder()
        .uri("/api/v1/orders")
        .header("x-user-id", "user_1")
        .body(Body::empty())
        .unwrap()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = send(app(&h), get("/api/v1/orders")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_newsletter_rejects_invalid_email() {
    let (status, _) = send(app(&harness()), post_json("/api/v1/newsletter", json!({ "email": "not-an-email" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_rating_out_of_range_is_rejected() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/reviews")
        .header("content-type", "application/json")
        .header("x-user-id", "user_1")
        .body(Body::from(json!({
            "product_id": "lamp",
            "rating": 9,
            "title": "Great",
            "body": "Bright and sturdy lamp."
        }).to_string()))
        .unwrap();
    let (status, _) = send(app(&harness()), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_page_beyond_range_is_rejected() {
    let (status, body) = send(app(&harness()), get("/api/v1/products?page=4294967295&per_page=100")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}

#[tokio::test]
async fn test_someone_elses_order_is_not_found() {
    let h = harness();
    h.content.orders.lock().unwrap().push(placed_order("ORD-00000042", "user_2"));

    let (status, body) = send(app(&h), as_user(get("/api/v1/orders/ORD-00000042"), "user_1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);

    let (status, body) = send(app(&h), as_user(get("/api/v1/orders/ORD-00000042"), "user_2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderNumber"], "ORD-00000042");
}

#[tokio::test]
async fn test_malformed_bodies_get_json_errors() {
    let h = harness();
    let broken = Request::builder()
        .method("POST")
        .uri("/api/v1/basket/quote")
        .header("content-type", "application/json")
        .body(Body::from("{\"items\": ["))
        .unwrap();
    let (status, body) = send(app(&h), broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].is_string());

    // Does not fit the rating field at all, so it fails before validation.
    let req = as_user(post_json("/api/v1/reviews", json!({
        "product_id": "lamp",
        "rating": 300,
        "title": "Great",
        "body": "Bright and sturdy lamp."
    })), "user_1");
    let (status, body) = send(app(&h), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, body) = send(app(&h), get("/api/v1/products?per_page=many")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, body) = send(app(&h), as_user(post_json("/api/v1/reviews/not-a-uuid/helpful", json!({})), "user_1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
}
