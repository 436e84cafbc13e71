mod common;

use common::{product, Harness};
use storefront::auth::CurrentUser;
use storefront::checkout::{BasketItemRequest, CheckoutMetadata, CheckoutRequest, CheckoutService, CheckoutSettings};
use storefront::domain::aggregates::Address;
use storefront::error::StorefrontError;
use storefront::ports::CheckoutMode;

fn service(h: &Harness) -> CheckoutService {
    CheckoutService::new(h.content.clone(), h.payments.clone(), CheckoutSettings {
        public_url: "https://shop.test".into(),
        ..CheckoutSettings::default()
    })
}

fn shopper() -> CurrentUser {
    CurrentUser { id: "user_7".into(), email: Some("grace@example.com".into()), name: Some("Grace".into()) }
}

fn items(pairs: &[(&str, u32)]) -> Vec<BasketItemRequest> {
    pairs.iter().map(|(id, q)| BasketItemRequest { product_id: id.to_string(), quantity: *q }).collect()
}

fn request(pairs: &[(&str, u32)], installments: Option<u32>) -> CheckoutRequest {
    CheckoutRequest { items: items(pairs), customer_name: None, customer_email: None, address: None, installments }
}

fn harness() -> Harness {
    Harness::new(vec![product("mug", "12.50", 40), product("kettle", "80.00", 1)])
}

#[tokio::test]
async fn test_quote_merges_repeated_lines() {
    let h = harness();
    let basket = service(&h).quote(&items(&[("mug", 2), ("kettle", 1), ("mug", 1)])).await.unwrap();
    assert_eq!(basket.lines().len(), 2);
    assert_eq!(basket.item_count(), 4);
    assert_eq!(basket.subtotal().to_minor_units().unwrap(), 11750);
}

#[tokio::test]
async fn test_quote_rejects_unknown_product_and_zero_quantity() {
    let h = harness();
    let svc = service(&h);
    assert!(matches!(svc.quote(&items(&[("ghost", 1)])).await, Err(StorefrontError::NotFound(_))));
    assert!(matches!(svc.quote(&items(&[("mug", 0)])).await, Err(StorefrontError::Validation(_))));
}

#[tokio::test]
async fn test_one_off_session_has_a_line_per_product() {
    let h = harness();
    let address = Address {
        name: "Grace Hopper".into(),
        street1: "1 Navy Yard".into(),
        street2: None,
        city: "Arlington".into(),
        state: Some("VA".into()),
        zip: "22202".into(),
        country: "US".into(),
    };
    let mut req = request(&[("mug", 3), ("kettle", 1)], None);
    req.address = Some(address.clone());

    let started = service(&h).start(&shopper(), req).await.unwrap();
    assert_eq!(started.total.to_minor_units().unwrap(), 11750);
    assert!(started.installment_amount.is_none());

    let session = h.payments.last_session();
    assert_eq!(session.mode, CheckoutMode::Payment);
    assert_eq!(session.customer_email, "grace@example.com");
    assert_eq!(session.line_items.len(), 2);
    assert_eq!(session.line_items[0].unit_amount, 1250);
    assert_eq!(session.line_items[0].quantity, 3);
    assert!(session.subscription_metadata.is_empty());
    assert_eq!(session.cancel_url, "https://shop.test/cart");
    assert!(session.success_url.contains(started.order_number.as_str()));

    let meta = CheckoutMetadata::decode(&session.metadata).unwrap();
    assert_eq!(meta.order_number, started.order_number.to_string());
    assert_eq!(meta.user_id, "user_7");
    assert_eq!(meta.total_minor, 11750);
    assert_eq!(meta.address, Some(address));
    assert_eq!(meta.items.len(), 2);
}

#[tokio::test]
async fn test_installment_session_bills_monthly_share() {
    let h = harness();
    let started = service(&h).start(&shopper(), request(&[("mug", 2)], Some(6))).await.unwrap();

    let session = h.payments.last_session();
    assert_eq!(session.mode, CheckoutMode::Installments { installments: 6 });
    assert_eq!(session.line_items.len(), 1);
    // 2500 / 6 rounded up
    assert_eq!(session.line_items[0].unit_amount, 417);
    assert_eq!(session.subscription_metadata.get("installments").map(String::as_str), Some("6"));
    assert_eq!(
        session.subscription_metadata.get("orderNumber"),
        Some(&started.order_number.to_string())
    );
    assert_eq!(started.installment_amount.unwrap().to_minor_units().unwrap(), 417);
}

#[tokio::test]
async fn test_start_rejects_unsupported_installment_count() {
    let h = harness();
    let err = service(&h).start(&shopper(), request(&[("mug", 1)], Some(5))).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));
    assert!(h.payments.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_start_reports_every_short_line() {
    let h = harness();
    let err = service(&h).start(&shopper(), request(&[("kettle", 3)], None)).await.unwrap_err();
    match err {
        StorefrontError::OutOfStock(problems) => {
            assert_eq!(problems.len(), 1);
            assert_eq!(problems[0].product_id, "kettle");
            assert_eq!(problems[0].requested, 3);
            assert_eq!(problems[0].available, 1);
        }
        other => panic!("expected out of stock, got {:?}", other),
    }
    assert!(h.payments.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_start_needs_an_email() {
    let h = harness();
    let anonymous = CurrentUser { id: "user_8".into(), email: None, name: None };
    let err = service(&h).start(&anonymous, request(&[("mug", 1)], None)).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(_)));
}

#[tokio::test]
async fn test_address_too_long_for_metadata_is_a_client_error() {
    let h = harness();
    let mut req = request(&[("mug", 1)], None);
    // Every field is within its own limit; together they exceed one metadata value.
    req.address = Some(Address {
        name: "n".repeat(120),
        street1: "s".repeat(200),
        street2: Some("t".repeat(150)),
        city: "c".repeat(50),
        state: None,
        zip: "12345".into(),
        country: "US".into(),
    });

    let err = service(&h).start(&shopper(), req).await.unwrap_err();
    assert!(matches!(err, StorefrontError::Validation(ref msg) if msg.contains("address")));
    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    assert!(h.payments.sessions.lock().unwrap().is_empty());
}
