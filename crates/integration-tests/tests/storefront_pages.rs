//! Browsing, the payment page and operational endpoints.

use axum::http::StatusCode;
use paws_claws_integration_tests::TestApp;

#[tokio::test]
async fn test_health_and_readiness() {
    let app = TestApp::new();
    let health = app.get("/health").await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, "ok");
    assert_eq!(app.get("/health/ready").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_home_page_renders() {
    let app = TestApp::new();
    let response = app.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Featured Products"));
}

#[tokio::test]
async fn test_shop_filters_by_category() {
    let app = TestApp::new();

    let all = app.get("/shop").await;
    for name in ["Premium Dog Wash", "Organic Salmon Cat Food", "Durable Squeaky Bone"] {
        assert!(all.body.contains(name), "{name} missing");
    }

    let toys = app.get("/shop?cat=Toys").await;
    assert!(toys.body.contains("Durable Squeaky Bone"));
    assert!(!toys.body.contains("Premium Dog Wash"));
    assert!(!toys.body.contains("Organic Salmon Cat Food"));

    // Unknown categories fall back to everything
    let unknown = app.get("/shop?cat=Reptiles").await;
    assert!(unknown.body.contains("All Products"));
    assert!(unknown.body.contains("Premium Beef Jerky"));
}

#[tokio::test]
async fn test_discounted_product_shows_old_price() {
    let app = TestApp::new();
    let grooming = app.get("/shop?cat=Grooming").await;
    assert!(grooming.body.contains("<s class=\"muted\">$55.00</s>"));
}

#[tokio::test]
async fn test_payment_page_without_amount() {
    let app = TestApp::new();
    let page = app.get("/payment").await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Invalid Order"));

    let start = app.post_form("/payment/start", &[]).await;
    assert_eq!(start.redirect_target(), "/cart");
}

#[tokio::test]
async fn test_card_payment_flow() {
    let app = TestApp::new();
    app.add_to_cart("1").await;
    app.add_to_cart("1").await;
    app.add_to_cart("1").await;

    let start = app.post_form("/payment/start", &[]).await;
    assert_eq!(start.redirect_target(), "/payment");

    let page = app.get("/payment").await;
    assert!(page.body.contains("Secure Payment"));
    assert!(page.body.contains("$145.80"));
    assert!(page.body.contains("Test mode"));

    let rejected = app
        .post_form(
            "/payment",
            &[("card_number", "4242 4242 4242 4241"), ("expiry", "12/99"), ("cvc", "123")],
        )
        .await;
    assert!(rejected.redirect_target().starts_with("/payment?error="));

    let paid = app
        .post_form(
            "/payment",
            &[("card_number", "4242 4242 4242 4242"), ("expiry", "12/99"), ("cvc", "123")],
        )
        .await;
    assert_eq!(paid.redirect_target(), "/");

    let home = app.get("/").await;
    assert!(home.body.contains("Payment of $145.80 successful!"));
    // The banner is shown once
    assert!(!app.get("/").await.body.contains("successful!"));
    assert!(app.get("/payment").await.body.contains("Invalid Order"));
}
