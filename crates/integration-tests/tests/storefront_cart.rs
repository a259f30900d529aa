//! Session cart: add, adjust, remove and the order summary.

use axum::http::StatusCode;
use paws_claws_integration_tests::TestApp;

#[tokio::test]
async fn test_empty_cart_page() {
    let app = TestApp::new();
    let response = app.get("/cart").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_add_same_product_increments_quantity() {
    let app = TestApp::new();
    app.add_to_cart("1").await;
    app.add_to_cart("1").await;
    app.add_to_cart("1").await;

    let count = app.get("/cart/count").await;
    assert_eq!(count.body.trim(), r#"<span class="badge">3</span>"#);

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Premium Dog Wash"));
    // 3 x $45.00 crosses the free-shipping threshold
    assert!(cart.body.contains("$135.00"));
    assert!(cart.body.contains("Free"));
    assert!(cart.body.contains("$10.80"));
    assert!(cart.body.contains("$145.80"));
}

#[tokio::test]
async fn test_small_order_pays_flat_shipping() {
    let app = TestApp::new();
    app.add_to_cart("3").await;

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("$8.99"));
    assert!(cart.body.contains("$15.00"));
    assert!(cart.body.contains("$0.72"));
    assert!(cart.body.contains("$24.71"));
}

#[tokio::test]
async fn test_quantity_never_drops_below_one() {
    let app = TestApp::new();
    app.add_to_cart("2").await;
    app.add_to_cart("2").await;

    for _ in 0..3 {
        let response = app
            .post_form("/cart/update", &[("product_id", "2"), ("delta", "-1")])
            .await;
        assert_eq!(response.redirect_target(), "/cart");
    }

    let count = app.get("/cart/count").await;
    assert_eq!(count.body.trim(), r#"<span class="badge">1</span>"#);
}

#[tokio::test]
async fn test_remove_and_clear() {
    let app = TestApp::new();
    app.add_to_cart("4").await;
    app.add_to_cart("5").await;

    app.post_form("/cart/remove", &[("product_id", "4")]).await;
    let cart = app.get("/cart").await;
    assert!(!cart.body.contains("Luxury Cat SPA"));
    assert!(cart.body.contains("Oatmeal Shampoo"));

    app.post_form("/cart/clear", &[]).await;
    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let app = TestApp::new();
    let response = app.post_form("/cart/add", &[("product_id", "999")]).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_add_returns_to_same_site_page_only() {
    let app = TestApp::new();
    let response = app
        .post_form("/cart/add", &[("product_id", "6"), ("return_to", "/shop?cat=Food")])
        .await;
    assert_eq!(response.redirect_target(), "/shop?cat=Food");

    let response = app
        .post_form(
            "/cart/add",
            &[("product_id", "6"), ("return_to", "https://evil.example/")],
        )
        .await;
    assert_eq!(response.redirect_target(), "/cart");
}
