//! Checkout: authentication gate, order recording and failure handling.

#![allow(clippy::indexing_slicing)]

use axum::http::StatusCode;
use paws_claws_core::OrderStatus;
use paws_claws_integration_tests::TestApp;
use paws_claws_storefront::orders::StoreError;

#[tokio::test]
async fn test_signed_out_checkout_redirects_without_writing() {
    let app = TestApp::new();
    app.add_to_cart("1").await;

    let response = app.post_form("/checkout", &[]).await;
    assert_eq!(response.redirect_target(), "/auth");
    assert!(app.orders.orders().is_empty());

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Premium Dog Wash"));
}

#[tokio::test]
async fn test_checkout_records_completed_order_and_empties_cart() {
    let app = TestApp::new();
    let user = app.sign_in_as("mia@pets.io").await;
    app.add_to_cart("1").await;
    app.add_to_cart("1").await;
    app.add_to_cart("3").await;

    let response = app.post_form("/checkout", &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Thank you for your order!"));

    let orders = app.orders.orders();
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.user_id, user.id);
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.item_count(), 3);
    // $98.99 subtotal + $15.00 shipping + $7.92 tax
    assert_eq!(order.total.to_string(), "$121.91");
    assert!(response.body.contains("$121.91"));

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_missing_order_table_still_confirms() {
    let app = TestApp::new();
    app.sign_in_as("rex@dogs.io").await;
    app.orders.drop_table();
    app.add_to_cart("2").await;

    let response = app.post_form("/checkout", &[]).await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("could not be saved to your history"));
    assert!(app.orders.orders().is_empty());

    let cart = app.get("/cart").await;
    assert!(cart.body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_store_failure_keeps_cart_and_shows_message() {
    let app = TestApp::new();
    app.sign_in_as("luna@cats.io").await;
    app.add_to_cart("4").await;
    app.orders.fail_next(StoreError::Rejected {
        code: Some("23502".to_string()),
        message: "null value in column \"total\"".to_string(),
    });

    let response = app.post_form("/checkout", &[]).await;
    let target = response.redirect_target();
    assert!(target.starts_with("/cart?error="), "{target}");

    let cart = app.get(target).await;
    assert!(cart.body.contains("null value in column"));
    assert!(cart.body.contains("Luxury Cat SPA"));
}

#[tokio::test]
async fn test_empty_cart_checkout_is_rejected() {
    let app = TestApp::new();
    app.sign_in_as("kiwi@birds.io").await;

    let response = app.post_form("/checkout", &[]).await;
    assert_eq!(
        response.redirect_target(),
        "/cart?error=your%20cart%20is%20empty"
    );
    assert!(app.orders.orders().is_empty());
}
