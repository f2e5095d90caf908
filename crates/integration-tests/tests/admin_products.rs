//! Admin login and product management.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};

use sparktizen_integration_tests::{ADMIN_EMAIL, TestContext};

#[tokio::test]
async fn test_admin_routes_require_login() {
    let ctx = TestContext::start().await;
    let visitor = ctx.visitor();

    let resp = visitor.get(ctx.url("/admin/products")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Authentication required");

    let resp = visitor
        .delete(ctx.url("/admin/products/anything"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let ctx = TestContext::start().await;
    let visitor = ctx.visitor();

    let resp = visitor
        .post(ctx.url("/auth/login"))
        .json(&json!({ "email": ADMIN_EMAIL, "password": "not the password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let session: Value = visitor
        .get(ctx.url("/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(session["admin"].is_null());
}

#[tokio::test]
async fn test_login_and_logout() {
    let ctx = TestContext::start().await;
    let admin = ctx.admin().await;

    let session: Value = admin
        .get(ctx.url("/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["admin"]["email"], ADMIN_EMAIL);

    let resp = admin.post(ctx.url("/auth/logout")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = admin.get(ctx.url("/admin/products")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_requires_image_and_fields() {
    let ctx = TestContext::start().await;
    let admin = ctx.admin().await;

    let form = Form::new()
        .text("name", "Shirt")
        .text("description", "Cotton")
        .text("price", "2000");
    let resp = admin
        .post(ctx.url("/admin/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Please upload at least one image.");

    let form = Form::new()
        .text("name", "Shirt")
        .text("description", "Cotton")
        .text("price", "-5")
        .part("images", Part::bytes(vec![1, 2, 3]).file_name("a.png"));
    let resp = admin
        .post(ctx.url("/admin/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let form = Form::new()
        .text("name", " ")
        .text("description", "Cotton")
        .text("price", "10")
        .part("images", Part::bytes(vec![1, 2, 3]).file_name("a.png"));
    let resp = admin
        .post(ctx.url("/admin/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Missing required fields: name");

    for price in ["19.999", "10000000000"] {
        let form = Form::new()
            .text("name", "Shirt")
            .text("description", "Cotton")
            .text("price", price)
            .part("images", Part::bytes(vec![1, 2, 3]).file_name("a.png"));
        let resp = admin
            .post(ctx.url("/admin/products"))
            .multipart(form)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{price}");
    }

    assert!(ctx.assets.uploads().await.is_empty());
}

#[tokio::test]
async fn test_create_uploads_every_image() {
    let ctx = TestContext::start().await;
    let admin = ctx.admin().await;

    let form = Form::new()
        .text("name", "Hoodie")
        .text("description", "Fleece")
        .text("price", "7500")
        .part("images", Part::bytes(vec![1]).file_name("front.png"))
        .part("images", Part::bytes(vec![2]).file_name("back.png"));
    let resp = admin
        .post(ctx.url("/admin/products"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = resp.json().await.unwrap();
    assert_eq!(created["images"].as_array().unwrap().len(), 2);

    let mut uploads = ctx.assets.uploads().await;
    uploads.sort();
    assert_eq!(uploads, vec!["back.png", "front.png"]);

    let id = created["id"].as_str().unwrap();
    let product: Value = admin
        .get(ctx.url(&format!("/admin/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(product["name"], "Hoodie");
    assert_eq!(product["in_stock"], true);
    assert_eq!(product["images"], created["images"]);
}

#[tokio::test]
async fn test_update_and_delete() {
    let ctx = TestContext::start().await;
    let admin = ctx.admin().await;
    let id = ctx.create_product(&admin, "Shirt", "2000").await;
    let path = format!("/admin/products/{id}");

    let resp = admin
        .put(ctx.url(&path))
        .json(&json!({
            "name": "Linen Shirt",
            "description": "Breathable",
            "price": "2500",
            "in_stock": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let detail: Value = ctx
        .visitor()
        .get(ctx.url(&format!("/api/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(detail["name"], "Linen Shirt");
    assert_eq!(detail["price_display"], "₦2500.00");
    assert_eq!(detail["in_stock"], false);
    assert_eq!(detail["images"].as_array().unwrap().len(), 1);

    // Numeric prices are accepted too.
    let resp = admin
        .put(ctx.url(&path))
        .json(&json!({
            "name": "Linen Shirt",
            "description": "Breathable",
            "price": 3000,
            "in_stock": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = admin.delete(ctx.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = admin.get(ctx.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = admin.delete(ctx.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let products: Vec<Value> = admin
        .get(ctx.url("/admin/products"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(products.is_empty());
}
