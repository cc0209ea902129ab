//! End-to-end tests for the REST API, driven in-process with `tower::ServiceExt::oneshot`.

#![cfg(feature = "http-server")]

mod support;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Duration;
use serde_json::{json, Value};

use support::app::{start, TestApp};

async fn create_box(app: &TestApp, token: &str, title: &str) -> i64 {
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/boxes",
            Some(token),
            Some(json!({"title": title, "description": "words"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"]["id"].as_i64().unwrap()
}

async fn create_item(app: &TestApp, token: &str, box_id: i64) -> Value {
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/items",
            Some(token),
            Some(json!({"box_id": box_id, "text1": "gato", "text2": "cat"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["data"].clone()
}

// =========================================================
// Health and auth
// =========================================================

#[tokio::test]
async fn test_health_reports_connected_store() {
    let app = TestApp::new();
    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_register_login_and_current_user() {
    let app = TestApp::new();
    let token = app.register("Ada", "ada@example.com").await;

    let (status, body) = app.send(Method::GET, "/v1/user", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "ada@example.com");
    assert!(body.get("password_hash").is_none());

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "correct horse battery"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let second = body["data"]["token"].as_str().unwrap();
    assert_ne!(second, token);

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/login",
            None,
            Some(json!({"email": "ada@example.com", "password": "wrong password"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_protected_routes_require_a_valid_token() {
    let app = TestApp::new();
    for token in [None, Some("bogus")] {
        let (status, body) = app.send(Method::GET, "/v1/boxes", token, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Unauthenticated.");
    }
}

#[tokio::test]
async fn test_register_validation_errors_are_listed_per_field() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::POST,
            "/v1/register",
            None,
            Some(json!({"email": "not-an-email", "password": "short"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["errors"]["name"][0], "The name field is required.");
    assert_eq!(
        body["errors"]["email"][0],
        "The email field must be a valid email address."
    );
    assert_eq!(
        body["errors"]["password"][0],
        "The password field must be at least 8 characters."
    );
}

#[tokio::test]
async fn test_malformed_json_is_a_bad_request() {
    let app = TestApp::new();
    let token = app.register("Ada", "ada@example.com").await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/boxes")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();

    let (status, body) = app.send_request(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

// =========================================================
// Boxes
// =========================================================

#[tokio::test]
async fn test_box_lifecycle() {
    let app = TestApp::new();
    let token = app.register("Ada", "ada@example.com").await;

    let (status, body) = app
        .send(Method::POST, "/v1/boxes", Some(&token), Some(json!({"title": "Spanish"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
    assert!(body["errors"]["description"].is_array());

    let box_id = create_box(&app, &token, "Spanish").await;
    create_item(&app, &token, box_id).await;

    let (status, body) = app
        .send(Method::GET, &format!("/v1/boxes/{box_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Box retrieved successfully");
    assert_eq!(body["data"]["box"]["title"], "Spanish");
    assert_eq!(body["data"]["box"]["items"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .send(
            Method::PATCH,
            &format!("/v1/boxes/{box_id}"),
            Some(&token),
            Some(json!({"title": "Castellano", "description": "verbos"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Castellano");

    let (status, body) = app
        .send(Method::DELETE, &format!("/v1/boxes/{box_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Box deleted successfully");
    assert_eq!(app.repo.item_count(), 0);

    let (status, body) = app
        .send(Method::GET, &format!("/v1/boxes/{box_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Box not found");
}

#[tokio::test]
async fn test_boxes_are_private_to_their_owner() {
    let app = TestApp::new();
    let ada = app.register("Ada", "ada@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;
    let box_id = create_box(&app, &ada, "Spanish").await;

    let (status, body) = app
        .send(Method::GET, &format!("/v1/boxes/{box_id}"), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You do not have permission to view this box");

    // Ownership is checked before the payload.
    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/v1/boxes/{box_id}"),
            Some(&bob),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.send(Method::GET, "/v1/boxes", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn test_box_listing_is_paginated() {
    let app = TestApp::new();
    let token = app.register("Ada", "ada@example.com").await;
    for n in 0..12 {
        create_box(&app, &token, &format!("Box {n}")).await;
    }

    let (_, body) = app.send(Method::GET, "/v1/boxes", Some(&token), None).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 10);
    assert_eq!(body["data"]["total"], 12);
    assert_eq!(body["data"]["last_page"], 2);

    let (_, body) = app
        .send(Method::GET, "/v1/boxes?page=2", Some(&token), None)
        .await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["current_page"], 2);
}

// =========================================================
// Items and reviews
// =========================================================

#[tokio::test]
async fn test_item_starts_due_on_level_one() {
    let app = TestApp::new();
    let token = app.register("Ada", "ada@example.com").await;
    let box_id = create_box(&app, &token, "Spanish").await;

    let item = create_item(&app, &token, box_id).await;
    assert_eq!(item["level"], 1);
    assert_eq!(item["show_date"], json!(start()));
}

#[tokio::test]
async fn test_item_create_checks_fields_then_box_owner() {
    let app = TestApp::new();
    let ada = app.register("Ada", "ada@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;
    let box_id = create_box(&app, &ada, "Spanish").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/items",
            Some(&bob),
            Some(json!({"box_id": 999, "text1": "gato", "text2": "cat"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"]["box_id"][0], "The selected box id is invalid.");

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/items",
            Some(&bob),
            Some(json!({"box_id": box_id, "text1": "gato", "text2": "cat"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You do not have permission to add items to this box"
    );
}

#[tokio::test]
async fn test_review_flow_through_the_levels() {
    let app = TestApp::new();
    let token = app.register("Ada", "ada@example.com").await;
    let box_id = create_box(&app, &token, "Spanish").await;
    let item_id = create_item(&app, &token, box_id).await["id"].as_i64().unwrap();
    let level_uri = format!("/v1/items/{item_id}/level");

    let (status, body) = app
        .send(Method::POST, &level_uri, Some(&token), Some(json!({"is_true": true})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item level updated successfully");
    assert_eq!(body["data"]["level"], 2);
    assert_eq!(body["data"]["show_date"], json!(start() + Duration::days(3)));

    // Form-style booleans are accepted.
    let (status, body) = app
        .send(Method::POST, &level_uri, Some(&token), Some(json!({"is_true": "0"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["level"], 1);
    assert_eq!(body["data"]["show_date"], json!(start() + Duration::days(1)));

    let (status, body) = app
        .send(Method::POST, &level_uri, Some(&token), Some(json!({"is_true": "yes"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(
        body["errors"]["is_true"][0],
        "The is true field must be true or false."
    );
}

#[tokio::test]
async fn test_due_filter_tracks_the_clock() {
    let app = TestApp::new();
    let token = app.register("Ada", "ada@example.com").await;
    let box_id = create_box(&app, &token, "Spanish").await;
    let item_id = create_item(&app, &token, box_id).await["id"].as_i64().unwrap();

    app.send(
        Method::POST,
        &format!("/v1/items/{item_id}/level"),
        Some(&token),
        Some(json!({"is_true": 1})),
    )
    .await;

    let (_, body) = app
        .send(Method::GET, "/v1/items?due=true", Some(&token), None)
        .await;
    assert_eq!(body["data"]["total"], 0);

    app.clock.advance(Duration::days(3));
    let (_, body) = app
        .send(
            Method::GET,
            &format!("/v1/items?due=true&box_id={box_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["data"][0]["id"], item_id);
}

#[tokio::test]
async fn test_item_update_and_delete() {
    let app = TestApp::new();
    let ada = app.register("Ada", "ada@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;
    let box_id = create_box(&app, &ada, "Spanish").await;
    let item_id = create_item(&app, &ada, box_id).await["id"].as_i64().unwrap();
    let uri = format!("/v1/items/{item_id}");

    let (status, body) = app
        .send(Method::PUT, &uri, Some(&ada), Some(json!({"text2": "kitty"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["text1"], "gato");
    assert_eq!(body["data"]["text2"], "kitty");

    let (status, body) = app.send(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You do not have permission to delete this item");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.send(Method::GET, &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Item not found");
}

// =========================================================
// Posts
// =========================================================

#[tokio::test]
async fn test_posts_are_public_but_author_only_writes() {
    let app = TestApp::new();
    let ada = app.register("Ada", "ada@example.com").await;
    let bob = app.register("Bob", "bob@example.com").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/v1/posts",
            Some(&ada),
            Some(json!({"title": "Hello", "body": "First post"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["data"]["id"].as_i64().unwrap();
    let uri = format!("/v1/posts/{post_id}");

    let (status, body) = app.send(Method::GET, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Hello");
    assert!(body.get("message").is_none());

    let (status, body) = app
        .send(
            Method::PUT,
            &uri,
            Some(&bob),
            Some(json!({"title": "Mine", "body": "now"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Authorization Failed");

    let (status, _) = app.send(Method::DELETE, &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.repo.post_count(), 0);

    let (status, body) = app.send(Method::GET, &uri, Some(&ada), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Post not found");
}
