//! Two users walking through the whole blog flow.

mod common;

use axum::http::StatusCode;
use common::{app, unique};
use serde_json::json;

#[tokio::test]
async fn alice_and_bob() {
    let app = app().await;

    let alice_name = unique("alice");
    let alice_email = format!("{}@example.com", alice_name);
    let resp = app
        .post_json(
            "/auth/register",
            json!({ "username": alice_name, "email": alice_email, "password": "wonderland" }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let alice_id = resp.json()["id"].as_str().unwrap().to_string();

    let resp = app
        .post_json(
            "/auth/login",
            json!({ "email": alice_email, "password": "looking-glass" }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let resp = app
        .post_json(
            "/auth/login",
            json!({ "email": alice_email, "password": "wonderland" }),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    let alice_token = resp.json()["token"].as_str().unwrap().to_string();

    let resp = app
        .post_json(
            "/posts",
            json!({ "title": "Hello", "content": "World" }),
            Some(&alice_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    let post = resp.json();
    assert_eq!(post["author_id"].as_str().unwrap(), alice_id);
    let post_id = post["id"].as_str().unwrap().to_string();

    let bob = app.create_user("bob").await;
    let like_path = format!("/posts/{}/like", post_id);
    let likes_path = format!("/posts/{}/likes", post_id);

    let resp = app.post_empty(&like_path, Some(&bob.token)).await;
    assert_eq!(resp.json()["liked"], true);
    let resp = app.get(&likes_path, Some(&bob.token)).await;
    assert_eq!(resp.json()["totalLikes"].as_i64().unwrap(), 1);

    let resp = app.post_empty(&like_path, Some(&bob.token)).await;
    assert_eq!(resp.json()["liked"], false);
    let resp = app.get(&likes_path, Some(&bob.token)).await;
    assert_eq!(resp.json()["totalLikes"].as_i64().unwrap(), 0);

    let resp = app
        .delete(&format!("/posts/{}", post_id), Some(&bob.token))
        .await;
    assert_eq!(resp.status, StatusCode::FORBIDDEN);

    let resp = app
        .delete(&format!("/posts/{}", post_id), Some(&alice_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let resp = app.get(&format!("/posts/{}", post_id), None).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app().await;

    let resp = app.get("/health", None).await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["status"].as_str().unwrap(), "ok");
}

#[tokio::test]
async fn garbage_token_on_optional_route_is_anonymous() {
    let app = app().await;
    let user = app.create_user("optional").await;
    let post_id = app.create_post(&user, "Open").await;

    let resp = app
        .get(&format!("/posts/{}/likes", post_id), Some("not-a-token"))
        .await;

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["liked"], false);
}
