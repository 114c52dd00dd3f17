//! Pharmacy registration CRUD over HTTP.

mod common;

use common::{spawn_server, TestServer};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn form(owner: &str) -> Value {
    json!({
        "owner_user_id": owner,
        "name": "Farmacia San Rafael",
        "license_number": "LIC-9931",
        "address": "Calle 5 #12",
        "city": "Valencia",
        "phone": "+58 241 555 0199",
        "email": "sanrafael@example.com"
    })
}

async fn create(server: &TestServer, body: &Value) -> reqwest::Response {
    server
        .client
        .post(server.url("/api/pharmacies"))
        .json(body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn create_read_update_delete() {
    let server = spawn_server().await;

    let resp = create(&server, &form("owner-1")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let resp = server
        .client
        .get(server.url(&format!("/api/pharmacies/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["name"], "Farmacia San Rafael");

    let resp = server
        .client
        .put(server.url(&format!("/api/pharmacies/{}", id)))
        .json(&json!({ "city": "Maracay", "status": "approved", "email": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["city"], "Maracay");
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["email"], Value::Null);

    let resp = server
        .client
        .get(server.url("/api/pharmacies?status=approved"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let resp = server
        .client
        .delete(server.url(&format!("/api/pharmacies/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server
        .client
        .get(server.url(&format!("/api/pharmacies/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn one_active_registration_per_user() {
    let server = spawn_server().await;

    let resp = create(&server, &form("owner-2")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let first: Value = resp.json().await.unwrap();
    let first_id = first["data"]["id"].as_str().unwrap().to_string();

    let resp = create(&server, &form("owner-2")).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Rejecting the first frees the slot.
    let resp = server
        .client
        .put(server.url(&format!("/api/pharmacies/{}", first_id)))
        .json(&json!({ "status": "rejected" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = create(&server, &form("owner-2")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // ...and re-activating the rejected one now conflicts.
    let resp = server
        .client
        .put(server.url(&format!("/api/pharmacies/{}", first_id)))
        .json(&json!({ "status": "pending" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let resp = server
        .client
        .get(server.url("/api/pharmacies?owner_user_id=owner-2"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn validation_and_malformed_requests() {
    let server = spawn_server().await;

    let mut bad = form("owner-3");
    bad["name"] = json!(" ");
    bad["email"] = json!("not-an-email");
    let resp = create(&server, &bad).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    let fields: Vec<&str> = body["data"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email"]);

    let resp = create(&server, &json!({ "name": "only a name" })).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let resp = server
        .client
        .get(server.url("/api/pharmacies/not-a-uuid"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = server
        .client
        .put(server.url(&format!("/api/pharmacies/{}", uuid::Uuid::new_v4())))
        .json(&json!({ "city": "Mérida" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = server
        .client
        .put(server.url(&format!("/api/pharmacies/{}", uuid::Uuid::new_v4())))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
