//! Black-box HTTP test: the same router as prod, an in-memory store seeded
//! with fixtures, driven over a real socket with reqwest.

use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Utc};
use reqwest::StatusCode;
use serde_json::json;

use orderdesk_api::app::{AppServices, build_app};
use orderdesk_directory::{Client, ClientId, Personnel, PersonnelId};
use orderdesk_store::InMemoryStore;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let store = Arc::new(InMemoryStore::new());
        store.seed_client(Client {
            id: ClientId::new(1),
            name: "Ana".into(),
            surname: "Moreau".into(),
            address: "3 Oak Ave".into(),
            postal_code: "69003".into(),
            phone: "0400000000".into(),
            email: "ana@example.com".into(),
        });
        store.seed_personnel(Personnel {
            id: PersonnelId::new(1),
            name: "Marc".into(),
            surname: "Petit".into(),
            address: "8 Pine Rd".into(),
            city: "Lyon".into(),
            phone: "0600000001".into(),
            hired_on: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
            role_label: Some("Senior driver".into()),
        });
        store.seed_personnel(Personnel {
            id: PersonnelId::new(2),
            name: "Jo".into(),
            surname: "Klein".into(),
            address: "2 Elm St".into(),
            city: "Lyon".into(),
            phone: "0600000002".into(),
            hired_on: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            role_label: Some("Accountant".into()),
        });

        let zone = FixedOffset::east_opt(0).unwrap();
        let app = build_app(AppServices::new(store, zone));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", server.base_url))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn order_and_delivery_happy_path() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    // Place an order for the seeded client.
    let res = client
        .post(format!("{base}/orders"))
        .json(&json!({ "client_id": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let order_id = body["id"].as_i64().unwrap();

    let body: serde_json::Value = client
        .get(format!("{base}/orders/{order_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "EC");
    assert_eq!(body["client_name"], "Ana Moreau");

    // Mark it ready; it shows up in the ready listing.
    let res = client
        .put(format!("{base}/orders/{order_id}/status"))
        .json(&json!({ "status": "PR" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let ready: serde_json::Value = client
        .get(format!("{base}/orders/ready"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ready.as_array().unwrap().len(), 1);

    // Schedule with the eligible driver.
    let res = client
        .post(format!("{base}/deliveries"))
        .json(&json!({
            "order_id": order_id,
            "scheduled_at": Utc::now(),
            "agent_id": 1,
            "payment_mode": "card",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let body: serde_json::Value = client
        .get(format!("{base}/deliveries/{order_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "EP");
    assert_eq!(body["order_status"], "LI");
    assert_eq!(body["agent_name"], "Marc Petit");
    assert_eq!(body["postal_code"], "69003");

    // Dispatch, then complete; the order closes.
    let res = client
        .put(format!("{base}/deliveries/{order_id}/dispatch"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .put(format!("{base}/deliveries/{order_id}/complete"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let body: serde_json::Value = client
        .get(format!("{base}/orders/{order_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "SO");

    // Terminal: further transitions are rejected.
    let res = client
        .put(format!("{base}/orders/{order_id}/cancel"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn scheduling_on_an_unready_order_is_rejected() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let body: serde_json::Value = client
        .post(format!("{base}/orders"))
        .json(&json!({ "client_id": 1 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let order_id = body["id"].as_i64().unwrap();

    let res = client
        .post(format!("{base}/deliveries"))
        .json(&json!({
            "order_id": order_id,
            "scheduled_at": Utc::now(),
            "agent_id": 1,
            "payment_mode": "cash",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_transition");

    // Ineligible staff member: reported as not found.
    let res = client
        .put(format!("{base}/orders/{order_id}/status"))
        .json(&json!({ "status": "PR" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .post(format!("{base}/deliveries"))
        .json(&json!({
            "order_id": order_id,
            "scheduled_at": Utc::now(),
            "agent_id": 2,
            "payment_mode": "cash",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn article_crud_and_searches() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let res = client
        .post(format!("{base}/articles"))
        .json(&json!({
            "designation": "Ground coffee 1kg",
            "purchase_price": 650,
            "sale_price": 990,
            "tax_rate_bp": 550,
            "category": "grocery",
            "stock": 40,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await.unwrap();
    let article_id = body["id"].as_i64().unwrap();

    // Empty designation is a validation error.
    let res = client
        .post(format!("{base}/articles"))
        .json(&json!({
            "designation": "  ",
            "purchase_price": 1,
            "sale_price": 2,
            "tax_rate_bp": 0,
            "category": "",
            "stock": 0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Partial update: null clears the category, absent fields keep.
    let res = client
        .patch(format!("{base}/articles/{article_id}"))
        .json(&json!({ "sale_price": 950, "category": null }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let body: serde_json::Value = client
        .get(format!("{base}/articles/{article_id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["sale_price"], 950);
    assert_eq!(body["category"], "");
    assert_eq!(body["designation"], "Ground coffee 1kg");

    let hits: serde_json::Value = client
        .get(format!("{base}/articles/search/COFFEE"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(hits.as_array().unwrap().len(), 1);

    // Soft delete: gone from listings, still resolvable by id.
    let res = client
        .delete(format!("{base}/articles/{article_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let listing: serde_json::Value = client
        .get(format!("{base}/articles"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listing.as_array().unwrap().is_empty());

    let res = client
        .get(format!("{base}/articles/{article_id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["deleted"], true);
}

#[tokio::test]
async fn date_listings_are_strict_about_the_parameter() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let res = client
        .get(format!("{base}/orders/date/2024-5-10"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .get(format!("{base}/deliveries/date/2024-05-10"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn driver_listing_filters_by_role_label() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();
    let base = &server.base_url;

    let all: serde_json::Value = client
        .get(format!("{base}/personnel"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let drivers: serde_json::Value = client
        .get(format!("{base}/personnel/drivers"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let drivers = drivers.as_array().unwrap();
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0]["name"], "Marc");
}
