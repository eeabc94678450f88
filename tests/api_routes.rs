//! HTTP-level tests driving the assembled router with the memory engine

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Utc;
use ozkw_server::auth::JwtConfig;
use ozkw_server::checkout::ShippingPolicy;
use ozkw_server::core::{Config, ServerState, router};
use ozkw_server::db::DbService;
use ozkw_server::db::models::{Product, ProductStatus, Rating};
use ozkw_server::db::repository::order::OrderFilter;
use ozkw_server::db::repository::{OrderRepository, ProductRepository};
use ozkw_server::services::SmtpConfig;
use ozkw_server::utils::{PageQuery, Pagination};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

fn test_config(work_dir: &std::path::Path) -> Config {
    Config {
        work_dir: work_dir.to_string_lossy().into_owned(),
        http_port: 0,
        environment: "development".into(),
        client_origin: None,
        store_name: "24ozKw".into(),
        default_currency: "KWD".into(),
        jwt: JwtConfig {
            secret: "test-secret-test-secret-test-secret-42".into(),
            access_minutes: 15,
            refresh_days: 7,
            issuer: "ozkw-server".into(),
            audience: "ozkw-clients".into(),
        },
        shipping: ShippingPolicy {
            free_threshold_fils: 15_000,
            base_fee_fils: 2_000,
        },
        smtp: None,
        whatsapp: None,
    }
}

/// Router over a fresh memory database; the temp dir backs the uploads
/// static mount
async fn test_app(work_dir: &TempDir) -> (Router, ServerState) {
    let db = DbService::memory().await.expect("memory db");
    let state = ServerState::with_db(test_config(work_dir.path()), db).expect("state");
    (router(state.clone()), state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

fn seed_product(slug: &str, price_in_fils: i64, stock: i64) -> Product {
    let now = Utc::now();
    Product {
        id: None,
        title: format!("Seed {slug}"),
        slug: slug.to_string(),
        description: String::new(),
        price_in_fils,
        compare_at_price_in_fils: None,
        currency: "KWD".into(),
        stock,
        status: ProductStatus::Active,
        images: vec![],
        category: None,
        rating: Rating::default(),
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn health_reports_ok() {
    let dir = TempDir::new().expect("temp dir");
    let (app, _) = test_app(&dir).await;

    let response = app.oneshot(get_request("/api/health")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn register_then_me_roundtrip() {
    let dir = TempDir::new().expect("temp dir");
    let (app, _) = test_app(&dir).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": "Ali", "email": "Ali@Example.com", "password": "hunter2hunter2" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    // Emails are normalized to lowercase on the way in
    assert_eq!(body["user"]["email"], "ali@example.com");
    assert_eq!(body["user"]["role"], "customer");
    let access = body["tokens"]["accessToken"].as_str().expect("access token");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["email"], "ali@example.com");
}

#[tokio::test]
async fn me_requires_a_token() {
    let dir = TempDir::new().expect("temp dir");
    let (app, _) = test_app(&dir).await;

    let response = app.oneshot(get_request("/api/auth/me")).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["code"], "E3001");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let dir = TempDir::new().expect("temp dir");
    let (app, _) = test_app(&dir).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": "Ali", "email": "ali@example.com", "password": "hunter2hunter2" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "ali@example.com", "password": "not-the-password" }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let dir = TempDir::new().expect("temp dir");
    let (app, _) = test_app(&dir).await;
    let payload =
        json!({ "name": "Ali", "email": "ali@example.com", "password": "hunter2hunter2" });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/auth/register", payload.clone()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(json_request("POST", "/api/auth/register", payload))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn customer_cannot_create_products() {
    let dir = TempDir::new().expect("temp dir");
    let (app, _) = test_app(&dir).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": "Ali", "email": "ali@example.com", "password": "hunter2hunter2" }),
        ))
        .await
        .expect("response");
    let access = json_body(response).await["tokens"]["accessToken"]
        .as_str()
        .expect("access token")
        .to_string();

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/products")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::from(
                    json!({ "title": "Whey", "slug": "whey", "priceInFils": 12500 }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = json_body(response).await;
    assert_eq!(body["code"], "E2001");
}

#[tokio::test]
async fn product_listing_shows_active_only() {
    let dir = TempDir::new().expect("temp dir");
    let (app, state) = test_app(&dir).await;

    let repo = ProductRepository::new(state.surreal());
    repo.create(seed_product("whey", 12_500, 10))
        .await
        .expect("seed active");
    let mut draft = seed_product("creatine", 8_000, 10);
    draft.status = ProductStatus::Draft;
    repo.create(draft).await.expect("seed draft");

    let response = app.oneshot(get_request("/api/products")).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["slug"], "whey");
    assert_eq!(body["items"][0]["priceInFils"], 12_500);
}

#[tokio::test]
async fn product_detail_resolves_slug() {
    let dir = TempDir::new().expect("temp dir");
    let (app, state) = test_app(&dir).await;

    let repo = ProductRepository::new(state.surreal());
    repo.create(seed_product("whey", 12_500, 10))
        .await
        .expect("seed");

    let response = app
        .clone()
        .oneshot(get_request("/api/products/whey"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["slug"], "whey");

    let response = app
        .oneshot(get_request("/api/products/no-such-product"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guest_checkout_places_an_order() {
    let dir = TempDir::new().expect("temp dir");
    let (app, state) = test_app(&dir).await;

    let repo = ProductRepository::new(state.surreal());
    let whey = repo
        .create(seed_product("whey", 12_500, 10))
        .await
        .expect("seed");
    let whey_id = whey.id.as_ref().unwrap().to_string();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/orders",
            json!({
                "items": [{ "product": whey_id, "qty": 2 }],
                "customer": { "name": "Ali", "phone": "51234567" },
                "shippingAddress": {
                    "area": "Salmiya",
                    "block": "4",
                    "street": "12",
                    "houseNo": "25"
                }
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["subtotalInFils"], 25_000);
    assert_eq!(body["shippingInFils"], 0);
    assert_eq!(body["totalInFils"], 25_000);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["paymentMethod"], "cod");
    assert!(body["invoiceNo"].as_str().unwrap().starts_with("INV-"));
}

#[tokio::test]
async fn checkout_commits_even_when_mail_transport_is_down() {
    let dir = TempDir::new().expect("temp dir");
    let db = DbService::memory().await.expect("memory db");

    // SMTP configured but pointing at a closed port: the invoice email
    // task will fail after the response is already committed
    let mut config = test_config(dir.path());
    config.smtp = Some(SmtpConfig {
        host: "127.0.0.1".into(),
        port: 1,
        username: String::new(),
        password: String::new(),
        from_email: "orders@24ozkw.com".into(),
        from_name: "24ozKw".into(),
        order_receiver: Some("office@24ozkw.com".into()),
    });
    let state = ServerState::with_db(config, db).expect("state");
    assert!(state.mailer.is_some());
    let app = router(state.clone());

    let repo = ProductRepository::new(state.surreal());
    let whey = repo
        .create(seed_product("whey", 12_500, 10))
        .await
        .expect("seed");
    let whey_id = whey.id.as_ref().unwrap().to_string();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/orders",
            json!({
                "items": [{ "product": whey_id, "qty": 1 }],
                "customer": { "name": "Ali", "email": "ali@example.com", "phone": "51234567" },
                "shippingAddress": {
                    "area": "Salmiya",
                    "block": "4",
                    "street": "12",
                    "houseNo": "25"
                }
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert!(body["invoiceNo"].as_str().unwrap().starts_with("INV-"));

    // The order row exists regardless of the doomed email task
    let orders = OrderRepository::new(state.surreal());
    let page = Pagination::parse(&PageQuery::default());
    let (_, total) = orders
        .find_page(&OrderFilter::default(), &page)
        .await
        .expect("order count");
    assert_eq!(total, 1);
}

#[tokio::test]
async fn checkout_rejects_bad_phone() {
    let dir = TempDir::new().expect("temp dir");
    let (app, state) = test_app(&dir).await;

    let repo = ProductRepository::new(state.surreal());
    let whey = repo
        .create(seed_product("whey", 12_500, 10))
        .await
        .expect("seed");
    let whey_id = whey.id.as_ref().unwrap().to_string();

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/orders",
            json!({
                "items": [{ "product": whey_id, "qty": 1 }],
                "customer": { "name": "Ali", "phone": "123" },
                "shippingAddress": {
                    "area": "Salmiya",
                    "block": "4",
                    "street": "12",
                    "houseNo": "25"
                }
            }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn order_listing_requires_auth() {
    let dir = TempDir::new().expect("temp dir");
    let (app, _) = test_app(&dir).await;

    let response = app.oneshot(get_request("/api/orders")).await.expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
