#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use chrono::{DateTime, Duration, TimeZone, Utc};
use migration::MigratorTrait;
use patterns_server::entities::sea_orm_active_enums::{
    LocationCategory, PriceRange, ProductCategory, ServiceStatus,
};
use patterns_server::entities::*;
use patterns_server::notify::ConnectionRegistry;
use patterns_server::web::{AppState, create_app};
use sea_orm::prelude::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue, ConnectOptions, Database, DatabaseConnection};
use std::sync::Arc;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};
use tower::ServiceExt;

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_postgres_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// A migrated in-memory SQLite database.
///
/// The pool is pinned to a single connection so every query sees the same
/// in-memory database.
pub async fn setup_db() -> anyhow::Result<DatabaseConnection> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

pub struct TestContext {
    pub app: Router,
    pub state: Arc<AppState>,
}

impl TestContext {
    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }
}

pub async fn setup() -> anyhow::Result<TestContext> {
    setup_with_simulation(false).await
}

pub async fn setup_with_simulation(simulate_status: bool) -> anyhow::Result<TestContext> {
    let db = setup_db().await?;
    let state = Arc::new(AppState {
        db: Arc::new(db),
        notifier: Arc::new(ConnectionRegistry::new(16)),
        simulate_status,
    });
    Ok(TestContext {
        app: create_app(state.clone()),
        state,
    })
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("response body should be JSON")
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        headers,
        body: String::from_utf8(body.to_vec()).unwrap(),
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    get_with_headers(app, uri, &[]).await
}

pub async fn get_with_headers(app: &Router, uri: &str, headers: &[(&str, &str)]) -> TestResponse {
    let mut builder = Request::builder().method("GET").uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_form(app: &Router, uri: &str, form: &str) -> TestResponse {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> TestResponse {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 16, 12, 0, 0).unwrap()
}

pub async fn insert_country(db: &DatabaseConnection, name: &str, code: &str) -> i32 {
    country::ActiveModel {
        name: ActiveValue::Set(name.to_string()),
        code: ActiveValue::Set(code.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn insert_state(db: &DatabaseConnection, country_id: i32, name: &str, code: &str) -> i32 {
    state::ActiveModel {
        name: ActiveValue::Set(name.to_string()),
        code: ActiveValue::Set(code.to_string()),
        country_id: ActiveValue::Set(country_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn insert_city(db: &DatabaseConnection, state_id: i32, name: &str) -> i32 {
    city::ActiveModel {
        name: ActiveValue::Set(name.to_string()),
        state_id: ActiveValue::Set(state_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

/// IDs of the seeded locality rows.
pub struct Locality {
    pub united_states: i32,
    pub canada: i32,
    pub california: i32,
    pub texas: i32,
    pub ontario: i32,
}

/// Seeds two countries: the United States with Texas and California (two
/// cities each, inserted out of alphabetical order) and Canada with Ontario.
pub async fn seed_locality(db: &DatabaseConnection) -> Locality {
    let united_states = insert_country(db, "United States", "US").await;
    let canada = insert_country(db, "Canada", "CA").await;

    let texas = insert_state(db, united_states, "Texas", "TX").await;
    let california = insert_state(db, united_states, "California", "CA").await;
    let ontario = insert_state(db, canada, "Ontario", "ON").await;

    insert_city(db, california, "San Francisco").await;
    insert_city(db, california, "Los Angeles").await;
    insert_city(db, texas, "Houston").await;
    insert_city(db, texas, "Austin").await;
    insert_city(db, ontario, "Toronto").await;

    Locality {
        united_states,
        canada,
        california,
        texas,
        ontario,
    }
}

/// Seeds `count` products named "Product 1".."Product N", one minute apart,
/// so "Product N" is the newest.
pub async fn seed_products(db: &DatabaseConnection, count: i32) {
    let categories = [
        ProductCategory::Electronics,
        ProductCategory::Clothing,
        ProductCategory::Books,
        ProductCategory::Home,
        ProductCategory::Sports,
    ];
    for n in 1..=count {
        product::ActiveModel {
            name: ActiveValue::Set(format!("Product {n}")),
            description: ActiveValue::Set(format!("Description of product {n}")),
            price: ActiveValue::Set(Decimal::new(950 + 100 * i64::from(n), 2)),
            category: ActiveValue::Set(categories[(n as usize) % categories.len()]),
            in_stock: ActiveValue::Set(n % 4 != 0),
            created_at: ActiveValue::Set(base_time() + Duration::minutes(i64::from(n))),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }
}

pub async fn insert_status(
    db: &DatabaseConnection,
    service_name: &str,
    status: ServiceStatus,
    response_time_ms: i32,
) -> system_status::Model {
    system_status::ActiveModel {
        service_name: ActiveValue::Set(service_name.to_string()),
        status: ActiveValue::Set(status),
        response_time_ms: ActiveValue::Set(response_time_ms),
        uptime_percentage: ActiveValue::Set(99.9),
        last_check: ActiveValue::Set(base_time()),
        message: ActiveValue::Set(String::new()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_location(
    db: &DatabaseConnection,
    name: &str,
    category: LocationCategory,
    rating: f64,
    price_range: PriceRange,
    latitude: f64,
    longitude: f64,
) -> i32 {
    location::ActiveModel {
        name: ActiveValue::Set(name.to_string()),
        address: ActiveValue::Set(format!("1 {name} Way, San Francisco, CA")),
        latitude: ActiveValue::Set(latitude),
        longitude: ActiveValue::Set(longitude),
        category: ActiveValue::Set(category),
        description: ActiveValue::Set(format!("About {name}")),
        rating: ActiveValue::Set(rating),
        price_range: ActiveValue::Set(price_range),
        created_at: ActiveValue::Set(base_time()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}
