#![allow(dead_code)]

use helpdesk::models::{user, Role, User};
use reqwest::Client;
use sea_orm::{ActiveModelTrait, ConnectOptions, DatabaseConnection, EntityTrait};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Once,
};

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const PASSWORD: &str = "test_password_123";

fn init_env() {
    INIT.call_once(|| {
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::set_var("BCRYPT_COST", "4");
        let config = helpdesk::config::jwt::JwtConfig::from_env().unwrap();
        let _ = helpdesk::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.addr, path)
    }

    pub async fn get(&self, path: &str, token: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        read(resp).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(resp).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap();
        read(resp).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> (u16, Value) {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        read(resp).await
    }
}

async fn read(resp: reqwest::Response) -> (u16, Value) {
    let status = resp.status().as_u16();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// Every test gets its own in-memory SQLite database.
pub async fn spawn_app() -> TestApp {
    init_env();

    let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = sea_orm::Database::connect(opt)
        .await
        .expect("Failed to open in-memory database");

    helpdesk::migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let app = axum::Router::new()
        .route(
            "/",
            axum::routing::get(helpdesk::handlers::health::health_check),
        )
        .merge(helpdesk::routes::create_routes())
        .layer(axum::middleware::from_fn(
            helpdesk::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

/// Register a client and return (user_id, token).
pub async fn create_test_user(app: &TestApp, name_prefix: &str) -> (i32, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let name = format!("{}{}", name_prefix, counter);

    let resp = app
        .client
        .post(app.url("/Auth/register"))
        .json(&serde_json::json!({
            "name": name,
            "email": format!("{}@test.com", name),
            "password": PASSWORD,
        }))
        .send()
        .await
        .expect("Failed to register user");
    let (status, body) = read(resp).await;

    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to register user '{name}': status={status}, body={body}");
    }

    let user_id = body["data"]["user"]["id"]
        .as_i64()
        .unwrap_or_else(|| panic!("Response missing user id: {body}")) as i32;
    let token = body["data"]["token"]
        .as_str()
        .unwrap_or_else(|| panic!("Response missing token: {body}"))
        .to_string();
    (user_id, token)
}

/// Change a user's role directly in the database.
///
/// Roles are reloaded on every request, so the existing token picks it up.
pub async fn set_role(app: &TestApp, user_id: i32, role: Role) {
    let existing = User::find_by_id(user_id)
        .one(&app.db)
        .await
        .unwrap()
        .expect("user exists");
    let mut active: user::ActiveModel = existing.into();
    active.role = sea_orm::ActiveValue::Set(role);
    active.update(&app.db).await.unwrap();
}

pub async fn create_manager(app: &TestApp) -> (i32, String) {
    let (id, token) = create_test_user(app, "manager").await;
    set_role(app, id, Role::Manager).await;
    (id, token)
}

pub async fn create_admin(app: &TestApp) -> (i32, String) {
    let (id, token) = create_test_user(app, "admin").await;
    set_role(app, id, Role::Admin).await;
    (id, token)
}

/// Create an order as `token` and return its id.
pub async fn create_order(app: &TestApp, token: &str, name: &str) -> i32 {
    let (status, body) = app
        .post(
            "/Orders/create",
            token,
            serde_json::json!({
                "orderName": name,
                "description": "Screen flickers after boot",
                "cost": 120.5,
                "priority": "High",
            }),
        )
        .await;
    assert_eq!(status, 200, "create order failed: {body}");
    body["data"]["id"].as_i64().unwrap() as i32
}
