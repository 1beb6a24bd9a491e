/// Common test utilities for integration tests
///
/// Provides a TestContext that connects to the database named by
/// `TEST_DATABASE_URL`, runs migrations, creates a fresh user, and
/// builds the router. When `TEST_DATABASE_URL` is not set the context
/// is unavailable and tests skip themselves.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use sqlx::PgPool;
use std::sync::atomic::{AtomicU64, Ordering};
use tower::Service as _;
use tripledger_api::app::{build_router, AppState};
use tripledger_api::config::{AdminConfig, ApiConfig, Config, DatabaseConfig, JwtConfig};
use tripledger_shared::auth::jwt::{create_token, Claims};
use tripledger_shared::auth::password::hash_password;
use tripledger_shared::models::user::{CreateUser, User};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-key-32-bytes-min";
pub const TEST_PASSWORD: &str = "test_password_123";

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generates a name unique across the test run
pub fn unique(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}-{}-{}", prefix, nanos, n)
}

/// Test context containing the pool, router, and an authenticated user
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context, or None when TEST_DATABASE_URL is
    /// not set
    pub async fn new() -> Option<Self> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;

        let db = PgPool::connect(&url)
            .await
            .expect("failed to connect to test database");

        // Path relative to this crate's Cargo.toml
        sqlx::migrate!("../tripledger-shared/migrations")
            .run(&db)
            .await
            .expect("migrations failed");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
            admin: AdminConfig {
                username: unique("admin"),
                password: "admin_password".to_string(),
            },
        };

        let password_hash = hash_password(TEST_PASSWORD).expect("hashing failed");
        let user = User::create(
            &db,
            CreateUser {
                username: unique("user"),
                password_hash,
            },
        )
        .await
        .expect("failed to create test user");

        let claims = Claims::new(user.id, user.username.clone());
        let token = create_token(&claims, TEST_JWT_SECRET).expect("failed to create token");

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        Some(TestContext {
            db,
            app,
            user,
            token,
        })
    }

    /// Creates another user with their own token, for isolation tests
    pub async fn other_user(&self) -> (User, String) {
        let password_hash = hash_password(TEST_PASSWORD).expect("hashing failed");
        let user = User::create(
            &self.db,
            CreateUser {
                username: unique("other"),
                password_hash,
            },
        )
        .await
        .expect("failed to create second user");

        let claims = Claims::new(user.id, user.username.clone());
        let token = create_token(&claims, TEST_JWT_SECRET).expect("failed to create token");

        (user, token)
    }

    /// Sends a request with the context user's token and parses the
    /// JSON response
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        self.request_with_token(method, uri, Some(&self.token), body)
            .await
    }

    /// Sends a request with an explicit (or no) token
    pub async fn request_with_token(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };

        (status, json)
    }

    /// Deletes the context user, cascading to all their data
    pub async fn cleanup(&self) {
        sqlx::query("DELETE FROM usuarios WHERE id = $1")
            .bind(self.user.id)
            .execute(&self.db)
            .await
            .expect("cleanup failed");
    }
}
