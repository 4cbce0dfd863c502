/// Common test utilities for integration tests
///
/// Shared infrastructure for the end-to-end tests:
/// - Test database setup (migrations run on first connect)
/// - Per-test users with unique names, real password hashes, and tokens
/// - Request helpers that drive the in-process router
///
/// Tests require `DATABASE_URL` to point at a disposable PostgreSQL
/// database. Each test creates its own users and cleans up by deleting
/// them; tasks and tokens go with them via CASCADE.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::Config;
use taskhub_shared::auth::{password, service};
use taskhub_shared::db::migrations;
use taskhub_shared::models::user::{CreateUser, User};
use sqlx::PgPool;
use tower::ServiceExt as _;
use uuid::Uuid;

/// Password used for every test user
pub const TEST_PASSWORD: &str = "test-password-1";

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub user: User,
    pub token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh user and token
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;
        migrations::run_migrations(&db).await?;

        let state = AppState::new(db.clone(), config);
        let app = build_router(state);

        let (user, token) = create_user(&db, "ctx").await?;

        Ok(TestContext {
            db,
            app,
            user,
            token,
        })
    }

    /// Creates an additional user (for ownership isolation tests)
    pub async fn other_user(&self) -> anyhow::Result<(User, String)> {
        create_user(&self.db, "other").await
    }

    /// Cleans up test data
    ///
    /// Deleting the users removes their tasks and tokens via CASCADE.
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        User::delete(&self.db, self.user.id).await?;
        Ok(())
    }
}

/// Creates a user directly through the models and issues a token
async fn create_user(db: &PgPool, prefix: &str) -> anyhow::Result<(User, String)> {
    let suffix = Uuid::new_v4().simple().to_string();
    let user = User::create(
        db,
        CreateUser {
            username: format!("{}_{}", prefix, suffix),
            email: format!("{}-{}@example.com", prefix, suffix),
            password_hash: password::hash_password(TEST_PASSWORD)?,
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
        },
    )
    .await?;

    let token = service::issue_token(db, user.id).await?;

    Ok((user, token.token))
}

/// Sends a request through the router and returns status + parsed JSON body
///
/// `token` is added as a bearer Authorization header when present. An empty
/// body yields `serde_json::Value::Null`.
pub async fn send(
    app: &axum::Router,
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

    let response = app.clone().oneshot(request).await.unwrap();
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

/// Creates a task through the API and returns its ID
pub async fn create_test_task(
    ctx: &TestContext,
    token: &str,
    body: serde_json::Value,
) -> anyhow::Result<Uuid> {
    let (status, json) = send(&ctx.app, "POST", "/v1/tasks", Some(token), Some(body)).await;
    anyhow::ensure!(
        status == StatusCode::CREATED,
        "expected 201 creating task, got {}: {}",
        status,
        json
    );

    let id = json["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("task response missing id: {}", json))?;

    Ok(Uuid::parse_str(id)?)
}
