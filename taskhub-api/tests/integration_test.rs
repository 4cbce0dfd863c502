/// Integration tests for the TaskHub API
///
/// These tests drive the full system end to end through the in-process
/// router: registration and login, the bearer-token lifecycle, owner-scoped
/// task CRUD, the pending/completed/overdue views, and cascade deletion.
///
/// Requires `DATABASE_URL` pointing at a disposable PostgreSQL database.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{create_test_task, send, TestContext, TEST_PASSWORD};
use serde_json::json;
use taskhub_shared::models::task::Task;
use taskhub_shared::models::user::User;
use uuid::Uuid;

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

/// Registration returns 201 with a usable token; login returns the same token
#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new().await.unwrap();

    let username = unique("reg");
    let email = format!("{}@example.com", username);

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": email,
            "password": "longenough1",
            "password_confirm": "longenough1",
            "first_name": "Reg"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    assert_eq!(body["user"]["username"], username.as_str());
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(token.len(), 40);

    // The token from registration authenticates immediately
    let (status, _) = send(&ctx.app, "GET", "/v1/tasks", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Login hands back the same token (issue_token is idempotent)
    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": username, "password": "longenough1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token"].as_str().unwrap(), token);

    let registered = User::find_by_email(&ctx.db, &email).await.unwrap().unwrap();
    User::delete(&ctx.db, registered.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

/// Weak passwords and mismatched confirmations are rejected
#[tokio::test]
async fn test_register_password_rules() {
    let ctx = TestContext::new().await.unwrap();

    let username = unique("pw");
    let (status, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "short",
            "password_confirm": "short"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "longenough1",
            "password_confirm": "different1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "password_confirm");

    ctx.cleanup().await.unwrap();
}

/// Usernames are restricted to letters, digits, and underscores
#[tokio::test]
async fn test_register_rejects_bad_username() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/auth/register",
        None,
        Some(json!({
            "username": "not a username!",
            "email": format!("{}@example.com", unique("bad")),
            "password": "longenough1",
            "password_confirm": "longenough1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "username");

    ctx.cleanup().await.unwrap();
}

/// Emails differing only in case collide
#[tokio::test]
async fn test_register_duplicate_email_case_insensitive() {
    let ctx = TestContext::new().await.unwrap();

    let base = unique("dup");
    let first = json!({
        "username": format!("{}_a", base),
        "email": format!("{}@Example.COM", base),
        "password": "longenough1",
        "password_confirm": "longenough1"
    });
    let (status, _) = send(&ctx.app, "POST", "/v1/auth/register", None, Some(first)).await;
    assert_eq!(status, StatusCode::CREATED);

    let second = json!({
        "username": format!("{}_b", base),
        "email": format!("{}@example.com", base),
        "password": "longenough1",
        "password_confirm": "longenough1"
    });
    let (status, body) = send(&ctx.app, "POST", "/v1/auth/register", None, Some(second)).await;
    assert_eq!(status, StatusCode::CONFLICT, "expected conflict: {}", body);

    // Stored lowercased
    let stored = User::find_by_email(&ctx.db, &format!("{}@example.com", base))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.email, format!("{}@example.com", base).to_lowercase());

    User::delete(&ctx.db, stored.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

/// Wrong credentials are 401 without revealing which part was wrong
#[tokio::test]
async fn test_login_invalid_credentials() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": ctx.user.username, "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": unique("ghost"), "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// Requests without (or with an unknown) token are rejected
#[tokio::test]
async fn test_requests_require_valid_token() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = send(&ctx.app, "GET", "/v1/tasks", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let bogus = "0".repeat(40);
    let (status, _) = send(&ctx.app, "GET", "/v1/tasks", Some(&bogus), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// Logout revokes the token; the next logout attempt can't even authenticate
#[tokio::test]
async fn test_logout_revokes_token() {
    let ctx = TestContext::new().await.unwrap();

    let (status, _) = send(
        &ctx.app,
        "POST",
        "/v1/auth/logout",
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // The revoked token no longer authenticates anything
    let (status, _) = send(&ctx.app, "GET", "/v1/tasks", Some(&ctx.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logging in again issues a fresh, different token
    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/auth/login",
        None,
        Some(json!({ "username": ctx.user.username, "password": TEST_PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(body["token"].as_str().unwrap(), ctx.token);

    ctx.cleanup().await.unwrap();
}

/// Create -> pending -> complete -> completed, never overdue
#[tokio::test]
async fn test_task_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let tomorrow = (Utc::now() + Duration::days(1)).to_rfc3339();

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/tasks",
        Some(&ctx.token),
        Some(json!({ "title": "Buy milk", "due_date": tomorrow })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["username"], ctx.user.username.as_str());
    assert!(body["created_at"].is_string());
    let id = body["id"].as_str().unwrap().to_string();

    // Shows up in the pending view
    let (_, body) = send(&ctx.app, "GET", "/v1/tasks/pending", Some(&ctx.token), None).await;
    assert!(body.as_array().unwrap().iter().any(|t| t["id"] == id.as_str()));

    // Complete it
    let (status, body) = send(
        &ctx.app,
        "POST",
        &format!("/v1/tasks/{}/complete", id),
        Some(&ctx.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    // Now in completed, gone from pending and overdue
    let (_, body) = send(&ctx.app, "GET", "/v1/tasks/completed", Some(&ctx.token), None).await;
    assert!(body.as_array().unwrap().iter().any(|t| t["id"] == id.as_str()));

    let (_, body) = send(&ctx.app, "GET", "/v1/tasks/pending", Some(&ctx.token), None).await;
    assert!(!body.as_array().unwrap().iter().any(|t| t["id"] == id.as_str()));

    let (_, body) = send(&ctx.app, "GET", "/v1/tasks/overdue", Some(&ctx.token), None).await;
    assert!(!body.as_array().unwrap().iter().any(|t| t["id"] == id.as_str()));

    ctx.cleanup().await.unwrap();
}

/// Past due dates fail on create but are accepted on update
#[tokio::test]
async fn test_due_date_validation_asymmetry() {
    let ctx = TestContext::new().await.unwrap();
    let yesterday = (Utc::now() - Duration::days(1)).to_rfc3339();
    let tomorrow = (Utc::now() + Duration::days(1)).to_rfc3339();

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/tasks",
        Some(&ctx.token),
        Some(json!({ "title": "Too late", "due_date": yesterday })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "due_date");

    // Create with a valid date, then move it into the past
    let id = create_test_task(
        &ctx,
        &ctx.token,
        json!({ "title": "Slipped", "due_date": tomorrow }),
    )
    .await
    .unwrap();

    let (status, body) = send(
        &ctx.app,
        "PATCH",
        &format!("/v1/tasks/{}", id),
        Some(&ctx.token),
        Some(json!({ "due_date": yesterday })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "update failed: {}", body);

    // A pending task due in the past is overdue
    let (_, body) = send(&ctx.app, "GET", "/v1/tasks/overdue", Some(&ctx.token), None).await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == id.to_string()));

    ctx.cleanup().await.unwrap();
}

/// Titles are trimmed on write; whitespace-only titles are rejected
#[tokio::test]
async fn test_title_trimming_and_blank_rejection() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(
        &ctx.app,
        "POST",
        "/v1/tasks",
        Some(&ctx.token),
        Some(json!({ "title": "  Buy milk  " })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Buy milk");
    let id = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &ctx.app,
        "POST",
        "/v1/tasks",
        Some(&ctx.token),
        Some(json!({ "title": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(
        &ctx.app,
        "PATCH",
        &format!("/v1/tasks/{}", id),
        Some(&ctx.token),
        Some(json!({ "title": "\t " })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    ctx.cleanup().await.unwrap();
}

/// Updates touch only the supplied fields; null clears; owner is immutable
#[tokio::test]
async fn test_partial_update_semantics() {
    let ctx = TestContext::new().await.unwrap();

    let id = create_test_task(
        &ctx,
        &ctx.token,
        json!({ "title": "Original", "description": "keep or clear" }),
    )
    .await
    .unwrap();

    // Only the title changes
    let (status, body) = send(
        &ctx.app,
        "PATCH",
        &format!("/v1/tasks/{}", id),
        Some(&ctx.token),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Renamed");
    assert_eq!(body["description"], "keep or clear");

    // Explicit null clears the description
    let (status, body) = send(
        &ctx.app,
        "PATCH",
        &format!("/v1/tasks/{}", id),
        Some(&ctx.token),
        Some(json!({ "description": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["description"].is_null());

    // updated_at moved past created_at
    let task = Task::find_by_id_and_owner(&ctx.db, id, ctx.user.id)
        .await
        .unwrap()
        .unwrap();
    assert!(task.updated_at >= task.created_at);

    ctx.cleanup().await.unwrap();
}

/// A user can never see or touch another user's tasks
#[tokio::test]
async fn test_owner_isolation() {
    let ctx = TestContext::new().await.unwrap();
    let (other, other_token) = ctx.other_user().await.unwrap();

    let id = create_test_task(&ctx, &ctx.token, json!({ "title": "Mine" }))
        .await
        .unwrap();

    // Not in the other user's listings
    let (_, body) = send(&ctx.app, "GET", "/v1/tasks", Some(&other_token), None).await;
    assert!(!body
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t["id"] == id.to_string()));

    // Every direct operation 404s for the non-owner
    let uri = format!("/v1/tasks/{}", id);
    for (method, path, body) in [
        ("GET", uri.clone(), None),
        ("PATCH", uri.clone(), Some(json!({ "title": "Stolen" }))),
        ("POST", format!("{}/complete", uri), None),
        ("DELETE", uri.clone(), None),
    ] {
        let (status, _) = send(&ctx.app, method, &path, Some(&other_token), body).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {} should 404", method, path);
    }

    // The owner still sees it untouched
    let (status, body) = send(&ctx.app, "GET", &uri, Some(&ctx.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Mine");

    User::delete(&ctx.db, other.id).await.unwrap();
    ctx.cleanup().await.unwrap();
}

/// Filtering, searching, and ordering the task list
#[tokio::test]
async fn test_list_filter_search_ordering() {
    let ctx = TestContext::new().await.unwrap();

    let milk = create_test_task(
        &ctx,
        &ctx.token,
        json!({ "title": "Buy milk", "description": "from the corner shop" }),
    )
    .await
    .unwrap();
    let dog = create_test_task(
        &ctx,
        &ctx.token,
        json!({ "title": "Walk the dog", "description": "around the block" }),
    )
    .await
    .unwrap();

    // Free-text search matches the description too
    let (_, body) = send(
        &ctx.app,
        "GET",
        "/v1/tasks?search=corner",
        Some(&ctx.token),
        None,
    )
    .await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["id"], milk.to_string());

    // Status filter
    send(
        &ctx.app,
        "POST",
        &format!("/v1/tasks/{}/complete", dog),
        Some(&ctx.token),
        None,
    )
    .await;
    let (_, body) = send(
        &ctx.app,
        "GET",
        "/v1/tasks?status=completed",
        Some(&ctx.token),
        None,
    )
    .await;
    assert!(body
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["status"] == "completed"));

    // Default ordering is newest-created first
    let (_, body) = send(&ctx.app, "GET", "/v1/tasks", Some(&ctx.token), None).await;
    let ids: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();
    let milk_pos = ids.iter().position(|i| *i == milk.to_string()).unwrap();
    let dog_pos = ids.iter().position(|i| *i == dog.to_string()).unwrap();
    assert!(dog_pos < milk_pos, "newer task should come first");

    // Explicit ascending ordering flips that
    let (_, body) = send(
        &ctx.app,
        "GET",
        "/v1/tasks?ordering=created_at",
        Some(&ctx.token),
        None,
    )
    .await;
    let ids: Vec<String> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap().to_string())
        .collect();
    let milk_pos = ids.iter().position(|i| *i == milk.to_string()).unwrap();
    let dog_pos = ids.iter().position(|i| *i == dog.to_string()).unwrap();
    assert!(milk_pos < dog_pos);

    ctx.cleanup().await.unwrap();
}

/// Deleting a task removes it permanently
#[tokio::test]
async fn test_delete_task() {
    let ctx = TestContext::new().await.unwrap();

    let id = create_test_task(&ctx, &ctx.token, json!({ "title": "Ephemeral" }))
        .await
        .unwrap();

    let uri = format!("/v1/tasks/{}", id);
    let (status, _) = send(&ctx.app, "DELETE", &uri, Some(&ctx.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&ctx.app, "GET", &uri, Some(&ctx.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Deleting again is a 404, not a success
    let (status, _) = send(&ctx.app, "DELETE", &uri, Some(&ctx.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    ctx.cleanup().await.unwrap();
}

/// Deleting a user cascades to their tasks and token
#[tokio::test]
async fn test_user_delete_cascades() {
    let ctx = TestContext::new().await.unwrap();
    let (victim, victim_token) = ctx.other_user().await.unwrap();

    let id = create_test_task(&ctx, &victim_token, json!({ "title": "Doomed" }))
        .await
        .unwrap();

    assert!(User::delete(&ctx.db, victim.id).await.unwrap());

    // The task row is gone for every caller, not just hidden
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE id = $1")
        .bind(id)
        .fetch_one(&ctx.db)
        .await
        .unwrap();
    assert_eq!(count, 0);

    // The token died with the user
    let (status, _) = send(&ctx.app, "GET", "/v1/tasks", Some(&victim_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

/// The profile endpoint reports task statistics
#[tokio::test]
async fn test_profile_statistics() {
    let ctx = TestContext::new().await.unwrap();

    create_test_task(&ctx, &ctx.token, json!({ "title": "One" }))
        .await
        .unwrap();
    let done = create_test_task(&ctx, &ctx.token, json!({ "title": "Two" }))
        .await
        .unwrap();
    send(
        &ctx.app,
        "POST",
        &format!("/v1/tasks/{}/complete", done),
        Some(&ctx.token),
        None,
    )
    .await;

    let (status, body) = send(&ctx.app, "GET", "/v1/auth/profile", Some(&ctx.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], ctx.user.username.as_str());
    assert_eq!(body["statistics"]["total_tasks"], 2);
    assert_eq!(body["statistics"]["pending_tasks"], 1);
    assert_eq!(body["statistics"]["completed_tasks"], 1);

    ctx.cleanup().await.unwrap();
}

/// Health check works without authentication
#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = send(&ctx.app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");

    ctx.cleanup().await.unwrap();
}
