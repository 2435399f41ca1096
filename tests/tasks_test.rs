mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use common::{Factory, TestApp};

#[tokio::test]
async fn test_create_task() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/v1/tasks")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({
            "title": "Write the quarterly report",
            "description": "Numbers for Q3",
            "deadline": "2026-09-30T17:00:00Z",
            "userId": auth.user_id
        }))
        .await;

    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"].as_bool(), Some(true));
    assert_eq!(
        body["data"]["title"].as_str().unwrap(),
        "Write the quarterly report"
    );
    assert_eq!(body["data"]["status"].as_str().unwrap(), "pending");
    assert_eq!(
        body["data"]["userId"].as_str().unwrap(),
        auth.user_id.to_string()
    );
    assert!(body["data"]["startedAt"].is_null());
    assert!(body["data"]["completedAt"].is_null());
    assert!(body["data"]["timeSpent"].is_null());
    assert!(body["data"]["deadline"].as_str().is_some());
}

#[tokio::test]
async fn test_create_task_requires_admin() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;

    let response = app
        .server
        .post("/api/v1/tasks")
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "title": "Not allowed" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"].as_str().unwrap(), "FORBIDDEN");
    assert_eq!(
        body["error"]["message"].as_str().unwrap(),
        "Admin access required."
    );
}

#[tokio::test]
async fn test_create_task_validation() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;

    let response = app
        .server
        .post("/api/v1/tasks")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "title": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"].as_str().unwrap(), "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"].as_str().unwrap(), "Title is required");

    let response = app
        .server
        .post("/api/v1/tasks")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({
            "title": "Valid title",
            "description": "x".repeat(2001)
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = app
        .server
        .post("/api/v1/tasks")
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "title": "Valid title", "status": "done" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(
        body["error"]["message"].as_str().unwrap(),
        "Status must be one of 'pending', 'in_progress', 'pending_review', 'completed'"
    );
}

#[tokio::test]
async fn test_list_tasks_admin_sees_all() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let auth = factory.create_user().await;
    factory.create_task(Some(auth.user_id)).await;
    factory.create_task(None).await;
    factory.create_task(None).await;

    let response = app
        .server
        .get("/api/v1/tasks")
        .add_header("Authorization", admin.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
    assert_eq!(body["meta"]["total"].as_u64(), Some(3));
}

#[tokio::test]
async fn test_list_tasks_user_sees_only_own() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;
    factory.create_task(Some(auth.user_id)).await;
    factory.create_task(Some(other.user_id)).await;
    factory.create_task(None).await;

    let response = app
        .server
        .get("/api/v1/tasks")
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(body["meta"]["total"].as_u64(), Some(1));
    assert_eq!(
        data[0]["userId"].as_str().unwrap(),
        auth.user_id.to_string()
    );
}

#[tokio::test]
async fn test_get_task_as_assignee() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let task = factory.create_task(Some(auth.user_id)).await;

    let response = app
        .server
        .get(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["id"].as_str().unwrap(), task.id.to_string());
}

#[tokio::test]
async fn test_get_task_not_assignee() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let other = factory.create_user().await;
    let task = factory.create_task(Some(other.user_id)).await;

    let response = app
        .server
        .get(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::FORBIDDEN);

    let body: serde_json::Value = response.json();
    assert_eq!(
        body["error"]["message"].as_str().unwrap(),
        "You do not have access to this task"
    );
}

#[tokio::test]
async fn test_get_missing_task() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    let id = Uuid::new_v4();

    let response = app
        .server
        .get(&format!("/api/v1/tasks/{}", id))
        .add_header("Authorization", auth.auth_header())
        .await;

    response.assert_status(StatusCode::NOT_FOUND);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"].as_str().unwrap(), "TASK_NOT_FOUND");
    assert_eq!(
        body["error"]["message"].as_str().unwrap(),
        format!("Task with id '{}' not found", id)
    );
}

#[tokio::test]
async fn test_update_task_fields() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let task = factory.create_task(None).await;

    let response = app
        .server
        .patch(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({
            "title": "Retitled",
            "description": "New description"
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["title"].as_str().unwrap(), "Retitled");
    assert_eq!(
        body["data"]["description"].as_str().unwrap(),
        "New description"
    );
    // Status untouched by a field-only update
    assert_eq!(body["data"]["status"].as_str().unwrap(), "pending");
}

#[tokio::test]
async fn test_update_task_requires_admin() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let auth = factory.create_user().await;
    // Even the assignee cannot use the raw update route
    let task = factory.create_task(Some(auth.user_id)).await;

    let response = app
        .server
        .patch(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", auth.auth_header())
        .json(&json!({ "title": "Mine now" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_deadline_is_tri_state() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let task = factory.create_task(None).await;

    // Set
    let response = app
        .server
        .patch(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "deadline": "2026-12-01T09:00:00Z" }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body["data"]["deadline"].as_str().is_some());

    // Omitted field leaves the deadline alone
    let response = app
        .server
        .patch(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "title": "Still due" }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body["data"]["deadline"].as_str().is_some());

    // Explicit null clears it
    let response = app
        .server
        .patch(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "deadline": null }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body["data"]["deadline"].is_null());
}

#[tokio::test]
async fn test_reassign_and_unassign() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let auth = factory.create_user().await;
    let task = factory.create_task(None).await;

    let response = app
        .server
        .patch(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "userId": auth.user_id }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(
        body["data"]["userId"].as_str().unwrap(),
        auth.user_id.to_string()
    );

    let response = app
        .server
        .patch(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", admin.auth_header())
        .json(&json!({ "userId": null }))
        .await;
    response.assert_status(StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert!(body["data"]["userId"].is_null());
}

#[tokio::test]
async fn test_delete_task() {
    let app = TestApp::new().await;
    let factory = Factory::new(&app.state);
    let admin = factory.create_admin().await;
    let task = factory.create_task(None).await;

    let response = app
        .server
        .delete(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", admin.auth_header())
        .await;

    response.assert_status(StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["data"]["id"].as_str().unwrap(), task.id.to_string());
    assert_eq!(
        body["data"]["message"].as_str().unwrap(),
        "Task deleted successfully"
    );

    // Really gone
    let response = app
        .server
        .get(&format!("/api/v1/tasks/{}", task.id))
        .add_header("Authorization", admin.auth_header())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tasks_require_authentication() {
    let app = TestApp::new().await;

    let response = app.server.get("/api/v1/tasks").await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"].as_bool(), Some(false));
    assert_eq!(body["error"]["code"].as_str().unwrap(), "UNAUTHORIZED");
}
