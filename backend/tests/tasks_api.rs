mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use backend::config::QueryConfig;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};

use common::{query, FailingStore, Op, TestApp};

#[tokio::test]
async fn create_task_fills_defaults() {
    let app = TestApp::new();

    let response = app
        .post("/api/tasks", json!({ "name": "file taxes", "deadline": "2030-04-15" }))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.message(), "Task created successfully.");
    let data = response.data();
    assert_eq!(data["name"], "file taxes");
    assert_eq!(data["description"], "");
    assert_eq!(data["deadline"], "2030-04-15T00:00:00.000Z");
    assert_eq!(data["completed"], false);
    assert_eq!(data["assignedUser"], "");
    assert_eq!(data["assignedUserName"], "unassigned");
    assert!(data["dateCreated"].is_string());
}

#[rstest]
#[case(json!({ "deadline": "2030-01-01" }))]
#[case(json!({ "name": "no deadline" }))]
#[case(json!({ "name": "", "deadline": "2030-01-01" }))]
#[tokio::test]
async fn create_task_requires_name_and_deadline(#[case] body: Value) {
    let app = TestApp::new();

    let response = app.post("/api/tasks", body).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Task must have a name and deadline.");
    assert_eq!(response.data(), &json!({}));
}

#[tokio::test]
async fn create_task_rejects_bad_deadline_and_body() {
    let app = TestApp::new();

    let response = app
        .post("/api/tasks", json!({ "name": "x", "deadline": "someday" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Invalid deadline.");

    let response = app
        .post("/api/tasks", json!({ "name": "x", "deadline": "2030-01-01", "completed": "yes" }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Invalid request body.");
}

#[tokio::test]
async fn assigned_open_task_is_pending_for_user() {
    let app = TestApp::new();
    let user = app.create_user("Ada", "ada@example.com").await;

    let response = app
        .post(
            "/api/tasks",
            json!({ "name": "review", "deadline": "2030-01-01", "assignedUser": user }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["assignedUserName"], "Ada");
    let task = response.id();

    let done = app
        .create_task(json!({
            "name": "done already",
            "deadline": "2030-01-01",
            "completed": true,
            "assignedUser": user,
            "assignedUserName": "A."
        }))
        .await;

    let pending = app.pending_tasks(&user).await;
    assert_eq!(pending, vec![task]);
    assert!(!pending.contains(&done));
}

#[tokio::test]
async fn task_for_unknown_user_keeps_reference() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/tasks",
            json!({ "name": "orphan", "deadline": "2030-01-01", "assignedUser": "ghost" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.data()["assignedUser"], "ghost");
    assert_eq!(response.data()["assignedUserName"], "unassigned");
}

#[tokio::test]
async fn get_task_by_id_with_projection() {
    let app = TestApp::new();
    let id = app
        .create_task(json!({ "name": "a", "deadline": "2030-01-01", "description": "d" }))
        .await;

    let response = app.get(&format!("/api/tasks/{id}")).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Task retrieved successfully.");
    assert_eq!(response.data()["description"], "d");

    let select = query(&[("select", r#"{"name": 1}"#)]);
    let response = app.get(&format!("/api/tasks/{id}?{select}")).await;
    assert_eq!(response.data(), &json!({ "_id": id, "name": "a" }));
}

#[tokio::test]
async fn get_missing_task_is_404() {
    let app = TestApp::new();

    let response = app.get("/api/tasks/does-not-exist").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "Task not found.");
    assert_eq!(response.data(), &json!({}));
}

async fn seed_tasks(app: &TestApp) {
    for (name, points, completed) in [("c", 3, false), ("a", 1, true), ("d", 4, false), ("b", 2, false)] {
        app.create_task(json!({
            "name": name,
            "deadline": format!("2030-01-0{points}"),
            "completed": completed
        }))
        .await;
    }
}

fn names(data: &Value) -> Vec<&str> {
    data.as_array()
        .unwrap()
        .iter()
        .map(|task| task["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn list_tasks_filters_sorts_and_pages() {
    let app = TestApp::new();
    seed_tasks(&app).await;

    let params = query(&[
        ("where", r#"{"completed": false}"#),
        ("sort", r#"{"deadline": -1}"#),
        ("select", r#"{"name": 1, "_id": 0}"#),
        ("skip", "1"),
        ("limit", "5"),
    ]);
    let response = app.get(&format!("/api/tasks?{params}")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Tasks successfully retrieved.");
    assert_eq!(response.data(), &json!([{ "name": "c" }, { "name": "b" }]));
}

#[tokio::test]
async fn list_tasks_counts_matches() {
    let app = TestApp::new();
    seed_tasks(&app).await;

    let params = query(&[("where", r#"{"completed": false}"#), ("count", "true"), ("limit", "1")]);
    let response = app.get(&format!("/api/tasks?{params}")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Count of matching tasks.");
    assert_eq!(response.data(), &json!(3));
}

#[tokio::test]
async fn list_tasks_applies_default_limit() {
    let app = TestApp::with_limits(QueryConfig {
        task_limit: 2,
        user_limit: 0,
    });
    seed_tasks(&app).await;

    let response = app.get("/api/tasks").await;
    assert_eq!(names(response.data()), vec!["c", "a"]);

    let response = app.get("/api/tasks?limit=0").await;
    assert_eq!(names(response.data()), vec!["c", "a", "d", "b"]);
}

#[rstest]
#[case(&[("where", "{broken")])]
#[case(&[("sort", r#"{"name": "up"}"#)])]
#[case(&[("where", r#"{"name": {"$regex": "a"}}"#)])]
#[case(&[("limit", "-3")])]
#[tokio::test]
async fn malformed_query_is_400(#[case] pairs: &[(&str, &str)]) {
    let app = TestApp::new();

    let response = app.get(&format!("/api/tasks?{}", query(pairs))).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.message(), "Invalid query parameter.");
    assert!(response.data()["error"].is_string());
}

#[tokio::test]
async fn update_task_moves_pending_between_users() {
    let app = TestApp::new();
    let ada = app.create_user("Ada", "ada@example.com").await;
    let bob = app.create_user("Bob", "bob@example.com").await;
    let task = app
        .create_task(json!({ "name": "ship", "deadline": "2030-01-01", "assignedUser": ada }))
        .await;
    let created = app.get(&format!("/api/tasks/{task}")).await;

    let response = app
        .put(
            &format!("/api/tasks/{task}"),
            json!({ "name": "ship it", "deadline": "2030-02-01", "assignedUser": bob }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.message(), "Task updated successfully.");
    assert_eq!(response.data()["name"], "ship it");
    assert_eq!(response.data()["assignedUserName"], "Bob");
    assert_eq!(response.data()["dateCreated"], created.data()["dateCreated"]);
    assert!(app.pending_tasks(&ada).await.is_empty());
    assert_eq!(app.pending_tasks(&bob).await, vec![task.clone()]);

    let response = app
        .put(
            &format!("/api/tasks/{task}"),
            json!({ "name": "ship it", "deadline": "2030-02-01", "assignedUser": bob, "completed": true }),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(app.pending_tasks(&bob).await.is_empty());
}

#[tokio::test]
async fn update_task_replaces_whole_document() {
    let app = TestApp::new();
    let task = app
        .create_task(json!({ "name": "a", "deadline": "2030-01-01", "description": "keep?" }))
        .await;

    let response = app
        .put(&format!("/api/tasks/{task}"), json!({ "name": "a", "deadline": "2030-01-01" }))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["description"], "");
    assert_eq!(response.data()["_id"], task.as_str());
}

#[tokio::test]
async fn update_task_validation_and_missing() {
    let app = TestApp::new();

    let response = app.put("/api/tasks/nope", json!({ "name": "x" })).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .put("/api/tasks/nope", json!({ "name": "x", "deadline": "2030-01-01" }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.message(), "Task not found.");
}

#[tokio::test]
async fn delete_task_clears_pending_and_returns_204() {
    let app = TestApp::new();
    let user = app.create_user("Ada", "ada@example.com").await;
    let task = app
        .create_task(json!({ "name": "x", "deadline": "2030-01-01", "assignedUser": user }))
        .await;

    let response = app.delete(&format!("/api/tasks/{task}")).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.body, Value::Null);
    assert!(app.pending_tasks(&user).await.is_empty());

    let response = app.delete(&format!("/api/tasks/{task}")).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[rstest]
#[case(r#"{"deadline": "2030-01-03"}"#, 1)]
#[case(r#"{"deadline": 1893628800000}"#, 1)]
#[case(r#"{"deadline": {"$gte": "2030-01-02", "$lt": "2030-01-04T00:00:00Z"}}"#, 2)]
#[case(r#"{"completed": "false"}"#, 3)]
#[case(r#"{"completed": {"$in": ["true"]}}"#, 1)]
#[tokio::test]
async fn where_operands_follow_field_types(#[case] filter: &str, #[case] expected: usize) {
    let app = TestApp::new();
    seed_tasks(&app).await;

    let params = query(&[("where", filter), ("count", "true")]);
    let response = app.get(&format!("/api/tasks?{params}")).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data(), &json!(expected));
}

#[rstest]
#[case(Op::All, Method::GET, "/api/tasks", None, "can't retrive tasks.")]
#[case(Op::All, Method::GET, "/api/tasks?count=true", None, "can't retrive tasks.")]
#[case(
    Op::Insert,
    Method::POST,
    "/api/tasks",
    Some(json!({ "name": "x", "deadline": "2030-01-01" })),
    "can't create task."
)]
#[case(Op::Get, Method::GET, "/api/tasks/t1", None, "can't fetch task.")]
#[case(
    Op::Get,
    Method::PUT,
    "/api/tasks/t1",
    Some(json!({ "name": "x", "deadline": "2030-01-01" })),
    "can't update task."
)]
#[case(Op::Delete, Method::DELETE, "/api/tasks/t1", None, "can't delete task.")]
#[tokio::test]
async fn store_failures_are_500_with_route_message(
    #[case] failing: Op,
    #[case] method: Method,
    #[case] uri: &str,
    #[case] body: Option<Value>,
    #[case] message: &str,
) {
    let app = TestApp::with_store(Arc::new(FailingStore::new(&[failing])), QueryConfig::default());

    let response = app.request(method, uri, body).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.message(), message);
    assert!(response.data()["error"].is_string());
}
