use axum::http::{Method, StatusCode};
use axum_test::TestServer;
use serde_json::json;

use tablerest::{DatabaseConfig, ErrorPayload, Server, ServerOptions};

async fn init_server() -> (Server, TestServer) {
  let server = Server::init(ServerOptions {
    address: "localhost:4052".to_string(),
    table: "table_a".to_string(),
    database: DatabaseConfig::in_memory(),
    dev: false,
    log_responses: false,
    cors_allowed_origins: vec![],
  })
  .await
  .unwrap();

  server
    .database()
    .run(
      "CREATE TABLE table_a (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
      (),
    )
    .await
    .unwrap();
  server
    .database()
    .insert(
      "INSERT INTO table_a (id, name) VALUES (1, 'First Item'), (2, 'Second Item')",
      (),
    )
    .await
    .unwrap();

  let test_server = TestServer::try_new(server.router().clone()).unwrap();
  return (server, test_server);
}

#[tokio::test]
async fn test_healthcheck() {
  let (_server, test_server) = init_server().await;

  let response = test_server.get("/api/healthcheck").await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(response.text(), "Ok");

  assert_eq!(
    test_server.get("/api/v1/other_table").await.status_code(),
    StatusCode::NOT_FOUND
  );
}

#[tokio::test]
async fn test_read_records() {
  let (_server, test_server) = init_server().await;

  let response = test_server.get("/api/v1/table_a").await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!([
      {"id": 1, "name": "First Item"},
      {"id": 2, "name": "Second Item"},
    ])
  );

  let response = test_server.get("/api/v1/table_a/2").await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"id": 2, "name": "Second Item"})
  );

  let response = test_server.get("/api/v1/table_a/56").await;
  assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  assert_eq!(
    response.json::<ErrorPayload>(),
    ErrorPayload::new("Could not fetch")
  );
}

#[tokio::test]
async fn test_create_and_update_records() {
  let (_server, test_server) = init_server().await;

  let response = test_server
    .post("/api/v1/table_a")
    .json(&json!({"id": 34, "name": "Third Item"}))
    .await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(response.json::<serde_json::Value>(), json!(1));

  let response = test_server
    .post("/api/v1/table_a")
    .form(&[("name", "Fourth Item")])
    .await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(response.json::<serde_json::Value>(), json!(1));

  let response = test_server
    .patch("/api/v1/table_a/34")
    .json(&json!({"name": "Updated Item"}))
    .await;
  assert_eq!(response.status_code(), StatusCode::OK);
  assert_eq!(response.json::<serde_json::Value>(), json!(1));

  let response = test_server.get("/api/v1/table_a").await;
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!([
      {"id": 1, "name": "First Item"},
      {"id": 2, "name": "Second Item"},
      {"id": 34, "name": "Updated Item"},
      {"id": 35, "name": "Fourth Item"},
    ])
  );
}

#[tokio::test]
async fn test_errors() {
  let (server, test_server) = init_server().await;

  // Constraint violation: NOT NULL.
  let response = test_server
    .post("/api/v1/table_a")
    .json(&json!({"name": null}))
    .await;
  assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  let payload = response.json::<ErrorPayload>();
  assert_eq!(payload.status, "error");
  assert!(payload.message.contains("NOT NULL"), "{payload:?}");

  // PATCH requires an id.
  let response = test_server
    .patch("/api/v1/table_a")
    .json(&json!({"name": "x"}))
    .await;
  assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

  let response = test_server
    .post("/api/v1/table_a")
    .text("name=foo")
    .await;
  assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"error": "Unsupported Content-Type"})
  );

  let response = test_server
    .method(Method::DELETE, "/api/v1/table_a/1")
    .await;
  assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
  assert_eq!(
    response.json::<serde_json::Value>(),
    json!({"error": "Unknown REQUEST_METHOD"})
  );

  // Nothing got deleted.
  let records = server.database().find_all("SELECT * FROM table_a").await.unwrap();
  assert_eq!(records.len(), 2);
}
