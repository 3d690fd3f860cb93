// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process stand-in for the backend's REST row store.

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SERVICE_KEY: &str = "test_service_role_key";

/// Signs in normally, but the row store refuses its access token.
pub const REVOKED_EMAIL: &str = "revoked@example.com";

#[derive(Default)]
pub struct StubBackend {
    pub rows: Mutex<Vec<Value>>,
    pub users: Mutex<Vec<Value>>,
    pub rpc_calls: Mutex<Vec<(String, Value)>>,
    pub fail_rpc: bool,
}

type Params = Query<HashMap<String, String>>;

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn user_authorized(headers: &HeaderMap) -> bool {
    bearer(headers).is_some_and(|t| {
        t.starts_with("access-") && t != format!("access-{}", REVOKED_EMAIL)
    })
}

/// PostgREST `eq.` filter on a string column.
fn matches(row: &Value, params: &HashMap<String, String>, column: &str) -> bool {
    match params.get(column).and_then(|f| f.strip_prefix("eq.")) {
        Some(expected) => row[column].as_str() == Some(expected),
        None => true,
    }
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "JWT expired"})),
    )
}

async fn list_rows(
    State(stub): State<Arc<StubBackend>>,
    headers: HeaderMap,
    Query(params): Params,
) -> (StatusCode, Json<Value>) {
    if !user_authorized(&headers) {
        return unauthorized();
    }
    let rows: Vec<Value> = stub
        .rows
        .lock()
        .unwrap()
        .iter()
        .filter(|r| matches(r, &params, "user_id") && matches(r, &params, "id"))
        .cloned()
        .collect();
    (StatusCode::OK, Json(Value::Array(rows)))
}

async fn insert_row(
    State(stub): State<Arc<StubBackend>>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !user_authorized(&headers) {
        return unauthorized();
    }
    let mut rows = stub.rows.lock().unwrap();
    let now = chrono::Utc::now().to_rfc3339();
    body["id"] = json!(format!("sub-{}", rows.len() + 1));
    body["created_at"] = json!(now);
    body["updated_at"] = json!(now);
    rows.push(body.clone());
    (StatusCode::CREATED, Json(json!([body])))
}

async fn update_rows(
    State(stub): State<Arc<StubBackend>>,
    headers: HeaderMap,
    Query(params): Params,
    Json(patch): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !user_authorized(&headers) {
        return unauthorized();
    }
    let mut updated = Vec::new();
    for row in stub.rows.lock().unwrap().iter_mut() {
        if matches(row, &params, "user_id") && matches(row, &params, "id") {
            if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                for (k, v) in fields {
                    target.insert(k.clone(), v.clone());
                }
            }
            updated.push(row.clone());
        }
    }
    (StatusCode::OK, Json(Value::Array(updated)))
}

async fn delete_rows(
    State(stub): State<Arc<StubBackend>>,
    headers: HeaderMap,
    Query(params): Params,
) -> StatusCode {
    if !user_authorized(&headers) {
        return StatusCode::UNAUTHORIZED;
    }
    stub.rows
        .lock()
        .unwrap()
        .retain(|r| !(matches(r, &params, "user_id") && matches(r, &params, "id")));
    StatusCode::NO_CONTENT
}

async fn list_users(
    State(stub): State<Arc<StubBackend>>,
    headers: HeaderMap,
    Query(params): Params,
) -> (StatusCode, Json<Value>) {
    if bearer(&headers) != Some(SERVICE_KEY) {
        return unauthorized();
    }
    let users: Vec<Value> = stub
        .users
        .lock()
        .unwrap()
        .iter()
        .filter(|u| matches(u, &params, "email"))
        .cloned()
        .collect();
    (StatusCode::OK, Json(Value::Array(users)))
}

async fn call_rpc(
    State(stub): State<Arc<StubBackend>>,
    headers: HeaderMap,
    Path(procedure): Path<String>,
    Json(args): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if bearer(&headers) != Some(SERVICE_KEY) {
        return unauthorized();
    }
    if stub.fail_rpc {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "mailer unavailable"})),
        );
    }
    stub.rpc_calls.lock().unwrap().push((procedure, args));
    (StatusCode::OK, Json(Value::Null))
}

/// Serve the stub and return its base URL (without `/rest/v1`).
pub async fn spawn(stub: Arc<StubBackend>) -> String {
    let router = Router::new()
        .route(
            "/rest/v1/subscriptions",
            get(list_rows)
                .post(insert_row)
                .patch(update_rows)
                .delete(delete_rows),
        )
        .route("/rest/v1/users", get(list_users))
        .route("/rest/v1/rpc/{procedure}", post(call_rpc))
        .with_state(stub);
    super::spawn_server(router).await
}

/// A stored subscription row for `user_id`.
pub fn row(id: &str, user_id: &str, name: &str, cost: f64, cycle: &str, next: &str) -> Value {
    json!({
        "id": id,
        "user_id": user_id,
        "name": name,
        "cost": cost,
        "currency": "USD",
        "billing_cycle": cycle,
        "next_billing": next,
        "status": "active",
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z"
    })
}
