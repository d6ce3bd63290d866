// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! HTTP transport for rpncalc.
//!
//! | Method | Path | Body / query | Success body |
//! |--------|------|--------------|--------------|
//! | GET | `/health` | - | [`HealthReport`] |
//! | POST | `/calculate` | `{operation, arguments}` | `{result}` |
//! | POST | `/stack/push` | `{arguments}` | `{size}` |
//! | POST | `/stack/operate` | `{operation}` | `{result}` |
//! | POST | `/stack/pop` | `{count}` | `{size}` |
//! | GET | `/stack/size` | - | `{size}` |
//! | GET | `/history` | `?backend=&flavor=` | `[OperationRecord]` |
//!
//! Failures return `{code, errorMessage}` with status 400, or 500 when a
//! store failed. Malformed bodies and query strings are reported as
//! `INVALID_ARGUMENT`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CalcError;
use crate::history::OperationRecord;
use crate::service::{CalculatorService, HealthReport};

/// Request body for `/calculate`.
#[derive(Debug, Clone, Deserialize)]
pub struct CalculateRequest {
    /// Operation name, case-insensitive.
    pub operation: String,
    /// Arguments in order.
    #[serde(default)]
    pub arguments: Vec<i64>,
}

/// Request body for `/stack/push`.
#[derive(Debug, Clone, Deserialize)]
pub struct PushRequest {
    /// Values to push; the last one ends on top.
    #[serde(default)]
    pub arguments: Vec<i64>,
}

/// Request body for `/stack/operate`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperateRequest {
    /// Operation name, case-insensitive.
    pub operation: String,
}

/// Request body for `/stack/pop`.
#[derive(Debug, Clone, Deserialize)]
pub struct PopRequest {
    /// Number of values to discard.
    pub count: i64,
}

/// Query string for `/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    /// `relational` or `document`. Required.
    pub backend: Option<String>,
    /// `independent` or `stack`.
    pub flavor: Option<String>,
}

/// Successful calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultResponse {
    /// Evaluation result.
    pub result: i64,
}

/// Stack size after a stack call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizeResponse {
    /// Current stack size.
    pub size: usize,
}

/// [`CalcError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub CalcError);

impl From<CalcError> for ApiError {
    fn from(err: CalcError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(CalcError::InvalidArgument {
            field: "body".to_string(),
            message: rejection.body_text(),
        })
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(CalcError::InvalidArgument {
            field: "query".to_string(),
            message: rejection.body_text(),
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_persistence() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::BAD_REQUEST
        };
        (status, Json(self.0.to_error_body())).into_response()
    }
}

type AppState = Arc<CalculatorService>;

/// Build the router over a shared service.
pub fn router(service: Arc<CalculatorService>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/calculate", post(handle_calculate))
        .route("/stack/push", post(handle_push))
        .route("/stack/operate", post(handle_operate))
        .route("/stack/pop", post(handle_pop))
        .route("/stack/size", get(handle_size))
        .route("/history", get(handle_history))
        .with_state(service)
}

/// Serve the router on `addr` until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    service: Arc<CalculatorService>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle_health(State(service): State<AppState>) -> Json<HealthReport> {
    Json(service.health().await)
}

async fn handle_calculate(
    State(service): State<AppState>,
    payload: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<ResultResponse>, ApiError> {
    let Json(req) = payload?;
    let result = service.calculate(&req.operation, &req.arguments).await?;
    Ok(Json(ResultResponse { result }))
}

async fn handle_push(
    State(service): State<AppState>,
    payload: Result<Json<PushRequest>, JsonRejection>,
) -> Result<Json<SizeResponse>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(SizeResponse {
        size: service.push(&req.arguments),
    }))
}

async fn handle_operate(
    State(service): State<AppState>,
    payload: Result<Json<OperateRequest>, JsonRejection>,
) -> Result<Json<ResultResponse>, ApiError> {
    let Json(req) = payload?;
    let result = service.operate(&req.operation).await?;
    Ok(Json(ResultResponse { result }))
}

async fn handle_pop(
    State(service): State<AppState>,
    payload: Result<Json<PopRequest>, JsonRejection>,
) -> Result<Json<SizeResponse>, ApiError> {
    let Json(req) = payload?;
    let size = service.pop(req.count)?;
    Ok(Json(SizeResponse { size }))
}

async fn handle_size(State(service): State<AppState>) -> Json<SizeResponse> {
    Json(SizeResponse {
        size: service.size(),
    })
}

async fn handle_history(
    State(service): State<AppState>,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<OperationRecord>>, ApiError> {
    let Query(query) = params?;
    let backend = query.backend.unwrap_or_default();
    let records = service
        .history(&backend, query.flavor.as_deref())
        .await?;
    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryStore;
    use crate::persistence::{InMemoryDocumentStore, SqliteRelationalStore};
    use crate::stack::OperandStack;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    async fn test_router() -> Router {
        let relational = SqliteRelationalStore::in_memory().await.unwrap();
        let history = HistoryStore::new(
            Arc::new(relational),
            Arc::new(InMemoryDocumentStore::new()),
        );
        let service = CalculatorService::new(Arc::new(OperandStack::new()), Arc::new(history));
        router(Arc::new(service))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(body) => Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_calculate_returns_result() {
        let app = test_router().await;
        let (status, body) = send(
            &app,
            "POST",
            "/calculate",
            Some(json!({"operation": "times", "arguments": [6, 7]})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"result": 42}));
    }

    #[tokio::test]
    async fn test_domain_error_maps_to_bad_request() {
        let app = test_router().await;
        let (status, body) = send(
            &app,
            "POST",
            "/calculate",
            Some(json!({"operation": "divide", "arguments": [1, 0]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "DIVISION_BY_ZERO");
        assert!(body["errorMessage"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_stack_routes() {
        let app = test_router().await;

        let (_, body) = send(&app, "POST", "/stack/push", Some(json!({"arguments": [10, 3]}))).await;
        assert_eq!(body, json!({"size": 2}));

        let (status, body) = send(&app, "POST", "/stack/operate", Some(json!({"operation": "minus"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"result": 7}));

        let (_, body) = send(&app, "GET", "/stack/size", None).await;
        assert_eq!(body, json!({"size": 0}));

        let (status, body) = send(&app, "POST", "/stack/pop", Some(json!({"count": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INSUFFICIENT_OPERANDS");
    }

    #[tokio::test]
    async fn test_history_requires_backend() {
        let app = test_router().await;
        let (status, body) = send(&app, "GET", "/history", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "UNKNOWN_PERSISTENCE_METHOD");

        send(
            &app,
            "POST",
            "/calculate",
            Some(json!({"operation": "abs", "arguments": [-4]})),
        )
        .await;
        let (status, body) = send(&app, "GET", "/history?backend=relational&flavor=independent", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["operation"], "abs");
        assert_eq!(body[0]["result"], 4);
        assert_eq!(body[0]["flavor"], "INDEPENDENT");
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let app = test_router().await;
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["stackSize"], 0);
    }

    #[test]
    fn test_persistence_error_maps_to_internal_error() {
        let response = ApiError(CalcError::relational("insert", "disk full")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_malformed_bodies_use_error_shape() {
        let app = test_router().await;
        let cases = [
            ("/calculate", json!({"operation": "plus", "arguments": [1.5, 2]})),
            ("/calculate", json!({"arguments": [1, 2]})),
            ("/stack/push", json!({"arguments": ["ten"]})),
            ("/stack/operate", json!({})),
            ("/stack/pop", json!({"count": "x"})),
        ];
        for (uri, payload) in cases {
            let (status, body) = send(&app, "POST", uri, Some(payload.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri} {payload}");
            assert_eq!(body["code"], "INVALID_ARGUMENT", "{uri} {payload}");
            assert!(body["errorMessage"].as_str().is_some(), "{uri} {payload}");
        }

        let (_, body) = send(&app, "GET", "/stack/size", None).await;
        assert_eq!(body, json!({"size": 0}));
    }

    #[tokio::test]
    async fn test_missing_content_type_uses_error_shape() {
        let app = test_router().await;
        let request = Request::builder()
            .method("POST")
            .uri("/calculate")
            .body(Body::from(r#"{"operation":"plus","arguments":[1,2]}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "INVALID_ARGUMENT");
    }
}
