//! Per-invocation entry point.
//!
//! A function runtime hands the process one request at a time as a JSON envelope and
//! expects a JSON envelope back. The process, and with it the `ConnectionManager` behind
//! the `ContactService`, outlives individual invocations, so the database connection is
//! established once and reused.

use crate::api::schemas::contact::{ContactRequest, ContactResponse};
use crate::domain::submission::ValidationError;
use crate::error::{AppError, Result};
use crate::services::contact_service::ContactService;
use axum::http::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct Invocation {
    pub method: String,
    #[serde(default)]
    pub body: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<ContactResponse>,
}

/// Parses one raw invocation and handles it. Never fails: every problem becomes a
/// response envelope.
pub async fn invoke(service: &ContactService, raw: &str) -> InvocationResponse {
    match serde_json::from_str::<Invocation>(raw) {
        Ok(invocation) => handle(service, invocation).await,
        Err(e) => {
            tracing::debug!(error = %e, "Unreadable invocation envelope");
            error_response(&AppError::Validation(ValidationError::MalformedBody))
        }
    }
}

#[tracing::instrument(skip_all, fields(method = %invocation.method))]
pub async fn handle(service: &ContactService, invocation: Invocation) -> InvocationResponse {
    let Ok(method) = Method::from_bytes(invocation.method.to_ascii_uppercase().as_bytes()) else {
        return error_response(&AppError::MethodNotAllowed(invocation.method));
    };

    if method == Method::OPTIONS {
        return respond(StatusCode::OK, None);
    }

    match submit(service, &method, invocation.body).await {
        Ok(()) => respond(StatusCode::CREATED, Some(ContactResponse::submitted())),
        Err(e) => error_response(&e),
    }
}

async fn submit(service: &ContactService, method: &Method, body: Value) -> Result<()> {
    ContactService::ensure_method(method)?;

    service.submit(ContactRequest::from(body).into()).await?;
    Ok(())
}

fn error_response(error: &AppError) -> InvocationResponse {
    error.report();
    respond(error.status_code(), Some(ContactResponse::failure(error.public_message())))
}

fn respond(status: StatusCode, body: Option<ContactResponse>) -> InvocationResponse {
    let mut headers = BTreeMap::from([
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        ("Access-Control-Allow-Methods".to_string(), "GET, POST, OPTIONS".to_string()),
        ("Access-Control-Allow-Headers".to_string(), "Content-Type".to_string()),
    ]);
    if body.is_some() {
        headers.insert("Content-Type".to_string(), "application/json".to_string());
    }

    InvocationResponse { status: status.as_u16(), headers, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::ConnectionManager;
    use crate::adapters::database::memory::MemoryConnector;

    fn service(connector: &MemoryConnector) -> ContactService {
        ContactService::new(ConnectionManager::new(connector.clone()))
    }

    #[tokio::test]
    async fn test_created() {
        let connector = MemoryConnector::new();
        let raw = r#"{"method":"POST","body":{"name":"Ann","email":"ann@x.com","message":"hi"}}"#;

        let response = invoke(&service(&connector), raw).await;

        assert_eq!(response.status, 201);
        let body = response.body.unwrap();
        assert!(body.success);
        assert_eq!(body.message, "Contact form submitted successfully");
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(connector.repository().submissions().len(), 1);
    }

    #[tokio::test]
    async fn test_preflight_has_no_body() {
        let connector = MemoryConnector::new();

        let response = invoke(&service(&connector), r#"{"method":"OPTIONS"}"#).await;

        assert_eq!(response.status, 200);
        assert!(response.body.is_none());
        assert_eq!(response.headers["Access-Control-Allow-Methods"], "GET, POST, OPTIONS");
        assert_eq!(connector.attempts(), 0);
    }

    #[tokio::test]
    async fn test_method_checked_before_body() {
        let connector = MemoryConnector::new();

        let response = invoke(&service(&connector), r#"{"method":"GET","body":"garbage"}"#).await;

        assert_eq!(response.status, 405);
        assert_eq!(response.body.unwrap().message, "Method Not Allowed");
    }

    #[tokio::test]
    async fn test_missing_body_is_missing_fields() {
        let connector = MemoryConnector::new();

        let response = invoke(&service(&connector), r#"{"method":"POST"}"#).await;

        assert_eq!(response.status, 400);
        assert_eq!(response.body.unwrap().message, "All fields are required");
    }

    #[tokio::test]
    async fn test_non_object_body_is_missing_fields() {
        let connector = MemoryConnector::new();
        let service = service(&connector);

        for raw in [
            r#"{"method":"POST","body":["Ann","ann@x.com","hi"]}"#,
            r#"{"method":"POST","body":"name=Ann&email=ann@x.com"}"#,
            r#"{"method":"POST","body":42}"#,
        ] {
            let response = invoke(&service, raw).await;
            assert_eq!(response.status, 400, "raw: {raw}");
            assert_eq!(response.body.unwrap().message, "All fields are required");
        }

        assert!(connector.repository().submissions().is_empty());
        assert_eq!(connector.attempts(), 0);
    }

    #[tokio::test]
    async fn test_malformed_envelope() {
        let connector = MemoryConnector::new();

        let response = invoke(&service(&connector), "not json").await;

        assert_eq!(response.status, 400);
        assert!(!response.body.unwrap().success);
    }

    #[tokio::test]
    async fn test_invocations_share_one_connection() {
        let connector = MemoryConnector::new();
        let service = service(&connector);
        let raw = r#"{"method":"post","body":{"name":"Ann","email":"ann@x.com","message":"hi"}}"#;

        for _ in 0..3 {
            assert_eq!(invoke(&service, raw).await.status, 201);
        }

        assert_eq!(connector.attempts(), 1);
        assert_eq!(connector.repository().submissions().len(), 3);
    }

    #[tokio::test]
    async fn test_unavailable_database() {
        let connector = MemoryConnector::new().failing(1);
        let raw = r#"{"method":"POST","body":{"name":"Ann","email":"ann@x.com","message":"hi"}}"#;

        let response = invoke(&service(&connector), raw).await;

        assert_eq!(response.status, 503);
        assert_eq!(response.body.unwrap().message, "Database connection unavailable");
    }
}
