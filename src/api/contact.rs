use crate::api::AppState;
use crate::api::schemas::contact::{ContactRequest, ContactResponse};
use crate::domain::submission::ValidationError;
use crate::error::{AppError, Result};
use crate::services::contact_service::ContactService;
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{Method, StatusCode},
    response::IntoResponse,
};
use serde_json::Value;

/// Handles every method on the contact route so that non-`POST` requests get the
/// JSON `405` envelope before the body is looked at.
pub async fn submit(
    State(state): State<AppState>,
    method: Method,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse> {
    ContactService::ensure_method(&method)?;

    let body = match payload {
        Ok(Json(body)) => body,
        // A body not declared as JSON is never parsed, so the form is empty.
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Null,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Unreadable contact body");
            return Err(AppError::Validation(ValidationError::MalformedBody));
        }
    };

    state.contact_service.submit(ContactRequest::from(body).into()).await?;

    Ok((StatusCode::CREATED, Json(ContactResponse::submitted())))
}

/// Preflight requests that the CORS layer does not answer itself.
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}
