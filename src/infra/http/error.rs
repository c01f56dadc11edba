use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::admin::AdminError;
use crate::application::error::ErrorReport;
use crate::application::routes::RouteError;
use crate::domain::error::DomainError;

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const NOT_FOUND: &str = "not_found";
    pub const VALIDATION: &str = "validation_failed";
    pub const ACTION_FAILED: &str = "action_failed";
    pub const INTERNAL: &str = "internal_error";
}

/// Failure body of the route surface: `{"status": 404, "data": "Not Found"}`.
#[derive(Debug, Serialize)]
pub struct RouteErrorBody {
    pub status: u16,
    pub data: String,
}

/// A route-adapter failure rendered as an HTTP response.
#[derive(Debug)]
pub struct RouteFailure(pub RouteError);

impl From<RouteError> for RouteFailure {
    fn from(error: RouteError) -> Self {
        Self(error)
    }
}

impl IntoResponse for RouteFailure {
    fn into_response(self) -> Response {
        let status = self.0.status();
        let body = RouteErrorBody {
            status: status.as_u16(),
            data: self.0.to_string(),
        };
        let mut response = (status, Json(body)).into_response();
        ErrorReport::from_error("infra::http::routes", status, &self.0).attach(&mut response);
        response
    }
}

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Admin view failure: `{"error": {"code", "message", "field"?}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    field: Option<&'static str>,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            status,
            code,
            report: ErrorReport::from_message("infra::http::admin", status, message.clone()),
            message,
            field: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message)
    }
}

impl From<AdminError> for ApiError {
    fn from(error: AdminError) -> Self {
        let status = error.status();
        let report = ErrorReport::from_error("infra::http::admin", status, &error);
        let (code, field) = match &error {
            AdminError::Domain(err @ DomainError::Validation { .. }) => {
                (codes::VALIDATION, err.field())
            }
            AdminError::Domain(DomainError::Timestamp(_)) => (codes::INTERNAL, None),
            AdminError::NotFound(_) => (codes::NOT_FOUND, None),
            AdminError::Failed { .. } => (codes::ACTION_FAILED, None),
        };
        Self {
            status,
            code,
            message: error.to_string(),
            field,
            report,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message,
                field: self.field.map(str::to_string),
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
