// HTTP API error surface.
//
// One error kind per entity and action; "not found", "validation failed" and
// "storage failed" all collapse into the operation's kind and differ only by
// message, so a handler carries exactly one kind through its whole pipeline.
use std::collections::BTreeMap;

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RegionCreate,
    RegionView,
    RegionCollectionView,
    RegionSearch,
    RegionUpdate,
    RegionRemove,

    ConfigCreate,
    ConfigView,
    ConfigCollectionView,
    ConfigSearch,
    ConfigUpdate,
    ConfigRemove,

    RequestCreate,
    RequestView,
    RequestCollectionView,
    RequestSearch,
    RequestUpdate,
    RequestRemove,

    Unauthorized,
}

impl ErrorKind {
    /// Wire identifier carried in the `type` field of every error body.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::RegionCreate => "REGION_CREATION_ERROR",
            ErrorKind::RegionView => "REGION_VIEW_ERROR",
            ErrorKind::RegionCollectionView => "VIEW_REGIONS_COLLECTION_ERROR",
            ErrorKind::RegionSearch => "REGION_SEARCH_ERROR",
            ErrorKind::RegionUpdate => "UPDATE_REGION_ERROR",
            ErrorKind::RegionRemove => "REMOVE_REGION_ERROR",

            ErrorKind::ConfigCreate => "CONFIG_CREATION_ERROR",
            ErrorKind::ConfigView => "CONFIG_VIEW_ERROR",
            ErrorKind::ConfigCollectionView => "VIEW_CONFIGS_COLLECTION_ERROR",
            ErrorKind::ConfigSearch => "CONFIG_SEARCH_ERROR",
            ErrorKind::ConfigUpdate => "UPDATE_CONFIG_ERROR",
            ErrorKind::ConfigRemove => "REMOVE_CONFIG_ERROR",

            ErrorKind::RequestCreate => "REQUEST_CREATION_ERROR",
            ErrorKind::RequestView => "REQUEST_VIEW_ERROR",
            ErrorKind::RequestCollectionView => "VIEW_REQUESTS_COLLECTION_ERROR",
            ErrorKind::RequestSearch => "REQUEST_SEARCH_ERROR",
            ErrorKind::RequestUpdate => "UPDATE_REQUEST_ERROR",
            ErrorKind::RequestRemove => "REMOVE_REQUEST_ERROR",

            ErrorKind::Unauthorized => "UNAUTHORIZED",
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    field_errors: Option<BTreeMap<String, String>>,
    status: StatusCode,
}

impl ApiError {
    /// Caller error (bad input, missing record) within an operation.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field_errors: None,
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// Aggregated presence-validation failure.
    pub fn validation(kind: ErrorKind, field_errors: BTreeMap<String, String>) -> Self {
        Self {
            kind,
            message: "Validation failed".to_string(),
            field_errors: Some(field_errors),
            status: StatusCode::BAD_REQUEST,
        }
    }

    /// Permission check denied the operation.
    pub fn forbidden(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: "You don't have enough permissions to complete this action".to_string(),
            field_errors: None,
            status: StatusCode::FORBIDDEN,
        }
    }

    /// No usable principal on the request.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unauthorized,
            message: message.into(),
            field_errors: None,
            status: StatusCode::UNAUTHORIZED,
        }
    }

    /// Storage failure surfaced through an operation's kind. The underlying
    /// error is logged here; the client only sees a generic message.
    pub fn database(kind: ErrorKind, err: DatabaseError) -> Self {
        tracing::error!(kind = kind.as_str(), error = %err, "database operation failed");
        Self {
            kind,
            message: "An error occurred while processing your request".to_string(),
            field_errors: None,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "type": self.kind.as_str(),
            "message": self.message,
        });
        if let Some(field_errors) = &self.field_errors {
            body["field_errors"] = json!(field_errors);
        }
        body
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.to_json())).into_response()
    }
}
