// Handlers orchestrate one operation each: resolve principal, check
// permission, validate presence, call the access layer, track the audit
// event, respond with the projected record.
pub mod monitoring_config;
pub mod processing_request;
pub mod region;
pub mod scope;
pub mod validate;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::{ApiError, ErrorKind};

/// Pagination query parameters shared by every paginate endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub sort_by: Option<String>,
}

/// Parse a path identifier, surfacing failures through the operation's
/// error kind like any other caller error.
pub(crate) fn parse_id(raw: &str, kind: ErrorKind) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::new(kind, "Invalid identifier"))
}
