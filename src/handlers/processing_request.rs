// Processing request handlers. Creation is idempotent on `external_uid`:
// the record of an external geospatial computation is get-or-create.
use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::audit::AuditEvent;
use crate::dal;
use crate::dal::{PageOptions, Paginated};
use crate::database::models::processing_request::{
    NewProcessingRequest, ProcessingRequest, ProcessingRequestPatch,
};
use crate::error::{ApiError, ErrorKind};
use crate::filter::{sort, SearchFilter};
use crate::middleware::principal::Principal;
use crate::permissions::{Action, Category};
use crate::state::AppState;

use super::scope::scoped_branch_filter;
use super::validate::{optional_text, require_ref, FieldErrors};
use super::{parse_id, PageQuery};

#[derive(Debug, Default, Deserialize)]
pub struct CreateRequestBody {
    pub branch: Option<String>,
    pub config: Option<String>,
    pub indicator: Option<String>,
    pub external_uid: Option<String>,
}

impl CreateRequestBody {
    fn validate(self) -> Result<NewProcessingRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let branch = require_ref(
            &mut errors,
            "branch",
            self.branch,
            "Request branch reference is empty",
        );
        let config = require_ref(
            &mut errors,
            "config",
            self.config,
            "Request config reference is empty",
        );
        match (branch, config) {
            (Some(branch), Some(config)) if errors.is_empty() => Ok(NewProcessingRequest {
                branch,
                config,
                indicator: optional_text(self.indicator),
                external_uid: optional_text(self.external_uid),
            }),
            _ => Err(errors),
        }
    }
}

/// POST /geospatial/requests/create - get-or-create keyed on
/// `external_uid`. A hit returns the existing record unchanged, with the
/// same response shape as a fresh create and no new write.
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CreateRequestBody>,
) -> Result<Json<ProcessingRequest>, ApiError> {
    let kind = ErrorKind::RequestCreate;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::Create)
    {
        return Err(ApiError::forbidden(kind));
    }

    let data = body
        .validate()
        .map_err(|fields| ApiError::validation(kind, fields))?;

    if let Some(external_uid) = &data.external_uid {
        let existing = dal::processing_request::get_by_external_uid(&state.pool, external_uid)
            .await
            .map_err(|e| ApiError::database(kind, e))?;
        if let Some(request) = existing {
            tracing::debug!(%external_uid, "request already exists, returning it");
            return Ok(Json(request));
        }
    }

    let request = dal::processing_request::create(&state.pool, &data)
        .await
        .map_err(|e| ApiError::database(kind, e))?;

    state
        .track(AuditEvent::new(
            "request_create",
            principal.user_id,
            format!("Created request {}", request.id),
        ))
        .await;

    Ok(Json(request))
}

/// GET /geospatial/requests/:id - fetch a single request.
pub async fn fetch_one(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<ProcessingRequest>, ApiError> {
    let kind = ErrorKind::RequestView;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::View)
    {
        return Err(ApiError::forbidden(kind));
    }
    let id = parse_id(&id, kind)?;

    let request = dal::processing_request::get(&state.pool, id)
        .await
        .map_err(|e| ApiError::database(kind, e))?
        .ok_or_else(|| ApiError::new(kind, "Request does not exist"))?;

    state
        .track(AuditEvent::new(
            "view_request",
            principal.user_id,
            format!("View request - {}", request.id),
        ))
        .await;

    Ok(Json(request))
}

/// PUT /geospatial/requests/:id - partial update.
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ProcessingRequest>, ApiError> {
    let kind = ErrorKind::RequestUpdate;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::Update)
    {
        return Err(ApiError::forbidden(kind));
    }
    let id = parse_id(&id, kind)?;

    let patch: ProcessingRequestPatch = serde_json::from_value(body.clone())
        .map_err(|_| ApiError::new(kind, "Invalid update payload"))?;

    let request = dal::processing_request::update(&state.pool, id, &patch)
        .await
        .map_err(|e| ApiError::database(kind, e))?
        .ok_or_else(|| ApiError::new(kind, "Request does not exist"))?;

    state
        .track(
            AuditEvent::new(
                "request_update",
                principal.user_id,
                format!("Update info for request {}", request.id),
            )
            .with_diff(body),
        )
        .await;

    Ok(Json(request))
}

/// GET /geospatial/requests/paginate - paginated listing, branch-scoped by
/// the principal's account.
pub async fn fetch_all_by_pagination(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<ProcessingRequest>>, ApiError> {
    let kind = ErrorKind::RequestCollectionView;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::View)
    {
        return Err(ApiError::forbidden(kind));
    }

    let sort = sort::descending(query.sort_by.as_deref(), dal::processing_request::SORT_FIELDS);
    let opts = PageOptions::resolve(query.page, query.per_page, sort);

    let filter = scoped_branch_filter(&state, &principal, dal::processing_request::BRANCH_COLUMN)
        .await
        .map_err(|e| ApiError::database(kind, e))?;

    let page = dal::processing_request::get_collection_by_pagination(&state.pool, &filter, &opts)
        .await
        .map_err(|e| ApiError::database(kind, e))?;

    Ok(Json(page))
}

/// GET /geospatial/requests/search - filtered listing, at least one query
/// parameter required.
pub async fn search(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<ProcessingRequest>>, ApiError> {
    let kind = ErrorKind::RequestSearch;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::View)
    {
        return Err(ApiError::forbidden(kind));
    }

    let filter = SearchFilter::from_query(&params, dal::processing_request::SEARCH_FIELDS)
        .map_err(|e| ApiError::new(kind, e.to_string()))?;

    let requests = dal::processing_request::get_collection(&state.pool, &filter)
        .await
        .map_err(|e| ApiError::database(kind, e))?;

    Ok(Json(requests))
}

/// DELETE /geospatial/requests/:id - delete a request.
pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<ProcessingRequest>, ApiError> {
    let kind = ErrorKind::RequestRemove;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::Remove)
    {
        return Err(ApiError::forbidden(kind));
    }
    let id = parse_id(&id, kind)?;

    let request = dal::processing_request::delete(&state.pool, id)
        .await
        .map_err(|e| ApiError::database(kind, e))?
        .ok_or_else(|| ApiError::new(kind, "Request does not exist"))?;

    state
        .track(AuditEvent::new(
            "request_delete",
            principal.user_id,
            format!("Delete info for request {}", request.id),
        ))
        .await;

    Ok(Json(request))
}
