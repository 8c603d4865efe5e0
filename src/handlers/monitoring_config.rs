// Monitoring configuration handlers.
use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::audit::AuditEvent;
use crate::dal;
use crate::dal::{PageOptions, Paginated};
use crate::database::models::monitoring_config::{
    MonitoringConfig, MonitoringConfigPatch, NewMonitoringConfig,
};
use crate::error::{ApiError, ErrorKind};
use crate::filter::{sort, SearchFilter};
use crate::middleware::principal::Principal;
use crate::permissions::{Action, Category};
use crate::state::AppState;

use super::scope::scoped_branch_filter;
use super::validate::{optional_text, require_ref, require_text, FieldErrors};
use super::{parse_id, PageQuery};

#[derive(Debug, Default, Deserialize)]
pub struct CreateConfigBody {
    pub user: Option<String>,
    pub name: Option<String>,
    pub branch: Option<String>,
    pub indicator: Option<String>,
    pub period_start: Option<DateTime<Utc>>,
    pub period_end: Option<DateTime<Utc>>,
}

impl CreateConfigBody {
    fn validate(self) -> Result<NewMonitoringConfig, FieldErrors> {
        let mut errors = FieldErrors::new();
        let user = require_ref(&mut errors, "user", self.user, "Config user reference is empty");
        let name = require_text(&mut errors, "name", self.name, "Config name is empty");
        let branch = require_ref(
            &mut errors,
            "branch",
            self.branch,
            "Config branch reference is empty",
        );
        match (user, name, branch) {
            (Some(user), Some(name), Some(branch)) if errors.is_empty() => Ok(NewMonitoringConfig {
                user,
                name,
                branch,
                indicator: optional_text(self.indicator),
                period_start: self.period_start,
                period_end: self.period_end,
            }),
            _ => Err(errors),
        }
    }
}

/// POST /geospatial/configs/create - create a config. A user holds at most
/// one config; the rule is checked here rather than constraint-enforced,
/// so two racing creates can slip past it.
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CreateConfigBody>,
) -> Result<Json<MonitoringConfig>, ApiError> {
    let kind = ErrorKind::ConfigCreate;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::Create)
    {
        return Err(ApiError::forbidden(kind));
    }

    let data = body
        .validate()
        .map_err(|fields| ApiError::validation(kind, fields))?;

    let existing = dal::monitoring_config::get_by_user(&state.pool, data.user)
        .await
        .map_err(|e| ApiError::database(kind, e))?;
    if existing.is_some() {
        return Err(ApiError::new(kind, "Config for user already exists"));
    }

    let config = dal::monitoring_config::create(&state.pool, &data)
        .await
        .map_err(|e| ApiError::database(kind, e))?;

    state
        .track(AuditEvent::new(
            "config_create",
            principal.user_id,
            format!("Created config {}", config.name),
        ))
        .await;

    Ok(Json(config))
}

/// GET /geospatial/configs/:id - fetch a single config.
pub async fn fetch_one(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<MonitoringConfig>, ApiError> {
    let kind = ErrorKind::ConfigView;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::View)
    {
        return Err(ApiError::forbidden(kind));
    }
    let id = parse_id(&id, kind)?;

    let config = dal::monitoring_config::get(&state.pool, id)
        .await
        .map_err(|e| ApiError::database(kind, e))?
        .ok_or_else(|| ApiError::new(kind, "Config does not exist"))?;

    state
        .track(AuditEvent::new(
            "view_config",
            principal.user_id,
            format!("View config - {}", config.name),
        ))
        .await;

    Ok(Json(config))
}

/// PUT /geospatial/configs/:id - partial update.
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<MonitoringConfig>, ApiError> {
    let kind = ErrorKind::ConfigUpdate;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::Update)
    {
        return Err(ApiError::forbidden(kind));
    }
    let id = parse_id(&id, kind)?;

    let patch: MonitoringConfigPatch = serde_json::from_value(body.clone())
        .map_err(|_| ApiError::new(kind, "Invalid update payload"))?;

    let config = dal::monitoring_config::update(&state.pool, id, &patch)
        .await
        .map_err(|e| ApiError::database(kind, e))?
        .ok_or_else(|| ApiError::new(kind, "Config does not exist"))?;

    state
        .track(
            AuditEvent::new(
                "config_update",
                principal.user_id,
                format!("Update info for {}", config.name),
            )
            .with_diff(body),
        )
        .await;

    Ok(Json(config))
}

/// GET /geospatial/configs/paginate - paginated listing, branch-scoped by
/// the principal's account.
pub async fn fetch_all_by_pagination(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<MonitoringConfig>>, ApiError> {
    let kind = ErrorKind::ConfigCollectionView;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::View)
    {
        return Err(ApiError::forbidden(kind));
    }

    let sort = sort::descending(query.sort_by.as_deref(), dal::monitoring_config::SORT_FIELDS);
    let opts = PageOptions::resolve(query.page, query.per_page, sort);

    let filter = scoped_branch_filter(&state, &principal, dal::monitoring_config::BRANCH_COLUMN)
        .await
        .map_err(|e| ApiError::database(kind, e))?;

    let page = dal::monitoring_config::get_collection_by_pagination(&state.pool, &filter, &opts)
        .await
        .map_err(|e| ApiError::database(kind, e))?;

    Ok(Json(page))
}

/// GET /geospatial/configs/search - filtered listing, at least one query
/// parameter required.
pub async fn search(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<MonitoringConfig>>, ApiError> {
    let kind = ErrorKind::ConfigSearch;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::View)
    {
        return Err(ApiError::forbidden(kind));
    }

    let filter = SearchFilter::from_query(&params, dal::monitoring_config::SEARCH_FIELDS)
        .map_err(|e| ApiError::new(kind, e.to_string()))?;

    let configs = dal::monitoring_config::get_collection(&state.pool, &filter)
        .await
        .map_err(|e| ApiError::database(kind, e))?;

    Ok(Json(configs))
}

/// DELETE /geospatial/configs/:id - delete a config.
pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<MonitoringConfig>, ApiError> {
    let kind = ErrorKind::ConfigRemove;
    if !state
        .permissions
        .is_permitted(&principal, Category::User, Action::Remove)
    {
        return Err(ApiError::forbidden(kind));
    }
    let id = parse_id(&id, kind)?;

    let config = dal::monitoring_config::delete(&state.pool, id)
        .await
        .map_err(|e| ApiError::database(kind, e))?
        .ok_or_else(|| ApiError::new(kind, "Config does not exist"))?;

    state
        .track(AuditEvent::new(
            "config_delete",
            principal.user_id,
            format!("Delete info for {}", config.name),
        ))
        .await;

    Ok(Json(config))
}
