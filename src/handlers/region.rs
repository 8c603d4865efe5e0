// Region handlers, including the branch-cleanup cascade on removal.
use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::audit::AuditEvent;
use crate::dal;
use crate::dal::{PageOptions, Paginated};
use crate::database::models::region::{NewRegion, Region, RegionPatch};
use crate::error::{ApiError, ErrorKind};
use crate::filter::{sort, SearchFilter};
use crate::middleware::principal::Principal;
use crate::permissions::{Action, Category};
use crate::state::AppState;

use super::validate::{require_text, FieldErrors};
use super::{parse_id, PageQuery};

#[derive(Debug, Default, Deserialize)]
pub struct CreateRegionBody {
    pub name: Option<String>,
    pub code: Option<String>,
}

impl CreateRegionBody {
    fn validate(self) -> Result<NewRegion, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = require_text(&mut errors, "name", self.name, "Region name is empty");
        let code = require_text(&mut errors, "code", self.code, "Region code is empty");
        match (name, code) {
            (Some(name), Some(code)) if errors.is_empty() => Ok(NewRegion { name, code }),
            _ => Err(errors),
        }
    }
}

/// POST /geospatial/regions/create - create a region.
pub async fn create(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(body): Json<CreateRegionBody>,
) -> Result<Json<Region>, ApiError> {
    let kind = ErrorKind::RegionCreate;
    if !state
        .permissions
        .is_permitted(&principal, Category::Region, Action::Create)
    {
        return Err(ApiError::forbidden(kind));
    }

    let data = body
        .validate()
        .map_err(|fields| ApiError::validation(kind, fields))?;

    let duplicate = dal::region::get_by_name_or_code(&state.pool, &data.name, &data.code)
        .await
        .map_err(|e| ApiError::database(kind, e))?;
    if duplicate.is_some() {
        return Err(ApiError::new(kind, "Region already exists"));
    }

    let region = dal::region::create(&state.pool, &data).await.map_err(|e| {
        if e.is_unique_violation() {
            ApiError::new(kind, "Region already exists")
        } else {
            ApiError::database(kind, e)
        }
    })?;

    state
        .track(AuditEvent::new(
            "region_create",
            principal.user_id,
            format!("Created region {}", region.name),
        ))
        .await;

    Ok(Json(region))
}

/// GET /geospatial/regions/:id - fetch a single region.
pub async fn fetch_one(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Region>, ApiError> {
    let kind = ErrorKind::RegionView;
    if !state
        .permissions
        .is_permitted(&principal, Category::Region, Action::View)
    {
        return Err(ApiError::forbidden(kind));
    }
    let id = parse_id(&id, kind)?;

    let region = dal::region::get(&state.pool, id)
        .await
        .map_err(|e| ApiError::database(kind, e))?
        .ok_or_else(|| ApiError::new(kind, "Region does not exist"))?;

    state
        .track(AuditEvent::new(
            "view_region",
            principal.user_id,
            format!("View region - {}", region.name),
        ))
        .await;

    Ok(Json(region))
}

/// PUT /geospatial/regions/:id - partial update.
pub async fn update(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Region>, ApiError> {
    let kind = ErrorKind::RegionUpdate;
    if !state
        .permissions
        .is_permitted(&principal, Category::Region, Action::Update)
    {
        return Err(ApiError::forbidden(kind));
    }
    let id = parse_id(&id, kind)?;

    let patch: RegionPatch = serde_json::from_value(body.clone())
        .map_err(|_| ApiError::new(kind, "Invalid update payload"))?;

    let region = dal::region::update(&state.pool, id, &patch)
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::new(kind, "Region name or code already in use")
            } else {
                ApiError::database(kind, e)
            }
        })?
        .ok_or_else(|| ApiError::new(kind, "Region does not exist"))?;

    state
        .track(
            AuditEvent::new(
                "region_update",
                principal.user_id,
                format!("Update info for {}", region.name),
            )
            .with_diff(body),
        )
        .await;

    Ok(Json(region))
}

/// GET /geospatial/regions/paginate - paginated listing. Regions are not
/// branch-scoped.
pub async fn fetch_all_by_pagination(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<Region>>, ApiError> {
    let kind = ErrorKind::RegionCollectionView;
    if !state
        .permissions
        .is_permitted(&principal, Category::Region, Action::View)
    {
        return Err(ApiError::forbidden(kind));
    }

    let sort = sort::descending(query.sort_by.as_deref(), dal::region::SORT_FIELDS);
    let opts = PageOptions::resolve(query.page, query.per_page, sort);

    let page =
        dal::region::get_collection_by_pagination(&state.pool, &SearchFilter::empty(), &opts)
            .await
            .map_err(|e| ApiError::database(kind, e))?;

    Ok(Json(page))
}

/// GET /geospatial/regions/search - filtered listing, at least one query
/// parameter required.
pub async fn search(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Region>>, ApiError> {
    let kind = ErrorKind::RegionSearch;
    if !state
        .permissions
        .is_permitted(&principal, Category::Region, Action::View)
    {
        return Err(ApiError::forbidden(kind));
    }

    let filter = SearchFilter::from_query(&params, dal::region::SEARCH_FIELDS)
        .map_err(|e| ApiError::new(kind, e.to_string()))?;

    let regions = dal::region::get_collection(&state.pool, &filter)
        .await
        .map_err(|e| ApiError::database(kind, e))?;

    Ok(Json(regions))
}

/// DELETE /geospatial/regions/:id - delete a region and strip it from
/// every branch embedding it.
pub async fn remove(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<Region>, ApiError> {
    let kind = ErrorKind::RegionRemove;
    if !state
        .permissions
        .is_permitted(&principal, Category::Region, Action::Remove)
    {
        return Err(ApiError::forbidden(kind));
    }
    let id = parse_id(&id, kind)?;

    let region = dal::region::delete(&state.pool, id)
        .await
        .map_err(|e| ApiError::database(kind, e))?
        .ok_or_else(|| ApiError::new(kind, "Region does not exist"))?;

    // Full scan of the branch collection; each branch update is atomic on
    // its own, so a crash mid-loop leaves earlier branches corrected and
    // later ones untouched.
    let branches = dal::branch::get_collection(&state.pool)
        .await
        .map_err(|e| ApiError::database(kind, e))?;
    for branch in branches {
        if !branch.region_ids.contains(&region.id) {
            continue;
        }
        let remaining: Vec<Uuid> = branch
            .region_ids
            .iter()
            .copied()
            .filter(|region_id| *region_id != region.id)
            .collect();
        dal::branch::set_regions(&state.pool, branch.id, remaining)
            .await
            .map_err(|e| ApiError::database(kind, e))?;
    }

    state
        .track(AuditEvent::new(
            "region_delete",
            principal.user_id,
            format!("Delete info for {}", region.name),
        ))
        .await;

    Ok(Json(region))
}
