// Principal resolution middleware. Session/token mechanics live in an
// upstream gateway; by the time a request reaches this service the acting
// user is carried in headers, and this layer turns them into a typed
// extension every handler can rely on.
use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ROLES_HEADER: &str = "x-user-roles";

const DEFAULT_ROLE: &str = "officer";

/// Acting principal attached to every request under `/geospatial`.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub roles: Vec<String>,
}

/// Reject requests without a usable principal; inject the principal as an
/// extension otherwise.
pub async fn principal_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let principal =
        resolve_principal(&headers).map_err(|msg| ApiError::unauthorized(msg).into_response())?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn resolve_principal(headers: &HeaderMap) -> Result<Principal, String> {
    let raw_id = headers
        .get(USER_ID_HEADER)
        .ok_or_else(|| format!("Missing {} header", USER_ID_HEADER))?
        .to_str()
        .map_err(|_| format!("Invalid {} header", USER_ID_HEADER))?;

    let user_id = Uuid::parse_str(raw_id.trim())
        .map_err(|_| format!("Invalid {} header: expected a UUID", USER_ID_HEADER))?;

    let roles = match headers.get(ROLES_HEADER) {
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| format!("Invalid {} header", ROLES_HEADER))?;
            let roles: Vec<String> = raw
                .split(',')
                .map(|role| role.trim().to_lowercase())
                .filter(|role| !role.is_empty())
                .collect();
            if roles.is_empty() {
                vec![DEFAULT_ROLE.to_string()]
            } else {
                roles
            }
        }
        None => vec![DEFAULT_ROLE.to_string()],
    };

    Ok(Principal { user_id, roles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn missing_user_id_is_rejected() {
        let err = resolve_principal(&HeaderMap::new()).unwrap_err();
        assert!(err.contains("x-user-id"));
    }

    #[test]
    fn malformed_user_id_is_rejected() {
        let err = resolve_principal(&headers(&[(USER_ID_HEADER, "not-a-uuid")])).unwrap_err();
        assert!(err.contains("UUID"));
    }

    #[test]
    fn roles_parse_and_normalize() {
        let id = Uuid::new_v4();
        let principal = resolve_principal(&headers(&[
            (USER_ID_HEADER, &id.to_string()),
            (ROLES_HEADER, "Admin, manager ,"),
        ]))
        .unwrap();
        assert_eq!(principal.user_id, id);
        assert_eq!(principal.roles, vec!["admin", "manager"]);
    }

    #[test]
    fn role_defaults_to_officer() {
        let id = Uuid::new_v4();
        let principal = resolve_principal(&headers(&[(USER_ID_HEADER, &id.to_string())])).unwrap();
        assert_eq!(principal.roles, vec![DEFAULT_ROLE]);
    }
}
