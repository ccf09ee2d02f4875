use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use quizbank_policy::Requester;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::util;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
}

/// The authenticated user behind a request, loaded fresh from the store so
/// admin-flag changes take effect on the next request, not at token expiry.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

/// Requester identity attached to every request by [`identify`].
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn requester(&self) -> Requester {
        match &self.0 {
            Some(user) => Requester::User { id: user.id, is_admin: user.is_admin },
            None => Requester::Anonymous,
        }
    }

    pub fn require(&self) -> ApiResult<&CurrentUser> {
        self.0.as_ref().ok_or_else(|| ApiError::Unauthorized("Not logged in!".into()))
    }

    /// Admin-gated routes answer 404 to everyone else, so they do not even
    /// appear to exist.
    pub fn require_admin(&self) -> ApiResult<&CurrentUser> {
        match &self.0 {
            Some(user) if user.is_admin => Ok(user),
            _ => Err(ApiError::not_found()),
        }
    }

    pub fn require_anonymous(&self) -> ApiResult<()> {
        if self.0.is_some() {
            return Err(ApiError::Unauthorized("Already logged in!".into()));
        }
        Ok(())
    }
}

/// Resolve the bearer token (if any) to a user and attach the requester
/// identity. A missing, expired or malformed token makes the request
/// anonymous, the same as carrying no session at all.
pub async fn identify(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let user = match token {
        Some(token) => resolve_user(&state, token)?,
        None => None,
    };

    req.extensions_mut().insert(MaybeUser(user));
    Ok(next.run(req).await)
}

fn resolve_user(state: &AppState, token: &str) -> ApiResult<Option<CurrentUser>> {
    let claims = match decode::<Claims>(
        token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    ) {
        Ok(data) => data.claims,
        Err(_) => return Ok(None),
    };

    let row = state.db.get_user_by_id(&claims.sub.to_string())?;
    Ok(row.map(|row| CurrentUser {
        id: util::parse_uuid(&row.id),
        name: row.name,
        email: row.email,
        is_admin: row.is_admin,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(is_admin: bool) -> MaybeUser {
        MaybeUser(Some(CurrentUser {
            id: Uuid::from_u128(1),
            name: "alice".into(),
            email: "alice@example.com".into(),
            is_admin,
        }))
    }

    #[test]
    fn admin_gate_hides_the_route() {
        assert!(matches!(MaybeUser(None).require_admin(), Err(ApiError::NotFound(_))));
        assert!(matches!(user(false).require_admin(), Err(ApiError::NotFound(_))));
        assert!(user(true).require_admin().is_ok());
    }

    #[test]
    fn login_gate() {
        assert!(matches!(MaybeUser(None).require(), Err(ApiError::Unauthorized(_))));
        assert!(user(false).require().is_ok());
        assert!(MaybeUser(None).require_anonymous().is_ok());
        assert!(matches!(user(false).require_anonymous(), Err(ApiError::Unauthorized(_))));
    }
}
