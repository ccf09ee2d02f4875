use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

use quizbank_types::api::{LoginRequest, LoginResponse, MeResponse, SignupRequest};

use crate::error::{ApiError, ApiResult};
use crate::middleware::{Claims, MaybeUser};
use crate::state::AppState;

pub async fn signup(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require_anonymous()?;

    if req.name.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Name, email, password required"));
    }

    if state.db.get_user_by_email(&req.email)?.is_some() {
        return Err(ApiError::Conflict("Email already in use".into()));
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();

    let user_id = Uuid::new_v4();
    state.db.create_user(&user_id.to_string(), &req.name, &req.email, &password_hash)?;

    Ok(StatusCode::CREATED)
}

pub async fn login(
    State(state): State<AppState>,
    Extension(user): Extension<MaybeUser>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    user.require_anonymous()?;

    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Email and password required"));
    }

    let row = state
        .db
        .get_user_by_email(&req.email)?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".into()))?;

    let parsed_hash = PasswordHash::new(&row.password)
        .map_err(|e| anyhow::anyhow!("stored password hash unreadable: {}", e))?;
    Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .map_err(|_| ApiError::Unauthorized("Invalid email or password".into()))?;

    let user_id: Uuid = row
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {}", row.id, e))?;
    let token = create_token(&state.jwt_secret, user_id)?;

    Ok(Json(LoginResponse {
        id: user_id,
        name: row.name,
        email: row.email,
        is_admin: row.is_admin,
        token,
    }))
}

/// Tokens are stateless, so logout is a contract-parity endpoint: the client
/// discards its token and the server just confirms.
pub async fn logout(Extension(user): Extension<MaybeUser>) -> ApiResult<impl IntoResponse> {
    user.require()?;
    Ok(StatusCode::OK)
}

pub async fn me(Extension(user): Extension<MaybeUser>) -> ApiResult<Json<MeResponse>> {
    let user = user.require()?;
    Ok(Json(MeResponse {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
    }))
}

fn create_token(secret: &str, user_id: Uuid) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(7)).timestamp() as usize,
    };

    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
