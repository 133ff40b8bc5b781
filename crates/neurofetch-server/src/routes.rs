//! Route table and handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use neurofetch_auth::{LoginInput, SignupInput};
use neurofetch_core::models::user::UserProfile;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, MessageBody};
use crate::guard::AuthenticatedUser;
use crate::state::AppState;

/// Signup and login body. `password` is accepted for older clients.
#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    #[serde(alias = "password")]
    pub secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
    pub expires_in: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login))
        .route("/auth/verify", get(verify))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn credentials(payload: Result<Json<CredentialsBody>, JsonRejection>) -> Result<CredentialsBody, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsBody>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageBody>), ApiError> {
    let body = credentials(payload)?;
    state
        .auth
        .signup(SignupInput {
            email: body.email,
            secret: body.secret,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageBody::new("User created successfully")),
    ))
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<CredentialsBody>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let body = credentials(payload)?;
    let out = state
        .auth
        .login(LoginInput {
            email: body.email,
            secret: body.secret,
        })
        .await?;

    Ok(Json(LoginResponse {
        token: out.token,
        user: out.user,
        expires_in: out.expires_in,
    }))
}

async fn verify(AuthenticatedUser(user): AuthenticatedUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        user: user.profile(),
    })
}
