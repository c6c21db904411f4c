use super::user::UserResponse;
use crate::error::{AppError, AppResult};
use crate::middleware::RequestContext;
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, Registration};
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Display name (up to 35 characters)
    #[validate(length(min = 1, max = 35))]
    pub name: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    /// Password (min 6 characters)
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(max = 12))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub old_password: String,
    /// New password (min 6 characters)
    #[validate(length(min = 6))]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token, valid for seven days by default
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckResponse {
    pub user_id: i32,
    pub user_name: String,
    pub user_role: crate::models::Role,
}

#[utoipa::path(
    post,
    path = "/api/Auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and signed in", body = AuthResponse),
        (status = 400, description = "Validation error or duplicate email/phone", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = AuthService::new(db);
    let (user, token) = service
        .register(Registration {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            password: payload.password,
        })
        .await?;

    Ok(ApiResponse::with_message(
        AuthResponse {
            token,
            user: UserResponse::from(user),
        },
        "Registration successful",
    ))
}

#[utoipa::path(
    post,
    path = "/api/Auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Email or password missing", body = AppError),
        (status = 401, description = "Wrong email or password", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|_| AppError::validation("Email and password are required"))?;

    let service = AuthService::new(db);
    let (user, token) = service.login(&payload.email, &payload.password).await?;

    Ok(ApiResponse::with_message(
        AuthResponse {
            token,
            user: UserResponse::from(user),
        },
        "Login successful",
    ))
}

#[utoipa::path(
    post,
    path = "/api/Auth/change-password",
    security(("jwt_token" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Old password wrong or new password invalid", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn change_password(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let service = AuthService::new(db);
    service
        .change_password(ctx.user_id, &payload.old_password, &payload.new_password)
        .await?;

    Ok(ApiResponse::message("Password changed"))
}

#[utoipa::path(
    get,
    path = "/api/Auth/check",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Token is valid", body = CheckResponse),
        (status = 401, description = "Missing or invalid token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn check(ctx: RequestContext) -> AppResult<impl IntoResponse> {
    Ok(ApiResponse::with_message(
        CheckResponse {
            user_id: ctx.user_id,
            user_name: ctx.name,
            user_role: ctx.role,
        },
        "Token is valid",
    ))
}
