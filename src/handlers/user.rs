use crate::error::{AppError, AppResult};
use crate::middleware::{ensure, Action, RequestContext, Target};
use crate::models::{Role, UserModel};
use crate::response::ApiResponse;
use crate::services::user::{NewUser, UserService, UserUpdate};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub reg_date: NaiveDateTime,
}

impl From<UserModel> for UserResponse {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            reg_date: user.reg_date,
        }
    }
}

/// Contact card embedded in order and request payloads.
#[derive(Debug, Serialize, ToSchema)]
pub struct PersonSummary {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

impl From<UserModel> for PersonSummary {
    fn from(user: UserModel) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 35))]
    pub name: String,
    #[validate(email, length(max = 100))]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(max = 12))]
    pub phone: Option<String>,
    /// User, Manager or Admin. Defaults to User.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(max = 35))]
    pub name: String,
    /// Omit to keep the current email.
    #[validate(email, length(max = 100))]
    pub email: Option<String>,
    #[validate(length(max = 12))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: String,
}

fn self_target(user: &UserModel) -> Target {
    Target::new(user.id, None)
}

#[utoipa::path(
    get,
    path = "/api/Users",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    ensure(&ctx, None, Action::Browse, "User")?;

    let users = UserService::new(db).list().await?;
    Ok(Json(
        users.into_iter().map(UserResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/Users/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "The caller's account", body = UserResponse),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_me(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let user = UserService::new(db).get(ctx.user_id).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/Users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 403, description = "Not yourself and not staff", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user = UserService::new(db).find(id).await?;
    ensure(&ctx, user.as_ref().map(self_target), Action::View, "User")?;
    let user = user.ok_or(AppError::NotFound("User"))?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/Users",
    security(("jwt_token" = [])),
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error or duplicate contact", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "users"
)]
pub async fn create_user(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<impl IntoResponse> {
    ensure(&ctx, None, Action::Administer, "User")?;
    payload.validate()?;

    let role = match payload.role.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw.parse::<Role>().map_err(AppError::Validation)?,
        _ => Role::User,
    };

    let user = UserService::new(db)
        .create(NewUser {
            name: payload.name,
            email: payload.email,
            phone: payload.phone,
            password: payload.password,
            role,
        })
        .await?;

    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "User created",
    ))
}

#[utoipa::path(
    put,
    path = "/api/Users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error or duplicate contact", body = AppError),
        (status = 403, description = "Not yourself and not staff", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_user(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let existing = service.find(id).await?;
    ensure(&ctx, existing.as_ref().map(self_target), Action::View, "User")?;
    payload.validate()?;

    let user = service
        .update(
            id,
            UserUpdate {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "User updated",
    ))
}

#[utoipa::path(
    put,
    path = "/api/Users/{id}/role",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = UserResponse),
        (status = 400, description = "Unknown role", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_user_role(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    ensure(&ctx, None, Action::Administer, "User")?;
    let role = payload.role.parse::<Role>().map_err(AppError::Validation)?;

    let user = UserService::new(db).change_role(id, role).await?;
    Ok(ApiResponse::with_message(
        UserResponse::from(user),
        "Role updated",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/Users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 400, description = "User is still referenced", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn delete_user(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    ensure(&ctx, None, Action::Administer, "User")?;

    UserService::new(db).delete(id).await?;
    Ok(ApiResponse::message("User deleted"))
}
