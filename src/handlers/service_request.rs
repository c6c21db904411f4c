use super::optional_cents;
use super::support_request::UpdateStatusRequest;
use super::user::PersonSummary;
use crate::error::{AppError, AppResult};
use crate::middleware::RequestContext;
use crate::models::{RequestStatus, ServiceRequestModel};
use crate::response::ApiResponse;
use crate::services::service_request::{
    NewServiceRequest, ServiceRequestService, ServiceRequestView,
};
use crate::utils::amount_from_cents;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub service_type: String,
    pub description: String,
    pub cost: Option<f64>,
    /// Must be one of the caller's orders.
    pub order_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestResponse {
    pub id: i32,
    pub service_type: String,
    pub description: String,
    pub cost: Option<f64>,
    pub status: RequestStatus,
    pub create_date: NaiveDateTime,
    pub client_id: i32,
    pub assigned_to_id: Option<i32>,
    pub order_id: Option<i32>,
    pub client: Option<PersonSummary>,
    pub manager: Option<PersonSummary>,
}

impl From<ServiceRequestModel> for ServiceRequestResponse {
    fn from(request: ServiceRequestModel) -> Self {
        Self {
            id: request.id,
            service_type: request.service_type,
            description: request.description,
            cost: request.cost_cents.map(amount_from_cents),
            status: request.status,
            create_date: request.create_date,
            client_id: request.client_id,
            assigned_to_id: request.assigned_to_id,
            order_id: request.order_id,
            client: None,
            manager: None,
        }
    }
}

impl From<ServiceRequestView> for ServiceRequestResponse {
    fn from(view: ServiceRequestView) -> Self {
        Self {
            client: view.client.map(PersonSummary::from),
            manager: view.manager.map(PersonSummary::from),
            ..ServiceRequestResponse::from(view.request)
        }
    }
}

fn responses(views: Vec<ServiceRequestView>) -> Vec<ServiceRequestResponse> {
    views.into_iter().map(ServiceRequestResponse::from).collect()
}

#[utoipa::path(
    post,
    path = "/api/ServiceRequests/create",
    security(("jwt_token" = [])),
    request_body = CreateServiceRequest,
    responses(
        (status = 200, description = "Service request created", body = ServiceRequestResponse),
        (status = 400, description = "Validation error or foreign order", body = AppError),
    ),
    tag = "service-requests"
)]
pub async fn create_service_request(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Json(payload): Json<CreateServiceRequest>,
) -> AppResult<impl IntoResponse> {
    let request = ServiceRequestService::new(db)
        .create(
            &ctx,
            NewServiceRequest {
                service_type: payload.service_type,
                description: payload.description,
                cost_cents: optional_cents(payload.cost)?,
                order_id: payload.order_id,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        ServiceRequestResponse::from(request),
        "Service request created",
    ))
}

#[utoipa::path(
    get,
    path = "/api/ServiceRequests/my",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "The caller's service requests", body = Vec<ServiceRequestResponse>),
    ),
    tag = "service-requests"
)]
pub async fn my_service_requests(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let requests = ServiceRequestService::new(db)
        .my_requests(ctx.user_id)
        .await?;
    Ok(Json(responses(requests)))
}

#[utoipa::path(
    get,
    path = "/api/ServiceRequests/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Service request", body = ServiceRequestResponse),
        (status = 403, description = "Not your request", body = AppError),
        (status = 404, description = "Service request not found", body = AppError),
    ),
    tag = "service-requests"
)]
pub async fn get_service_request(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let request = ServiceRequestService::new(db).get(&ctx, id).await?;
    Ok(Json(ServiceRequestResponse::from(request)))
}

#[utoipa::path(
    get,
    path = "/api/ServiceRequests",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All service requests, newest first", body = Vec<ServiceRequestResponse>),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "service-requests"
)]
pub async fn list_service_requests(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let requests = ServiceRequestService::new(db).list(&ctx).await?;
    Ok(Json(responses(requests)))
}

#[utoipa::path(
    put,
    path = "/api/ServiceRequests/manager/assign/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Service request ID")),
    responses(
        (status = 200, description = "Assigned to the caller", body = ServiceRequestResponse),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Service request not found", body = AppError),
    ),
    tag = "service-requests"
)]
pub async fn assign_service_request(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let request = ServiceRequestService::new(db)
        .assign_to_self(&ctx, id)
        .await?;
    Ok(ApiResponse::with_message(
        ServiceRequestResponse::from(request),
        "Service request assigned",
    ))
}

#[utoipa::path(
    put,
    path = "/api/ServiceRequests/manager/status/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Service request ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ServiceRequestResponse),
        (status = 400, description = "Unknown status", body = AppError),
        (status = 403, description = "Not assigned to you", body = AppError),
        (status = 404, description = "Service request not found", body = AppError),
    ),
    tag = "service-requests"
)]
pub async fn update_service_request_status(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let status = payload
        .status
        .parse::<RequestStatus>()
        .map_err(AppError::Validation)?;

    let request = ServiceRequestService::new(db)
        .set_status(&ctx, id, status)
        .await?;
    Ok(ApiResponse::with_message(
        ServiceRequestResponse::from(request),
        "Status updated",
    ))
}
