use super::order::OrderResponse;
use super::report::ReportResponse;
use super::user::PersonSummary;
use crate::error::{AppError, AppResult};
use crate::middleware::RequestContext;
use crate::models::{RequestStatus, SupportRequestModel};
use crate::response::ApiResponse;
use crate::services::support_request::{
    ManagedSupportRequest, NewSupportRequest, Reply, SupportRequestDetail, SupportRequestService,
    SupportRequestStats, SupportRequestView,
};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupportRequest {
    pub topic: String,
    pub message: String,
    /// Must be one of the caller's orders. `0` or omitted means none.
    pub related_order_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub complete_request: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// New, Processing, Completed or Cancelled (any case)
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupportRequestResponse {
    pub id: i32,
    pub topic: String,
    pub message: String,
    pub status: RequestStatus,
    pub create_date: NaiveDateTime,
    pub client_id: i32,
    pub assigned_to_id: Option<i32>,
    pub related_order_id: Option<i32>,
    pub related_order_name: Option<String>,
    pub client: Option<PersonSummary>,
    pub manager: Option<PersonSummary>,
}

impl From<SupportRequestView> for SupportRequestResponse {
    fn from(view: SupportRequestView) -> Self {
        let request = view.request;
        Self {
            id: request.id,
            topic: request.topic,
            message: request.message,
            status: request.status,
            create_date: request.create_date,
            client_id: request.client_id,
            assigned_to_id: request.assigned_to_id,
            related_order_id: request.related_order_id,
            related_order_name: view.order_name,
            client: view.client.map(PersonSummary::from),
            manager: view.manager.map(PersonSummary::from),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedSupportRequestResponse {
    #[serde(flatten)]
    pub request: SupportRequestResponse,
    pub report_count: usize,
    pub last_report_date: Option<NaiveDateTime>,
}

impl From<ManagedSupportRequest> for ManagedSupportRequestResponse {
    fn from(row: ManagedSupportRequest) -> Self {
        Self {
            request: SupportRequestResponse::from(row.view),
            report_count: row.report_count,
            last_report_date: row.last_report_date,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupportRequestDetailResponse {
    pub request: SupportRequestResponse,
    pub related_order: Option<OrderResponse>,
    pub reports: Vec<ReportResponse>,
    pub last_response_date: Option<NaiveDateTime>,
    pub days_since_creation: f64,
}

impl From<SupportRequestDetail> for SupportRequestDetailResponse {
    fn from(detail: SupportRequestDetail) -> Self {
        Self {
            request: SupportRequestResponse::from(detail.view),
            related_order: detail.related_order.map(OrderResponse::from),
            reports: detail.reports.into_iter().map(ReportResponse::from).collect(),
            last_response_date: detail.last_response_date,
            days_since_creation: detail.days_since_creation,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupportRequestStatsResponse {
    pub total: u64,
    pub new: u64,
    pub processing: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub mine: u64,
    pub today: u64,
    pub without_response: u64,
}

impl From<SupportRequestStats> for SupportRequestStatsResponse {
    fn from(s: SupportRequestStats) -> Self {
        Self {
            total: s.total,
            new: s.new,
            processing: s.processing,
            completed: s.completed,
            cancelled: s.cancelled,
            mine: s.mine,
            today: s.today,
            without_response: s.without_response,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestStatusResponse {
    pub id: i32,
    pub status: RequestStatus,
    pub assigned_to_id: Option<i32>,
}

impl From<SupportRequestModel> for RequestStatusResponse {
    fn from(request: SupportRequestModel) -> Self {
        Self {
            id: request.id,
            status: request.status,
            assigned_to_id: request.assigned_to_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RespondResponse {
    pub report_id: i32,
    pub request_status: RequestStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkableOrder {
    pub id: i32,
    pub order_name: String,
    pub status: crate::models::OrderStatus,
    pub create_date: NaiveDateTime,
}

fn responses(views: Vec<SupportRequestView>) -> Vec<SupportRequestResponse> {
    views.into_iter().map(SupportRequestResponse::from).collect()
}

#[utoipa::path(
    post,
    path = "/api/SupportRequests/create",
    security(("jwt_token" = [])),
    request_body = CreateSupportRequest,
    responses(
        (status = 200, description = "Support request created", body = SupportRequestResponse),
        (status = 400, description = "Validation error or foreign order", body = AppError),
    ),
    tag = "support-requests"
)]
pub async fn create_support_request(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Json(payload): Json<CreateSupportRequest>,
) -> AppResult<impl IntoResponse> {
    let request = SupportRequestService::new(db)
        .create(
            &ctx,
            NewSupportRequest {
                topic: payload.topic,
                message: payload.message,
                related_order_id: payload.related_order_id,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        SupportRequestResponse::from(request),
        "Support request created",
    ))
}

#[utoipa::path(
    get,
    path = "/api/SupportRequests/my",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "The caller's support requests", body = Vec<SupportRequestResponse>),
    ),
    tag = "support-requests"
)]
pub async fn my_support_requests(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let requests = SupportRequestService::new(db)
        .my_requests(ctx.user_id)
        .await?;
    Ok(Json(responses(requests)))
}

#[utoipa::path(
    get,
    path = "/api/SupportRequests/my-orders",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Orders the caller can link a request to", body = Vec<LinkableOrder>),
    ),
    tag = "support-requests"
)]
pub async fn my_linkable_orders(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let orders = SupportRequestService::new(db).my_orders(ctx.user_id).await?;
    Ok(Json(
        orders
            .into_iter()
            .map(|o| LinkableOrder {
                id: o.id,
                order_name: o.order_name,
                status: o.status,
                create_date: o.create_date,
            })
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/SupportRequests/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Support request ID")),
    responses(
        (status = 200, description = "Support request", body = SupportRequestResponse),
        (status = 403, description = "Not your request", body = AppError),
        (status = 404, description = "Support request not found", body = AppError),
    ),
    tag = "support-requests"
)]
pub async fn get_support_request(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let request = SupportRequestService::new(db).get(&ctx, id).await?;
    Ok(Json(SupportRequestResponse::from(request)))
}

#[utoipa::path(
    get,
    path = "/api/SupportRequests",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All support requests, newest first", body = Vec<SupportRequestResponse>),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "support-requests"
)]
pub async fn list_support_requests(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let requests = SupportRequestService::new(db).list(&ctx).await?;
    Ok(Json(responses(requests)))
}

#[utoipa::path(
    get,
    path = "/api/SupportRequests/manager",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Queue with response activity", body = Vec<ManagedSupportRequestResponse>),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "support-requests"
)]
pub async fn manager_support_requests(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let rows = SupportRequestService::new(db).list_for_managers(&ctx).await?;
    Ok(Json(
        rows.into_iter()
            .map(ManagedSupportRequestResponse::from)
            .collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/SupportRequests/manager/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Support request counters", body = SupportRequestStatsResponse),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "support-requests"
)]
pub async fn support_request_stats(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let stats = SupportRequestService::new(db).stats(&ctx).await?;
    Ok(Json(SupportRequestStatsResponse::from(stats)))
}

#[utoipa::path(
    get,
    path = "/api/SupportRequests/manager/detail/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Support request ID")),
    responses(
        (status = 200, description = "Request with its order and replies", body = SupportRequestDetailResponse),
        (status = 403, description = "Not assigned to you", body = AppError),
        (status = 404, description = "Support request not found", body = AppError),
    ),
    tag = "support-requests"
)]
pub async fn support_request_detail(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let detail = SupportRequestService::new(db).detail(&ctx, id).await?;
    Ok(Json(SupportRequestDetailResponse::from(detail)))
}

#[utoipa::path(
    put,
    path = "/api/SupportRequests/manager/assign/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Support request ID")),
    responses(
        (status = 200, description = "Assigned to the caller", body = RequestStatusResponse),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Support request not found", body = AppError),
    ),
    tag = "support-requests"
)]
pub async fn assign_support_request(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let request = SupportRequestService::new(db)
        .assign_to_self(&ctx, id)
        .await?;
    Ok(ApiResponse::with_message(
        RequestStatusResponse::from(request),
        "Support request assigned",
    ))
}

#[utoipa::path(
    post,
    path = "/api/SupportRequests/manager/respond/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Support request ID")),
    request_body = RespondRequest,
    responses(
        (status = 200, description = "Reply filed", body = RespondResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Not assigned to you", body = AppError),
        (status = 404, description = "Support request not found", body = AppError),
    ),
    tag = "support-requests"
)]
pub async fn respond_support_request(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Json(payload): Json<RespondRequest>,
) -> AppResult<impl IntoResponse> {
    let (report, request_status) = SupportRequestService::new(db)
        .respond(
            &ctx,
            id,
            Reply {
                title: payload.title,
                content: payload.content,
                complete_request: payload.complete_request,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        RespondResponse {
            report_id: report.id,
            request_status,
        },
        "Response sent",
    ))
}

#[utoipa::path(
    put,
    path = "/api/SupportRequests/manager/status/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Support request ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = RequestStatusResponse),
        (status = 400, description = "Unknown status", body = AppError),
        (status = 403, description = "Not assigned to you", body = AppError),
        (status = 404, description = "Support request not found", body = AppError),
    ),
    tag = "support-requests"
)]
pub async fn update_support_request_status(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    let status = payload
        .status
        .parse::<RequestStatus>()
        .map_err(AppError::Validation)?;

    let request = SupportRequestService::new(db)
        .set_status(&ctx, id, status)
        .await?;
    Ok(ApiResponse::with_message(
        RequestStatusResponse::from(request),
        "Status updated",
    ))
}
