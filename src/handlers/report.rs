use crate::error::{AppError, AppResult};
use crate::middleware::RequestContext;
use crate::models::{ReportModel, RequestStatus, UserModel};
use crate::response::ApiResponse;
use crate::services::report::{NewReport, ReportService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    #[validate(length(min = 1, max = 3500))]
    pub content: String,
    pub order_id: Option<i32>,
    pub service_request_id: Option<i32>,
    pub support_request_id: Option<i32>,
    /// Complete the linked support request
    #[serde(default)]
    pub complete_request: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub create_date: NaiveDateTime,
    pub created_by_id: i32,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub order_id: Option<i32>,
    pub service_request_id: Option<i32>,
    pub support_request_id: Option<i32>,
}

impl From<(ReportModel, Option<UserModel>)> for ReportResponse {
    fn from((report, author): (ReportModel, Option<UserModel>)) -> Self {
        let (author_name, author_email) = match author {
            Some(author) => (Some(author.name), author.email),
            None => (None, None),
        };
        Self {
            id: report.id,
            title: report.title,
            content: report.content,
            create_date: report.create_date,
            created_by_id: report.created_by_id,
            author_name,
            author_email,
            order_id: report.order_id,
            service_request_id: report.service_request_id,
            support_request_id: report.support_request_id,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedReportResponse {
    pub report: ReportResponse,
    /// Status of the linked support request after the report was filed
    pub support_request_status: Option<RequestStatus>,
}

#[utoipa::path(
    post,
    path = "/api/Reports/create",
    security(("jwt_token" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Report created", body = CreatedReportResponse),
        (status = 400, description = "Validation error or unknown linked record", body = AppError),
        (status = 403, description = "Staff only, and the support request must be yours", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload.validate()?;

    let (report, support_request_status) = ReportService::new(db)
        .create(
            &ctx,
            NewReport {
                title: payload.title,
                content: payload.content,
                order_id: payload.order_id,
                service_request_id: payload.service_request_id,
                support_request_id: payload.support_request_id,
                complete_request: payload.complete_request,
            },
        )
        .await?;

    Ok(ApiResponse::with_message(
        CreatedReportResponse {
            report: ReportResponse::from(report),
            support_request_status,
        },
        "Report created",
    ))
}

#[utoipa::path(
    get,
    path = "/api/Reports/order/{orderId}",
    security(("jwt_token" = [])),
    params(("orderId" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Reports on the order, newest first", body = Vec<ReportResponse>),
        (status = 403, description = "Not your order", body = AppError),
        (status = 404, description = "Order not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn reports_for_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(order_id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let reports = ReportService::new(db).for_order(&ctx, order_id).await?;
    Ok(Json(
        reports.into_iter().map(ReportResponse::from).collect::<Vec<_>>(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/Reports/support-request/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Support request ID")),
    responses(
        (status = 200, description = "Reports on the support request, newest first", body = Vec<ReportResponse>),
        (status = 403, description = "Not your support request", body = AppError),
        (status = 404, description = "Support request not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn reports_for_support_request(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let reports = ReportService::new(db)
        .for_support_request(&ctx, id)
        .await?;
    Ok(Json(
        reports.into_iter().map(ReportResponse::from).collect::<Vec<_>>(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, content: &str) -> CreateReportRequest {
        CreateReportRequest {
            title: title.to_string(),
            content: content.to_string(),
            order_id: None,
            service_request_id: None,
            support_request_id: None,
            complete_request: false,
        }
    }

    #[test]
    fn payload_lengths_are_bounded() {
        assert!(request("Diagnosis", "Fan worn").validate().is_ok());
        assert!(request("", "Fan worn").validate().is_err());
        assert!(request(&"t".repeat(251), "Fan worn").validate().is_err());
        assert!(request("Diagnosis", &"c".repeat(3501)).validate().is_err());
    }
}
