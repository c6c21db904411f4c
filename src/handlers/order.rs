use super::report::ReportResponse;
use super::user::PersonSummary;
use super::{optional_cents, parse_optional};
use crate::error::{AppError, AppResult};
use crate::middleware::RequestContext;
use crate::models::{OrderModel, OrderStatus, Priority, RequestStatus, UserModel};
use crate::response::ApiResponse;
use crate::services::lifecycle::{AssigneeChange, OrderUpdate};
use crate::services::order::{NewOrder, OrderDetail, OrderService, OrderStats, OrderWithPeople};
use crate::utils::amount_from_cents;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use chrono::NaiveDateTime;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub order_name: String,
    pub description: String,
    pub cost: Option<f64>,
    /// Low, Medium or High. Defaults to Medium.
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminCreateOrderRequest {
    pub client_id: i32,
    pub order_name: String,
    pub description: String,
    pub cost: Option<f64>,
    pub priority: Option<String>,
}

/// Every field is optional; omitted fields keep their value.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub order_name: Option<String>,
    pub description: Option<String>,
    pub cost: Option<f64>,
    pub status: Option<String>,
    pub priority: Option<String>,
    /// `0` removes the assignee.
    pub assigned_to_id: Option<i32>,
}

impl UpdateOrderRequest {
    fn into_update(self) -> AppResult<OrderUpdate> {
        Ok(OrderUpdate {
            order_name: self.order_name,
            description: self.description,
            cost_cents: optional_cents(self.cost)?,
            status: parse_optional(self.status.as_deref())?,
            priority: parse_optional(self.priority.as_deref())?,
            assignee: self.assigned_to_id.map(AssigneeChange::from_wire),
        })
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ManagerOrdersQuery {
    /// `me` narrows the list to orders assigned to the caller.
    pub assigned: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i32,
    pub order_name: String,
    pub description: String,
    pub cost: Option<f64>,
    pub status: OrderStatus,
    pub priority: Priority,
    pub create_date: NaiveDateTime,
    pub complete_date: Option<NaiveDateTime>,
    pub client_id: i32,
    pub assigned_to_id: Option<i32>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub manager_name: Option<String>,
    pub manager_email: Option<String>,
    pub manager_phone: Option<String>,
}

fn contact(user: Option<&UserModel>) -> (Option<String>, Option<String>, Option<String>) {
    match user {
        Some(u) => (Some(u.name.clone()), u.email.clone(), u.phone.clone()),
        None => (None, None, None),
    }
}

impl OrderResponse {
    fn new(order: OrderModel, client: Option<&UserModel>, manager: Option<&UserModel>) -> Self {
        let (client_name, client_email, client_phone) = contact(client);
        let (manager_name, manager_email, manager_phone) = contact(manager);
        Self {
            id: order.id,
            order_name: order.order_name,
            description: order.description,
            cost: order.cost_cents.map(amount_from_cents),
            status: order.status,
            priority: order.priority,
            create_date: order.create_date,
            complete_date: order.complete_date,
            client_id: order.client_id,
            assigned_to_id: order.assigned_to_id,
            client_name,
            client_email,
            client_phone,
            manager_name,
            manager_email,
            manager_phone,
        }
    }
}

impl From<OrderWithPeople> for OrderResponse {
    fn from(view: OrderWithPeople) -> Self {
        OrderResponse::new(view.order, view.client.as_ref(), view.manager.as_ref())
    }
}

impl From<OrderModel> for OrderResponse {
    fn from(order: OrderModel) -> Self {
        OrderResponse::new(order, None, None)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentResponse {
    pub order_id: i32,
    pub assigned_to_id: Option<i32>,
    pub status: OrderStatus,
}

impl From<&OrderModel> for AssignmentResponse {
    fn from(order: &OrderModel) -> Self {
        Self {
            order_id: order.id,
            assigned_to_id: order.assigned_to_id,
            status: order.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUnassignResponse {
    pub order_id: i32,
    pub status: OrderStatus,
    pub complete_date: Option<NaiveDateTime>,
    pub old_manager: Option<PersonSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkedServiceRequest {
    pub id: i32,
    pub service_type: String,
    pub description: String,
    pub cost: Option<f64>,
    pub status: RequestStatus,
    pub create_date: NaiveDateTime,
    pub client_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinkedSupportRequest {
    pub id: i32,
    pub topic: String,
    pub message: String,
    pub status: RequestStatus,
    pub create_date: NaiveDateTime,
    pub client_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatisticsResponse {
    pub service_request_count: usize,
    pub support_request_count: usize,
    pub report_count: usize,
    pub total_time_in_days: f64,
    pub active_service_requests: usize,
    pub active_support_requests: usize,
    pub total_service_cost: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub client: Option<PersonSummary>,
    pub manager: Option<PersonSummary>,
    pub service_requests: Vec<LinkedServiceRequest>,
    pub support_requests: Vec<LinkedSupportRequest>,
    pub reports: Vec<ReportResponse>,
    pub statistics: OrderStatisticsResponse,
}

impl From<OrderDetail> for OrderDetailResponse {
    fn from(detail: OrderDetail) -> Self {
        let client = detail.order.client.clone().map(PersonSummary::from);
        let manager = detail.order.manager.clone().map(PersonSummary::from);
        let stats = detail.statistics;

        Self {
            order: OrderResponse::from(detail.order),
            client,
            manager,
            service_requests: detail
                .service_requests
                .into_iter()
                .map(|(r, client)| LinkedServiceRequest {
                    id: r.id,
                    service_type: r.service_type,
                    description: r.description,
                    cost: r.cost_cents.map(amount_from_cents),
                    status: r.status,
                    create_date: r.create_date,
                    client_name: client.map(|c| c.name),
                })
                .collect(),
            support_requests: detail
                .support_requests
                .into_iter()
                .map(|(r, client)| LinkedSupportRequest {
                    id: r.id,
                    topic: r.topic,
                    message: r.message,
                    status: r.status,
                    create_date: r.create_date,
                    client_name: client.map(|c| c.name),
                })
                .collect(),
            reports: detail.reports.into_iter().map(ReportResponse::from).collect(),
            statistics: OrderStatisticsResponse {
                service_request_count: stats.service_request_count,
                support_request_count: stats.support_request_count,
                report_count: stats.report_count,
                total_time_in_days: stats.total_time_in_days,
                active_service_requests: stats.active_service_requests,
                active_support_requests: stats.active_support_requests,
                total_service_cost: amount_from_cents(stats.total_service_cost_cents),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatsResponse {
    pub total: u64,
    pub new: u64,
    pub processing: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub mine: u64,
    pub high_priority: u64,
    pub today: u64,
}

impl From<OrderStats> for OrderStatsResponse {
    fn from(s: OrderStats) -> Self {
        Self {
            total: s.total,
            new: s.new,
            processing: s.processing,
            completed: s.completed,
            cancelled: s.cancelled,
            mine: s.mine,
            high_priority: s.high_priority,
            today: s.today,
        }
    }
}

fn new_order(
    order_name: String,
    description: String,
    cost: Option<f64>,
    priority: Option<&str>,
) -> AppResult<NewOrder> {
    Ok(NewOrder {
        order_name,
        description,
        cost_cents: optional_cents(cost)?,
        priority: parse_optional(priority)?.unwrap_or(Priority::Medium),
    })
}

fn responses(views: Vec<OrderWithPeople>) -> Vec<OrderResponse> {
    views.into_iter().map(OrderResponse::from).collect()
}

#[utoipa::path(
    post,
    path = "/api/Orders/create",
    security(("jwt_token" = [])),
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = OrderResponse),
        (status = 400, description = "Validation error", body = AppError),
    ),
    tag = "orders"
)]
pub async fn create_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let new_order = new_order(
        payload.order_name,
        payload.description,
        payload.cost,
        payload.priority.as_deref(),
    )?;

    let order = OrderService::new(db).create(ctx.user_id, new_order).await?;
    Ok(ApiResponse::with_message(
        OrderResponse::from(order),
        "Order created",
    ))
}

#[utoipa::path(
    get,
    path = "/api/Orders/my",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "The caller's orders, newest first", body = Vec<OrderResponse>),
    ),
    tag = "orders"
)]
pub async fn my_orders(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let orders = OrderService::new(db).my_orders(ctx.user_id).await?;
    Ok(Json(responses(orders)))
}

#[utoipa::path(
    get,
    path = "/api/Orders/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order", body = OrderResponse),
        (status = 403, description = "Not your order", body = AppError),
        (status = 404, description = "Order not found", body = AppError),
    ),
    tag = "orders"
)]
pub async fn get_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let order = OrderService::new(db).get(&ctx, id).await?;
    Ok(Json(OrderResponse::from(order)))
}

#[utoipa::path(
    get,
    path = "/api/Orders",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "All orders, newest first", body = Vec<OrderResponse>),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let orders = OrderService::new(db).list(&ctx, None).await?;
    Ok(Json(responses(orders)))
}

#[utoipa::path(
    get,
    path = "/api/Orders/manager",
    security(("jwt_token" = [])),
    params(ManagerOrdersQuery),
    responses(
        (status = 200, description = "Order queue, newest first", body = Vec<OrderResponse>),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "orders"
)]
pub async fn manager_orders(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Query(query): Query<ManagerOrdersQuery>,
) -> AppResult<impl IntoResponse> {
    let assigned_to = match query.assigned.as_deref() {
        Some(value) if value.eq_ignore_ascii_case("me") => Some(ctx.user_id),
        _ => None,
    };

    let orders = OrderService::new(db).list(&ctx, assigned_to).await?;
    Ok(Json(responses(orders)))
}

#[utoipa::path(
    get,
    path = "/api/Orders/manager/detail/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with linked records and statistics", body = OrderDetailResponse),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Order not found", body = AppError),
    ),
    tag = "orders"
)]
pub async fn order_detail(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let detail = OrderService::new(db).detail(&ctx, id).await?;
    Ok(Json(OrderDetailResponse::from(detail)))
}

#[utoipa::path(
    get,
    path = "/api/Orders/manager/stats",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Order counters", body = OrderStatsResponse),
        (status = 403, description = "Staff only", body = AppError),
    ),
    tag = "orders"
)]
pub async fn order_stats(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
) -> AppResult<impl IntoResponse> {
    let stats = OrderService::new(db).stats(&ctx).await?;
    Ok(Json(OrderStatsResponse::from(stats)))
}

#[utoipa::path(
    put,
    path = "/api/Orders/manager/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Validation error or bad assignee", body = AppError),
        (status = 403, description = "Not assigned to you", body = AppError),
        (status = 404, description = "Order not found", body = AppError),
    ),
    tag = "orders"
)]
pub async fn manager_update_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let update = payload.into_update()?;
    let order = OrderService::new(db)
        .update_as_manager(&ctx, id, update)
        .await?;
    Ok(ApiResponse::with_message(
        OrderResponse::from(order),
        "Order updated",
    ))
}

#[utoipa::path(
    put,
    path = "/api/Orders/manager/assign/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order assigned to the caller", body = AssignmentResponse),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Order not found", body = AppError),
    ),
    tag = "orders"
)]
pub async fn assign_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let order = OrderService::new(db).assign_to_self(&ctx, id).await?;
    Ok(ApiResponse::with_message(
        AssignmentResponse::from(&order),
        "Order assigned",
    ))
}

#[utoipa::path(
    put,
    path = "/api/Orders/manager/unassign/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order returned to the queue", body = AssignmentResponse),
        (status = 400, description = "Not yours, or already closed", body = AppError),
        (status = 403, description = "Staff only", body = AppError),
        (status = 404, description = "Order not found", body = AppError),
    ),
    tag = "orders"
)]
pub async fn unassign_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let order = OrderService::new(db).unassign_by_manager(&ctx, id).await?;
    Ok(ApiResponse::with_message(
        AssignmentResponse::from(&order),
        "Order unassigned",
    ))
}

#[utoipa::path(
    put,
    path = "/api/Orders/admin/unassign/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Manager removed", body = AdminUnassignResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Order not found", body = AppError),
    ),
    tag = "orders"
)]
pub async fn admin_unassign_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let (order, old_manager) = OrderService::new(db).unassign_by_admin(&ctx, id).await?;
    Ok(ApiResponse::with_message(
        AdminUnassignResponse {
            order_id: order.id,
            status: order.status,
            complete_date: order.complete_date,
            old_manager: old_manager.map(PersonSummary::from),
        },
        "Manager removed from order",
    ))
}

#[utoipa::path(
    post,
    path = "/api/Orders",
    security(("jwt_token" = [])),
    request_body = AdminCreateOrderRequest,
    responses(
        (status = 200, description = "Order created", body = OrderResponse),
        (status = 400, description = "Validation error or unknown client", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "orders"
)]
pub async fn admin_create_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Json(payload): Json<AdminCreateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let new_order = new_order(
        payload.order_name,
        payload.description,
        payload.cost,
        payload.priority.as_deref(),
    )?;

    let order = OrderService::new(db)
        .create_for_client(&ctx, payload.client_id, new_order)
        .await?;
    Ok(ApiResponse::with_message(
        OrderResponse::from(order),
        "Order created",
    ))
}

#[utoipa::path(
    put,
    path = "/api/Orders/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderResponse),
        (status = 400, description = "Validation error or bad assignee", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Order not found", body = AppError),
    ),
    tag = "orders"
)]
pub async fn admin_update_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<impl IntoResponse> {
    let update = payload.into_update()?;
    let order = OrderService::new(db).update_as_admin(&ctx, id, update).await?;
    Ok(ApiResponse::with_message(
        OrderResponse::from(order),
        "Order updated",
    ))
}

#[utoipa::path(
    delete,
    path = "/api/Orders/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order deleted"),
        (status = 400, description = "Order is still referenced", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Order not found", body = AppError),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    Extension(db): Extension<DatabaseConnection>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    OrderService::new(db).delete(&ctx, id).await?;
    Ok(ApiResponse::message("Order deleted"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_maps_wire_values() {
        let update = UpdateOrderRequest {
            status: Some("completed".to_string()),
            priority: Some("HIGH".to_string()),
            cost: Some(99.99),
            assigned_to_id: Some(0),
            ..Default::default()
        }
        .into_update()
        .unwrap();

        assert_eq!(update.status, Some(OrderStatus::Completed));
        assert_eq!(update.priority, Some(Priority::High));
        assert_eq!(update.cost_cents, Some(9_999));
        assert_eq!(update.assignee, Some(AssigneeChange::Clear));
        assert_eq!(update.order_name, None);
    }

    #[test]
    fn unknown_status_is_a_validation_error() {
        let err = UpdateOrderRequest {
            status: Some("Shipped".to_string()),
            ..Default::default()
        }
        .into_update()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn priority_defaults_to_medium() {
        let order = new_order("Laptop Repair".into(), "Fan".into(), None, None).unwrap();
        assert_eq!(order.priority, Priority::Medium);
        assert!(new_order("X".into(), "Y".into(), None, Some("Urgent")).is_err());
    }
}
