use crate::handlers;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `jwt_token` bearer scheme referenced by protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt_token",
                SecurityScheme::Http(
                    Http::builder()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        // Auth
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::change_password,
        handlers::auth::check,
        // Users
        handlers::user::list_users,
        handlers::user::get_me,
        handlers::user::get_user,
        handlers::user::create_user,
        handlers::user::update_user,
        handlers::user::update_user_role,
        handlers::user::delete_user,
        // Orders
        handlers::order::create_order,
        handlers::order::my_orders,
        handlers::order::get_order,
        handlers::order::list_orders,
        handlers::order::manager_orders,
        handlers::order::order_detail,
        handlers::order::order_stats,
        handlers::order::manager_update_order,
        handlers::order::assign_order,
        handlers::order::unassign_order,
        handlers::order::admin_unassign_order,
        handlers::order::admin_create_order,
        handlers::order::admin_update_order,
        handlers::order::delete_order,
        // Support requests
        handlers::support_request::create_support_request,
        handlers::support_request::my_support_requests,
        handlers::support_request::my_linkable_orders,
        handlers::support_request::get_support_request,
        handlers::support_request::list_support_requests,
        handlers::support_request::manager_support_requests,
        handlers::support_request::support_request_stats,
        handlers::support_request::support_request_detail,
        handlers::support_request::assign_support_request,
        handlers::support_request::respond_support_request,
        handlers::support_request::update_support_request_status,
        // Service requests
        handlers::service_request::create_service_request,
        handlers::service_request::my_service_requests,
        handlers::service_request::get_service_request,
        handlers::service_request::list_service_requests,
        handlers::service_request::assign_service_request,
        handlers::service_request::update_service_request_status,
        // Reports
        handlers::report::create_report,
        handlers::report::reports_for_order,
        handlers::report::reports_for_support_request,
    ),
    components(
        schemas(
            crate::response::ApiResponse<serde_json::Value>,
            crate::error::AppError,
            crate::models::Role,
            crate::models::OrderStatus,
            crate::models::RequestStatus,
            crate::models::Priority,
            // Auth
            handlers::auth::RegisterRequest,
            handlers::auth::LoginRequest,
            handlers::auth::ChangePasswordRequest,
            handlers::auth::AuthResponse,
            handlers::auth::CheckResponse,
            // Users
            handlers::user::UserResponse,
            handlers::user::PersonSummary,
            handlers::user::CreateUserRequest,
            handlers::user::UpdateUserRequest,
            handlers::user::UpdateRoleRequest,
            // Orders
            handlers::order::CreateOrderRequest,
            handlers::order::AdminCreateOrderRequest,
            handlers::order::UpdateOrderRequest,
            handlers::order::OrderResponse,
            handlers::order::AssignmentResponse,
            handlers::order::AdminUnassignResponse,
            handlers::order::OrderDetailResponse,
            handlers::order::LinkedServiceRequest,
            handlers::order::LinkedSupportRequest,
            handlers::order::OrderStatisticsResponse,
            handlers::order::OrderStatsResponse,
            // Support requests
            handlers::support_request::CreateSupportRequest,
            handlers::support_request::RespondRequest,
            handlers::support_request::UpdateStatusRequest,
            handlers::support_request::SupportRequestResponse,
            handlers::support_request::ManagedSupportRequestResponse,
            handlers::support_request::SupportRequestDetailResponse,
            handlers::support_request::SupportRequestStatsResponse,
            handlers::support_request::RequestStatusResponse,
            handlers::support_request::RespondResponse,
            handlers::support_request::LinkableOrder,
            // Service requests
            handlers::service_request::CreateServiceRequest,
            handlers::service_request::ServiceRequestResponse,
            // Reports
            handlers::report::CreateReportRequest,
            handlers::report::ReportResponse,
            handlers::report::CreatedReportResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness and database reachability"),
        (name = "auth", description = "Registration, login and token checks"),
        (name = "users", description = "User accounts and roles"),
        (name = "orders", description = "Client orders and the manager queue"),
        (name = "support-requests", description = "Support tickets and replies"),
        (name = "service-requests", description = "Service work attached to orders"),
        (name = "reports", description = "Staff reports on orders and requests"),
    )
)]
pub struct ApiDoc;
