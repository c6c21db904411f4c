use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let api = api_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    Router::new().nest("/api", auth.merge(api))
}

/// Credential endpoints: register and login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/Auth/register", routing::post(handlers::auth::register))
        .route("/Auth/login", routing::post(handlers::auth::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Everything that needs a bearer token.
fn api_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route(
            "/Auth/change-password",
            routing::post(handlers::auth::change_password),
        )
        .route("/Auth/check", routing::get(handlers::auth::check))
        // Users
        .route(
            "/Users",
            routing::get(handlers::user::list_users).post(handlers::user::create_user),
        )
        .route("/Users/me", routing::get(handlers::user::get_me))
        .route(
            "/Users/{id}",
            routing::get(handlers::user::get_user)
                .put(handlers::user::update_user)
                .delete(handlers::user::delete_user),
        )
        .route(
            "/Users/{id}/role",
            routing::put(handlers::user::update_user_role),
        )
        // Orders
        .route(
            "/Orders",
            routing::get(handlers::order::list_orders).post(handlers::order::admin_create_order),
        )
        .route("/Orders/create", routing::post(handlers::order::create_order))
        .route("/Orders/my", routing::get(handlers::order::my_orders))
        .route(
            "/Orders/manager",
            routing::get(handlers::order::manager_orders),
        )
        .route(
            "/Orders/manager/stats",
            routing::get(handlers::order::order_stats),
        )
        .route(
            "/Orders/manager/detail/{id}",
            routing::get(handlers::order::order_detail),
        )
        .route(
            "/Orders/manager/assign/{id}",
            routing::put(handlers::order::assign_order),
        )
        .route(
            "/Orders/manager/unassign/{id}",
            routing::put(handlers::order::unassign_order),
        )
        .route(
            "/Orders/manager/{id}",
            routing::put(handlers::order::manager_update_order),
        )
        .route(
            "/Orders/admin/unassign/{id}",
            routing::put(handlers::order::admin_unassign_order),
        )
        .route(
            "/Orders/{id}",
            routing::get(handlers::order::get_order)
                .put(handlers::order::admin_update_order)
                .delete(handlers::order::delete_order),
        )
        // Support requests
        .route(
            "/SupportRequests",
            routing::get(handlers::support_request::list_support_requests),
        )
        .route(
            "/SupportRequests/create",
            routing::post(handlers::support_request::create_support_request),
        )
        .route(
            "/SupportRequests/my",
            routing::get(handlers::support_request::my_support_requests),
        )
        .route(
            "/SupportRequests/my-orders",
            routing::get(handlers::support_request::my_linkable_orders),
        )
        .route(
            "/SupportRequests/manager",
            routing::get(handlers::support_request::manager_support_requests),
        )
        .route(
            "/SupportRequests/manager/stats",
            routing::get(handlers::support_request::support_request_stats),
        )
        .route(
            "/SupportRequests/manager/detail/{id}",
            routing::get(handlers::support_request::support_request_detail),
        )
        .route(
            "/SupportRequests/manager/assign/{id}",
            routing::put(handlers::support_request::assign_support_request),
        )
        .route(
            "/SupportRequests/manager/respond/{id}",
            routing::post(handlers::support_request::respond_support_request),
        )
        .route(
            "/SupportRequests/manager/status/{id}",
            routing::put(handlers::support_request::update_support_request_status),
        )
        .route(
            "/SupportRequests/{id}",
            routing::get(handlers::support_request::get_support_request),
        )
        // Service requests
        .route(
            "/ServiceRequests",
            routing::get(handlers::service_request::list_service_requests),
        )
        .route(
            "/ServiceRequests/create",
            routing::post(handlers::service_request::create_service_request),
        )
        .route(
            "/ServiceRequests/my",
            routing::get(handlers::service_request::my_service_requests),
        )
        .route(
            "/ServiceRequests/manager/assign/{id}",
            routing::put(handlers::service_request::assign_service_request),
        )
        .route(
            "/ServiceRequests/manager/status/{id}",
            routing::put(handlers::service_request::update_service_request_status),
        )
        .route(
            "/ServiceRequests/{id}",
            routing::get(handlers::service_request::get_service_request),
        )
        // Reports
        .route(
            "/Reports/create",
            routing::post(handlers::report::create_report),
        )
        .route(
            "/Reports/order/{order_id}",
            routing::get(handlers::report::reports_for_order),
        )
        .route(
            "/Reports/support-request/{id}",
            routing::get(handlers::report::reports_for_support_request),
        );

    with_optional_rate_limit(router, config.enabled, config.api)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    match GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    {
        Some(governor_conf) => router.layer(GovernorLayer::new(governor_conf)),
        None => {
            tracing::warn!(?rule, "Invalid rate limit rule, serving without a limit");
            router
        }
    }
}
