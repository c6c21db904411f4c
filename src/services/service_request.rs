use super::lifecycle::claimed_request_status;
use super::load_users;
use crate::{
    error::{AppError, AppResult},
    middleware::{ensure, Action, RequestContext, Target},
    models::{order, service_request, Order, RequestStatus, ServiceRequest, ServiceRequestModel,
        UserModel},
    utils::required_text,
    utils::text::{BODY_MAX, NAME_MAX},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

const ENTITY: &str = "Service request";

pub struct NewServiceRequest {
    pub service_type: String,
    pub description: String,
    pub cost_cents: Option<i64>,
    pub order_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct ServiceRequestView {
    pub request: ServiceRequestModel,
    pub client: Option<UserModel>,
    pub manager: Option<UserModel>,
}

pub struct ServiceRequestService {
    db: DatabaseConnection,
}

impl ServiceRequestService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        new_request: NewServiceRequest,
    ) -> AppResult<ServiceRequestModel> {
        let service_type = required_text("Service type", &new_request.service_type, NAME_MAX)?;
        let description = required_text("Description", &new_request.description, BODY_MAX)?;

        let order_id = new_request.order_id.filter(|id| *id > 0);
        if let Some(order_id) = order_id {
            let owned = Order::find_by_id(order_id)
                .filter(order::Column::ClientId.eq(ctx.user_id))
                .one(&self.db)
                .await?;
            if owned.is_none() {
                return Err(AppError::validation(
                    "The order was not found or does not belong to you",
                ));
            }
        }

        let active = service_request::ActiveModel {
            service_type: sea_orm::ActiveValue::Set(service_type),
            description: sea_orm::ActiveValue::Set(description),
            cost_cents: sea_orm::ActiveValue::Set(new_request.cost_cents),
            status: sea_orm::ActiveValue::Set(RequestStatus::New),
            create_date: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
            client_id: sea_orm::ActiveValue::Set(ctx.user_id),
            assigned_to_id: sea_orm::ActiveValue::Set(None),
            order_id: sea_orm::ActiveValue::Set(order_id),
            ..Default::default()
        };

        let request = active.insert(&self.db).await.inspect_err(|e| {
            tracing::error!(client_id = ctx.user_id, "Failed to insert service request: {e}");
        })?;
        tracing::info!(service_request_id = request.id, client_id = ctx.user_id, "Service request created");
        Ok(request)
    }

    pub async fn my_requests(&self, client_id: i32) -> AppResult<Vec<ServiceRequestView>> {
        let requests = ServiceRequest::find()
            .filter(service_request::Column::ClientId.eq(client_id))
            .order_by_desc(service_request::Column::CreateDate)
            .order_by_desc(service_request::Column::Id)
            .all(&self.db)
            .await?;
        self.views(requests).await
    }

    pub async fn get(&self, ctx: &RequestContext, id: i32) -> AppResult<ServiceRequestView> {
        let request = self.find(id).await?;
        ensure(ctx, request.as_ref().map(target), Action::View, ENTITY)?;
        let request = request.ok_or(AppError::NotFound(ENTITY))?;

        let mut views = self.views(vec![request]).await?;
        views.pop().ok_or(AppError::NotFound(ENTITY))
    }

    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<ServiceRequestView>> {
        ensure(ctx, None, Action::Browse, ENTITY)?;
        let requests = ServiceRequest::find()
            .order_by_desc(service_request::Column::CreateDate)
            .order_by_desc(service_request::Column::Id)
            .all(&self.db)
            .await?;
        self.views(requests).await
    }

    pub async fn assign_to_self(
        &self,
        ctx: &RequestContext,
        id: i32,
    ) -> AppResult<ServiceRequestModel> {
        ensure(ctx, None, Action::Claim, ENTITY)?;
        let existing = self.find(id).await?.ok_or(AppError::NotFound(ENTITY))?;

        let status = claimed_request_status(existing.status);
        let mut active: service_request::ActiveModel = existing.into();
        active.assigned_to_id = sea_orm::ActiveValue::Set(Some(ctx.user_id));
        active.status = sea_orm::ActiveValue::Set(status);

        let saved = active.update(&self.db).await.inspect_err(|e| {
            tracing::error!(service_request_id = id, "Failed to assign service request: {e}");
        })?;
        tracing::info!(service_request_id = id, manager_id = ctx.user_id, "Service request assigned");
        Ok(saved)
    }

    pub async fn set_status(
        &self,
        ctx: &RequestContext,
        id: i32,
        status: RequestStatus,
    ) -> AppResult<ServiceRequestModel> {
        let existing = self.find(id).await?;
        ensure(ctx, existing.as_ref().map(target), Action::Handle, ENTITY)?;
        let existing = existing.ok_or(AppError::NotFound(ENTITY))?;

        let mut active: service_request::ActiveModel = existing.into();
        active.status = sea_orm::ActiveValue::Set(status);
        let saved = active.update(&self.db).await.inspect_err(|e| {
            tracing::error!(service_request_id = id, "Failed to update service request status: {e}");
        })?;
        Ok(saved)
    }

    async fn find(&self, id: i32) -> AppResult<Option<ServiceRequestModel>> {
        Ok(ServiceRequest::find_by_id(id).one(&self.db).await?)
    }

    async fn views(&self, requests: Vec<ServiceRequestModel>) -> AppResult<Vec<ServiceRequestView>> {
        let people = load_users(
            &self.db,
            requests
                .iter()
                .flat_map(|r| [Some(r.client_id), r.assigned_to_id])
                .flatten(),
        )
        .await?;

        Ok(requests
            .into_iter()
            .map(|request| ServiceRequestView {
                client: people.get(&request.client_id).cloned(),
                manager: request.assigned_to_id.and_then(|m| people.get(&m).cloned()),
                request,
            })
            .collect())
    }
}

fn target(request: &ServiceRequestModel) -> Target {
    Target::new(request.client_id, request.assigned_to_id)
}
