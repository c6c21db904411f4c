use super::lifecycle::{self, AssigneeChange, OrderUpdate};
use super::{load_users, start_of_today};
use crate::{
    error::{AppError, AppResult},
    middleware::{ensure, Action, RequestContext, Target},
    models::{order, report, service_request, support_request, Order, OrderModel, OrderStatus,
        Priority, Report, ReportModel, ServiceRequest, ServiceRequestModel, SupportRequest,
        SupportRequestModel, UserModel},
    utils::required_text,
    utils::text::{BODY_MAX, NAME_MAX},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

const ENTITY: &str = "Order";

pub struct NewOrder {
    pub order_name: String,
    pub description: String,
    pub cost_cents: Option<i64>,
    pub priority: Priority,
}

/// An order together with the people it names.
#[derive(Debug, Clone)]
pub struct OrderWithPeople {
    pub order: OrderModel,
    pub client: Option<UserModel>,
    pub manager: Option<UserModel>,
}

pub struct OrderDetail {
    pub order: OrderWithPeople,
    pub service_requests: Vec<(ServiceRequestModel, Option<UserModel>)>,
    pub support_requests: Vec<(SupportRequestModel, Option<UserModel>)>,
    pub reports: Vec<(ReportModel, Option<UserModel>)>,
    pub statistics: OrderStatistics,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatistics {
    pub service_request_count: usize,
    pub support_request_count: usize,
    pub report_count: usize,
    /// Zero while the order is open.
    pub total_time_in_days: f64,
    pub active_service_requests: usize,
    pub active_support_requests: usize,
    pub total_service_cost_cents: i64,
}

impl OrderStatistics {
    fn compute(
        order: &OrderModel,
        service_requests: &[ServiceRequestModel],
        support_requests: &[SupportRequestModel],
        report_count: usize,
    ) -> Self {
        let total_time_in_days = order
            .complete_date
            .map(|done| (done - order.create_date).num_seconds() as f64 / 86_400.0)
            .unwrap_or(0.0);

        Self {
            service_request_count: service_requests.len(),
            support_request_count: support_requests.len(),
            report_count,
            total_time_in_days,
            active_service_requests: service_requests.iter().filter(|r| r.status.is_open()).count(),
            active_support_requests: support_requests.iter().filter(|r| r.status.is_open()).count(),
            total_service_cost_cents: service_requests.iter().filter_map(|r| r.cost_cents).sum(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderStats {
    pub total: u64,
    pub new: u64,
    pub processing: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub mine: u64,
    pub high_priority: u64,
    pub today: u64,
}

pub struct OrderService {
    db: DatabaseConnection,
}

impl OrderService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(&self, client_id: i32, new_order: NewOrder) -> AppResult<OrderModel> {
        let order_name = required_text("Order name", &new_order.order_name, NAME_MAX)?;
        let description = required_text("Description", &new_order.description, BODY_MAX)?;
        let now = chrono::Utc::now().naive_utc();

        let active = order::ActiveModel {
            order_name: sea_orm::ActiveValue::Set(order_name),
            description: sea_orm::ActiveValue::Set(description),
            cost_cents: sea_orm::ActiveValue::Set(new_order.cost_cents),
            status: sea_orm::ActiveValue::Set(OrderStatus::New),
            priority: sea_orm::ActiveValue::Set(new_order.priority),
            create_date: sea_orm::ActiveValue::Set(now),
            complete_date: sea_orm::ActiveValue::Set(None),
            client_id: sea_orm::ActiveValue::Set(client_id),
            assigned_to_id: sea_orm::ActiveValue::Set(None),
            ..Default::default()
        };

        let order = active.insert(&self.db).await.inspect_err(|e| {
            tracing::error!(client_id, "Failed to insert order: {e}");
        })?;
        tracing::info!(order_id = order.id, client_id, "Order created");
        Ok(order)
    }

    /// Admin entry point: create an order on behalf of an existing client.
    pub async fn create_for_client(
        &self,
        ctx: &RequestContext,
        client_id: i32,
        new_order: NewOrder,
    ) -> AppResult<OrderModel> {
        ensure(ctx, None, Action::Administer, ENTITY)?;

        if load_users(&self.db, [client_id]).await?.is_empty() {
            return Err(AppError::validation("Client not found"));
        }
        self.create(client_id, new_order).await
    }

    pub async fn my_orders(&self, client_id: i32) -> AppResult<Vec<OrderWithPeople>> {
        let orders = Order::find()
            .filter(order::Column::ClientId.eq(client_id))
            .order_by_desc(order::Column::CreateDate)
            .order_by_desc(order::Column::Id)
            .all(&self.db)
            .await?;
        self.with_people(orders).await
    }

    /// Every order, newest first. `assigned_to` narrows to one manager's queue.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        assigned_to: Option<i32>,
    ) -> AppResult<Vec<OrderWithPeople>> {
        ensure(ctx, None, Action::Browse, ENTITY)?;

        let mut query = Order::find();
        if let Some(manager_id) = assigned_to {
            query = query.filter(order::Column::AssignedToId.eq(manager_id));
        }
        let orders = query
            .order_by_desc(order::Column::CreateDate)
            .order_by_desc(order::Column::Id)
            .all(&self.db)
            .await?;
        self.with_people(orders).await
    }

    pub async fn get(&self, ctx: &RequestContext, id: i32) -> AppResult<OrderWithPeople> {
        let order = self.find(id).await?;
        ensure(ctx, order.as_ref().map(target), Action::View, ENTITY)?;
        let order = order.ok_or(AppError::NotFound(ENTITY))?;

        let mut views = self.with_people(vec![order]).await?;
        views.pop().ok_or(AppError::NotFound(ENTITY))
    }

    pub async fn detail(&self, ctx: &RequestContext, id: i32) -> AppResult<OrderDetail> {
        ensure(ctx, None, Action::Browse, ENTITY)?;
        let order = self.find(id).await?.ok_or(AppError::NotFound(ENTITY))?;

        let service_requests = ServiceRequest::find()
            .filter(service_request::Column::OrderId.eq(id))
            .order_by_desc(service_request::Column::CreateDate)
            .all(&self.db)
            .await?;
        let support_requests = SupportRequest::find()
            .filter(support_request::Column::RelatedOrderId.eq(id))
            .order_by_desc(support_request::Column::CreateDate)
            .all(&self.db)
            .await?;
        let reports = Report::find()
            .filter(report::Column::OrderId.eq(id))
            .order_by_desc(report::Column::CreateDate)
            .all(&self.db)
            .await?;

        let statistics =
            OrderStatistics::compute(&order, &service_requests, &support_requests, reports.len());

        let people = load_users(
            &self.db,
            [Some(order.client_id), order.assigned_to_id]
                .into_iter()
                .flatten()
                .chain(service_requests.iter().map(|r| r.client_id))
                .chain(support_requests.iter().map(|r| r.client_id))
                .chain(reports.iter().map(|r| r.created_by_id)),
        )
        .await?;

        Ok(OrderDetail {
            order: OrderWithPeople {
                client: people.get(&order.client_id).cloned(),
                manager: order.assigned_to_id.and_then(|m| people.get(&m).cloned()),
                order,
            },
            service_requests: service_requests
                .into_iter()
                .map(|r| {
                    let client = people.get(&r.client_id).cloned();
                    (r, client)
                })
                .collect(),
            support_requests: support_requests
                .into_iter()
                .map(|r| {
                    let client = people.get(&r.client_id).cloned();
                    (r, client)
                })
                .collect(),
            reports: reports
                .into_iter()
                .map(|r| {
                    let author = people.get(&r.created_by_id).cloned();
                    (r, author)
                })
                .collect(),
            statistics,
        })
    }

    pub async fn stats(&self, ctx: &RequestContext) -> AppResult<OrderStats> {
        ensure(ctx, None, Action::Browse, ENTITY)?;

        let count_status = |status: OrderStatus| {
            Order::find()
                .filter(order::Column::Status.eq(status))
                .count(&self.db)
        };

        Ok(OrderStats {
            total: Order::find().count(&self.db).await?,
            new: count_status(OrderStatus::New).await?,
            processing: count_status(OrderStatus::Processing).await?,
            completed: count_status(OrderStatus::Completed).await?,
            cancelled: count_status(OrderStatus::Cancelled).await?,
            mine: Order::find()
                .filter(order::Column::AssignedToId.eq(ctx.user_id))
                .count(&self.db)
                .await?,
            high_priority: Order::find()
                .filter(order::Column::Priority.eq(Priority::High))
                .count(&self.db)
                .await?,
            today: Order::find()
                .filter(order::Column::CreateDate.gte(start_of_today()))
                .count(&self.db)
                .await?,
        })
    }

    /// Edit as the order's handler (assigned manager or admin).
    pub async fn update_as_manager(
        &self,
        ctx: &RequestContext,
        id: i32,
        update: OrderUpdate,
    ) -> AppResult<OrderWithPeople> {
        let existing = self.find(id).await?;
        ensure(ctx, existing.as_ref().map(target), Action::Handle, ENTITY)?;
        self.apply(existing, update).await
    }

    pub async fn update_as_admin(
        &self,
        ctx: &RequestContext,
        id: i32,
        update: OrderUpdate,
    ) -> AppResult<OrderWithPeople> {
        ensure(ctx, None, Action::Administer, ENTITY)?;
        let existing = self.find(id).await?;
        self.apply(existing, update).await
    }

    async fn apply(
        &self,
        existing: Option<OrderModel>,
        update: OrderUpdate,
    ) -> AppResult<OrderWithPeople> {
        let existing = existing.ok_or(AppError::NotFound(ENTITY))?;
        if let Some(AssigneeChange::To(manager_id)) = update.assignee {
            self.ensure_staff(manager_id).await?;
        }

        let mut updated = existing.clone();
        lifecycle::apply_update(&mut updated, update, chrono::Utc::now().naive_utc())?;
        let saved = self.save(existing, updated).await?;

        let mut views = self.with_people(vec![saved]).await?;
        views.pop().ok_or(AppError::NotFound(ENTITY))
    }

    pub async fn assign_to_self(&self, ctx: &RequestContext, id: i32) -> AppResult<OrderModel> {
        ensure(ctx, None, Action::Claim, ENTITY)?;
        let existing = self.find(id).await?.ok_or(AppError::NotFound(ENTITY))?;

        let mut updated = existing.clone();
        lifecycle::assign_to_self(&mut updated, ctx.user_id);
        let saved = self.save(existing, updated).await?;

        tracing::info!(order_id = id, manager_id = ctx.user_id, "Order assigned");
        Ok(saved)
    }

    pub async fn unassign_by_manager(&self, ctx: &RequestContext, id: i32) -> AppResult<OrderModel> {
        ensure(ctx, None, Action::Claim, ENTITY)?;
        let existing = self.find(id).await?.ok_or(AppError::NotFound(ENTITY))?;

        let mut updated = existing.clone();
        lifecycle::unassign_by_manager(&mut updated, ctx.user_id)?;
        let saved = self.save(existing, updated).await?;

        tracing::info!(order_id = id, manager_id = ctx.user_id, "Order given back");
        Ok(saved)
    }

    /// Returns the saved order and the manager who was removed, if any.
    pub async fn unassign_by_admin(
        &self,
        ctx: &RequestContext,
        id: i32,
    ) -> AppResult<(OrderModel, Option<UserModel>)> {
        ensure(ctx, None, Action::Administer, ENTITY)?;
        let existing = self.find(id).await?.ok_or(AppError::NotFound(ENTITY))?;

        let mut updated = existing.clone();
        let previous = lifecycle::unassign_by_admin(&mut updated);
        let saved = self.save(existing, updated).await?;

        let previous_manager = match previous {
            Some(manager_id) => load_users(&self.db, [manager_id]).await?.remove(&manager_id),
            None => None,
        };
        tracing::info!(order_id = id, previous_manager = ?previous, "Manager removed from order");
        Ok((saved, previous_manager))
    }

    pub async fn delete(&self, ctx: &RequestContext, id: i32) -> AppResult<()> {
        ensure(ctx, None, Action::Administer, ENTITY)?;
        self.find(id).await?.ok_or(AppError::NotFound(ENTITY))?;

        let linked = ServiceRequest::find()
            .filter(service_request::Column::OrderId.eq(id))
            .count(&self.db)
            .await?
            + SupportRequest::find()
                .filter(support_request::Column::RelatedOrderId.eq(id))
                .count(&self.db)
                .await?
            + Report::find()
                .filter(report::Column::OrderId.eq(id))
                .count(&self.db)
                .await?;
        if linked > 0 {
            return Err(AppError::validation(
                "Order cannot be deleted while requests or reports reference it",
            ));
        }

        Order::delete_by_id(id)
            .exec(&self.db)
            .await
            .inspect_err(|e| tracing::error!(order_id = id, "Failed to delete order: {e}"))?;
        tracing::info!(order_id = id, "Order deleted");
        Ok(())
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<OrderModel>> {
        Ok(Order::find_by_id(id).one(&self.db).await?)
    }

    async fn ensure_staff(&self, user_id: i32) -> AppResult<()> {
        let user = load_users(&self.db, [user_id]).await?.remove(&user_id);
        match user {
            None => Err(AppError::validation("Assigned manager not found")),
            Some(user) if !user.role.is_staff() => Err(AppError::validation(
                "Orders can only be assigned to managers or admins",
            )),
            Some(_) => Ok(()),
        }
    }

    /// Persist every mutable column of `updated` over `existing`.
    async fn save(&self, existing: OrderModel, updated: OrderModel) -> AppResult<OrderModel> {
        let id = existing.id;
        let mut active: order::ActiveModel = existing.into();
        active.order_name = sea_orm::ActiveValue::Set(updated.order_name);
        active.description = sea_orm::ActiveValue::Set(updated.description);
        active.cost_cents = sea_orm::ActiveValue::Set(updated.cost_cents);
        active.status = sea_orm::ActiveValue::Set(updated.status);
        active.priority = sea_orm::ActiveValue::Set(updated.priority);
        active.complete_date = sea_orm::ActiveValue::Set(updated.complete_date);
        active.assigned_to_id = sea_orm::ActiveValue::Set(updated.assigned_to_id);

        let saved = active.update(&self.db).await.inspect_err(|e| {
            tracing::error!(order_id = id, "Failed to update order: {e}");
        })?;
        Ok(saved)
    }

    async fn with_people(&self, orders: Vec<OrderModel>) -> AppResult<Vec<OrderWithPeople>> {
        let people = load_users(
            &self.db,
            orders
                .iter()
                .flat_map(|o| [Some(o.client_id), o.assigned_to_id])
                .flatten(),
        )
        .await?;

        Ok(orders
            .into_iter()
            .map(|order| OrderWithPeople {
                client: people.get(&order.client_id).cloned(),
                manager: order.assigned_to_id.and_then(|m| people.get(&m).cloned()),
                order,
            })
            .collect())
    }
}

fn target(order: &OrderModel) -> Target {
    Target::new(order.client_id, order.assigned_to_id)
}
