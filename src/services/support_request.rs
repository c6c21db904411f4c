use super::lifecycle::claimed_request_status;
use super::report::{complete_support_request, insert_report, with_authors, ReportLinks, ReportWithAuthor};
use super::{load_users, start_of_today};
use crate::{
    error::{AppError, AppResult},
    middleware::{ensure, Action, RequestContext, Target},
    models::{order, report, support_request, Order, OrderModel, Report, ReportModel,
        RequestStatus, SupportRequest, SupportRequestModel, UserModel},
    utils::required_text,
    utils::text::{BODY_MAX, NAME_MAX},
};
use chrono::NaiveDateTime;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::collections::HashMap;

const ENTITY: &str = "Support request";

pub struct NewSupportRequest {
    pub topic: String,
    pub message: String,
    pub related_order_id: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct SupportRequestView {
    pub request: SupportRequestModel,
    pub client: Option<UserModel>,
    pub manager: Option<UserModel>,
    pub order_name: Option<String>,
}

/// Queue row for staff, with response activity.
pub struct ManagedSupportRequest {
    pub view: SupportRequestView,
    pub report_count: usize,
    pub last_report_date: Option<NaiveDateTime>,
}

pub struct SupportRequestDetail {
    pub view: SupportRequestView,
    pub related_order: Option<OrderModel>,
    pub reports: Vec<ReportWithAuthor>,
    pub last_response_date: Option<NaiveDateTime>,
    pub days_since_creation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportRequestStats {
    pub total: u64,
    pub new: u64,
    pub processing: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub mine: u64,
    pub today: u64,
    pub without_response: u64,
}

pub struct Reply {
    pub title: String,
    pub content: String,
    pub complete_request: bool,
}

pub struct SupportRequestService {
    db: DatabaseConnection,
}

impl SupportRequestService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        new_request: NewSupportRequest,
    ) -> AppResult<SupportRequestView> {
        let topic = required_text("Topic", &new_request.topic, NAME_MAX)?;
        let message = required_text("Message", &new_request.message, BODY_MAX)?;

        // Non-positive ids mean "no order".
        let related_order_id = new_request.related_order_id.filter(|id| *id > 0);
        if let Some(order_id) = related_order_id {
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

        let active = support_request::ActiveModel {
            topic: sea_orm::ActiveValue::Set(topic),
            message: sea_orm::ActiveValue::Set(message),
            status: sea_orm::ActiveValue::Set(RequestStatus::New),
            create_date: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
            client_id: sea_orm::ActiveValue::Set(ctx.user_id),
            assigned_to_id: sea_orm::ActiveValue::Set(None),
            related_order_id: sea_orm::ActiveValue::Set(related_order_id),
            ..Default::default()
        };

        let request = active.insert(&self.db).await.inspect_err(|e| {
            tracing::error!(client_id = ctx.user_id, "Failed to insert support request: {e}");
        })?;
        tracing::info!(support_request_id = request.id, client_id = ctx.user_id, "Support request created");

        self.view_one(request).await
    }

    pub async fn my_requests(&self, client_id: i32) -> AppResult<Vec<SupportRequestView>> {
        let requests = SupportRequest::find()
            .filter(support_request::Column::ClientId.eq(client_id))
            .order_by_desc(support_request::Column::CreateDate)
            .order_by_desc(support_request::Column::Id)
            .all(&self.db)
            .await?;
        self.views(requests).await
    }

    /// The caller's orders, for linking a new request.
    pub async fn my_orders(&self, client_id: i32) -> AppResult<Vec<OrderModel>> {
        let orders = Order::find()
            .filter(order::Column::ClientId.eq(client_id))
            .order_by_desc(order::Column::CreateDate)
            .order_by_desc(order::Column::Id)
            .all(&self.db)
            .await?;
        Ok(orders)
    }

    pub async fn get(&self, ctx: &RequestContext, id: i32) -> AppResult<SupportRequestView> {
        let request = self.find(id).await?;
        ensure(ctx, request.as_ref().map(target), Action::View, ENTITY)?;
        self.view_one(request.ok_or(AppError::NotFound(ENTITY))?)
            .await
    }

    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<SupportRequestView>> {
        ensure(ctx, None, Action::Browse, ENTITY)?;
        let requests = self.all_newest_first().await?;
        self.views(requests).await
    }

    pub async fn list_for_managers(
        &self,
        ctx: &RequestContext,
    ) -> AppResult<Vec<ManagedSupportRequest>> {
        ensure(ctx, None, Action::Browse, ENTITY)?;
        let requests = self.all_newest_first().await?;

        let ids: Vec<i32> = requests.iter().map(|r| r.id).collect();
        let reports = if ids.is_empty() {
            Vec::new()
        } else {
            Report::find()
                .filter(report::Column::SupportRequestId.is_in(ids))
                .all(&self.db)
                .await?
        };
        let activity = response_activity(&reports);

        let views = self.views(requests).await?;
        Ok(views
            .into_iter()
            .map(|view| {
                let (report_count, last_report_date) =
                    activity.get(&view.request.id).copied().unwrap_or((0, None));
                ManagedSupportRequest {
                    view,
                    report_count,
                    last_report_date,
                }
            })
            .collect())
    }

    pub async fn detail(&self, ctx: &RequestContext, id: i32) -> AppResult<SupportRequestDetail> {
        let request = self.find(id).await?;
        ensure(ctx, request.as_ref().map(target), Action::Handle, ENTITY)?;
        let request = request.ok_or(AppError::NotFound(ENTITY))?;

        let related_order = match request.related_order_id {
            Some(order_id) => Order::find_by_id(order_id).one(&self.db).await?,
            None => None,
        };
        let reports = Report::find()
            .filter(report::Column::SupportRequestId.eq(id))
            .order_by_desc(report::Column::CreateDate)
            .order_by_desc(report::Column::Id)
            .all(&self.db)
            .await?;
        let last_response_date = reports.iter().map(|r| r.create_date).max();
        let reports = with_authors(&self.db, reports).await?;

        let days_since_creation = (chrono::Utc::now().naive_utc() - request.create_date)
            .num_seconds() as f64
            / 86_400.0;

        Ok(SupportRequestDetail {
            view: self.view_one(request).await?,
            related_order,
            reports,
            last_response_date,
            days_since_creation,
        })
    }

    pub async fn stats(&self, ctx: &RequestContext) -> AppResult<SupportRequestStats> {
        ensure(ctx, None, Action::Browse, ENTITY)?;

        let count_status = |status: RequestStatus| {
            SupportRequest::find()
                .filter(support_request::Column::Status.eq(status))
                .count(&self.db)
        };

        let new = count_status(RequestStatus::New).await?;
        let processing = count_status(RequestStatus::Processing).await?;

        Ok(SupportRequestStats {
            total: SupportRequest::find().count(&self.db).await?,
            new,
            processing,
            completed: count_status(RequestStatus::Completed).await?,
            cancelled: count_status(RequestStatus::Cancelled).await?,
            mine: SupportRequest::find()
                .filter(support_request::Column::AssignedToId.eq(ctx.user_id))
                .count(&self.db)
                .await?,
            today: SupportRequest::find()
                .filter(support_request::Column::CreateDate.gte(start_of_today()))
                .count(&self.db)
                .await?,
            without_response: new + processing,
        })
    }

    pub async fn assign_to_self(
        &self,
        ctx: &RequestContext,
        id: i32,
    ) -> AppResult<SupportRequestModel> {
        ensure(ctx, None, Action::Claim, ENTITY)?;
        let existing = self.find(id).await?.ok_or(AppError::NotFound(ENTITY))?;

        let status = claimed_request_status(existing.status);
        let mut active: support_request::ActiveModel = existing.into();
        active.assigned_to_id = sea_orm::ActiveValue::Set(Some(ctx.user_id));
        active.status = sea_orm::ActiveValue::Set(status);

        let saved = active.update(&self.db).await.inspect_err(|e| {
            tracing::error!(support_request_id = id, "Failed to assign support request: {e}");
        })?;
        tracing::info!(support_request_id = id, manager_id = ctx.user_id, "Support request assigned");
        Ok(saved)
    }

    /// Answer the request with a report, optionally closing it.
    pub async fn respond(
        &self,
        ctx: &RequestContext,
        id: i32,
        reply: Reply,
    ) -> AppResult<(ReportModel, RequestStatus)> {
        let request = self.find(id).await?;
        ensure(ctx, request.as_ref().map(target), Action::Handle, ENTITY)?;
        let request = request.ok_or(AppError::NotFound(ENTITY))?;

        let title = required_text("Title", &reply.title, NAME_MAX)?;
        let content = required_text("Content", &reply.content, BODY_MAX)?;

        let txn = self.db.begin().await?;
        let report = insert_report(
            &txn,
            ctx.user_id,
            ReportLinks {
                order_id: request.related_order_id,
                service_request_id: None,
                support_request_id: Some(id),
            },
            title,
            content,
        )
        .await?;
        let status = if reply.complete_request {
            complete_support_request(&txn, request).await?
        } else {
            request.status
        };
        txn.commit().await?;

        Ok((report, status))
    }

    pub async fn set_status(
        &self,
        ctx: &RequestContext,
        id: i32,
        status: RequestStatus,
    ) -> AppResult<SupportRequestModel> {
        let existing = self.find(id).await?;
        ensure(ctx, existing.as_ref().map(target), Action::Handle, ENTITY)?;
        let existing = existing.ok_or(AppError::NotFound(ENTITY))?;

        let mut active: support_request::ActiveModel = existing.into();
        active.status = sea_orm::ActiveValue::Set(status);
        let saved = active.update(&self.db).await.inspect_err(|e| {
            tracing::error!(support_request_id = id, "Failed to update support request status: {e}");
        })?;
        Ok(saved)
    }

    async fn find(&self, id: i32) -> AppResult<Option<SupportRequestModel>> {
        Ok(SupportRequest::find_by_id(id).one(&self.db).await?)
    }

    async fn all_newest_first(&self) -> AppResult<Vec<SupportRequestModel>> {
        let requests = SupportRequest::find()
            .order_by_desc(support_request::Column::CreateDate)
            .order_by_desc(support_request::Column::Id)
            .all(&self.db)
            .await?;
        Ok(requests)
    }

    async fn view_one(&self, request: SupportRequestModel) -> AppResult<SupportRequestView> {
        let mut views = self.views(vec![request]).await?;
        views.pop().ok_or(AppError::NotFound(ENTITY))
    }

    async fn views(&self, requests: Vec<SupportRequestModel>) -> AppResult<Vec<SupportRequestView>> {
        let people = load_users(
            &self.db,
            requests
                .iter()
                .flat_map(|r| [Some(r.client_id), r.assigned_to_id])
                .flatten(),
        )
        .await?;

        let order_ids: Vec<i32> = requests.iter().filter_map(|r| r.related_order_id).collect();
        let order_names: HashMap<i32, String> = if order_ids.is_empty() {
            HashMap::new()
        } else {
            Order::find()
                .filter(order::Column::Id.is_in(order_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|o| (o.id, o.order_name))
                .collect()
        };

        Ok(requests
            .into_iter()
            .map(|request| SupportRequestView {
                client: people.get(&request.client_id).cloned(),
                manager: request.assigned_to_id.and_then(|m| people.get(&m).cloned()),
                order_name: request
                    .related_order_id
                    .and_then(|o| order_names.get(&o).cloned()),
                request,
            })
            .collect())
    }
}

fn target(request: &SupportRequestModel) -> Target {
    Target::new(request.client_id, request.assigned_to_id)
}

/// Report count and latest report date per support request.
fn response_activity(reports: &[ReportModel]) -> HashMap<i32, (usize, Option<NaiveDateTime>)> {
    let mut activity: HashMap<i32, (usize, Option<NaiveDateTime>)> = HashMap::new();
    for report in reports {
        let Some(request_id) = report.support_request_id else {
            continue;
        };
        let entry = activity.entry(request_id).or_insert((0, None));
        entry.0 += 1;
        entry.1 = entry.1.max(Some(report.create_date));
    }
    activity
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn report(id: i32, support_request_id: Option<i32>, age: Duration) -> ReportModel {
        ReportModel {
            id,
            title: "Reply".to_string(),
            content: "We are on it".to_string(),
            create_date: Utc::now().naive_utc() - age,
            created_by_id: 10,
            order_id: None,
            service_request_id: None,
            support_request_id,
        }
    }

    #[test]
    fn activity_counts_reports_and_keeps_latest_date() {
        let reports = [
            report(1, Some(5), Duration::days(3)),
            report(2, Some(5), Duration::hours(1)),
            report(3, Some(6), Duration::days(1)),
            report(4, None, Duration::zero()),
        ];
        let activity = response_activity(&reports);

        assert_eq!(activity.len(), 2);
        assert_eq!(activity[&5].0, 2);
        assert_eq!(activity[&5].1, Some(reports[1].create_date));
        assert_eq!(activity[&6].0, 1);
    }
}
