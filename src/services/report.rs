use super::load_users;
use crate::{
    error::{AppError, AppResult},
    middleware::{ensure, Action, RequestContext, Target},
    models::{report, support_request, Order, Report, ReportModel, RequestStatus, ServiceRequest,
        SupportRequest, UserModel},
    utils::required_text,
    utils::text::{BODY_MAX, NAME_MAX},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};

const ENTITY: &str = "Report";

#[derive(Debug, Clone, Default)]
pub struct NewReport {
    pub title: String,
    pub content: String,
    pub order_id: Option<i32>,
    pub service_request_id: Option<i32>,
    pub support_request_id: Option<i32>,
    /// Complete the linked support request in the same transaction.
    pub complete_request: bool,
}

/// A report and the staff member who wrote it.
pub type ReportWithAuthor = (ReportModel, Option<UserModel>);

pub struct ReportService {
    db: DatabaseConnection,
}

impl ReportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        new_report: NewReport,
    ) -> AppResult<(ReportWithAuthor, Option<RequestStatus>)> {
        ensure(ctx, None, Action::Browse, ENTITY)?;

        let title = required_text("Title", &new_report.title, NAME_MAX)?;
        let content = required_text("Content", &new_report.content, BODY_MAX)?;

        // Zero or negative ids mean "not linked".
        let new_report = NewReport {
            order_id: new_report.order_id.filter(|id| *id > 0),
            service_request_id: new_report.service_request_id.filter(|id| *id > 0),
            support_request_id: new_report.support_request_id.filter(|id| *id > 0),
            ..new_report
        };

        if let Some(order_id) = new_report.order_id {
            if Order::find_by_id(order_id).one(&self.db).await?.is_none() {
                return Err(AppError::validation("Linked order not found"));
            }
        }
        if let Some(request_id) = new_report.service_request_id {
            if ServiceRequest::find_by_id(request_id).one(&self.db).await?.is_none() {
                return Err(AppError::validation("Linked service request not found"));
            }
        }

        let support_request = match new_report.support_request_id {
            Some(request_id) => {
                let request = SupportRequest::find_by_id(request_id)
                    .one(&self.db)
                    .await?
                    .ok_or_else(|| AppError::validation("Linked support request not found"))?;
                ensure(
                    ctx,
                    Some(Target::new(request.client_id, request.assigned_to_id)),
                    Action::Handle,
                    "Support request",
                )?;
                Some(request)
            }
            None => None,
        };

        let txn = self.db.begin().await?;

        let report = insert_report(
            &txn,
            ctx.user_id,
            ReportLinks {
                // An explicit order wins over the request's related order.
                order_id: new_report
                    .order_id
                    .or(support_request.as_ref().and_then(|r| r.related_order_id)),
                service_request_id: new_report.service_request_id,
                support_request_id: new_report.support_request_id,
            },
            title,
            content,
        )
        .await?;

        let new_status = match support_request {
            Some(request) if new_report.complete_request => {
                Some(complete_support_request(&txn, request).await?)
            }
            Some(request) => Some(request.status),
            None => None,
        };

        txn.commit().await?;

        let author = load_users(&self.db, [ctx.user_id]).await?.remove(&ctx.user_id);
        Ok(((report, author), new_status))
    }

    /// Reports on one order, newest first. The caller must be able to view the order.
    pub async fn for_order(
        &self,
        ctx: &RequestContext,
        order_id: i32,
    ) -> AppResult<Vec<ReportWithAuthor>> {
        let order = Order::find_by_id(order_id).one(&self.db).await?;
        ensure(
            ctx,
            order.map(|o| Target::new(o.client_id, o.assigned_to_id)),
            Action::View,
            "Order",
        )?;

        self.list_where(report::Column::OrderId.eq(order_id)).await
    }

    pub async fn for_support_request(
        &self,
        ctx: &RequestContext,
        request_id: i32,
    ) -> AppResult<Vec<ReportWithAuthor>> {
        let request = SupportRequest::find_by_id(request_id).one(&self.db).await?;
        ensure(
            ctx,
            request.map(|r| Target::new(r.client_id, r.assigned_to_id)),
            Action::View,
            "Support request",
        )?;

        self.list_where(report::Column::SupportRequestId.eq(request_id))
            .await
    }

    async fn list_where(
        &self,
        condition: sea_orm::sea_query::SimpleExpr,
    ) -> AppResult<Vec<ReportWithAuthor>> {
        let reports = Report::find()
            .filter(condition)
            .order_by_desc(report::Column::CreateDate)
            .order_by_desc(report::Column::Id)
            .all(&self.db)
            .await?;
        with_authors(&self.db, reports).await
    }
}

pub(crate) struct ReportLinks {
    pub order_id: Option<i32>,
    pub service_request_id: Option<i32>,
    pub support_request_id: Option<i32>,
}

/// Insert an already validated report.
pub(crate) async fn insert_report<C: ConnectionTrait>(
    conn: &C,
    author_id: i32,
    links: ReportLinks,
    title: String,
    content: String,
) -> AppResult<ReportModel> {
    let active = report::ActiveModel {
        title: sea_orm::ActiveValue::Set(title),
        content: sea_orm::ActiveValue::Set(content),
        create_date: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
        created_by_id: sea_orm::ActiveValue::Set(author_id),
        order_id: sea_orm::ActiveValue::Set(links.order_id),
        service_request_id: sea_orm::ActiveValue::Set(links.service_request_id),
        support_request_id: sea_orm::ActiveValue::Set(links.support_request_id),
        ..Default::default()
    };

    let report = active.insert(conn).await.inspect_err(|e| {
        tracing::error!(author_id, "Failed to insert report: {e}");
    })?;
    tracing::info!(report_id = report.id, author_id, "Report created");
    Ok(report)
}

pub(crate) async fn complete_support_request<C: ConnectionTrait>(
    conn: &C,
    request: crate::models::SupportRequestModel,
) -> AppResult<RequestStatus> {
    let id = request.id;
    let mut active: support_request::ActiveModel = request.into();
    active.status = sea_orm::ActiveValue::Set(RequestStatus::Completed);
    active.update(conn).await.inspect_err(|e| {
        tracing::error!(support_request_id = id, "Failed to complete support request: {e}");
    })?;
    Ok(RequestStatus::Completed)
}

pub(crate) async fn with_authors(
    db: &DatabaseConnection,
    reports: Vec<ReportModel>,
) -> AppResult<Vec<ReportWithAuthor>> {
    let authors = load_users(db, reports.iter().map(|r| r.created_by_id)).await?;
    Ok(reports
        .into_iter()
        .map(|r| {
            let author = authors.get(&r.created_by_id).cloned();
            (r, author)
        })
        .collect())
}
