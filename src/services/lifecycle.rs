//! Status transitions for orders and requests.
//!
//! Every function here works on an in-memory model and keeps
//! `complete_date.is_some() == (status == Completed)` for orders.

use crate::error::{AppError, AppResult};
use crate::models::{OrderModel, OrderStatus, Priority, RequestStatus};
use crate::utils::text::{required_text, BODY_MAX, NAME_MAX};
use chrono::NaiveDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeChange {
    Clear,
    To(i32),
}

impl AssigneeChange {
    /// `0` is the wire value for "nobody".
    pub fn from_wire(id: i32) -> Self {
        if id == 0 {
            AssigneeChange::Clear
        } else {
            AssigneeChange::To(id)
        }
    }
}

/// Partial order edit. Absent fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct OrderUpdate {
    pub order_name: Option<String>,
    pub description: Option<String>,
    pub cost_cents: Option<i64>,
    pub status: Option<OrderStatus>,
    pub priority: Option<Priority>,
    pub assignee: Option<AssigneeChange>,
}

pub fn assign_to_self(order: &mut OrderModel, manager_id: i32) {
    order.assigned_to_id = Some(manager_id);
    if order.status == OrderStatus::New {
        order.status = OrderStatus::Processing;
    }
}

/// A manager gives an open order back to the queue.
pub fn unassign_by_manager(order: &mut OrderModel, manager_id: i32) -> AppResult<()> {
    if order.assigned_to_id != Some(manager_id) {
        return Err(AppError::validation("This order is not assigned to you"));
    }
    if order.status.is_closed() {
        return Err(AppError::validation(
            "A completed or cancelled order cannot be given back",
        ));
    }

    order.assigned_to_id = None;
    order.status = OrderStatus::New;
    order.complete_date = None;
    Ok(())
}

/// Returns the previous assignee.
pub fn unassign_by_admin(order: &mut OrderModel) -> Option<i32> {
    let previous = order.assigned_to_id.take();
    if order.status == OrderStatus::Processing {
        order.status = OrderStatus::New;
    }
    // A completed order keeps its completion date.
    if order.status != OrderStatus::Completed {
        order.complete_date = None;
    }
    previous
}

/// Apply a partial edit. Nothing is changed when validation fails.
pub fn apply_update(order: &mut OrderModel, update: OrderUpdate, now: NaiveDateTime) -> AppResult<()> {
    let order_name = update
        .order_name
        .map(|name| required_text("Order name", &name, NAME_MAX))
        .transpose()?;
    let description = update
        .description
        .map(|text| required_text("Description", &text, BODY_MAX))
        .transpose()?;

    if let Some(name) = order_name {
        order.order_name = name;
    }
    if let Some(description) = description {
        order.description = description;
    }
    if let Some(cost) = update.cost_cents {
        order.cost_cents = Some(cost);
    }
    if let Some(status) = update.status {
        set_order_status(order, status, now);
    }
    if let Some(priority) = update.priority {
        order.priority = priority;
    }
    match update.assignee {
        Some(AssigneeChange::Clear) => order.assigned_to_id = None,
        Some(AssigneeChange::To(id)) => order.assigned_to_id = Some(id),
        None => {}
    }
    Ok(())
}

fn set_order_status(order: &mut OrderModel, status: OrderStatus, now: NaiveDateTime) {
    order.status = status;
    if status == OrderStatus::Completed {
        order.complete_date.get_or_insert(now);
    } else {
        order.complete_date = None;
    }
}

/// Status a request moves to when a manager claims it.
pub fn claimed_request_status(status: RequestStatus) -> RequestStatus {
    match status {
        RequestStatus::New => RequestStatus::Processing,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    const CLIENT: i32 = 1;
    const MANAGER: i32 = 10;

    fn now() -> NaiveDateTime {
        Utc::now().naive_utc()
    }

    fn order(status: OrderStatus, assignee: Option<i32>) -> OrderModel {
        OrderModel {
            id: 7,
            order_name: "Laptop Repair".to_string(),
            description: "Screen flickers".to_string(),
            cost_cents: None,
            status,
            priority: Priority::Medium,
            create_date: now() - Duration::days(2),
            complete_date: (status == OrderStatus::Completed).then(now),
            client_id: CLIENT,
            assigned_to_id: assignee,
        }
    }

    fn holds_invariant(order: &OrderModel) -> bool {
        order.complete_date.is_some() == (order.status == OrderStatus::Completed)
    }

    #[test]
    fn assigning_a_new_order_starts_processing() {
        let mut o = order(OrderStatus::New, None);
        assign_to_self(&mut o, MANAGER);
        assert_eq!(o.status, OrderStatus::Processing);
        assert_eq!(o.assigned_to_id, Some(MANAGER));
    }

    #[test]
    fn assigning_keeps_later_statuses() {
        let mut o = order(OrderStatus::Completed, Some(99));
        assign_to_self(&mut o, MANAGER);
        assert_eq!(o.status, OrderStatus::Completed);
        assert_eq!(o.assigned_to_id, Some(MANAGER));
        assert!(holds_invariant(&o));
    }

    #[test]
    fn manager_gives_back_own_open_order() {
        let mut o = order(OrderStatus::Processing, Some(MANAGER));
        unassign_by_manager(&mut o, MANAGER).unwrap();
        assert_eq!(o.assigned_to_id, None);
        assert_eq!(o.status, OrderStatus::New);
        assert!(holds_invariant(&o));
    }

    #[test]
    fn manager_cannot_give_back_someone_elses_order() {
        let mut o = order(OrderStatus::Processing, Some(MANAGER + 1));
        let err = unassign_by_manager(&mut o, MANAGER).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(o.assigned_to_id, Some(MANAGER + 1));
    }

    #[test]
    fn manager_cannot_give_back_closed_orders() {
        for status in [OrderStatus::Completed, OrderStatus::Cancelled] {
            let mut o = order(status, Some(MANAGER));
            assert!(unassign_by_manager(&mut o, MANAGER).is_err());
            assert_eq!(o.status, status);
        }
    }

    #[test]
    fn admin_unassign_resets_processing_only() {
        let mut processing = order(OrderStatus::Processing, Some(MANAGER));
        assert_eq!(unassign_by_admin(&mut processing), Some(MANAGER));
        assert_eq!(processing.status, OrderStatus::New);
        assert_eq!(processing.assigned_to_id, None);

        let mut cancelled = order(OrderStatus::Cancelled, Some(MANAGER));
        unassign_by_admin(&mut cancelled);
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(cancelled.assigned_to_id, None);
    }

    #[test]
    fn admin_unassign_keeps_completion_date_of_completed_order() {
        let mut o = order(OrderStatus::Completed, Some(MANAGER));
        unassign_by_admin(&mut o);
        assert_eq!(o.status, OrderStatus::Completed);
        assert!(o.complete_date.is_some());
        assert!(holds_invariant(&o));
    }

    #[test]
    fn completing_sets_completion_date_once() {
        let mut o = order(OrderStatus::Processing, Some(MANAGER));
        let at = now();
        apply_update(
            &mut o,
            OrderUpdate {
                status: Some(OrderStatus::Completed),
                ..Default::default()
            },
            at,
        )
        .unwrap();
        assert_eq!(o.complete_date, Some(at));

        apply_update(
            &mut o,
            OrderUpdate {
                status: Some(OrderStatus::Completed),
                ..Default::default()
            },
            at + Duration::hours(1),
        )
        .unwrap();
        assert_eq!(o.complete_date, Some(at));
    }

    #[test]
    fn leaving_completed_clears_completion_date() {
        let mut o = order(OrderStatus::Completed, Some(MANAGER));
        apply_update(
            &mut o,
            OrderUpdate {
                status: Some(OrderStatus::Processing),
                ..Default::default()
            },
            now(),
        )
        .unwrap();
        assert_eq!(o.complete_date, None);
    }

    #[test]
    fn invariant_holds_for_every_status_sequence() {
        let statuses = [
            OrderStatus::New,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ];
        for first in statuses {
            for second in statuses {
                let mut o = order(OrderStatus::New, Some(MANAGER));
                for status in [first, second] {
                    apply_update(
                        &mut o,
                        OrderUpdate {
                            status: Some(status),
                            ..Default::default()
                        },
                        now(),
                    )
                    .unwrap();
                    assert!(holds_invariant(&o), "{first} -> {second}");
                }
            }
        }
    }

    #[test]
    fn update_trims_text_and_changes_fields() {
        let mut o = order(OrderStatus::Processing, Some(MANAGER));
        apply_update(
            &mut o,
            OrderUpdate {
                order_name: Some("  Desktop Repair ".to_string()),
                cost_cents: Some(15_000),
                priority: Some(Priority::High),
                assignee: Some(AssigneeChange::Clear),
                ..Default::default()
            },
            now(),
        )
        .unwrap();
        assert_eq!(o.order_name, "Desktop Repair");
        assert_eq!(o.description, "Screen flickers");
        assert_eq!(o.cost_cents, Some(15_000));
        assert_eq!(o.priority, Priority::High);
        assert_eq!(o.assigned_to_id, None);
    }

    #[test]
    fn rejected_update_changes_nothing() {
        let mut o = order(OrderStatus::Processing, Some(MANAGER));
        let before = o.clone();
        let err = apply_update(
            &mut o,
            OrderUpdate {
                order_name: Some("Fine".to_string()),
                description: Some("   ".to_string()),
                status: Some(OrderStatus::Completed),
                ..Default::default()
            },
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(o, before);
    }

    #[test]
    fn overlong_name_is_rejected() {
        let mut o = order(OrderStatus::New, None);
        let result = apply_update(
            &mut o,
            OrderUpdate {
                order_name: Some("x".repeat(251)),
                ..Default::default()
            },
            now(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn wire_zero_clears_assignee() {
        assert_eq!(AssigneeChange::from_wire(0), AssigneeChange::Clear);
        assert_eq!(AssigneeChange::from_wire(12), AssigneeChange::To(12));
    }

    #[test]
    fn claiming_a_request_starts_processing() {
        assert_eq!(claimed_request_status(RequestStatus::New), RequestStatus::Processing);
        assert_eq!(claimed_request_status(RequestStatus::Completed), RequestStatus::Completed);
    }
}
