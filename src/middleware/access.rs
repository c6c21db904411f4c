//! Role and ownership decisions, kept free of I/O so every rule is unit tested.

use super::auth::RequestContext;
use crate::error::{AppError, AppResult};
use crate::models::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Staff-only work not tied to one record: listings, statistics, authoring reports.
    Browse,
    /// Read a single record.
    View,
    /// Assign a record to oneself.
    Claim,
    /// Act on a record as its handler.
    Handle,
    Administer,
}

/// Ownership facts of the record being acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub owner_id: i32,
    pub assignee_id: Option<i32>,
}

impl Target {
    pub fn new(owner_id: i32, assignee_id: Option<i32>) -> Self {
        Self {
            owner_id,
            assignee_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Forbid,
    NotFound,
}

impl Decision {
    /// `entity` names the record in the 404 message.
    pub fn into_result(self, entity: &'static str) -> AppResult<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Forbid => Err(AppError::Forbidden),
            Decision::NotFound => Err(AppError::NotFound(entity)),
        }
    }
}

/// `target` is the looked-up record for `View` and `Handle`; `None` there
/// means the record does not exist. Role-only actions ignore it.
pub fn authorize(ctx: &RequestContext, target: Option<Target>, action: Action) -> Decision {
    match action {
        Action::Browse | Action::Claim if ctx.role.is_staff() => Decision::Allow,
        Action::Browse => Decision::Forbid,
        Action::Administer if ctx.role == Role::Admin => Decision::Allow,
        Action::Administer => Decision::Forbid,
        Action::Claim => Decision::Forbid,
        Action::View | Action::Handle => {
            let Some(target) = target else {
                return Decision::NotFound;
            };
            if allows_record(ctx, target, action) {
                Decision::Allow
            } else {
                Decision::Forbid
            }
        }
    }
}

fn allows_record(ctx: &RequestContext, target: Target, action: Action) -> bool {
    match (ctx.role, action) {
        (Role::Admin, _) => true,
        (Role::Manager, Action::View) => true,
        (Role::Manager, _) => target.assignee_id == Some(ctx.user_id),
        (Role::User, Action::View) => target.owner_id == ctx.user_id,
        (Role::User, _) => false,
    }
}

/// Shorthand for record actions: `authorize` then map the decision to an error.
pub fn ensure(
    ctx: &RequestContext,
    target: Option<Target>,
    action: Action,
    entity: &'static str,
) -> AppResult<()> {
    authorize(ctx, target, action).into_result(entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(user_id: i32, role: Role) -> RequestContext {
        RequestContext {
            user_id,
            name: format!("user{user_id}"),
            role,
        }
    }

    const CLIENT: i32 = 1;
    const OTHER_CLIENT: i32 = 2;
    const MANAGER: i32 = 10;
    const OTHER_MANAGER: i32 = 11;
    const ADMIN: i32 = 100;

    fn order(assignee_id: Option<i32>) -> Option<Target> {
        Some(Target::new(CLIENT, assignee_id))
    }

    #[test]
    fn admin_is_allowed_everything() {
        let admin = ctx(ADMIN, Role::Admin);
        for action in [
            Action::Browse,
            Action::View,
            Action::Claim,
            Action::Handle,
            Action::Administer,
        ] {
            assert_eq!(authorize(&admin, order(Some(MANAGER)), action), Decision::Allow);
        }
    }

    #[test]
    fn owner_may_view_own_record() {
        let client = ctx(CLIENT, Role::User);
        assert_eq!(authorize(&client, order(None), Action::View), Decision::Allow);
    }

    #[test]
    fn other_client_is_forbidden() {
        let stranger = ctx(OTHER_CLIENT, Role::User);
        assert_eq!(authorize(&stranger, order(None), Action::View), Decision::Forbid);
    }

    #[test]
    fn clients_cannot_browse_claim_handle_or_administer() {
        let client = ctx(CLIENT, Role::User);
        assert_eq!(authorize(&client, None, Action::Browse), Decision::Forbid);
        assert_eq!(authorize(&client, order(None), Action::Claim), Decision::Forbid);
        assert_eq!(authorize(&client, order(None), Action::Handle), Decision::Forbid);
        assert_eq!(authorize(&client, None, Action::Administer), Decision::Forbid);
    }

    #[test]
    fn manager_views_and_claims_any_record() {
        let manager = ctx(MANAGER, Role::Manager);
        assert_eq!(authorize(&manager, None, Action::Browse), Decision::Allow);
        assert_eq!(authorize(&manager, order(None), Action::View), Decision::Allow);
        assert_eq!(
            authorize(&manager, order(Some(OTHER_MANAGER)), Action::Claim),
            Decision::Allow
        );
    }

    #[test]
    fn manager_handles_only_assigned_records() {
        let manager = ctx(MANAGER, Role::Manager);
        assert_eq!(authorize(&manager, order(Some(MANAGER)), Action::Handle), Decision::Allow);
        assert_eq!(
            authorize(&manager, order(Some(OTHER_MANAGER)), Action::Handle),
            Decision::Forbid
        );
        assert_eq!(authorize(&manager, order(None), Action::Handle), Decision::Forbid);
        assert_eq!(authorize(&manager, None, Action::Administer), Decision::Forbid);
    }

    #[test]
    fn missing_record_is_not_found() {
        for role in [Role::User, Role::Manager, Role::Admin] {
            let actor = ctx(CLIENT, role);
            assert_eq!(authorize(&actor, None, Action::View), Decision::NotFound);
            assert_eq!(authorize(&actor, None, Action::Handle), Decision::NotFound);
        }
    }

    #[test]
    fn decisions_map_to_errors() {
        assert!(Decision::Allow.into_result("Order").is_ok());
        assert!(matches!(
            Decision::Forbid.into_result("Order"),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            Decision::NotFound.into_result("Order"),
            Err(AppError::NotFound("Order"))
        ));
    }
}
