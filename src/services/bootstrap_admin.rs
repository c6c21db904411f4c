use crate::config::parse_bool_env;
use crate::error::AppResult;
use crate::models::{user, Role, User};
use crate::services::user::{normalize_email, NewUser, UserService};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        if !parse_bool_env("BOOTSTRAP_ADMIN_ENABLED", false) {
            return None;
        }

        Some(Self {
            name: env::var("BOOTSTRAP_ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok()?,
            password: env::var("BOOTSTRAP_ADMIN_PASSWORD").ok()?,
        })
    }
}

/// Make sure an admin exists at startup:
/// - any existing admin: nothing to do
/// - a user with the configured email: promote it
/// - otherwise create a fresh admin account
pub async fn ensure_bootstrap_admin(db: &DatabaseConnection) -> AppResult<()> {
    let Some(cfg) = BootstrapAdminConfig::from_env() else {
        return Ok(());
    };

    let admin_exists = User::find()
        .filter(user::Column::Role.eq(Role::Admin))
        .one(db)
        .await?
        .is_some();
    if admin_exists {
        return Ok(());
    }

    let users = UserService::new(db.clone());

    if let Some(existing) = users.find_by_email(&cfg.email).await? {
        let id = existing.id;
        let mut active: user::ActiveModel = existing.into();
        active.role = sea_orm::ActiveValue::Set(Role::Admin);
        active.update(db).await?;
        tracing::info!(user_id = id, "Promoted existing user to admin");
        return Ok(());
    }

    let admin = users
        .create(NewUser {
            name: cfg.name,
            email: normalize_email(&cfg.email),
            phone: None,
            password: cfg.password,
            role: Role::Admin,
        })
        .await?;
    tracing::info!(user_id = admin.id, "Created bootstrap admin");
    Ok(())
}
