use crate::{
    error::{AppError, AppResult},
    models::{Role, UserModel},
    services::user::{NewUser, UserService},
    utils::{encode_access_token, verify_password},
};
use sea_orm::DatabaseConnection;

pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
}

pub struct AuthService {
    users: UserService,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: UserService::new(db),
        }
    }

    /// Self-registration always yields a client account.
    /// Returns (user_model, access_token).
    pub async fn register(&self, registration: Registration) -> AppResult<(UserModel, String)> {
        let user = self
            .users
            .create(NewUser {
                name: registration.name,
                email: registration.email,
                phone: registration.phone,
                password: registration.password,
                role: Role::User,
            })
            .await?;

        let token = encode_access_token(&user)?;
        tracing::info!(user_id = user.id, "User registered");
        Ok((user, token))
    }

    /// Returns (user_model, access_token).
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(UserModel, String)> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::warn!(email, "Login failed: unknown email");
            return Err(AppError::Unauthorized);
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!(email, "Login failed: wrong password");
            return Err(AppError::Unauthorized);
        }

        let token = encode_access_token(&user)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((user, token))
    }

    pub async fn change_password(
        &self,
        user_id: i32,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.users.get(user_id).await?;

        if !verify_password(old_password, &user.password_hash)? {
            return Err(AppError::validation("Old password is incorrect"));
        }
        if old_password == new_password {
            return Err(AppError::validation(
                "New password must differ from the old one",
            ));
        }

        self.users.set_password(user, new_password).await?;
        tracing::info!(user_id, "Password changed");
        Ok(())
    }
}
