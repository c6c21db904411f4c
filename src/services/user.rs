use crate::{
    error::{AppError, AppResult},
    models::{order, report, service_request, support_request, user, Order, Report, Role,
        ServiceRequest, SupportRequest, User, UserModel},
    utils::{hash_password, required_text},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, SqlErr,
};

const USER_NAME_MAX: usize = 35;

pub struct NewUser {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub role: Role,
}

pub struct UserUpdate {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Emails compare case-insensitively, so they are stored lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A unique-index hit means a concurrent writer took the email or phone
/// between the availability check and the write.
fn contact_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) if detail.contains("phone") => {
            AppError::validation("A user with this phone already exists")
        }
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::validation("A user with this email already exists")
        }
        _ => AppError::Database(err),
    }
}

fn normalize_phone(phone: Option<String>) -> Option<String> {
    phone
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
}

pub struct UserService {
    db: DatabaseConnection,
}

impl UserService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> AppResult<Vec<UserModel>> {
        let users = User::find()
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await?;
        Ok(users)
    }

    pub async fn find(&self, id: i32) -> AppResult<Option<UserModel>> {
        Ok(User::find_by_id(id).one(&self.db).await?)
    }

    pub async fn get(&self, id: i32) -> AppResult<UserModel> {
        self.find(id).await?.ok_or(AppError::NotFound("User"))
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserModel>> {
        let user = User::find()
            .filter(user::Column::Email.eq(normalize_email(email)))
            .one(&self.db)
            .await?;
        Ok(user)
    }

    pub async fn create(&self, new_user: NewUser) -> AppResult<UserModel> {
        let name = required_text("Name", &new_user.name, USER_NAME_MAX)?;
        let email = normalize_email(&new_user.email);
        let phone = normalize_phone(new_user.phone);

        self.ensure_contacts_free(Some(&email), phone.as_deref(), None)
            .await?;

        let password_hash = hash_password(&new_user.password)?;
        let now = chrono::Utc::now().naive_utc();

        let active = user::ActiveModel {
            name: sea_orm::ActiveValue::Set(name),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            email: sea_orm::ActiveValue::Set(Some(email)),
            phone: sea_orm::ActiveValue::Set(phone),
            role: sea_orm::ActiveValue::Set(new_user.role),
            reg_date: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        let user = self.insert(active).await?;
        tracing::info!(user_id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn update(&self, id: i32, update: UserUpdate) -> AppResult<UserModel> {
        let existing = self.get(id).await?;

        let name = required_text("Name", &update.name, USER_NAME_MAX)?;
        let email = update
            .email
            .as_deref()
            .map(normalize_email)
            .filter(|e| !e.is_empty());
        let phone = normalize_phone(update.phone);

        self.ensure_contacts_free(email.as_deref(), phone.as_deref(), Some(id))
            .await?;

        let mut active: user::ActiveModel = existing.into();
        active.name = sea_orm::ActiveValue::Set(name);
        // An omitted email keeps the current one; phone is always replaced.
        if let Some(email) = email {
            active.email = sea_orm::ActiveValue::Set(Some(email));
        }
        active.phone = sea_orm::ActiveValue::Set(phone);

        active.update(&self.db).await.map_err(|e| match contact_conflict(e) {
            AppError::Database(e) => {
                tracing::error!(user_id = id, "Failed to update user: {e}");
                AppError::Database(e)
            }
            conflict => conflict,
        })
    }

    pub async fn change_role(&self, id: i32, role: Role) -> AppResult<UserModel> {
        let existing = self.get(id).await?;

        let mut active: user::ActiveModel = existing.into();
        active.role = sea_orm::ActiveValue::Set(role);
        let updated = active.update(&self.db).await?;

        tracing::info!(user_id = id, role = %role, "User role changed");
        Ok(updated)
    }

    pub async fn set_password(&self, existing: UserModel, password: &str) -> AppResult<()> {
        let id = existing.id;
        let password_hash = hash_password(password)?;

        let mut active: user::ActiveModel = existing.into();
        active.password_hash = sea_orm::ActiveValue::Set(password_hash);
        active.update(&self.db).await.inspect_err(|e| {
            tracing::error!(user_id = id, "Failed to store new password: {e}");
        })?;
        Ok(())
    }

    /// Users still referenced by any record cannot be removed.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.get(id).await?;

        if self.is_referenced(id).await? {
            return Err(AppError::validation(
                "User cannot be deleted while orders, requests or reports reference them",
            ));
        }

        User::delete_by_id(id)
            .exec(&self.db)
            .await
            .inspect_err(|e| tracing::error!(user_id = id, "Failed to delete user: {e}"))?;

        tracing::info!(user_id = id, "User deleted");
        Ok(())
    }

    async fn is_referenced(&self, id: i32) -> AppResult<bool> {
        let orders = Order::find()
            .filter(
                Condition::any()
                    .add(order::Column::ClientId.eq(id))
                    .add(order::Column::AssignedToId.eq(id)),
            )
            .count(&self.db)
            .await?;
        let service_requests = ServiceRequest::find()
            .filter(
                Condition::any()
                    .add(service_request::Column::ClientId.eq(id))
                    .add(service_request::Column::AssignedToId.eq(id)),
            )
            .count(&self.db)
            .await?;
        let support_requests = SupportRequest::find()
            .filter(
                Condition::any()
                    .add(support_request::Column::ClientId.eq(id))
                    .add(support_request::Column::AssignedToId.eq(id)),
            )
            .count(&self.db)
            .await?;
        let reports = Report::find()
            .filter(report::Column::CreatedById.eq(id))
            .count(&self.db)
            .await?;

        Ok(orders + service_requests + support_requests + reports > 0)
    }

    async fn insert(&self, active: user::ActiveModel) -> AppResult<UserModel> {
        active.insert(&self.db).await.map_err(|e| match contact_conflict(e) {
            AppError::Database(e) => {
                tracing::error!("Failed to insert user: {e}");
                AppError::Database(e)
            }
            conflict => conflict,
        })
    }

    /// `exclude` skips the user being edited.
    async fn ensure_contacts_free(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        exclude: Option<i32>,
    ) -> AppResult<()> {
        if let Some(email) = email {
            if self.contact_taken(user::Column::Email, email, exclude).await? {
                return Err(AppError::validation("A user with this email already exists"));
            }
        }
        if let Some(phone) = phone {
            if self.contact_taken(user::Column::Phone, phone, exclude).await? {
                return Err(AppError::validation("A user with this phone already exists"));
            }
        }
        Ok(())
    }

    async fn contact_taken(
        &self,
        column: user::Column,
        value: &str,
        exclude: Option<i32>,
    ) -> AppResult<bool> {
        let mut query = User::find().filter(column.eq(value));
        if let Some(id) = exclude {
            query = query.filter(user::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tests::memory_db;
    use sea_orm::ActiveValue::Set;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Anna@Example.COM "), "anna@example.com");
    }

    #[test]
    fn blank_phone_is_absent() {
        assert_eq!(normalize_phone(Some("   ".to_string())), None);
        assert_eq!(
            normalize_phone(Some(" +7900123 ".to_string())),
            Some("+7900123".to_string())
        );
        assert_eq!(normalize_phone(None), None);
    }

    fn contact(email: &str, phone: Option<&str>) -> user::ActiveModel {
        user::ActiveModel {
            name: Set("Anna".into()),
            password_hash: Set("hash".into()),
            email: Set(Some(email.into())),
            phone: Set(phone.map(Into::into)),
            role: Set(Role::User),
            reg_date: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn racing_duplicate_contacts_are_validation_errors() {
        let service = UserService::new(memory_db().await);
        service
            .insert(contact("anna@test.com", Some("+7900")))
            .await
            .unwrap();

        // Straight to the insert, as if the availability check had raced.
        let err = service
            .insert(contact("anna@test.com", None))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, AppError::Validation(m) if m.contains("email")),
            "{err:?}"
        );

        let err = service
            .insert(contact("other@test.com", Some("+7900")))
            .await
            .unwrap_err();
        assert!(
            matches!(&err, AppError::Validation(m) if m.contains("phone")),
            "{err:?}"
        );
    }
}
