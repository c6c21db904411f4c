pub mod auth;
pub mod bootstrap_admin;
pub mod lifecycle;
pub mod order;
pub mod report;
pub mod service_request;
pub mod support_request;
pub mod user;

use crate::error::AppResult;
use crate::models::{user as user_entity, User, UserModel};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::collections::HashMap;
use std::future::Future;

/// Fetch every user named in `ids` with one query, keyed by id.
///
/// The ids are collected before the returned future is built, so callers can
/// pass borrowing iterators from inside `Send` handler futures.
pub(crate) fn load_users<'a>(
    db: &'a DatabaseConnection,
    ids: impl IntoIterator<Item = i32>,
) -> impl Future<Output = AppResult<HashMap<i32, UserModel>>> + Send + 'a {
    let ids: Vec<i32> = ids.into_iter().collect();
    load_users_by_id(db, ids)
}

async fn load_users_by_id(
    db: &DatabaseConnection,
    mut ids: Vec<i32>,
) -> AppResult<HashMap<i32, UserModel>> {
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = User::find()
        .filter(user_entity::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u)).collect())
}

/// Midnight (UTC) of the current day.
pub(crate) fn start_of_today() -> chrono::NaiveDateTime {
    chrono::Utc::now().date_naive().and_time(chrono::NaiveTime::MIN)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::migration::Migrator;
    use crate::models::Role;
    use sea_orm::{ActiveModelTrait, ActiveValue::Set, ConnectOptions, Database};
    use sea_orm_migration::MigratorTrait;

    /// Fresh migrated in-memory database on a single connection.
    pub(crate) async fn memory_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:".to_owned());
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn assert_send<T: Send>(value: T) -> T {
        value
    }

    #[tokio::test]
    async fn load_users_accepts_borrowing_iterators() {
        let db = memory_db().await;

        let user = user_entity::ActiveModel {
            name: Set("Anna".into()),
            password_hash: Set("hash".into()),
            email: Set(Some("anna@test.com".into())),
            phone: Set(None),
            role: Set(Role::User),
            reg_date: Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();

        let rows = [(user.id, "first"), (user.id, "second"), (9999, "missing")];
        let users = assert_send(load_users(&db, rows.iter().map(|(id, _)| *id)))
            .await
            .unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[&user.id].name, "Anna");
    }
}
