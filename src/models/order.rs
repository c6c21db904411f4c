use super::enums::{OrderStatus, Priority};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "String(StringLen::N(250))")]
    pub order_name: String,
    #[sea_orm(column_type = "String(StringLen::N(3500))")]
    pub description: String,
    pub cost_cents: Option<i64>,
    pub status: OrderStatus,
    pub priority: Priority,
    pub create_date: DateTime,
    pub complete_date: Option<DateTime>,
    pub client_id: i32,
    pub assigned_to_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ClientId",
        to = "super::user::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AssignedToId",
        to = "super::user::Column::Id"
    )]
    Manager,
    #[sea_orm(has_many = "super::support_request::Entity")]
    SupportRequests,
    #[sea_orm(has_many = "super::service_request::Entity")]
    ServiceRequests,
    #[sea_orm(has_many = "super::report::Entity")]
    Reports,
}

impl Related<super::support_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupportRequests.def()
    }
}

impl Related<super::service_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceRequests.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
