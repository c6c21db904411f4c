use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staff note or response. Rows are never updated after insert.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "String(StringLen::N(250))")]
    pub title: String,
    #[sea_orm(column_type = "String(StringLen::N(3500))")]
    pub content: String,
    pub create_date: DateTime,
    pub created_by_id: i32,
    pub order_id: Option<i32>,
    pub service_request_id: Option<i32>,
    pub support_request_id: Option<i32>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedById",
        to = "super::user::Column::Id"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
    #[sea_orm(
        belongs_to = "super::service_request::Entity",
        from = "Column::ServiceRequestId",
        to = "super::service_request::Column::Id"
    )]
    ServiceRequest,
    #[sea_orm(
        belongs_to = "super::support_request::Entity",
        from = "Column::SupportRequestId",
        to = "super::support_request::Column::Id"
    )]
    SupportRequest,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::service_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceRequest.def()
    }
}

impl Related<super::support_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SupportRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
