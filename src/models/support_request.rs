use super::enums::RequestStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "supportRequest")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "String(StringLen::N(250))")]
    pub topic: String,
    #[sea_orm(column_type = "String(StringLen::N(3500))")]
    pub message: String,
    pub status: RequestStatus,
    pub create_date: DateTime,
    pub client_id: i32,
    pub assigned_to_id: Option<i32>,
    pub related_order_id: Option<i32>,
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
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::RelatedOrderId",
        to = "super::order::Column::Id"
    )]
    RelatedOrder,
    #[sea_orm(has_many = "super::report::Entity")]
    Reports,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RelatedOrder.def()
    }
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
