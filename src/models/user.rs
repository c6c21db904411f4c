use super::enums::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "String(StringLen::N(35))")]
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sea_orm(column_type = "String(StringLen::N(100))", nullable, unique)]
    pub email: Option<String>,
    #[sea_orm(column_type = "String(StringLen::N(12))", nullable, unique)]
    pub phone: Option<String>,
    pub role: Role,
    pub reg_date: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::report::Entity")]
    Reports,
}

impl Related<super::report::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reports.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
