use sea_orm::entity::prelude::*;
use serde_json::Value;

/// Logo, embroidery and design requests share one table keyed by `kind`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "custom_requests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: String,
    #[sea_orm(unique)]
    pub request_number: String,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub package: String,
    pub rush_delivery: bool,
    pub package_price: i64,
    pub rush_cost: i64,
    pub extras_cost: i64,
    pub total_price: i64,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub details: Value,
    #[sea_orm(column_type = "JsonBinary")]
    pub attachments: Value,
    #[sea_orm(column_type = "JsonBinary")]
    pub final_designs: Value,
    pub estimated_delivery: Option<DateTimeWithTimeZone>,
    pub completed_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(has_many = "super::request_revisions::Entity")]
    RequestRevisions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::request_revisions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RequestRevisions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
