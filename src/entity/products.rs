use sea_orm::entity::prelude::*;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub subcategory: String,
    pub price_base: i64,
    pub price_premium: Option<i64>,
    pub price_enterprise: Option<i64>,
    pub days_base: i64,
    pub days_premium: Option<i64>,
    pub days_enterprise: Option<i64>,
    #[sea_orm(column_type = "JsonBinary")]
    pub images: Value,
    pub is_featured: bool,
    pub is_active: bool,
    /// Maintained by the review aggregation, never by catalog writes.
    #[sea_orm(column_type = "Double")]
    pub rating_average: f64,
    pub rating_count: i32,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
