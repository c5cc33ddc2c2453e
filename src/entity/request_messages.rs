use sea_orm::entity::prelude::*;

/// Status log of a custom request.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "request_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::custom_requests::Entity",
        from = "Column::RequestId",
        to = "super::custom_requests::Column::Id"
    )]
    CustomRequests,
}

impl Related<super::custom_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CustomRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
