//! Studio entity for SeaORM.
//!
//! One row per generation job.

use sea_orm::entity::prelude::*;
use serde_json::Value as JsonValue;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "studios")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub creator_user_id: Uuid,
    pub organization_id: Option<Uuid>,
    pub name: String,
    pub plan: String,
    /// PAYMENT_PENDING, PROCESSING, ACCEPTED, COMPLETED or FAILED
    pub status: String,
    /// Training ID at the AI provider
    pub provider_id: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub user_attributes: JsonValue,
    pub datasets_object_key: String,
    pub predictions_dispatched: i32,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<JsonValue>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::studio_image::Entity")]
    Images,
}

impl Related<super::studio_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
