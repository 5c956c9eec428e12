//! Credit account entity for SeaORM.
//!
//! Exactly one of `user_id` and `organization_id` is set. Balances are only
//! mutated by the `deduct_credits` and `transfer_team_credits_to_member`
//! procedures.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "credits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub starter: i32,
    pub professional: i32,
    pub elite: i32,
    pub studio: i32,
    pub team: i32,
    pub balance: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
