//! Credit accounts.
//!
//! Balances are only changed through the `deduct_credits` and
//! `transfer_team_credits_to_member` procedures, which lock the rows they
//! touch. Every call is keyed by [`CreditType`], so an unknown credit type
//! never reaches the database.

use async_trait::async_trait;
use sea_orm::{ColumnTrait, DbBackend, EntityTrait, FromQueryResult, QueryFilter, Statement};
use uuid::Uuid;

use crate::entity::credit::{self, Entity as Credit};
use crate::error::{AppError, AppResult};
use crate::models::{CreditBalance, CreditContext, CreditRpcResult, CreditType};

use super::DbPool;

/// Account a balance belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOwner {
    User(Uuid),
    Organization(Uuid),
}

/// Arguments of `deduct_credits`.
#[derive(Debug, Clone)]
pub struct Deduction {
    pub user_id: Uuid,
    pub credit_type: CreditType,
    pub amount: i32,
    pub context: CreditContext,
    pub studio_id: Uuid,
    pub description: String,
}

#[async_trait]
pub trait CreditsRepository: Send + Sync {
    async fn deduct_credits(&self, deduction: &Deduction) -> AppResult<CreditRpcResult>;

    async fn transfer_team_credits_to_member(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
        credit_type: CreditType,
        amount: i32,
    ) -> AppResult<CreditRpcResult>;

    async fn balance(&self, owner: CreditOwner) -> AppResult<CreditBalance>;
}

#[derive(Debug, FromQueryResult)]
struct RpcRow {
    result: serde_json::Value,
}

impl DbPool {
    async fn call_credit_rpc(&self, stmt: Statement) -> AppResult<CreditRpcResult> {
        let row = RpcRow::find_by_statement(stmt)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Credit procedure failed: {}", e)))?
            .ok_or_else(|| AppError::Database("Credit procedure returned no row".to_string()))?;

        serde_json::from_value(row.result)
            .map_err(|e| AppError::Database(format!("Unexpected credit procedure result: {}", e)))
    }
}

#[async_trait]
impl CreditsRepository for DbPool {
    async fn deduct_credits(&self, deduction: &Deduction) -> AppResult<CreditRpcResult> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT deduct_credits($1, $2, $3, $4, $5, $6) AS result",
            [
                deduction.user_id.into(),
                deduction.credit_type.column().into(),
                deduction.amount.into(),
                deduction.context.as_str().into(),
                deduction.studio_id.into(),
                deduction.description.clone().into(),
            ],
        );
        self.call_credit_rpc(stmt).await
    }

    async fn transfer_team_credits_to_member(
        &self,
        organization_id: Uuid,
        member_id: Uuid,
        credit_type: CreditType,
        amount: i32,
    ) -> AppResult<CreditRpcResult> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT transfer_team_credits_to_member($1, $2, $3, $4) AS result",
            [
                organization_id.into(),
                member_id.into(),
                credit_type.column().into(),
                amount.into(),
            ],
        );
        self.call_credit_rpc(stmt).await
    }

    async fn balance(&self, owner: CreditOwner) -> AppResult<CreditBalance> {
        let query = match owner {
            CreditOwner::User(id) => Credit::find().filter(credit::Column::UserId.eq(id)),
            CreditOwner::Organization(id) => {
                Credit::find().filter(credit::Column::OrganizationId.eq(id))
            }
        };

        let Some(row) = query
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load credits: {}", e)))?
        else {
            return Ok(CreditBalance::default());
        };

        Ok(balance_from_row(&row))
    }
}

fn balance_from_row(row: &credit::Model) -> CreditBalance {
    let mut balance = CreditBalance::default();
    for credit_type in CreditType::ALL {
        let amount = match credit_type {
            CreditType::Starter => row.starter,
            CreditType::Pro => row.professional,
            CreditType::Elite => row.elite,
            CreditType::Studio => row.studio,
            CreditType::Team => row.team,
            CreditType::Balance => row.balance,
        };
        balance.set(credit_type, amount as i64);
    }
    balance
}
