//! Database queries for studios.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::studio::{self, ActiveModel, Entity as StudioEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Plan, Studio, StudioAttributes, StudioStatus};

use super::DbPool;

/// Studio persistence used by the webhook dispatcher and studio creation.
#[async_trait]
pub trait StudioRepository: Send + Sync {
    /// Find a studio owned by `owner`, by studio ID or provider training ID.
    async fn find_for_owner(&self, reference: &str, owner: Uuid) -> AppResult<Option<Studio>>;

    async fn insert_studio(&self, studio: &Studio) -> AppResult<()>;

    async fn delete_studio(&self, id: Uuid) -> AppResult<()>;

    async fn set_provider_id(&self, id: Uuid, provider_id: &str) -> AppResult<()>;

    /// Mark the studio FAILED and keep the error in its metadata.
    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()>;

    /// Record how many predictions were requested for the studio.
    async fn record_predictions_dispatched(&self, id: Uuid, count: i32) -> AppResult<()>;
}

impl TryFrom<studio::Model> for Studio {
    type Error = AppError;

    fn try_from(model: studio::Model) -> Result<Self, Self::Error> {
        let plan = Plan::parse(&model.plan)
            .ok_or_else(|| AppError::Internal(format!("Unknown plan '{}'", model.plan)))?;
        let status = StudioStatus::parse(&model.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown status '{}'", model.status)))?;
        let attributes: StudioAttributes = serde_json::from_value(model.user_attributes)
            .map_err(|e| AppError::Internal(format!("Corrupt studio attributes: {}", e)))?;

        Ok(Studio {
            id: model.id,
            creator_user_id: model.creator_user_id,
            organization_id: model.organization_id,
            name: model.name,
            plan,
            status,
            provider_id: model.provider_id,
            attributes,
            datasets_object_key: model.datasets_object_key,
            created_at: model.created_at,
        })
    }
}

#[async_trait]
impl StudioRepository for DbPool {
    async fn find_for_owner(&self, reference: &str, owner: Uuid) -> AppResult<Option<Studio>> {
        let mut by_reference = Condition::any().add(studio::Column::ProviderId.eq(reference));
        if let Ok(id) = Uuid::parse_str(reference) {
            by_reference = by_reference.add(studio::Column::Id.eq(id));
        }

        let model = StudioEntity::find()
            .filter(by_reference)
            .filter(studio::Column::CreatorUserId.eq(owner))
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to find studio: {}", e)))?;

        model.map(Studio::try_from).transpose()
    }

    async fn insert_studio(&self, studio: &Studio) -> AppResult<()> {
        let now = Utc::now();
        let model = ActiveModel {
            id: Set(studio.id),
            creator_user_id: Set(studio.creator_user_id),
            organization_id: Set(studio.organization_id),
            name: Set(studio.name.clone()),
            plan: Set(studio.plan.as_str().to_string()),
            status: Set(studio.status.as_str().to_string()),
            provider_id: Set(studio.provider_id.clone()),
            user_attributes: Set(serde_json::to_value(&studio.attributes)?),
            datasets_object_key: Set(studio.datasets_object_key.clone()),
            predictions_dispatched: Set(0),
            metadata: Set(None),
            created_at: Set(studio.created_at),
            updated_at: Set(now),
        };

        model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert studio: {}", e)))?;

        Ok(())
    }

    async fn delete_studio(&self, id: Uuid) -> AppResult<()> {
        StudioEntity::delete_by_id(id)
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete studio: {}", e)))?;
        Ok(())
    }

    async fn set_provider_id(&self, id: Uuid, provider_id: &str) -> AppResult<()> {
        StudioEntity::update_many()
            .col_expr(studio::Column::ProviderId, Expr::value(provider_id))
            .filter(studio::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to set provider id: {}", e)))?;
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, error: &str) -> AppResult<()> {
        StudioEntity::update_many()
            .col_expr(
                studio::Column::Status,
                Expr::value(StudioStatus::Failed.as_str()),
            )
            .col_expr(
                studio::Column::Metadata,
                Expr::value(serde_json::json!({ "error": error })),
            )
            .filter(studio::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to mark studio failed: {}", e)))?;
        Ok(())
    }

    async fn record_predictions_dispatched(&self, id: Uuid, count: i32) -> AppResult<()> {
        StudioEntity::update_many()
            .col_expr(studio::Column::PredictionsDispatched, Expr::value(count))
            .filter(studio::Column::Id.eq(id))
            .exec(self.connection())
            .await
            .map_err(|e| {
                AppError::Database(format!("Failed to record dispatched predictions: {}", e))
            })?;
        Ok(())
    }
}
