//! Append-only persistence of stored image URLs.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use uuid::Uuid;

use crate::entity::studio_image::{self, ActiveModel, Entity as StudioImage};
use crate::error::{AppError, AppResult};
use crate::models::ImageKind;

use super::DbPool;

#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Append `urls` to the studio's `kind` collection.
    ///
    /// All rows land in one transaction; concurrent callers never lose
    /// each other's rows. Returns the number of rows appended.
    async fn append_images(
        &self,
        user_id: Uuid,
        studio_id: Uuid,
        kind: ImageKind,
        urls: &[String],
    ) -> AppResult<u64>;

    /// URLs of a collection in append order.
    async fn list_images(&self, studio_id: Uuid, kind: ImageKind) -> AppResult<Vec<String>>;
}

#[async_trait]
impl ImageRepository for DbPool {
    async fn append_images(
        &self,
        user_id: Uuid,
        studio_id: Uuid,
        kind: ImageKind,
        urls: &[String],
    ) -> AppResult<u64> {
        if urls.is_empty() {
            return Ok(0);
        }

        let now = Utc::now();
        let rows = urls.iter().map(|url| ActiveModel {
            studio_id: Set(studio_id),
            user_id: Set(user_id),
            kind: Set(kind.as_str().to_string()),
            url: Set(url.clone()),
            created_at: Set(now),
            ..Default::default()
        });

        let txn = self.connection().begin().await?;
        StudioImage::insert_many(rows)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(format!("Failed to append {} images: {}", kind, e)))?;
        txn.commit().await?;

        Ok(urls.len() as u64)
    }

    async fn list_images(&self, studio_id: Uuid, kind: ImageKind) -> AppResult<Vec<String>> {
        let rows = StudioImage::find()
            .filter(studio_image::Column::StudioId.eq(studio_id))
            .filter(studio_image::Column::Kind.eq(kind.as_str()))
            .order_by_asc(studio_image::Column::Id)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list images: {}", e)))?;

        Ok(rows.into_iter().map(|row| row.url).collect())
    }
}
