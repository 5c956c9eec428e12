//! Migration: Create studio_images table.
//!
//! Previews and results are appended as rows, so concurrent webhook
//! deliveries for one studio never overwrite each other.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TABLE studio_images (
                    id BIGSERIAL PRIMARY KEY,              -- insertion order
                    studio_id UUID NOT NULL REFERENCES studios(id) ON DELETE CASCADE,
                    user_id UUID NOT NULL,
                    kind VARCHAR(10) NOT NULL CHECK (kind IN ('results', 'previews')),
                    url TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_studio_images_studio_kind ON studio_images(studio_id, kind, id);
                CREATE INDEX idx_studio_images_user ON studio_images(user_id);
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS studio_images CASCADE;")
            .await?;

        Ok(())
    }
}
