//! Migration: Create studios table.

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
                CREATE OR REPLACE FUNCTION update_updated_at_column()
                RETURNS TRIGGER AS $$
                BEGIN
                    NEW.updated_at = NOW();
                    RETURN NEW;
                END;
                $$ LANGUAGE plpgsql;

                CREATE TABLE studios (
                    id UUID PRIMARY KEY,
                    creator_user_id UUID NOT NULL,
                    organization_id UUID,
                    name VARCHAR(200) NOT NULL,
                    plan VARCHAR(20) NOT NULL
                        CHECK (plan IN ('starter', 'professional', 'studio', 'team')),
                    status VARCHAR(20) NOT NULL DEFAULT 'PAYMENT_PENDING'
                        CHECK (status IN ('PAYMENT_PENDING', 'PROCESSING', 'ACCEPTED', 'COMPLETED', 'FAILED')),
                    provider_id VARCHAR(100),              -- training ID at the AI provider
                    user_attributes JSONB NOT NULL DEFAULT '{}'::jsonb,
                    datasets_object_key VARCHAR(500) NOT NULL,
                    predictions_dispatched INTEGER NOT NULL DEFAULT 0,
                    metadata JSONB,                        -- failure details

                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE INDEX idx_studios_creator ON studios(creator_user_id);
                CREATE UNIQUE INDEX idx_studios_provider_id ON studios(provider_id)
                    WHERE provider_id IS NOT NULL;

                CREATE TRIGGER update_studios_updated_at
                    BEFORE UPDATE ON studios
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();
                "#,
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                r#"
                DROP TRIGGER IF EXISTS update_studios_updated_at ON studios;
                DROP TABLE IF EXISTS studios CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
