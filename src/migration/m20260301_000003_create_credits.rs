//! Migration: Create credit accounts and their procedures.
//!
//! `deduct_credits` and `transfer_team_credits_to_member` lock the affected
//! rows and never let a balance go negative. Both return
//! `{"success": bool, "error": text}`.

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
                CREATE TABLE credits (
                    id BIGSERIAL PRIMARY KEY,
                    user_id UUID UNIQUE,
                    organization_id UUID UNIQUE,
                    starter INTEGER NOT NULL DEFAULT 0 CHECK (starter >= 0),
                    professional INTEGER NOT NULL DEFAULT 0 CHECK (professional >= 0),
                    elite INTEGER NOT NULL DEFAULT 0 CHECK (elite >= 0),
                    studio INTEGER NOT NULL DEFAULT 0 CHECK (studio >= 0),
                    team INTEGER NOT NULL DEFAULT 0 CHECK (team >= 0),
                    balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0),
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    CHECK ((user_id IS NULL) <> (organization_id IS NULL))
                );

                CREATE TRIGGER update_credits_updated_at
                    BEFORE UPDATE ON credits
                    FOR EACH ROW
                    EXECUTE FUNCTION update_updated_at_column();

                CREATE TABLE credit_transactions (
                    id BIGSERIAL PRIMARY KEY,
                    credit_id BIGINT NOT NULL REFERENCES credits(id) ON DELETE CASCADE,
                    studio_id UUID,
                    credit_type VARCHAR(20) NOT NULL,
                    amount INTEGER NOT NULL,               -- negative for deductions
                    description TEXT,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                );

                CREATE OR REPLACE FUNCTION deduct_credits(
                    p_user_id UUID,
                    p_plan TEXT,
                    p_credits_to_deduct INTEGER,
                    p_context TEXT,
                    p_studio_id UUID,
                    p_description TEXT
                ) RETURNS JSONB AS $$
                DECLARE
                    v_credit_id BIGINT;
                    v_org UUID;
                    v_rows INTEGER;
                BEGIN
                    IF p_plan NOT IN ('starter', 'professional', 'elite', 'studio', 'team', 'balance') THEN
                        RETURN jsonb_build_object('success', false, 'error', 'Invalid credit type');
                    END IF;
                    IF p_credits_to_deduct <= 0 THEN
                        RETURN jsonb_build_object('success', false, 'error', 'Amount must be positive');
                    END IF;

                    IF p_context = 'ORGANIZATION' THEN
                        SELECT organization_id INTO v_org FROM studios WHERE id = p_studio_id;
                        SELECT id INTO v_credit_id FROM credits WHERE organization_id = v_org FOR UPDATE;
                    ELSE
                        SELECT id INTO v_credit_id FROM credits WHERE user_id = p_user_id FOR UPDATE;
                    END IF;

                    IF v_credit_id IS NULL THEN
                        RETURN jsonb_build_object('success', false, 'error', 'No credit account found');
                    END IF;

                    EXECUTE format(
                        'UPDATE credits SET %1$I = %1$I - $1 WHERE id = $2 AND %1$I >= $1',
                        p_plan
                    ) USING p_credits_to_deduct, v_credit_id;
                    GET DIAGNOSTICS v_rows = ROW_COUNT;

                    IF v_rows = 0 THEN
                        RETURN jsonb_build_object('success', false, 'error', 'Insufficient credits');
                    END IF;

                    INSERT INTO credit_transactions (credit_id, studio_id, credit_type, amount, description)
                    VALUES (v_credit_id, p_studio_id, p_plan, -p_credits_to_deduct, p_description);

                    RETURN jsonb_build_object('success', true);
                END;
                $$ LANGUAGE plpgsql;

                CREATE OR REPLACE FUNCTION transfer_team_credits_to_member(
                    p_organization_id UUID,
                    p_member_id UUID,
                    p_credit_type TEXT,
                    p_amount INTEGER
                ) RETURNS JSONB AS $$
                DECLARE
                    v_org_credit_id BIGINT;
                    v_member_credit_id BIGINT;
                    v_rows INTEGER;
                BEGIN
                    IF p_credit_type NOT IN ('starter', 'professional', 'elite', 'studio', 'team', 'balance') THEN
                        RETURN jsonb_build_object('success', false, 'error', 'Invalid credit type');
                    END IF;
                    IF p_amount <= 0 THEN
                        RETURN jsonb_build_object('success', false, 'error', 'Amount must be positive');
                    END IF;

                    SELECT id INTO v_org_credit_id FROM credits
                        WHERE organization_id = p_organization_id FOR UPDATE;
                    IF v_org_credit_id IS NULL THEN
                        RETURN jsonb_build_object('success', false, 'error', 'No organization credit account found');
                    END IF;

                    EXECUTE format(
                        'UPDATE credits SET %1$I = %1$I - $1 WHERE id = $2 AND %1$I >= $1',
                        p_credit_type
                    ) USING p_amount, v_org_credit_id;
                    GET DIAGNOSTICS v_rows = ROW_COUNT;
                    IF v_rows = 0 THEN
                        RETURN jsonb_build_object('success', false, 'error', 'Insufficient team credits');
                    END IF;

                    INSERT INTO credits (user_id) VALUES (p_member_id)
                        ON CONFLICT (user_id) DO NOTHING;
                    SELECT id INTO v_member_credit_id FROM credits WHERE user_id = p_member_id FOR UPDATE;

                    EXECUTE format(
                        'UPDATE credits SET %1$I = %1$I + $1 WHERE id = $2',
                        p_credit_type
                    ) USING p_amount, v_member_credit_id;

                    INSERT INTO credit_transactions (credit_id, credit_type, amount, description)
                    VALUES
                        (v_org_credit_id, p_credit_type, -p_amount, 'Transfer to member ' || p_member_id),
                        (v_member_credit_id, p_credit_type, p_amount, 'Transfer from organization ' || p_organization_id);

                    RETURN jsonb_build_object('success', true);
                END;
                $$ LANGUAGE plpgsql;
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
                DROP FUNCTION IF EXISTS transfer_team_credits_to_member(UUID, UUID, TEXT, INTEGER);
                DROP FUNCTION IF EXISTS deduct_credits(UUID, TEXT, INTEGER, TEXT, UUID, TEXT);
                DROP TABLE IF EXISTS credit_transactions CASCADE;
                DROP TRIGGER IF EXISTS update_credits_updated_at ON credits;
                DROP TABLE IF EXISTS credits CASCADE;
                "#,
            )
            .await?;

        Ok(())
    }
}
