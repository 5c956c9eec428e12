//! SeaORM database migrations.

pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_studios;
mod m20260301_000002_create_studio_images;
mod m20260301_000003_create_credits;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_studios::Migration),
            Box::new(m20260301_000002_create_studio_images::Migration),
            Box::new(m20260301_000003_create_credits::Migration),
        ]
    }
}
