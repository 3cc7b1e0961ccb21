pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_users_and_profiles;
mod m20250301_000002_create_care_tables;
mod m20250301_000003_create_payment_tables;
mod m20250301_000004_create_marketplace_tables;
mod m20250301_000005_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_users_and_profiles::Migration),
            Box::new(m20250301_000002_create_care_tables::Migration),
            Box::new(m20250301_000003_create_payment_tables::Migration),
            Box::new(m20250301_000004_create_marketplace_tables::Migration),
            Box::new(m20250301_000005_add_indexes::Migration),
        ]
    }
}
