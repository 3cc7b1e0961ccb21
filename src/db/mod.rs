pub mod appointments;
pub mod chat;
pub mod connections;
pub mod direct_messages;
pub mod journal;
pub mod marketplace;
pub mod mood;
pub mod notifications;
pub mod payments;
pub mod profiles;
pub mod users;
pub mod verification;
pub mod withdrawals;

use sea_orm::{Database, DatabaseConnection, DbErr};

/// Create a SeaORM database connection pool.
pub async fn create_pool(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}
