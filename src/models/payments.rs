use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "success")]
    Success,
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// SeaORM entity for the `payments` table. `tx_ref` is the gateway idempotency key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub amount: Decimal,
    pub currency: String,
    pub email: String,
    #[sea_orm(unique)]
    pub tx_ref: String,
    pub status: PaymentStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const DEFAULT_CURRENCY: &str = "ETB";

/// Amounts arrive either as JSON numbers or as strings.
pub fn parse_amount(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

// ── DTOs ──

/// Body of `POST /api/auth/payment/initialize/`.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializePayment {
    pub amount: Option<serde_json::Value>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub checkout_url: String,
    pub tx_ref: String,
}

/// Webhook body posted by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub username: String,
    pub amount: Decimal,
    pub currency: String,
    pub email: String,
    pub tx_ref: String,
    pub status: PaymentStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl PaymentResponse {
    pub fn new(p: Model, username: String) -> Self {
        Self {
            id: p.id,
            user: p.user_id,
            username,
            amount: p.amount,
            currency: p.currency,
            email: p.email,
            tx_ref: p.tx_ref,
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numeric_and_string_amounts() {
        assert_eq!(parse_amount(&json!(100)), Some(Decimal::new(100, 0)));
        assert_eq!(parse_amount(&json!("250.50")), Some(Decimal::new(25050, 2)));
        assert_eq!(parse_amount(&json!(" 10 ")), Some(Decimal::new(10, 0)));
    }

    #[test]
    fn rejects_garbage_amounts() {
        assert_eq!(parse_amount(&json!("ten")), None);
        assert_eq!(parse_amount(&json!(null)), None);
        assert_eq!(parse_amount(&json!({"v": 1})), None);
    }
}
