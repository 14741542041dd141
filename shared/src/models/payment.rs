//! Payment Model

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Online,
    Wallet,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

/// External token purchase; each payment has exactly one matching ledger credit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: i64,
    pub member_id: i64,
    /// Money received
    pub amount: f64,
    pub tokens: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: String,
    pub description: Option<String>,
    pub refund_tokens: Option<i64>,
    pub refund_reason: Option<String>,
    pub refunded_at: Option<i64>,
    pub created_by: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    #[validate(range(min = 0.0, message = "amount must not be negative"))]
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub method: PaymentMethod,
    /// Client idempotency key; generated when absent
    #[validate(length(min = 1, max = 100))]
    pub transaction_id: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCreate {
    pub member_id: i64,
    #[validate(range(min = 1, max = 100000, message = "tokens must be a positive integer"))]
    pub tokens: i64,
    #[serde(default)]
    #[validate(nested)]
    pub payment_details: PaymentDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    #[validate(range(min = 1, message = "refund amount must be a positive integer"))]
    pub refund_amount: Option<i64>,
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub ledger_transaction_id: i64,
    pub new_balance: i64,
}
