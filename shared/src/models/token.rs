//! Token Ledger Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Ledger entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }

    /// Signed effect of `amount` on the balance
    pub fn signed(&self, amount: i64) -> i64 {
        match self {
            TransactionType::Credit => amount,
            TransactionType::Debit => -amount,
        }
    }
}

/// What caused a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelatedDocument {
    Attendance { id: i64 },
    Payment { id: i64 },
    Adjustment,
    Registration,
}

impl RelatedDocument {
    /// Storage tag
    pub fn kind(&self) -> &'static str {
        match self {
            RelatedDocument::Attendance { .. } => "attendance",
            RelatedDocument::Payment { .. } => "payment",
            RelatedDocument::Adjustment => "adjustment",
            RelatedDocument::Registration => "registration",
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            RelatedDocument::Attendance { id } | RelatedDocument::Payment { id } => Some(*id),
            RelatedDocument::Adjustment | RelatedDocument::Registration => None,
        }
    }

    /// Rebuild from the stored `(kind, id)` columns
    pub fn from_parts(kind: &str, id: Option<i64>) -> Option<Self> {
        match (kind, id) {
            ("attendance", Some(id)) => Some(RelatedDocument::Attendance { id }),
            ("payment", Some(id)) => Some(RelatedDocument::Payment { id }),
            ("adjustment", _) => Some(RelatedDocument::Adjustment),
            ("registration", _) => Some(RelatedDocument::Registration),
            _ => None,
        }
    }
}

/// Immutable ledger entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransaction {
    pub id: i64,
    pub member_id: i64,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub amount: i64,
    pub description: String,
    pub reference: String,
    pub related_document: Option<RelatedDocument>,
    pub created_by: Option<i64>,
    pub created_at: i64,
}

/// Balance derived from the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub member_id: i64,
    pub balance: i64,
    pub total_credits: i64,
    pub total_debits: i64,
}

/// Aggregate token usage over a period
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TokenStats {
    pub total_credits: i64,
    pub total_debits: i64,
    pub credit_count: i64,
    pub debit_count: i64,
    pub net_tokens: i64,
}

/// Member whose cached balance disagrees with the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BalanceDrift {
    pub member_id: i64,
    pub member_code: String,
    pub cached_balance: i64,
    pub ledger_balance: i64,
}

/// Admin credit/debit payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TokenAdjustment {
    #[validate(range(min = 1, max = 100000, message = "amount must be a positive integer"))]
    pub amount: i64,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    /// Client idempotency key
    #[validate(length(min = 1, max = 100))]
    pub reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_document_tagged_json() {
        let json = serde_json::to_value(RelatedDocument::Attendance { id: 7 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "attendance", "id": 7}));

        let json = serde_json::to_value(RelatedDocument::Adjustment).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "adjustment"}));
    }

    #[test]
    fn test_related_document_from_parts() {
        let doc = RelatedDocument::Payment { id: 42 };
        assert_eq!(RelatedDocument::from_parts(doc.kind(), doc.id()), Some(doc));
        assert_eq!(RelatedDocument::from_parts("attendance", None), None);
        assert_eq!(RelatedDocument::from_parts("order", Some(1)), None);
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(TransactionType::Credit.signed(5), 5);
        assert_eq!(TransactionType::Debit.signed(5), -5);
    }
}
