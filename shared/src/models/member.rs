//! Member Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Member profile joined with its owning user
///
/// `token_balance` is a cache of the member's ledger sum and is only ever
/// changed inside a ledger unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Member {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub member_code: String,
    pub token_balance: i64,
    pub is_active: bool,
    pub emergency_contact: Option<String>,
    pub notes: Option<String>,
    pub last_check_in: Option<i64>,
    pub check_in_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Fields a member may change on their own profile
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MemberSelfUpdate {
    #[validate(length(max = 200))]
    pub emergency_contact: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Admin activation / deactivation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatusUpdate {
    pub is_active: bool,
}
