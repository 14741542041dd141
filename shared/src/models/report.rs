//! Dashboard and export types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::token::{TokenTransaction, TransactionType};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TokenUsage {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    pub total: i64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_members: i64,
    pub active_members: i64,
    pub total_gyms: i64,
    pub total_classes: i64,
    pub recent_transactions: Vec<TokenTransaction>,
    pub token_usage: Vec<TokenUsage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    Members,
    Gyms,
    Attendance,
    Classes,
    Transactions,
}

impl ExportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportType::Members => "members",
            ExportType::Gyms => "gyms",
            ExportType::Attendance => "attendance",
            ExportType::Classes => "classes",
            ExportType::Transactions => "transactions",
        }
    }
}

impl FromStr for ExportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "members" => Ok(ExportType::Members),
            "gyms" => Ok(ExportType::Gyms),
            "attendance" => Ok(ExportType::Attendance),
            "classes" => Ok(ExportType::Classes),
            "transactions" => Ok(ExportType::Transactions),
            other => Err(format!("unknown export type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unsupported export format: {other}")),
        }
    }
}
