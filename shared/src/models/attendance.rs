//! Attendance Model

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum AttendanceStatus {
    #[default]
    Present,
    Late,
    Absent,
    Excused,
}

/// Check-in record; `check_out` is `None` while the session is open
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Attendance {
    pub id: i64,
    pub member_id: i64,
    pub member_name: Option<String>,
    pub class_id: Option<i64>,
    pub class_name: Option<String>,
    pub check_in: i64,
    pub check_out: Option<i64>,
    pub token_used: i64,
    pub status: AttendanceStatus,
    pub created_at: i64,
}

impl Attendance {
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }

    /// Whole minutes between check-in and check-out, rounded half-up
    pub fn duration_minutes(&self) -> Option<i64> {
        self.check_out
            .map(|out| duration_minutes(self.check_in, out))
    }
}

/// Whole minutes between two millisecond timestamps, rounded half-up
pub fn duration_minutes(check_in: i64, check_out: i64) -> i64 {
    ((check_out - check_in).max(0) + 30_000) / 60_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub member_id: i64,
    pub class_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResult {
    pub attendance_id: i64,
    pub remaining_tokens: i64,
    pub token_used: i64,
    pub class_id: Option<i64>,
    pub check_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutResult {
    pub attendance_id: i64,
    pub check_out: i64,
    /// Minutes
    pub duration: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total_visits: i64,
    pub total_hours: f64,
    pub tokens_spent: i64,
    /// Minutes, over completed visits
    pub average_visit_length: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_rounds_half_up() {
        assert_eq!(duration_minutes(0, 29_999), 0);
        assert_eq!(duration_minutes(0, 30_000), 1);
        assert_eq!(duration_minutes(0, 89_999), 1);
        assert_eq!(duration_minutes(0, 90_000), 2);
        assert_eq!(duration_minutes(0, 60 * 60_000), 60);
    }

    #[test]
    fn test_clock_skew_never_negative() {
        assert_eq!(duration_minutes(10_000, 5_000), 0);
    }
}
