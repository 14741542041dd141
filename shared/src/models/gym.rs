//! Gym Model

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::class::validate_hhmm;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Address {
    #[validate(length(max = 200))]
    pub street: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub state: Option<String>,
    #[validate(length(max = 100))]
    pub country: Option<String>,
    #[validate(length(max = 20))]
    pub pincode: Option<String>,
}

/// Opening hours, `HH:MM`
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OperatingHours {
    #[validate(custom(function = "validate_hhmm"))]
    pub weekday_open: String,
    #[validate(custom(function = "validate_hhmm"))]
    pub weekday_close: String,
    #[validate(custom(function = "validate_hhmm"))]
    pub weekend_open: String,
    #[validate(custom(function = "validate_hhmm"))]
    pub weekend_close: String,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            weekday_open: "06:00".into(),
            weekday_close: "22:00".into(),
            weekend_open: "08:00".into(),
            weekend_close: "20:00".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Gym {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub address: Address,
    #[cfg_attr(feature = "db", sqlx(flatten))]
    pub operating_hours: OperatingHours,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Creates the gym and its owner account together
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GymCreate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    /// Owner login password
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub address: Address,
    #[validate(nested)]
    pub operating_hours: Option<OperatingHours>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GymUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
    #[validate(nested)]
    pub address: Option<Address>,
    #[validate(nested)]
    pub operating_hours: Option<OperatingHours>,
    /// Admin only
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymStats {
    pub gym_id: i64,
    pub total_classes: i64,
    pub active_classes: i64,
    pub total_enrollment: i64,
    /// Distinct members who checked into one of the gym's classes
    pub unique_members: i64,
    pub is_active: bool,
}
