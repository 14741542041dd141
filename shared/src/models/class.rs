//! Class Model

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

/// Scheduled class; `current_enrollment` never exceeds `max_capacity`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub trainer: Option<String>,
    pub gym_id: Option<i64>,
    pub day: Weekday,
    /// `HH:MM`
    pub start_time: String,
    pub duration_minutes: i64,
    pub max_capacity: i64,
    pub current_enrollment: i64,
    pub token_cost: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Class {
    pub fn is_full(&self) -> bool {
        self.current_enrollment >= self.max_capacity
    }

    /// `HH:MM` end of the session, wrapping at midnight
    pub fn end_time(&self) -> Option<String> {
        let start = parse_hhmm(&self.start_time)?;
        let end = (start + self.duration_minutes).rem_euclid(24 * 60);
        Some(format!("{:02}:{:02}", end / 60, end % 60))
    }
}

/// Minutes since midnight for a `HH:MM` string
pub fn parse_hhmm(value: &str) -> Option<i64> {
    let (h, m) = value.split_once(':')?;
    if h.len() != 2 || m.len() != 2 {
        return None;
    }
    let h: i64 = h.parse().ok()?;
    let m: i64 = m.parse().ok()?;
    ((0..24).contains(&h) && (0..60).contains(&m)).then_some(h * 60 + m)
}

pub fn validate_hhmm(value: &str) -> Result<(), ValidationError> {
    match parse_hhmm(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("time_format")
            .with_message("time must be in HH:MM format".into())),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClassCreate {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub trainer: Option<String>,
    /// Ignored for gym owners, who always create classes for their own gym
    pub gym_id: Option<i64>,
    pub day: Weekday,
    #[validate(custom(function = "validate_hhmm"))]
    pub start_time: String,
    #[validate(range(min = 15, max = 480, message = "duration must be 15-480 minutes"))]
    pub duration_minutes: i64,
    #[validate(range(min = 1, max = 1000))]
    pub max_capacity: i64,
    #[validate(range(min = 0, max = 1000))]
    pub token_cost: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ClassUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 500))]
    pub description: Option<String>,
    #[validate(length(max = 100))]
    pub trainer: Option<String>,
    pub day: Option<Weekday>,
    #[validate(custom(function = "validate_hhmm"))]
    pub start_time: Option<String>,
    #[validate(range(min = 15, max = 480, message = "duration must be 15-480 minutes"))]
    pub duration_minutes: Option<i64>,
    #[validate(range(min = 1, max = 1000))]
    pub max_capacity: Option<i64>,
    #[validate(range(min = 0, max = 1000))]
    pub token_cost: Option<i64>,
    pub is_active: Option<bool>,
}

/// Enrolled member, as listed for a class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ClassParticipant {
    pub member_id: i64,
    pub member_code: String,
    pub name: String,
    pub enrolled_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(start: &str, duration: i64) -> Class {
        Class {
            id: 1,
            name: "Spin".into(),
            description: None,
            trainer: None,
            gym_id: None,
            day: Weekday::Monday,
            start_time: start.into(),
            duration_minutes: duration,
            max_capacity: 10,
            current_enrollment: 0,
            token_cost: 3,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_parse_hhmm() {
        assert_eq!(parse_hhmm("06:30"), Some(390));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("6:30"), None);
        assert_eq!(parse_hhmm("06:60"), None);
    }

    #[test]
    fn test_end_time() {
        assert_eq!(class("18:00", 45).end_time().as_deref(), Some("18:45"));
        assert_eq!(class("23:30", 60).end_time().as_deref(), Some("00:30"));
    }

    #[test]
    fn test_create_validation() {
        let req = ClassCreate {
            name: "Yoga".into(),
            description: None,
            trainer: None,
            gym_id: None,
            day: Weekday::Friday,
            start_time: "7pm".into(),
            duration_minutes: 10,
            max_capacity: 0,
            token_cost: 2,
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("start_time"));
        assert!(fields.contains_key("duration_minutes"));
        assert!(fields.contains_key("max_capacity"));
    }
}
