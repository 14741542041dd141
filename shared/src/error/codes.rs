//! Unified error codes for the gym server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Member errors
//! - 4xxx: Token ledger errors
//! - 5xxx: Payment errors
//! - 6xxx: Class errors
//! - 7xxx: Attendance errors
//! - 8xxx: Gym errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Account is disabled
    AccountDisabled = 1007,
    /// Too many attempts from the same client
    TooManyRequests = 1008,
    /// Email is already registered
    EmailAlreadyRegistered = 1009,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,
    /// Users cannot change their own role or status
    CannotModifySelf = 2004,

    // ==================== 3xxx: Member ====================
    /// Member not found
    MemberNotFound = 3001,
    /// Member is inactive
    MemberInactive = 3002,

    // ==================== 4xxx: Token ledger ====================
    /// Balance does not cover the cost of a check-in or enrollment
    InsufficientTokens = 4001,
    /// Balance does not cover a debit
    InsufficientBalance = 4002,
    /// Ledger reference already used
    DuplicateReference = 4003,
    /// Token amount must be a positive integer
    InvalidTokenAmount = 4004,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Payment has already been refunded
    PaymentAlreadyRefunded = 5002,
    /// Invalid payment method
    PaymentInvalidMethod = 5003,
    /// Refund exceeds the tokens granted by the payment
    PaymentRefundExceedsAmount = 5004,

    // ==================== 6xxx: Class ====================
    /// Class not found
    ClassNotFound = 6001,
    /// Class is not active
    ClassInactive = 6002,
    /// Class is at capacity
    ClassFull = 6003,
    /// Member already enrolled in the class
    AlreadyEnrolled = 6004,
    /// Member is not enrolled in the class
    NotEnrolled = 6005,
    /// Class still has enrolled members
    ClassHasEnrollments = 6006,

    // ==================== 7xxx: Attendance ====================
    /// Attendance record not found
    AttendanceNotFound = 7001,
    /// Member already has an open check-in
    AlreadyCheckedIn = 7002,
    /// Attendance record already closed
    AlreadyCheckedOut = 7003,

    // ==================== 8xxx: Gym ====================
    /// Gym not found
    GymNotFound = 8001,
    /// Gym email already exists
    GymEmailExists = 8002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timed out (client may retry)
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this code represents success
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",
            ErrorCode::TooManyRequests => "Too many requests, try again later",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::CannotModifySelf => "Cannot change own role or status",

            // Member
            ErrorCode::MemberNotFound => "Member not found",
            ErrorCode::MemberInactive => "Member account is inactive",

            // Ledger
            ErrorCode::InsufficientTokens => "Insufficient tokens",
            ErrorCode::InsufficientBalance => "Insufficient token balance",
            ErrorCode::DuplicateReference => "Transaction reference already used",
            ErrorCode::InvalidTokenAmount => "Token amount must be a positive integer",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentAlreadyRefunded => "Payment has already been refunded",
            ErrorCode::PaymentInvalidMethod => "Invalid payment method",
            ErrorCode::PaymentRefundExceedsAmount => "Refund exceeds tokens granted by payment",

            // Class
            ErrorCode::ClassNotFound => "Class not found",
            ErrorCode::ClassInactive => "Class is not active",
            ErrorCode::ClassFull => "Class is full",
            ErrorCode::AlreadyEnrolled => "Member is already enrolled in this class",
            ErrorCode::NotEnrolled => "Member is not enrolled in this class",
            ErrorCode::ClassHasEnrollments => "Class has enrolled members",

            // Attendance
            ErrorCode::AttendanceNotFound => "Attendance record not found",
            ErrorCode::AlreadyCheckedIn => "Member is already checked in",
            ErrorCode::AlreadyCheckedOut => "Attendance is already checked out",

            // Gym
            ErrorCode::GymNotFound => "Gym not found",
            ErrorCode::GymEmailExists => "Gym email already exists",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::TooManyRequests),
            1009 => Ok(ErrorCode::EmailAlreadyRegistered),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),
            2004 => Ok(ErrorCode::CannotModifySelf),

            // Member
            3001 => Ok(ErrorCode::MemberNotFound),
            3002 => Ok(ErrorCode::MemberInactive),

            // Ledger
            4001 => Ok(ErrorCode::InsufficientTokens),
            4002 => Ok(ErrorCode::InsufficientBalance),
            4003 => Ok(ErrorCode::DuplicateReference),
            4004 => Ok(ErrorCode::InvalidTokenAmount),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::PaymentAlreadyRefunded),
            5003 => Ok(ErrorCode::PaymentInvalidMethod),
            5004 => Ok(ErrorCode::PaymentRefundExceedsAmount),

            // Class
            6001 => Ok(ErrorCode::ClassNotFound),
            6002 => Ok(ErrorCode::ClassInactive),
            6003 => Ok(ErrorCode::ClassFull),
            6004 => Ok(ErrorCode::AlreadyEnrolled),
            6005 => Ok(ErrorCode::NotEnrolled),
            6006 => Ok(ErrorCode::ClassHasEnrollments),

            // Attendance
            7001 => Ok(ErrorCode::AttendanceNotFound),
            7002 => Ok(ErrorCode::AlreadyCheckedIn),
            7003 => Ok(ErrorCode::AlreadyCheckedOut),

            // Gym
            8001 => Ok(ErrorCode::GymNotFound),
            8002 => Ok(ErrorCode::GymEmailExists),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::Success,
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::NotAuthenticated,
        ErrorCode::AccountDisabled,
        ErrorCode::PermissionDenied,
        ErrorCode::MemberNotFound,
        ErrorCode::MemberInactive,
        ErrorCode::InsufficientTokens,
        ErrorCode::InsufficientBalance,
        ErrorCode::DuplicateReference,
        ErrorCode::PaymentAlreadyRefunded,
        ErrorCode::ClassFull,
        ErrorCode::AlreadyEnrolled,
        ErrorCode::AlreadyCheckedIn,
        ErrorCode::AlreadyCheckedOut,
        ErrorCode::GymNotFound,
        ErrorCode::TimeoutError,
    ];

    #[test]
    fn test_try_from_matches_discriminant() {
        for code in ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(*code));
        }
    }

    #[test]
    fn test_unknown_value_rejected() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::InsufficientTokens).unwrap();
        assert_eq!(json, "4001");
        let code: ErrorCode = serde_json::from_str("7002").unwrap();
        assert_eq!(code, ErrorCode::AlreadyCheckedIn);
    }

    #[test]
    fn test_messages_not_empty() {
        for code in ALL {
            assert!(!code.message().is_empty());
        }
    }
}
