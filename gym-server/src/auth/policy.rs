//! Access policy
//!
//! One table keyed by (role, resource, action). A missing entry is a denial;
//! an entry grants either any record (`Scope::Any`) or only records the caller
//! owns (`Scope::Own`). Ownership is resolved by the handler through
//! [`Grant::check_owner`] once it has loaded the record.

use std::fmt;

use shared::models::Role;
use shared::{AppError, ErrorCode};

use super::CurrentUser;
use crate::security_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Members,
    Tokens,
    Attendance,
    Classes,
    Payments,
    Gyms,
    Users,
    Reports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    List,
    Create,
    Update,
    Delete,
    Adjust,
    Audit,
    Refund,
    Enroll,
    Withdraw,
    CheckIn,
    CheckOut,
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Any,
    Own,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

use Action::*;
use Resource::*;
use Scope::*;

const ADMIN: Role = Role::Admin;
const GYM: Role = Role::Gym;
const MEMBER: Role = Role::Member;

#[rustfmt::skip]
const POLICY: &[(Role, Resource, Action, Scope)] = &[
    // Members
    (ADMIN,  Members, List,     Any),
    (GYM,    Members, List,     Any),
    (ADMIN,  Members, Read,     Any),
    (GYM,    Members, Read,     Any),
    (MEMBER, Members, Read,     Own),
    (MEMBER, Members, Update,   Own),
    (ADMIN,  Members, Delete,   Any),
    // Tokens
    (ADMIN,  Tokens,  Read,     Any),
    (GYM,    Tokens,  Read,     Any),
    (MEMBER, Tokens,  Read,     Own),
    (ADMIN,  Tokens,  Adjust,   Any),
    (ADMIN,  Tokens,  Audit,    Any),
    // Attendance
    (ADMIN,  Attendance, CheckIn,  Any),
    (GYM,    Attendance, CheckIn,  Any),
    (MEMBER, Attendance, CheckIn,  Own),
    (ADMIN,  Attendance, CheckOut, Any),
    (GYM,    Attendance, CheckOut, Any),
    (MEMBER, Attendance, CheckOut, Own),
    (ADMIN,  Attendance, List,     Any),
    (GYM,    Attendance, List,     Any),
    (ADMIN,  Attendance, Read,     Any),
    (GYM,    Attendance, Read,     Any),
    (MEMBER, Attendance, Read,     Own),
    // Classes
    (ADMIN,  Classes, Read,     Any),
    (GYM,    Classes, Read,     Any),
    (MEMBER, Classes, Read,     Any),
    (ADMIN,  Classes, Create,   Any),
    (GYM,    Classes, Create,   Own),
    (ADMIN,  Classes, Update,   Any),
    (GYM,    Classes, Update,   Own),
    (ADMIN,  Classes, Delete,   Any),
    (ADMIN,  Classes, Enroll,   Any),
    (GYM,    Classes, Enroll,   Any),
    (MEMBER, Classes, Enroll,   Own),
    (ADMIN,  Classes, Withdraw, Any),
    (GYM,    Classes, Withdraw, Own),
    // Payments
    (ADMIN,  Payments, Create,  Any),
    (GYM,    Payments, Create,  Any),
    (ADMIN,  Payments, Refund,  Any),
    (ADMIN,  Payments, List,    Any),
    (MEMBER, Payments, List,    Own),
    (ADMIN,  Payments, Read,    Any),
    (MEMBER, Payments, Read,    Own),
    // Gyms (public listing needs no grant)
    (ADMIN,  Gyms,    Create,   Any),
    (ADMIN,  Gyms,    Update,   Any),
    (GYM,    Gyms,    Update,   Own),
    (ADMIN,  Gyms,    Delete,   Any),
    (ADMIN,  Gyms,    Read,     Any),
    (GYM,    Gyms,    Read,     Own),
    // Users
    (ADMIN,  Users,   List,     Any),
    (ADMIN,  Users,   Update,   Any),
    // Reports
    (ADMIN,  Reports, Read,     Any),
    (ADMIN,  Reports, Export,   Any),
];

/// Scope granted to `role` for `action` on `resource`, if any
pub fn lookup(role: Role, resource: Resource, action: Action) -> Option<Scope> {
    POLICY
        .iter()
        .find(|(r, res, act, _)| *r == role && *res == resource && *act == action)
        .map(|(_, _, _, scope)| *scope)
}

/// Result of a successful policy check, inserted into request extensions
#[derive(Debug, Clone)]
pub struct Grant {
    pub user: CurrentUser,
    pub scope: Scope,
    pub resource: Resource,
    pub action: Action,
}

impl Grant {
    pub fn is_any(&self) -> bool {
        self.scope == Scope::Any
    }

    /// Allow when the grant covers every record or the caller owns this one
    pub fn check_owner(&self, owner_user_id: Option<i64>) -> Result<(), AppError> {
        if self.scope == Scope::Any || owner_user_id == Some(self.user.id) {
            return Ok(());
        }
        security_log!(
            "WARN",
            "ownership_denied",
            user_id = self.user.id,
            role = self.user.role.as_str(),
            resource = self.resource.to_string(),
            action = self.action.to_string()
        );
        Err(AppError::with_message(
            ErrorCode::PermissionDenied,
            "You can only access your own records",
        ))
    }
}

/// Look up the grant for `user`, logging and rejecting denials
pub fn authorize(user: &CurrentUser, resource: Resource, action: Action) -> Result<Grant, AppError> {
    match lookup(user.role, resource, action) {
        Some(scope) => Ok(Grant {
            user: user.clone(),
            scope,
            resource,
            action,
        }),
        None => {
            security_log!(
                "WARN",
                "permission_denied",
                user_id = user.id,
                role = user.role.as_str(),
                resource = resource.to_string(),
                action = action.to_string()
            );
            Err(AppError::with_message(
                ErrorCode::PermissionDenied,
                format!("Permission denied: {resource}:{action}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            name: format!("user-{id}"),
            role,
        }
    }

    #[test]
    fn test_member_reads_own_balance_only() {
        assert_eq!(lookup(Role::Member, Tokens, Read), Some(Own));
        assert_eq!(lookup(Role::Gym, Tokens, Read), Some(Any));
        assert_eq!(lookup(Role::Member, Tokens, Adjust), None);
    }

    #[test]
    fn test_refund_is_admin_only() {
        assert_eq!(lookup(Role::Admin, Payments, Refund), Some(Any));
        assert_eq!(lookup(Role::Gym, Payments, Refund), None);
        assert_eq!(lookup(Role::Member, Payments, Refund), None);
    }

    #[test]
    fn test_no_duplicate_entries() {
        for (i, a) in POLICY.iter().enumerate() {
            for b in &POLICY[i + 1..] {
                assert!(
                    !(a.0 == b.0 && a.1 == b.1 && a.2 == b.2),
                    "duplicate policy entry for {:?} {:?} {:?}",
                    a.0,
                    a.1,
                    a.2
                );
            }
        }
    }

    #[test]
    fn test_grant_ownership() {
        let grant = authorize(&user(7, Role::Member), Members, Read).unwrap();
        assert!(grant.check_owner(Some(7)).is_ok());
        let err = grant.check_owner(Some(8)).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(grant.check_owner(None).is_err());

        let admin = authorize(&user(1, Role::Admin), Members, Read).unwrap();
        assert!(admin.check_owner(Some(8)).is_ok());
    }

    #[test]
    fn test_denied_action() {
        let err = authorize(&user(3, Role::Member), Reports, Export).unwrap_err();
        assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);
    }
}
