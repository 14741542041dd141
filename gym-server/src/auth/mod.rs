//! Authentication and authorization
//!
//! - [`JwtService`]: token issue and validation
//! - [`CurrentUser`]: authenticated caller
//! - [`require_auth`]: authentication middleware
//! - [`require_policy`]: policy check middleware, yields a [`Grant`]
//! - [`password`]: argon2 hashing
//! - [`RateLimiter`]: login/register throttling

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod policy;
pub mod rate_limit;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{CurrentUserExt, require_auth, require_policy};
pub use policy::{Action, Grant, Resource, Scope, authorize};
pub use rate_limit::{RateLimiter, login_rate_limit, register_rate_limit};
