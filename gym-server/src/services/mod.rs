//! Service layer
//!
//! Units of work that span several repositories. Each mutating operation runs
//! as one transaction on the writer connection and records its ledger entry
//! inside that transaction.
//!
//! - [`registration`]: member sign-up, gym onboarding, bootstrap admin
//! - [`attendance`]: check-in / enrollment, check-out, withdrawal
//! - [`payment`]: token purchases and refunds

pub mod attendance;
pub mod payment;
pub mod registration;
