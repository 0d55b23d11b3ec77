//! `mintledger-access`: role-based access control for the ledger.
//!
//! Pure state + policy checks: no IO, no storage. The token aggregate embeds a
//! [`RoleRegistry`] and consults it through the narrow [`AccessRegistry`] trait.

pub mod authorize;
pub mod registry;
pub mod roles;

pub use authorize::{AccessError, authorize, authorize_role_admin, check_renounce};
pub use registry::{AccessRegistry, RoleRegistry};
pub use roles::Role;
