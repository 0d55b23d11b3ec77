use thiserror::Error;

use mintledger_core::Address;

use crate::{AccessRegistry, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("account {account} is missing role '{role}'")]
    MissingRole { account: Address, role: Role },

    #[error("bad confirmation: {caller} may only renounce its own roles, not {confirmation}'s")]
    BadConfirmation { caller: Address, confirmation: Address },
}

/// Require `account` to hold `role`.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize<R>(registry: &R, role: &Role, account: Address) -> Result<(), AccessError>
where
    R: AccessRegistry + ?Sized,
{
    if registry.has_role(role, account) {
        Ok(())
    } else {
        Err(AccessError::MissingRole {
            account,
            role: role.clone(),
        })
    }
}

/// Require `account` to hold the admin role of `role` (grant/revoke gate).
pub fn authorize_role_admin<R>(registry: &R, role: &Role, account: Address) -> Result<(), AccessError>
where
    R: AccessRegistry + ?Sized,
{
    let admin = registry.role_admin(role);
    authorize(registry, &admin, account)
}

/// Roles can only be renounced by their holder.
pub fn check_renounce(caller: Address, confirmation: Address) -> Result<(), AccessError> {
    if caller == confirmation {
        Ok(())
    } else {
        Err(AccessError::BadConfirmation {
            caller,
            confirmation,
        })
    }
}
