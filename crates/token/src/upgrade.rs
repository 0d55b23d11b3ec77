//! Upgrade gate: the swappable implementation pointer.
//!
//! Only the pointer moves; balances, roles and minting records are owned by the
//! other collaborators and survive every upgrade unchanged.

use mintledger_access::{AccessRegistry, Role, authorize};
use mintledger_core::Address;

use crate::error::TokenError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeGate {
    implementation: String,
}

impl UpgradeGate {
    pub fn new(implementation: impl Into<String>) -> Self {
        Self {
            implementation: implementation.into(),
        }
    }

    pub fn implementation(&self) -> &str {
        &self.implementation
    }

    pub fn check_upgrade<R>(&self, registry: &R, caller: Address, next: &str) -> Result<(), TokenError>
    where
        R: AccessRegistry + ?Sized,
    {
        authorize(registry, &Role::UPGRADER, caller)?;

        if next.trim().is_empty() {
            return Err(TokenError::InvalidImplementation(
                "implementation cannot be empty".to_string(),
            ));
        }
        if next == self.implementation {
            return Err(TokenError::InvalidImplementation(format!(
                "already pointing at '{next}'"
            )));
        }
        Ok(())
    }

    pub fn point_to(&mut self, implementation: impl Into<String>) {
        self.implementation = implementation.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mintledger_access::RoleRegistry;

    #[test]
    fn only_upgraders_may_swap() {
        let upgrader = Address::from_bytes([4; 20]);
        let mut roles = RoleRegistry::new();
        roles.grant(Role::UPGRADER, upgrader);
        let gate = UpgradeGate::new("v1");

        assert!(gate.check_upgrade(&roles, upgrader, "v2").is_ok());
        assert!(matches!(
            gate.check_upgrade(&roles, Address::from_bytes([5; 20]), "v2"),
            Err(TokenError::CapabilityDenied { .. })
        ));
        assert!(matches!(
            gate.check_upgrade(&roles, upgrader, "v1"),
            Err(TokenError::InvalidImplementation(_))
        ));
        assert!(matches!(
            gate.check_upgrade(&roles, upgrader, ""),
            Err(TokenError::InvalidImplementation(_))
        ));
    }
}
