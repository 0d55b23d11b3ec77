use std::collections::{BTreeSet, HashMap};

use mintledger_core::Address;

use crate::Role;

/// Read-only capability queries (the only thing minting needs).
pub trait AccessRegistry {
    /// Does `account` hold `role`?
    fn has_role(&self, role: &Role, account: Address) -> bool;

    /// The role whose holders may grant/revoke `role`.
    fn role_admin(&self, role: &Role) -> Role;
}

/// In-aggregate role membership table.
///
/// Mutations return whether anything changed so callers can skip emitting
/// events for no-op grants/revokes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRegistry {
    members: HashMap<Role, BTreeSet<Address>>,
    admins: HashMap<Role, Role>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `account` to `role`. Returns `false` if it already held the role.
    pub fn grant(&mut self, role: Role, account: Address) -> bool {
        self.members.entry(role).or_default().insert(account)
    }

    /// Remove `account` from `role`. Returns `false` if it did not hold the role.
    pub fn revoke(&mut self, role: &Role, account: Address) -> bool {
        match self.members.get_mut(role) {
            Some(set) => {
                let removed = set.remove(&account);
                if set.is_empty() {
                    self.members.remove(role);
                }
                removed
            }
            None => false,
        }
    }

    /// Change which role administers `role`.
    pub fn set_role_admin(&mut self, role: Role, admin: Role) {
        if admin == Role::DEFAULT_ADMIN {
            self.admins.remove(&role);
        } else {
            self.admins.insert(role, admin);
        }
    }

    /// Holders of `role`, in address order.
    pub fn members(&self, role: &Role) -> Vec<Address> {
        self.members
            .get(role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }
}

impl AccessRegistry for RoleRegistry {
    fn has_role(&self, role: &Role, account: Address) -> bool {
        self.members
            .get(role)
            .is_some_and(|set| set.contains(&account))
    }

    fn role_admin(&self, role: &Role) -> Role {
        self.admins.get(role).cloned().unwrap_or(Role::DEFAULT_ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        let mut raw = [0u8; 20];
        raw[19] = n;
        Address::from_bytes(raw)
    }

    #[test]
    fn grant_is_idempotent() {
        let mut reg = RoleRegistry::new();
        assert!(reg.grant(Role::MINTER, addr(1)));
        assert!(!reg.grant(Role::MINTER, addr(1)));
        assert!(reg.has_role(&Role::MINTER, addr(1)));
        assert!(!reg.has_role(&Role::PAUSER, addr(1)));
    }

    #[test]
    fn revoke_reports_change() {
        let mut reg = RoleRegistry::new();
        reg.grant(Role::PAUSER, addr(2));
        assert!(reg.revoke(&Role::PAUSER, addr(2)));
        assert!(!reg.revoke(&Role::PAUSER, addr(2)));
        assert!(reg.members(&Role::PAUSER).is_empty());
    }

    #[test]
    fn admin_defaults_to_default_admin() {
        let mut reg = RoleRegistry::new();
        assert_eq!(reg.role_admin(&Role::MINTER), Role::DEFAULT_ADMIN);

        reg.set_role_admin(Role::MINTER, Role::UPGRADER);
        assert_eq!(reg.role_admin(&Role::MINTER), Role::UPGRADER);

        reg.set_role_admin(Role::MINTER, Role::DEFAULT_ADMIN);
        assert_eq!(reg.role_admin(&Role::MINTER), Role::DEFAULT_ADMIN);
    }

    #[test]
    fn members_are_sorted() {
        let mut reg = RoleRegistry::new();
        reg.grant(Role::MINTER, addr(9));
        reg.grant(Role::MINTER, addr(3));
        assert_eq!(reg.members(&Role::MINTER), vec![addr(3), addr(9)]);
    }
}
