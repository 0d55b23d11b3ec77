use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role identifier used for access control.
///
/// Roles are opaque names. The ledger uses four fixed roles; every role is
/// administered by [`Role::DEFAULT_ADMIN`] unless configured otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Administers every other role.
    pub const DEFAULT_ADMIN: Role = Role(Cow::Borrowed("DEFAULT_ADMIN_ROLE"));
    /// May pause and unpause balance movements.
    pub const PAUSER: Role = Role(Cow::Borrowed("PAUSER_ROLE"));
    /// May issue new supply.
    pub const MINTER: Role = Role(Cow::Borrowed("MINTER_ROLE"));
    /// May swap the implementation pointer.
    pub const UPGRADER: Role = Role(Cow::Borrowed("UPGRADER_ROLE"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
