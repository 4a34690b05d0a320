use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Role name carried in tokens (`"admin"`, `"staff"`, `"courier"`, ...).
///
/// Roles stay opaque strings on the wire; [`crate::policy`] maps them to
/// permissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    /// Store owner / administrator.
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    /// Kitchen and dispatch staff (ops dashboard).
    pub const STAFF: Role = Role(Cow::Borrowed("staff"));
    pub const COURIER: Role = Role(Cow::Borrowed("courier"));
    pub const CUSTOMER: Role = Role(Cow::Borrowed("customer"));

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
