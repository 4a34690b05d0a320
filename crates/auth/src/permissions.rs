use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier (e.g. `"orders.ops.transition"`).
///
/// The wildcard `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    /// Read the ops dashboard.
    pub const OPS_READ: Permission = Permission(Cow::Borrowed("orders.ops.read"));
    /// Move orders through the ops/admin transition table.
    pub const OPS_TRANSITION: Permission = Permission(Cow::Borrowed("orders.ops.transition"));
    /// Read the courier dashboard.
    pub const COURIER_READ: Permission = Permission(Cow::Borrowed("orders.courier.read"));
    /// Move orders through the courier transition table.
    pub const COURIER_TRANSITION: Permission = Permission(Cow::Borrowed("orders.courier.transition"));
    pub const ORDERS_LIST: Permission = Permission(Cow::Borrowed("orders.admin.list"));
    pub const ORDERS_BULK_UPDATE: Permission = Permission(Cow::Borrowed("orders.admin.bulk_update"));
    pub const NOTIFICATION_SETTINGS_READ: Permission =
        Permission(Cow::Borrowed("settings.notifications.read"));
    pub const NOTIFICATION_SETTINGS_WRITE: Permission =
        Permission(Cow::Borrowed("settings.notifications.write"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
