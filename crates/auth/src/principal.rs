use serde::{Deserialize, Serialize};

use oysters_core::{TenantId, UserId};

use crate::{Permission, Role};

/// A principal's membership in a tenant: which roles and permissions apply
/// there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<Role>,
    pub permissions: Vec<Permission>,
}

/// A fully resolved principal for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub active_tenant_id: TenantId,
    pub membership: TenantMembership,
}

impl Principal {
    pub fn has_role(&self, role: &Role) -> bool {
        self.membership.roles.contains(role)
    }
}
