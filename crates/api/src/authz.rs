//! Permission checks at the HTTP boundary, before any command is dispatched.

use oysters_auth::{
    AuthzError, CommandAuthorization, Principal, Role, TenantMembership, authorize, permissions_for_roles,
};
use oysters_orders::ActorRole;

use crate::context::{PrincipalContext, TenantContext};

pub fn principal_for(tenant: &TenantContext, principal: &PrincipalContext) -> Principal {
    Principal {
        user_id: principal.user_id(),
        active_tenant_id: tenant.tenant_id(),
        membership: TenantMembership {
            tenant_id: tenant.tenant_id(),
            roles: principal.roles().to_vec(),
            permissions: permissions_for_roles(principal.roles()),
        },
    }
}

/// Every permission the command names must be granted.
pub fn authorize_command<C: CommandAuthorization>(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    command: &C,
) -> Result<(), AuthzError> {
    let principal = principal_for(tenant, principal);
    for perm in command.required_permissions() {
        authorize(&principal, perm)?;
    }
    Ok(())
}

/// Workflow roles the token's roles map to: admin and staff act as ops,
/// couriers as couriers.
pub fn actor_roles(roles: &[Role]) -> Vec<ActorRole> {
    let mut out = Vec::new();
    if roles.iter().any(|r| *r == Role::ADMIN || *r == Role::STAFF) {
        out.push(ActorRole::Ops);
    }
    if roles.contains(&Role::COURIER) {
        out.push(ActorRole::Courier);
    }
    out
}

/// The wildcard permission does not let a principal borrow another role's
/// transition table.
pub fn ensure_acts_as(principal: &PrincipalContext, role: ActorRole) -> Result<(), AuthzError> {
    if actor_roles(principal.roles()).contains(&role) {
        Ok(())
    } else {
        Err(AuthzError::RoleNotHeld(role.to_string()))
    }
}
