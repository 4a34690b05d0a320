//! Static role → permission mapping for the storefront back office.

use crate::{Permission, Role};

/// Permissions granted by a single role. Unknown roles grant nothing.
pub fn role_permissions(role: &Role) -> Vec<Permission> {
    match role.as_str() {
        "admin" => vec![Permission::WILDCARD],
        "staff" => vec![Permission::OPS_READ, Permission::OPS_TRANSITION],
        "courier" => vec![Permission::COURIER_READ, Permission::COURIER_TRANSITION],
        _ => Vec::new(),
    }
}

/// Union of the permissions granted by `roles`, without duplicates.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut out: Vec<Permission> = Vec::new();
    for perm in roles.iter().flat_map(role_permissions) {
        if !out.contains(&perm) {
            out.push(perm);
        }
    }
    out
}
