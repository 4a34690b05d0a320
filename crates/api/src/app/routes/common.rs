use std::sync::Arc;

use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::Utc;

use oysters_auth::{CommandAuthorization, Permission};
use oysters_orders::{ActorRole, ChangeStatus, OrderCommand, OrderId, allowed_actions};

use crate::app::{dto, errors, services::AppServices};
use crate::context::{PrincipalContext, TenantContext};

/// Associates required permissions with a command (or with `()` for reads).
pub struct CmdAuth<C> {
    pub inner: C,
    pub required: Vec<Permission>,
}

impl<C> CommandAuthorization for CmdAuth<C> {
    fn required_permissions(&self) -> &[Permission] {
        &self.required
    }
}

/// Check a read-only route's permissions.
pub fn require(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    required: Vec<Permission>,
) -> Result<(), axum::response::Response> {
    let auth = CmdAuth { inner: (), required };
    crate::authz::authorize_command(tenant, principal, &auth).map_err(errors::authz_error_to_response)
}

/// Shared body of the ops and courier status endpoints: same aggregate gate,
/// different role and permission. The principal must hold `role` itself.
pub fn change_status(
    services: &Arc<AppServices>,
    tenant: &TenantContext,
    principal: &PrincipalContext,
    raw_id: &str,
    body: dto::StatusChangeRequest,
    role: ActorRole,
    permission: Permission,
) -> axum::response::Response {
    let order_id = match errors::parse_id(raw_id, "order") {
        Ok(id) => OrderId::new(id),
        Err(resp) => return resp,
    };

    let cmd = OrderCommand::ChangeStatus(ChangeStatus {
        tenant_id: tenant.tenant_id(),
        order_id,
        status: body.status,
        changed_by: principal.user_id(),
        role,
        note: body.note,
        occurred_at: Utc::now(),
    });

    let cmd_auth = CmdAuth {
        inner: cmd,
        required: vec![permission],
    };
    if let Err(e) = crate::authz::authorize_command(tenant, principal, &cmd_auth)
        .and_then(|()| crate::authz::ensure_acts_as(principal, role))
    {
        return errors::authz_error_to_response(e);
    }

    let committed = match services.dispatch_order(tenant.tenant_id(), cmd_auth.inner) {
        Ok(c) => c,
        Err(e) => {
            tracing::info!(%order_id, %role, error = %e, "status change refused");
            return errors::dispatch_error_to_response(e);
        }
    };

    let order = match services.load_order(tenant.tenant_id(), order_id) {
        Ok(o) => o,
        Err(e) => return errors::dispatch_error_to_response(e),
    };
    tracing::info!(%order_id, %role, status = %order.status(), "order status changed");

    (
        StatusCode::OK,
        Json(dto::OrderStateResponse::new(
            &order,
            &committed,
            allowed_actions(role, order.status()),
        )),
    )
        .into_response()
}
