//! `oysters-auth`: authentication/authorization boundary.
//!
//! Decoupled from HTTP and storage: the API extracts a bearer token, this crate
//! turns it into claims and answers permission questions.

pub mod authorize;
pub mod claims;
pub mod jwt;
pub mod permissions;
pub mod policy;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, CommandAuthorization, authorize};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use permissions::Permission;
pub use policy::permissions_for_roles;
pub use principal::{Principal, TenantMembership};
pub use roles::Role;

pub use oysters_core::UserId;
