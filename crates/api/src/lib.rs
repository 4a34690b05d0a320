//! HTTP API for the storefront back office: public checkout and payment
//! routes, plus token-protected ops, courier and admin routes.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
