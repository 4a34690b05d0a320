//! `oysters-core`: domain foundation building blocks.
//!
//! Pure domain primitives shared by the storefront crates (no IO, no HTTP).

pub mod aggregate;
pub mod contact;
pub mod error;
pub mod id;
pub mod money;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId, UserId};
pub use money::Money;
pub use value_object::ValueObject;
