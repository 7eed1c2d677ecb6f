//! `bankacct-core` — domain foundation building blocks.
//!
//! Pure domain primitives shared by the account crates (no IO, no logging).

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::DomainError;
pub use id::AggregateId;
