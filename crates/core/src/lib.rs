//! `bizauth-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::DomainError;
pub use id::{BusinessId, InvitationId, MembershipId, RoleId, UserId};
pub use value_object::ValueObject;
