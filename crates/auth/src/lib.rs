//! `bizauth-auth` — identity resolution, invitation lifecycle and role-binding
//! backfill for business accounts.
//!
//! This crate is decoupled from HTTP and storage: it talks to persistence only
//! through the ports in [`store`]. In-memory adapters live in [`in_memory`].

pub mod backfill;
pub mod credentials;
pub mod email;
pub mod in_memory;
pub mod invitation;
pub mod lifecycle;
pub mod mapping;
pub mod membership;
pub mod resolver;
pub mod roles;
pub mod store;
pub mod user;

pub use backfill::{
    BackfillPlan, BackfillReport, BindingFailure, PlannedBinding, ReversalReport, RoleBackfill,
};
pub use credentials::{Credentials, Secret};
pub use email::EmailAddress;
pub use invitation::{
    BusinessInvitation, InvitationCommand, InvitationError, InvitationEvent, InvitationPayload,
    InvitationResolved, InvitationStatus, PayloadReplaced, ReplacePayload, Respond, Transition,
};
pub use lifecycle::{ExpirySweep, InvitationLifecycle};
pub use mapping::RoleMapping;
pub use membership::{BusinessMembership, LegacyRole};
pub use resolver::IdentityResolver;
pub use roles::{Permission, Role, RoleName};
pub use store::{InvitationStore, MembershipStore, RoleCatalog, StoreError, UserStore};
pub use user::User;
