//! Business invitation aggregate.
//!
//! An invitation is an offer of membership sent to an email address. It starts
//! `PENDING` and is resolved exactly once, into `ACCEPTED`, `EXPIRED` or
//! `REVOKED`. Its payload (intended role, permissions, ...) is opaque JSON and
//! can only be replaced while the invitation is still pending.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use bizauth_core::{Aggregate, AggregateRoot, BusinessId, InvitationId};

use crate::EmailAddress;
use crate::store::StoreError;

/// Opaque structured payload attached to an invitation.
pub type InvitationPayload = Map<String, Value>;

// ─────────────────────────────────────────────────────────────────────────────
// Status / transitions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Expired,
    Revoked,
}

impl InvitationStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, InvitationStatus::Pending)
    }
}

impl core::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InvitationStatus::Pending => f.write_str("PENDING"),
            InvitationStatus::Accepted => f.write_str("ACCEPTED"),
            InvitationStatus::Expired => f.write_str("EXPIRED"),
            InvitationStatus::Revoked => f.write_str("REVOKED"),
        }
    }
}

/// A requested status change. Every transition starts from `PENDING`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// The invited identity confirms.
    Accept,
    /// The deadline has passed.
    Expire,
    /// The issuing business withdraws the offer.
    Revoke,
}

impl Transition {
    pub fn target(self) -> InvitationStatus {
        match self {
            Transition::Accept => InvitationStatus::Accepted,
            Transition::Expire => InvitationStatus::Expired,
            Transition::Revoke => InvitationStatus::Revoked,
        }
    }
}

impl core::fmt::Display for Transition {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Transition::Accept => f.write_str("accept"),
            Transition::Expire => f.write_str("expire"),
            Transition::Revoke => f.write_str("revoke"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvitationError {
    #[error("invitation not found: {0}")]
    NotFound(InvitationId),

    #[error("illegal transition: cannot {attempted} an invitation that is {current}")]
    IllegalTransition {
        current: InvitationStatus,
        attempted: Transition,
    },

    #[error("payload is locked: invitation is {current}")]
    PayloadLocked { current: InvitationStatus },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("invitation cannot expire before its deadline ({deadline})")]
    NotYetDue { deadline: DateTime<Utc> },

    #[error("invitation deadline passed at {deadline}")]
    DeadlinePassed { deadline: DateTime<Utc> },

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Aggregate
// ─────────────────────────────────────────────────────────────────────────────

/// A pending (or resolved) offer of membership in a business.
///
/// # Invariants
/// - Status moves forward only, from `PENDING` to one terminal state.
/// - The payload is mutable only while `PENDING`.
/// - `version` increases by one for every applied event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessInvitation {
    id: InvitationId,
    business_id: BusinessId,
    email: EmailAddress,
    status: InvitationStatus,
    #[serde(default)]
    payload: InvitationPayload,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
    version: u64,
}

impl BusinessInvitation {
    /// Issue a fresh `PENDING` invitation.
    pub fn issue(
        business_id: BusinessId,
        email: EmailAddress,
        expires_at: DateTime<Utc>,
        payload: Option<InvitationPayload>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: InvitationId::new(),
            business_id,
            email,
            status: InvitationStatus::Pending,
            payload: payload.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            expires_at,
            responded_at: None,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> InvitationId {
        self.id
    }

    pub fn business_id(&self) -> BusinessId {
        self.business_id
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn status(&self) -> InvitationStatus {
        self.status
    }

    pub fn payload(&self) -> &InvitationPayload {
        &self.payload
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn responded_at(&self) -> Option<DateTime<Utc>> {
        self.responded_at
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl AggregateRoot for BusinessInvitation {
    type Id = InvitationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Command: move a pending invitation to a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Respond {
    pub transition: Transition,
    pub at: DateTime<Utc>,
}

/// Command: replace the payload of a pending invitation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacePayload {
    pub payload: InvitationPayload,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InvitationCommand {
    Respond(Respond),
    ReplacePayload(ReplacePayload),
}

// ─────────────────────────────────────────────────────────────────────────────
// Events
// ─────────────────────────────────────────────────────────────────────────────

/// Event: the invitation reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationResolved {
    pub status: InvitationStatus,
    pub at: DateTime<Utc>,
}

/// Event: the payload was replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadReplaced {
    pub payload: InvitationPayload,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InvitationEvent {
    Resolved(InvitationResolved),
    PayloadReplaced(PayloadReplaced),
}

impl Aggregate for BusinessInvitation {
    type Command = InvitationCommand;
    type Event = InvitationEvent;
    type Error = InvitationError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvitationEvent::Resolved(e) => {
                self.status = e.status;
                self.responded_at = Some(e.at);
                self.updated_at = e.at;
            }
            InvitationEvent::PayloadReplaced(e) => {
                self.payload = e.payload.clone();
                self.updated_at = e.at;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvitationCommand::Respond(cmd) => self.handle_respond(cmd),
            InvitationCommand::ReplacePayload(cmd) => self.handle_replace_payload(cmd),
        }
    }
}

impl BusinessInvitation {
    fn handle_respond(&self, cmd: &Respond) -> Result<Vec<InvitationEvent>, InvitationError> {
        if self.status.is_terminal() {
            return Err(InvitationError::IllegalTransition {
                current: self.status,
                attempted: cmd.transition,
            });
        }

        match cmd.transition {
            Transition::Accept if self.is_overdue(cmd.at) => {
                return Err(InvitationError::DeadlinePassed {
                    deadline: self.expires_at,
                });
            }
            Transition::Expire if !self.is_overdue(cmd.at) => {
                return Err(InvitationError::NotYetDue {
                    deadline: self.expires_at,
                });
            }
            _ => {}
        }

        Ok(vec![InvitationEvent::Resolved(InvitationResolved {
            status: cmd.transition.target(),
            at: cmd.at,
        })])
    }

    fn handle_replace_payload(
        &self,
        cmd: &ReplacePayload,
    ) -> Result<Vec<InvitationEvent>, InvitationError> {
        if self.status.is_terminal() {
            return Err(InvitationError::PayloadLocked {
                current: self.status,
            });
        }

        Ok(vec![InvitationEvent::PayloadReplaced(PayloadReplaced {
            payload: cmd.payload.clone(),
            at: cmd.at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending(now: DateTime<Utc>) -> BusinessInvitation {
        BusinessInvitation::issue(
            BusinessId::new(),
            EmailAddress::parse("new.hire@shop.io").unwrap(),
            now + Duration::days(7),
            None,
            now,
        )
    }

    fn respond(invitation: &mut BusinessInvitation, transition: Transition, at: DateTime<Utc>) -> Result<(), InvitationError> {
        let events = invitation.handle(&InvitationCommand::Respond(Respond { transition, at }))?;
        for event in &events {
            invitation.apply(event);
        }
        Ok(())
    }

    #[test]
    fn issued_invitation_is_pending_with_empty_payload() {
        let invitation = pending(Utc::now());
        assert_eq!(invitation.status(), InvitationStatus::Pending);
        assert!(invitation.payload().is_empty());
        assert_eq!(invitation.version(), 0);
        assert!(invitation.responded_at().is_none());
    }

    #[test]
    fn accept_resolves_once() {
        let now = Utc::now();
        let mut invitation = pending(now);

        respond(&mut invitation, Transition::Accept, now).unwrap();
        assert_eq!(invitation.status(), InvitationStatus::Accepted);
        assert_eq!(invitation.responded_at(), Some(now));
        assert_eq!(invitation.version(), 1);

        let err = respond(&mut invitation, Transition::Accept, now).unwrap_err();
        assert_eq!(
            err,
            InvitationError::IllegalTransition {
                current: InvitationStatus::Accepted,
                attempted: Transition::Accept,
            }
        );
    }

    #[test]
    fn terminal_states_reject_every_transition() {
        let now = Utc::now();
        let overdue = now + Duration::days(8);

        for (first, at) in [
            (Transition::Accept, now),
            (Transition::Expire, overdue),
            (Transition::Revoke, now),
        ] {
            let mut invitation = pending(now);
            respond(&mut invitation, first, at).unwrap();

            for next in [Transition::Accept, Transition::Expire, Transition::Revoke] {
                let err = respond(&mut invitation, next, overdue).unwrap_err();
                assert!(matches!(
                    err,
                    InvitationError::IllegalTransition { current, attempted }
                        if current == first.target() && attempted == next
                ));
            }
        }
    }

    #[test]
    fn expire_requires_deadline_to_have_passed() {
        let now = Utc::now();
        let mut invitation = pending(now);

        let err = respond(&mut invitation, Transition::Expire, now).unwrap_err();
        assert!(matches!(err, InvitationError::NotYetDue { .. }));
        assert_eq!(invitation.status(), InvitationStatus::Pending);

        let expires_at = invitation.expires_at();
        respond(&mut invitation, Transition::Expire, expires_at).unwrap();
        assert_eq!(invitation.status(), InvitationStatus::Expired);
    }

    #[test]
    fn accept_after_deadline_is_rejected() {
        let now = Utc::now();
        let mut invitation = pending(now);

        let err = respond(&mut invitation, Transition::Accept, now + Duration::days(30)).unwrap_err();
        assert!(matches!(err, InvitationError::DeadlinePassed { .. }));
        assert_eq!(invitation.status(), InvitationStatus::Pending);
    }

    #[test]
    fn payload_is_replaceable_only_while_pending() {
        let now = Utc::now();
        let mut invitation = pending(now);

        let mut payload = InvitationPayload::new();
        payload.insert("role".to_string(), Value::from("Manager"));

        let cmd = InvitationCommand::ReplacePayload(ReplacePayload {
            payload: payload.clone(),
            at: now,
        });
        for event in invitation.handle(&cmd).unwrap() {
            invitation.apply(&event);
        }
        assert_eq!(invitation.payload(), &payload);

        respond(&mut invitation, Transition::Revoke, now).unwrap();

        let err = invitation.handle(&cmd).unwrap_err();
        assert_eq!(
            err,
            InvitationError::PayloadLocked {
                current: InvitationStatus::Revoked
            }
        );
    }

    #[test]
    fn status_serializes_upper_case() {
        let json = serde_json::to_string(&InvitationStatus::Revoked).unwrap();
        assert_eq!(json, "\"REVOKED\"");
    }
}
