//! Invitation lifecycle service: load → decide → apply → compare-and-save.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use bizauth_core::{Aggregate, AggregateRoot, ExpectedVersion, InvitationId};

use crate::store::{InvitationStore, StoreError};
use crate::{
    BusinessInvitation, InvitationCommand, InvitationError, ReplacePayload, Respond, Transition,
};

/// How many times an operation re-reads and re-decides after losing an
/// optimistic-concurrency race before giving up with the conflict.
const MAX_CONFLICT_RETRIES: usize = 3;

/// Outcome of [`InvitationLifecycle::expire_overdue`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpirySweep {
    pub expired: Vec<InvitationId>,
    pub failures: Vec<(InvitationId, String)>,
}

/// Drives invitation state changes against an [`InvitationStore`].
///
/// Each operation is a single-record read-modify-write guarded by the
/// record's version. When two callers race on the same pending invitation,
/// the loser re-reads the winner's state and is rejected by the terminal
/// guard, e.g. a revoke racing an accept reports `IllegalTransition`.
///
/// Accepting does not create the membership; callers do that once
/// `transition(.., Transition::Accept, ..)` returns `Ok`.
#[derive(Debug, Clone)]
pub struct InvitationLifecycle<S> {
    store: S,
}

impl<S> InvitationLifecycle<S>
where
    S: InvitationStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn transition(
        &self,
        id: InvitationId,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<BusinessInvitation, InvitationError> {
        let command = InvitationCommand::Respond(Respond {
            transition,
            at: now,
        });
        let invitation = self.execute(id, &command)?;
        tracing::info!(
            invitation_id = %id,
            business_id = %invitation.business_id(),
            status = %invitation.status(),
            "invitation resolved"
        );
        Ok(invitation)
    }

    /// Replace the payload of a pending invitation. `payload` must be a JSON
    /// object.
    pub fn update_payload(
        &self,
        id: InvitationId,
        payload: Value,
        now: DateTime<Utc>,
    ) -> Result<BusinessInvitation, InvitationError> {
        let Value::Object(payload) = payload else {
            return Err(InvitationError::InvalidPayload(
                "payload must be a JSON object".to_string(),
            ));
        };

        let command = InvitationCommand::ReplacePayload(ReplacePayload { payload, at: now });
        let invitation = self.execute(id, &command)?;
        tracing::debug!(invitation_id = %id, "invitation payload replaced");
        Ok(invitation)
    }

    /// Expire every pending invitation whose deadline is at or before `now`.
    ///
    /// Failures on individual invitations are collected and do not stop the
    /// sweep. An invitation resolved concurrently is skipped silently.
    pub fn expire_overdue(&self, now: DateTime<Utc>) -> Result<ExpirySweep, StoreError> {
        let mut sweep = ExpirySweep::default();

        for invitation in self.store.list_pending()? {
            if !invitation.is_overdue(now) {
                continue;
            }
            let id = invitation.id_typed();
            match self.transition(id, Transition::Expire, now) {
                Ok(_) => sweep.expired.push(id),
                Err(InvitationError::IllegalTransition { .. }) => {}
                Err(e) => {
                    tracing::warn!(invitation_id = %id, error = %e, "failed to expire invitation");
                    sweep.failures.push((id, e.to_string()));
                }
            }
        }

        tracing::info!(
            expired = sweep.expired.len(),
            failed = sweep.failures.len(),
            "invitation expiry sweep finished"
        );
        Ok(sweep)
    }

    fn execute(
        &self,
        id: InvitationId,
        command: &InvitationCommand,
    ) -> Result<BusinessInvitation, InvitationError> {
        let mut attempt = 0;
        loop {
            let mut invitation = self
                .store
                .get(id)?
                .ok_or(InvitationError::NotFound(id))?;
            let loaded = invitation.version();

            for event in invitation.handle(command)? {
                invitation.apply(&event);
            }

            match self.store.save(&invitation, ExpectedVersion::Exact(loaded)) {
                Ok(()) => return Ok(invitation),
                Err(e) if e.is_conflict() && attempt < MAX_CONFLICT_RETRIES => {
                    attempt += 1;
                    tracing::debug!(invitation_id = %id, attempt, "invitation changed concurrently; retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
