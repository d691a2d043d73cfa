//! Role-binding backfill: legacy membership tags → catalog role records.
//!
//! ## Algorithm
//!
//! For every membership without an `rbac_role`:
//!
//! 1. Map the legacy tag to a role name via [`RoleMapping`]. No entry →
//!    *mapping miss*.
//! 2. Look the name up in the [`RoleCatalog`]. Not seeded → *catalog miss*.
//! 3. Bind the membership to the role and save it.
//!
//! Already-bound memberships are skipped without a write, so the run is
//! idempotent and safe to restart after a crash. Each membership's outcome
//! depends only on its own tag and the catalog, which is what lets
//! [`RoleBackfill::run_parallel`] split the scan across workers.
//!
//! Misses are report entries, not errors. A failed save is recorded against
//! that membership and the run continues; only a failed scan aborts.

use std::collections::HashMap;
use std::thread;

use serde::Serialize;

use bizauth_core::MembershipId;

use crate::store::{MembershipStore, RoleCatalog, StoreError};
use crate::{BusinessMembership, LegacyRole, Role, RoleMapping, RoleName};

// ─────────────────────────────────────────────────────────────────────────────
// Reports
// ─────────────────────────────────────────────────────────────────────────────

/// A membership the run could not process because a store call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingFailure {
    pub membership_id: MembershipId,
    pub error: String,
}

/// Outcome of [`RoleBackfill::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    /// Memberships bound (and saved) by this run.
    pub bound: usize,
    /// Memberships skipped because they already carried a role.
    pub already_bound: usize,
    /// Legacy tag has no entry in the mapping.
    pub mapping_misses: Vec<MembershipId>,
    /// Mapped role name is not seeded in the catalog.
    pub catalog_misses: Vec<MembershipId>,
    pub failures: Vec<BindingFailure>,
}

impl BackfillReport {
    fn merge(&mut self, other: BackfillReport) {
        self.bound += other.bound;
        self.already_bound += other.already_bound;
        self.mapping_misses.extend(other.mapping_misses);
        self.catalog_misses.extend(other.catalog_misses);
        self.failures.extend(other.failures);
    }
}

/// Outcome of [`RoleBackfill::reverse`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReversalReport {
    pub unbound: usize,
    pub failures: Vec<BindingFailure>,
}

/// A binding [`RoleBackfill::run`] would make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedBinding {
    pub membership_id: MembershipId,
    pub legacy_role: LegacyRole,
    pub role: RoleName,
}

/// Outcome of [`RoleBackfill::plan`] (dry run, no writes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillPlan {
    pub to_bind: Vec<PlannedBinding>,
    pub already_bound: usize,
    pub mapping_misses: Vec<MembershipId>,
    pub catalog_misses: Vec<MembershipId>,
    pub failures: Vec<BindingFailure>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolution
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resolution {
    AlreadyBound,
    MappingMiss,
    CatalogMiss(RoleName),
    Bind(Role),
}

/// Per-run memo of catalog lookups. Store errors are not memoized.
type RoleCache = HashMap<RoleName, Option<Role>>;

// ─────────────────────────────────────────────────────────────────────────────
// Migrator
// ─────────────────────────────────────────────────────────────────────────────

/// Binds memberships to catalog roles according to a [`RoleMapping`].
#[derive(Debug, Clone)]
pub struct RoleBackfill<C, M> {
    catalog: C,
    memberships: M,
    mapping: RoleMapping,
}

impl<C, M> RoleBackfill<C, M>
where
    C: RoleCatalog,
    M: MembershipStore,
{
    pub fn new(catalog: C, memberships: M, mapping: RoleMapping) -> Self {
        Self {
            catalog,
            memberships,
            mapping,
        }
    }

    pub fn mapping(&self) -> &RoleMapping {
        &self.mapping
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn memberships(&self) -> &M {
        &self.memberships
    }

    /// Bind every unbound membership whose tag maps to a seeded role.
    pub fn run(&self) -> Result<BackfillReport, StoreError> {
        let memberships = self.memberships.list_all()?;
        let report = self.bind_all(&memberships);
        log_report(&report);
        Ok(report)
    }

    /// Same as [`run`](Self::run), with the scan split across `workers`
    /// scoped threads. Reports are merged in scan order.
    pub fn run_parallel(&self, workers: usize) -> Result<BackfillReport, StoreError> {
        let memberships = self.memberships.list_all()?;
        if memberships.is_empty() {
            return Ok(BackfillReport::default());
        }

        let workers = workers.clamp(1, memberships.len());
        let chunk_size = memberships.len().div_ceil(workers);

        let report = thread::scope(|scope| {
            let handles: Vec<_> = memberships
                .chunks(chunk_size)
                .map(|chunk| scope.spawn(move || self.bind_all(chunk)))
                .collect();

            let mut merged = BackfillReport::default();
            for handle in handles {
                let partial = handle
                    .join()
                    .map_err(|_| StoreError::unavailable("backfill worker panicked"))?;
                merged.merge(partial);
            }
            Ok::<_, StoreError>(merged)
        })?;

        tracing::debug!(workers, chunk_size, "parallel backfill finished");
        log_report(&report);
        Ok(report)
    }

    /// Classify every membership exactly as [`run`](Self::run) would, without
    /// writing anything.
    pub fn plan(&self) -> Result<BackfillPlan, StoreError> {
        let mut cache = RoleCache::new();
        let mut plan = BackfillPlan::default();

        for membership in self.memberships.list_all()? {
            match self.resolve(&membership, &mut cache) {
                Ok(Resolution::AlreadyBound) => plan.already_bound += 1,
                Ok(Resolution::MappingMiss) => plan.mapping_misses.push(membership.id),
                Ok(Resolution::CatalogMiss(_)) => plan.catalog_misses.push(membership.id),
                Ok(Resolution::Bind(role)) => plan.to_bind.push(PlannedBinding {
                    membership_id: membership.id,
                    legacy_role: membership.legacy_role.clone(),
                    role: role.name,
                }),
                Err(e) => plan.failures.push(BindingFailure {
                    membership_id: membership.id,
                    error: e.to_string(),
                }),
            }
        }

        Ok(plan)
    }

    /// Clear `rbac_role` on every bound membership (rollback).
    ///
    /// Does not consult the mapping or the catalog.
    pub fn reverse(&self) -> Result<ReversalReport, StoreError> {
        let mut report = ReversalReport::default();

        for mut membership in self.memberships.list_all()? {
            let Some(previous) = membership.unbind() else {
                continue;
            };
            match self.memberships.save(&membership) {
                Ok(()) => report.unbound += 1,
                Err(e) => {
                    tracing::warn!(
                        membership_id = %membership.id,
                        role_id = %previous,
                        error = %e,
                        "failed to clear role binding"
                    );
                    report.failures.push(BindingFailure {
                        membership_id: membership.id,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            unbound = report.unbound,
            failed = report.failures.len(),
            "role binding reversal finished"
        );
        Ok(report)
    }

    fn bind_all(&self, memberships: &[BusinessMembership]) -> BackfillReport {
        let mut cache = RoleCache::new();
        let mut report = BackfillReport::default();

        for membership in memberships {
            let resolution = match self.resolve(membership, &mut cache) {
                Ok(resolution) => resolution,
                Err(e) => {
                    report.failures.push(failure(membership, &e));
                    continue;
                }
            };

            match resolution {
                Resolution::AlreadyBound => report.already_bound += 1,
                Resolution::MappingMiss => {
                    tracing::warn!(
                        membership_id = %membership.id,
                        legacy_role = %membership.legacy_role,
                        "no role mapping for legacy tag; leaving membership unbound"
                    );
                    report.mapping_misses.push(membership.id);
                }
                Resolution::CatalogMiss(name) => {
                    tracing::warn!(
                        membership_id = %membership.id,
                        legacy_role = %membership.legacy_role,
                        role = %name,
                        "role not found in catalog; leaving membership unbound"
                    );
                    report.catalog_misses.push(membership.id);
                }
                Resolution::Bind(role) => {
                    let mut updated = membership.clone();
                    updated.bind(role.id);
                    match self.memberships.save(&updated) {
                        Ok(()) => {
                            tracing::debug!(
                                membership_id = %membership.id,
                                role = %role.name,
                                "membership bound"
                            );
                            report.bound += 1;
                        }
                        Err(e) => report.failures.push(failure(membership, &e)),
                    }
                }
            }
        }

        report
    }

    fn resolve(
        &self,
        membership: &BusinessMembership,
        cache: &mut RoleCache,
    ) -> Result<Resolution, StoreError> {
        if membership.is_bound() {
            return Ok(Resolution::AlreadyBound);
        }

        let Some(name) = self.mapping.role_for(&membership.legacy_role) else {
            return Ok(Resolution::MappingMiss);
        };

        let role = match cache.get(&name) {
            Some(cached) => cached.clone(),
            None => {
                let found = self.catalog.find_by_name(name.as_str())?;
                cache.insert(name.clone(), found.clone());
                found
            }
        };

        Ok(match role {
            Some(role) => Resolution::Bind(role),
            None => Resolution::CatalogMiss(name),
        })
    }
}

fn failure(membership: &BusinessMembership, error: &StoreError) -> BindingFailure {
    tracing::warn!(
        membership_id = %membership.id,
        error = %error,
        "failed to bind membership"
    );
    BindingFailure {
        membership_id: membership.id,
        error: error.to_string(),
    }
}

fn log_report(report: &BackfillReport) {
    tracing::info!(
        bound = report.bound,
        already_bound = report.already_bound,
        mapping_misses = report.mapping_misses.len(),
        catalog_misses = report.catalog_misses.len(),
        failed = report.failures.len(),
        "role backfill finished"
    );
}
