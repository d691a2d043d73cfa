//! Cross-crate scenarios over the in-memory adapters.
//!
//! Verifies:
//! - Authentication is case-insensitive and failure causes are indistinguishable
//! - Concurrent responses to one invitation resolve it exactly once
//! - The backfill scenario survives a snapshot round trip and reversal

use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{Duration, Utc};

use bizauth_auth::in_memory::{InMemoryInvitationStore, InMemoryUserStore};
use bizauth_auth::{
    BusinessInvitation, BusinessMembership, Credentials, EmailAddress, IdentityResolver,
    InvitationError, InvitationLifecycle, InvitationStatus, InvitationStore, MembershipStore,
    Role, RoleBackfill, RoleCatalog, RoleMapping, Transition, User,
};
use bizauth_core::{AggregateRoot, BusinessId, UserId};

use crate::config::BackfillConfig;
use crate::snapshot::Snapshot;

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("bizauth-it-{name}-{}.json", std::process::id()))
}

#[test]
fn login_then_accept_invitation() {
    let users = Arc::new(InMemoryUserStore::new());
    let owner = User::new(EmailAddress::parse("Owner@Corner-Shop.io").unwrap());
    users.insert(owner.clone(), "hunter2").unwrap();
    let resolver = IdentityResolver::new(users);

    let creds = Credentials::default().with_email("OWNER@corner-shop.io");
    assert_eq!(resolver.authenticate(&creds).unwrap(), None);

    let creds = Credentials::new("owner@CORNER-shop.io", "hunter2");
    assert_eq!(resolver.authenticate(&creds).unwrap(), Some(owner));

    assert_eq!(
        resolver.authenticate(&Credentials::new("owner@corner-shop.io", "nope")).unwrap(),
        resolver.authenticate(&Credentials::new("nobody@corner-shop.io", "hunter2")).unwrap(),
    );

    let now = Utc::now();
    let store = Arc::new(InMemoryInvitationStore::new());
    let id = store
        .insert(BusinessInvitation::issue(
            BusinessId::new(),
            EmailAddress::parse("cashier@corner-shop.io").unwrap(),
            now + Duration::days(7),
            None,
            now,
        ))
        .unwrap();
    let lifecycle = InvitationLifecycle::new(store);

    let accepted = lifecycle.transition(id, Transition::Accept, now).unwrap();
    assert_eq!(accepted.status(), InvitationStatus::Accepted);
    assert_eq!(accepted.responded_at(), Some(now));
}

#[test]
fn concurrent_accept_and_revoke_resolve_once() {
    for _ in 0..20 {
        let now = Utc::now();
        let store = Arc::new(InMemoryInvitationStore::new());
        let id = store
            .insert(BusinessInvitation::issue(
                BusinessId::new(),
                EmailAddress::parse("race@shop.io").unwrap(),
                now + Duration::days(1),
                None,
                now,
            ))
            .unwrap();
        let lifecycle = Arc::new(InvitationLifecycle::new(store.clone()));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [Transition::Accept, Transition::Revoke]
            .into_iter()
            .map(|transition| {
                let lifecycle = lifecycle.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    lifecycle.transition(id, transition, now)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1, "{results:?}");
        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(loser, InvitationError::IllegalTransition { .. }), "{loser:?}");

        let stored = store.get(id).unwrap().unwrap();
        assert_eq!(stored.status(), winners[0].status());
        assert_eq!(stored.version(), 1);
    }
}

#[test]
fn backfill_scenario_through_snapshot() {
    let tagged = |tag: &str| BusinessMembership::new(BusinessId::new(), UserId::new(), tag);
    let snapshot = Snapshot {
        roles: vec![Role::new("OWNER"), Role::new("Admin"), Role::new("Manager")],
        memberships: vec![tagged("OWNER"), tagged("ADMIN"), tagged("MANAGER"), tagged("STAFF")],
    };
    let staff_id = snapshot.memberships[3].id;
    let path = temp_path("scenario");
    snapshot.save(&path).unwrap();

    // run
    let (catalog, memberships) = Snapshot::load(&path).unwrap().into_stores();
    let (catalog, memberships) = (Arc::new(catalog), Arc::new(memberships));
    let config = BackfillConfig::default();
    let backfill = RoleBackfill::new(catalog.clone(), memberships.clone(), config.mapping);

    let report = backfill.run().unwrap();
    assert_eq!(report.bound, 3);
    assert_eq!(report.catalog_misses, vec![staff_id]);
    Snapshot::from_stores(&catalog, &memberships).unwrap().save(&path).unwrap();

    // persisted bindings point at real catalog roles
    let persisted = Snapshot::load(&path).unwrap();
    for m in &persisted.memberships {
        match m.rbac_role {
            Some(role_id) => assert!(persisted.roles.iter().any(|r| r.id == role_id)),
            None => assert_eq!(m.id, staff_id),
        }
    }
    let bound: Vec<_> = persisted.memberships.iter().map(|m| (m.id, m.rbac_role)).collect();

    // reverse, then re-run on the reloaded snapshot
    let (catalog, memberships) = persisted.into_stores();
    let backfill = RoleBackfill::new(catalog, memberships, RoleMapping::canonical());
    assert_eq!(backfill.reverse().unwrap().unbound, 3);
    assert!(backfill.memberships().list_all().unwrap().iter().all(|m| m.rbac_role.is_none()));

    assert_eq!(backfill.run().unwrap().bound, 3);
    let rebound: Vec<_> = backfill
        .memberships()
        .list_all()
        .unwrap()
        .iter()
        .map(|m| (m.id, m.rbac_role))
        .collect();
    assert_eq!(rebound, bound);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn seeding_the_missing_role_completes_the_backfill() {
    let staff = BusinessMembership::new(BusinessId::new(), UserId::new(), "STAFF");
    let (catalog, memberships) = Snapshot {
        roles: vec![Role::new("OWNER")],
        memberships: vec![staff.clone()],
    }
    .into_stores();
    let backfill = RoleBackfill::new(catalog, memberships, RoleMapping::canonical());

    assert_eq!(backfill.run().unwrap().catalog_misses, vec![staff.id]);

    backfill.catalog().seed(Role::new("Cashier")).unwrap();
    let report = backfill.run_parallel(2).unwrap();
    assert_eq!(report.bound, 1);
    let cashier = backfill.catalog().find_by_name("Cashier").unwrap().unwrap();
    assert_eq!(
        backfill.memberships().get(staff.id).unwrap().unwrap().rbac_role,
        Some(cashier.id)
    );
}
