use std::sync::Arc;

use chrono::{Duration, NaiveDate, TimeZone, Utc};

use backoffice_auth::{
    AccessControl, ActorResolver, AuthzError, Principal, Role, actor_for,
};
use backoffice_core::{
    ActorId, AuditStamp, Claim, ClaimFilter, ClaimId, ClaimStatus, Company, CompanyFilter,
    CompanyId, ManualClock, User, UserId,
};
use backoffice_infra::{ChangeType, Store, StoreError, build};

fn clocked_store() -> (Arc<ManualClock>, Store) {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    ));
    (clock.clone(), Store::new(clock))
}

fn service_day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

#[test]
fn create_then_update_yields_add_then_modify() {
    let (clock, store) = clocked_store();
    let actor = ActorId::new();
    let id = CompanyId::new();

    let mut tx = store.begin(&actor);
    tx.insert(Company::new(id, "Acme", "nl")).unwrap();
    let first = tx.commit().unwrap().expect("insert opens a revision");

    clock.advance(Duration::minutes(10));
    let mut renamed = store.get::<Company>(&id).unwrap().unwrap();
    renamed.name = "Acme Holding".to_string();
    let mut tx = store.begin(&actor);
    tx.update(renamed).unwrap();
    let second = tx.commit().unwrap().expect("update opens a revision");

    let history = store.history::<Company>(&id).unwrap();
    assert_eq!(history.len(), 2);
    assert!(first.id < second.id);
    assert_eq!(history[0].revision, first);
    assert_eq!(history[0].change, ChangeType::Add);
    assert_eq!(history[0].state.name, "Acme");
    assert_eq!(history[1].revision, second);
    assert_eq!(history[1].change, ChangeType::Modify);
    assert_eq!(history[1].state.name, "Acme Holding");
}

#[test]
fn stamps_follow_the_actor_and_skip_no_op_updates() {
    let (clock, store) = clocked_store();
    let creator = ActorId::new();
    let editor = ActorId::new();
    let id = CompanyId::new();
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();

    let mut forged = Company::new(id, "Acme", "NL");
    forged.stamp = AuditStamp::created(ActorId::new(), t0 - Duration::days(300));
    let mut tx = store.begin(&creator);
    let inserted = tx.insert(forged).unwrap();
    tx.commit().unwrap();
    assert_eq!(inserted.stamp, AuditStamp::created(creator, t0));

    clock.advance(Duration::hours(1));
    let unchanged = store.get::<Company>(&id).unwrap().unwrap();
    let mut tx = store.begin(&editor);
    tx.update(unchanged.clone()).unwrap();
    assert_eq!(tx.commit().unwrap(), None);
    let after_noop = store.get::<Company>(&id).unwrap().unwrap();
    assert_eq!(after_noop.stamp, inserted.stamp);

    let mut changed = after_noop;
    changed.email = Some("office@acme.test".to_string());
    let mut tx = store.begin(&editor);
    tx.update(changed).unwrap();
    tx.commit().unwrap();

    let stored = store.get::<Company>(&id).unwrap().unwrap();
    assert_eq!(stored.stamp.created_by, creator);
    assert_eq!(stored.stamp.created_at, t0);
    assert_eq!(stored.stamp.updated_by, editor);
    assert_eq!(stored.stamp.updated_at, t0 + Duration::hours(1));
    assert_eq!(store.revisions().unwrap().len(), 2);
}

#[test]
fn one_revision_per_transaction() {
    let (_, store) = clocked_store();
    let actor = ActorId::new();
    let company = Company::new(CompanyId::new(), "Acme", "BE");
    let user = User::new(UserId::new(), Some(company.id), "Ann", "ann@acme.test");
    let claim = Claim::new(ClaimId::new(), company.id, user.id, service_day(3), 12_500);

    let mut tx = store.begin(&actor);
    tx.insert(company.clone()).unwrap();
    tx.insert(user.clone()).unwrap();
    tx.insert(claim.clone()).unwrap();
    let revision = tx.commit().unwrap().unwrap();

    assert_eq!(store.revisions().unwrap(), vec![revision]);
    assert_eq!(revision.actor, actor);
    for entries in [
        store.history::<Company>(&company.id).unwrap().len(),
        store.history::<User>(&user.id).unwrap().len(),
        store.history::<Claim>(&claim.id).unwrap().len(),
    ] {
        assert_eq!(entries, 1);
    }
}

#[test]
fn dropped_transaction_leaves_nothing_behind() {
    let (_, store) = clocked_store();
    let actor = ActorId::new();
    let id = CompanyId::new();

    {
        let mut tx = store.begin(&actor);
        tx.insert(Company::new(id, "Ghost", "NL")).unwrap();
    }
    let mut tx = store.begin(&actor);
    tx.insert(Company::new(CompanyId::new(), "Rolled back", "NL")).unwrap();
    tx.rollback();

    assert!(store.get::<Company>(&id).unwrap().is_none());
    assert!(store.revisions().unwrap().is_empty());
    assert!(store.history::<Company>(&id).unwrap().is_empty());
}

#[test]
fn unresolvable_callers_are_attributed_to_system() {
    let (_, store) = clocked_store();
    let anonymous = ActorResolver::new(Principal::anonymous());

    let mut tx = store.begin(&anonymous);
    let company = tx.insert(Company::new(CompanyId::new(), "Acme", "NL")).unwrap();
    let revision = tx.commit().unwrap().unwrap();

    assert_eq!(revision.actor, ActorId::SYSTEM);
    assert_eq!(company.stamp.created_by, ActorId::SYSTEM);
}

#[test]
fn opaque_subjects_are_attributed_to_a_stable_derived_actor() {
    let (_, store) = clocked_store();
    let principal = Principal::authenticated("auth0|5f7c2b", [Role::COMPANY_MANAGER]);
    let resolver = ActorResolver::new(principal.clone());

    let mut tx = store.begin(&resolver);
    tx.insert(Company::new(CompanyId::new(), "A", "NL")).unwrap();
    let first = tx.commit().unwrap().unwrap();

    let mut tx = store.begin(&resolver);
    tx.insert(Company::new(CompanyId::new(), "B", "NL")).unwrap();
    let second = tx.commit().unwrap().unwrap();

    assert_eq!(first.actor, second.actor);
    assert_eq!(first.actor, actor_for(Some(&principal)));
    assert!(!first.actor.is_system());
}

#[test]
fn delete_records_the_last_state() {
    let (_, store) = clocked_store();
    let actor = ActorId::new();
    let company = Company::new(CompanyId::new(), "Acme", "NL");

    let mut tx = store.begin(&actor);
    tx.insert(company.clone()).unwrap();
    tx.commit().unwrap();

    let mut tx = store.begin(&actor);
    let removed = tx.delete::<Company>(&company.id).unwrap();
    tx.commit().unwrap();

    assert!(store.get::<Company>(&company.id).unwrap().is_none());
    let history = store.history::<Company>(&company.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].change, ChangeType::Delete);
    assert_eq!(history[1].state, removed);
}

#[test]
fn narrowed_filters_only_return_the_callers_tenant() {
    let (_, store) = clocked_store();
    let store = Arc::new(store);
    let seed = ActorId::SYSTEM;

    let acme = Company::new(CompanyId::new(), "Acme", "NL");
    let globex = Company::new(CompanyId::new(), "Globex", "DE");
    let ann = User::new(UserId::new(), Some(acme.id), "Ann", "ann@acme.test");
    let bob = User::new(UserId::new(), Some(globex.id), "Bob", "bob@globex.test");
    let mut paid = Claim::new(ClaimId::new(), acme.id, ann.id, service_day(2), 100);
    paid.status = ClaimStatus::Paid;
    let open = Claim::new(ClaimId::new(), acme.id, ann.id, service_day(9), 200);
    let foreign = Claim::new(ClaimId::new(), globex.id, bob.id, service_day(2), 300);

    let mut tx = store.begin(&seed);
    tx.insert(acme.clone()).unwrap();
    tx.insert(globex.clone()).unwrap();
    tx.insert(ann.clone()).unwrap();
    tx.insert(bob.clone()).unwrap();
    for claim in [&paid, &open, &foreign] {
        tx.insert(claim.clone()).unwrap();
    }
    tx.commit().unwrap();

    let access = AccessControl::new(store.clone());
    let manager = Principal::authenticated(
        UserId::new().to_string(),
        [Role::CLAIM_MANAGER, Role::COMPANY_MANAGER],
    )
    .with_company_claim(acme.id.to_string());

    let effective = access
        .authorize_claim_list(Some(&manager), ClaimFilter::default())
        .unwrap();
    let ids: Vec<ClaimId> = store
        .find(&build(&effective))
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(!ids.contains(&foreign.id));

    let paid_only = ClaimFilter {
        status: Some("paid".to_string()),
        ..Default::default()
    };
    let effective = access.authorize_claim_list(Some(&manager), paid_only).unwrap();
    let found = store.find(&build(&effective)).unwrap();
    assert_eq!(found, vec![store.get::<Claim>(&paid.id).unwrap().unwrap()]);

    let foreign_filter = ClaimFilter {
        company_id: Some(globex.id),
        ..Default::default()
    };
    assert_eq!(
        access.authorize_claim_list(Some(&manager), foreign_filter),
        Err(AuthzError::TenantMismatch)
    );

    let consumer = Principal::authenticated(ann.id.to_string(), [Role::CONSUMER])
        .with_company_claim(acme.id.to_string());
    assert!(access.can_access_claim(Some(&consumer), open.id).is_ok());
    assert!(access.can_access_claim(Some(&consumer), foreign.id).is_err());

    let companies = access
        .authorize_company_list(Some(&manager), CompanyFilter::default())
        .unwrap();
    let visible = store.find(&build(&companies)).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, acme.id);
}

#[test]
fn concurrent_inserts_of_one_id_keep_the_first_commit() {
    let (_, store) = clocked_store();
    let first_actor = ActorId::new();
    let second_actor = ActorId::new();
    let id = CompanyId::new();

    let mut first = store.begin(&first_actor);
    let mut second = store.begin(&second_actor);
    first.insert(Company::new(id, "First", "NL")).unwrap();
    second.insert(Company::new(id, "Second", "NL")).unwrap();

    assert!(first.commit().unwrap().is_some());
    assert!(matches!(
        second.commit(),
        Err(StoreError::Conflict { entity_type: "company", .. })
    ));

    let stored = store.get::<Company>(&id).unwrap().unwrap();
    assert_eq!(stored.name, "First");
    assert_eq!(stored.stamp.created_by, first_actor);
    let history = store.history::<Company>(&id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change, ChangeType::Add);
    assert_eq!(store.revisions().unwrap().len(), 1);
}

#[test]
fn writes_based_on_a_stale_row_are_rejected_whole() {
    let (_, store) = clocked_store();
    let actor = ActorId::new();
    let company = Company::new(CompanyId::new(), "Acme", "NL");
    let user = User::new(UserId::new(), Some(company.id), "Ann", "ann@acme.test");

    let mut tx = store.begin(&actor);
    tx.insert(company.clone()).unwrap();
    tx.insert(user.clone()).unwrap();
    tx.commit().unwrap();

    let mut slow = store.begin(&actor);
    let mut renamed = slow.get::<Company>(&company.id).unwrap().unwrap();
    renamed.name = "Acme Slow".to_string();
    slow.update(renamed).unwrap();
    slow.delete::<User>(&user.id).unwrap();

    let mut fast = store.begin(&actor);
    let mut renamed = fast.get::<Company>(&company.id).unwrap().unwrap();
    renamed.name = "Acme Fast".to_string();
    fast.update(renamed).unwrap();
    fast.commit().unwrap();

    assert!(matches!(
        slow.commit(),
        Err(StoreError::Conflict { entity_type: "company", .. })
    ));
    assert_eq!(store.get::<Company>(&company.id).unwrap().unwrap().name, "Acme Fast");
    assert!(store.get::<User>(&user.id).unwrap().is_some());
    assert_eq!(store.revisions().unwrap().len(), 2);
}

#[test]
fn writes_to_a_concurrently_deleted_row_are_not_found() {
    let (_, store) = clocked_store();
    let actor = ActorId::new();
    let company = Company::new(CompanyId::new(), "Acme", "NL");

    let mut tx = store.begin(&actor);
    tx.insert(company.clone()).unwrap();
    tx.commit().unwrap();

    let mut late_update = store.begin(&actor);
    let mut renamed = late_update.get::<Company>(&company.id).unwrap().unwrap();
    renamed.name = "Acme Holding".to_string();
    late_update.update(renamed).unwrap();
    let mut late_delete = store.begin(&actor);
    late_delete.delete::<Company>(&company.id).unwrap();

    let mut remover = store.begin(&actor);
    remover.delete::<Company>(&company.id).unwrap();
    remover.commit().unwrap();

    assert!(matches!(late_update.commit(), Err(StoreError::NotFound { .. })));
    assert!(matches!(late_delete.commit(), Err(StoreError::NotFound { .. })));
    let history = store.history::<Company>(&company.id).unwrap();
    assert_eq!(
        history.iter().map(|e| e.change).collect::<Vec<_>>(),
        vec![ChangeType::Add, ChangeType::Delete]
    );
}

#[test]
fn reverting_within_a_transaction_keeps_the_committed_stamp() {
    let (clock, store) = clocked_store();
    let creator = ActorId::new();
    let editor = ActorId::new();
    let id = CompanyId::new();

    let mut tx = store.begin(&creator);
    let committed = tx.insert(Company::new(id, "Acme", "NL")).unwrap();
    tx.commit().unwrap();

    clock.advance(Duration::hours(2));
    let mut tx = store.begin(&editor);
    let mut renamed = committed.clone();
    renamed.name = "Acme Holding".to_string();
    tx.update(renamed).unwrap();
    tx.update(committed.clone()).unwrap();
    assert_eq!(tx.commit().unwrap(), None);

    let stored = store.get::<Company>(&id).unwrap().unwrap();
    assert_eq!(stored, committed);
    assert_eq!(stored.stamp.updated_by, creator);
    assert_eq!(store.history::<Company>(&id).unwrap().len(), 1);
}

#[test]
fn changes_to_one_row_merge_into_one_snapshot_per_transaction() {
    let (_, store) = clocked_store();
    let actor = ActorId::new();
    let id = CompanyId::new();
    let scratch = CompanyId::new();

    let mut tx = store.begin(&actor);
    let mut company = tx.insert(Company::new(id, "Acme", "NL")).unwrap();
    company.name = "Acme Holding".to_string();
    tx.update(company).unwrap();
    tx.insert(Company::new(scratch, "Scratch", "NL")).unwrap();
    tx.delete::<Company>(&scratch).unwrap();
    tx.commit().unwrap();

    let history = store.history::<Company>(&id).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].change, ChangeType::Add);
    assert_eq!(history[0].state.name, "Acme Holding");
    assert!(store.get::<Company>(&scratch).unwrap().is_none());
    assert!(store.history::<Company>(&scratch).unwrap().is_empty());
}
