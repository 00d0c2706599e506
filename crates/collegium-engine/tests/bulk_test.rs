//! Integration tests for the bulk orchestrator and preview.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use collegium_core::models::member::{CreateMember, Role};
use collegium_core::models::transition::{CreateTransitionRequest, RequestStatus};
use collegium_core::repository::{MemberRepository, TransitionRequestRepository};
use collegium_core::validation::InvalidField;
use collegium_db::repository::{SurrealMemberRepository, SurrealTransitionRequestRepository};
use collegium_engine::{
    BulkPolicy, BulkRunner, EngineConfig, NullNotifier, TransitionEngine,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

type Db = Surreal<surrealdb::engine::local::Db>;
type Members = SurrealMemberRepository<surrealdb::engine::local::Db>;
type Requests = SurrealTransitionRequestRepository<surrealdb::engine::local::Db>;

async fn setup() -> (Db, BulkRunner<Members, Requests, NullNotifier>) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    collegium_db::run_migrations(&db).await.unwrap();

    let engine = TransitionEngine::new(
        SurrealMemberRepository::new(db.clone()),
        SurrealTransitionRequestRepository::new(db.clone()),
        NullNotifier,
        EngineConfig::default(),
    );
    (db, BulkRunner::new(engine))
}

async fn create_member(db: &Db, email: &str, role: Role) -> Uuid {
    let (admission_year, year_of_study) = match role {
        Role::Student => (Some(2019), Some(4)),
        _ => (None, None),
    };
    SurrealMemberRepository::new(db.clone())
        .create(CreateMember {
            full_name: format!("Member {email}"),
            email: email.into(),
            role,
            region: "Kogi Chapter".into(),
            specialty: None,
            license_number: None,
            admission_year,
            year_of_study,
        })
        .await
        .unwrap()
        .id
}

async fn submit(db: &Db, member_id: Uuid, region: &str, specialty: &str, license: &str) -> Uuid {
    SurrealTransitionRequestRepository::new(db.clone())
        .create(CreateTransitionRequest {
            member_id,
            region: region.into(),
            specialty: specialty.into(),
            license_number: license.into(),
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn run_all_processes_every_pending_request() {
    let (db, runner) = setup().await;

    let s1 = create_member(&db, "s1@example.com", Role::Student).await;
    let s2 = create_member(&db, "s2@example.com", Role::Student).await;
    let d1 = create_member(&db, "d1@example.com", Role::Doctor).await;
    submit(&db, s1, "Kogi", "Paediatrics", "MDCN/1").await;
    submit(&db, s2, "Lagos", "", "").await;
    submit(&db, d1, "West Africa", "Surgery", "MDCN/2").await;

    let report = runner.run_bulk(BulkPolicy::All).await.unwrap();
    assert_eq!(report.approved, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 0);
    // Only the blank-field submission fell back to the placeholder.
    assert_eq!(report.approved_incomplete, 1);
    assert!(report.errors.is_empty());
    assert!(!report.cancelled);

    // Edge breakdown: two Student->Doctor, one Doctor->GlobalNetwork.
    let edge = |from, to| {
        report
            .edges
            .iter()
            .find(|e| e.from == from && e.to == to)
            .map(|e| e.count)
    };
    assert_eq!(edge(Role::Student, Role::Doctor), Some(2));
    assert_eq!(edge(Role::Doctor, Role::GlobalNetwork), Some(1));

    // Every request retired.
    let remaining = SurrealTransitionRequestRepository::new(db)
        .find_all()
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn one_failing_item_does_not_abort_the_batch() {
    let (db, runner) = setup().await;

    let s1 = create_member(&db, "s1@example.com", Role::Student).await;
    let s2 = create_member(&db, "s2@example.com", Role::Student).await;
    let s3 = create_member(&db, "s3@example.com", Role::Student).await;
    submit(&db, s1, "Kogi", "Paediatrics", "MDCN/1").await;
    let doomed = submit(&db, s2, "Lagos", "Surgery", "MDCN/2").await;
    submit(&db, s3, "Abuja", "Radiology", "MDCN/3").await;

    // Engineer a dangling reference in the middle of the batch.
    db.query("DELETE type::record('member', $id)")
        .bind(("id", s2.to_string()))
        .await
        .unwrap()
        .check()
        .unwrap();

    let report = runner.run_bulk(BulkPolicy::All).await.unwrap();
    assert_eq!(report.approved, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].request_id, doomed);

    // The doomed request persists, flagged.
    let request = SurrealTransitionRequestRepository::new(db)
        .get_by_id(doomed)
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Failed);
}

#[tokio::test]
async fn valid_only_skips_incomplete_submissions() {
    let (db, runner) = setup().await;

    let s1 = create_member(&db, "s1@example.com", Role::Student).await;
    let s2 = create_member(&db, "s2@example.com", Role::Student).await;
    submit(&db, s1, "Kogi", "Paediatrics", "MDCN/1").await;
    // Blank license: invalid under the strict policy.
    let skipped = submit(&db, s2, "Kogi", "Awaiting", "").await;

    let report = runner.run_bulk(BulkPolicy::ValidOnly).await.unwrap();
    assert_eq!(report.approved, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped_items.len(), 1);
    assert_eq!(report.skipped_items[0].request_id, skipped);
    assert_eq!(
        report.skipped_items[0].reasons,
        vec![InvalidField::License, InvalidField::Specialty]
    );

    // Skipped request and its member are untouched.
    let request = SurrealTransitionRequestRepository::new(db.clone())
        .get_by_id(skipped)
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    let member = SurrealMemberRepository::new(db)
        .get_by_id(s2)
        .await
        .unwrap();
    assert_eq!(member.role, Role::Student);
    assert_eq!(member.license_number, None);
}

#[tokio::test]
async fn empty_batch_still_yields_a_report() {
    let (_db, runner) = setup().await;

    let report = runner.run_bulk(BulkPolicy::All).await.unwrap();
    assert_eq!(report.approved, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(report.skipped, 0);
    assert!(report.edges.is_empty());
}

#[tokio::test]
async fn preview_buckets_pending_requests() {
    let (db, runner) = setup().await;

    let m = |i: u32| format!("m{i}@example.com");
    let a = create_member(&db, &m(1), Role::Student).await;
    let b = create_member(&db, &m(2), Role::Student).await;
    let c = create_member(&db, &m(3), Role::Student).await;
    let d = create_member(&db, &m(4), Role::Student).await;
    submit(&db, a, "Kogi", "Paediatrics", "MDCN/1").await; // valid
    submit(&db, b, "Kogi", "Surgery", "pending").await; // license only
    submit(&db, c, "Kogi", "Awaiting", "MDCN/2").await; // specialty only
    submit(&db, d, "", "", "").await; // both + region

    let report = runner.preview().await.unwrap();
    assert_eq!(report.pending, 4);
    assert_eq!(report.valid, 1);
    assert_eq!(report.invalid_license_only, 1);
    assert_eq!(report.invalid_specialty_only, 1);
    assert_eq!(report.invalid_both, 1);
    assert_eq!(report.invalid_region, 1);

    // Samples resolve display identities against the member store.
    assert_eq!(report.samples.valid.len(), 1);
    assert!(report.samples.valid[0].display_name.is_some());
    assert_eq!(
        report.samples.invalid_license_only[0].reasons,
        vec![InvalidField::License]
    );
}

#[tokio::test]
async fn preview_mutates_nothing() {
    let (db, runner) = setup().await;

    let s1 = create_member(&db, "s1@example.com", Role::Student).await;
    submit(&db, s1, "Kogi", "Awaiting", "").await;

    let requests = SurrealTransitionRequestRepository::new(db.clone());
    let members = SurrealMemberRepository::new(db);

    let requests_before = requests.find_all().await.unwrap();
    let member_before = members.get_by_id(s1).await.unwrap();

    runner.preview().await.unwrap();

    assert_eq!(requests.find_all().await.unwrap(), requests_before);
    assert_eq!(members.get_by_id(s1).await.unwrap(), member_before);
}

#[tokio::test]
async fn cancellation_is_honored_between_items() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    collegium_db::run_migrations(&db).await.unwrap();

    let flag = Arc::new(AtomicBool::new(true));
    let engine = TransitionEngine::new(
        SurrealMemberRepository::new(db.clone()),
        SurrealTransitionRequestRepository::new(db.clone()),
        NullNotifier,
        EngineConfig::default(),
    );
    let runner = BulkRunner::new(engine).with_cancel_flag(flag);

    let s1 = create_member(&db, "s1@example.com", Role::Student).await;
    submit(&db, s1, "Kogi", "Paediatrics", "MDCN/1").await;

    let report = runner.run_bulk(BulkPolicy::All).await.unwrap();
    assert!(report.cancelled);
    assert_eq!(report.approved, 0);

    // Nothing was processed.
    let pending = SurrealTransitionRequestRepository::new(db)
        .find_by_status(RequestStatus::Pending)
        .await
        .unwrap();
    assert_eq!(pending.len(), 1);
}
