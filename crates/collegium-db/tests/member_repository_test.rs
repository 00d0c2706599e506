//! Integration tests for the Member repository using in-memory SurrealDB.

use collegium_core::error::CollegiumError;
use collegium_core::models::member::{CreateMember, Role, UpdateMember};
use collegium_core::repository::MemberRepository;
use collegium_db::repository::SurrealMemberRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    collegium_db::run_migrations(&db).await.unwrap();
    db
}

fn student(name: &str, email: &str) -> CreateMember {
    CreateMember {
        full_name: name.into(),
        email: email.into(),
        role: Role::Student,
        region: "Kogi Chapter".into(),
        specialty: None,
        license_number: None,
        admission_year: Some(2019),
        year_of_study: Some(4),
    }
}

#[tokio::test]
async fn create_and_get_member() {
    let db = setup().await;
    let repo = SurrealMemberRepository::new(db);

    let created = repo
        .create(student("Ada Obi", "ada@example.com"))
        .await
        .unwrap();
    assert_eq!(created.role, Role::Student);
    assert_eq!(created.admission_year, Some(2019));
    assert_eq!(created.year_of_study, Some(4));
    assert_eq!(created.specialty, None);

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_missing_member_is_not_found() {
    let db = setup().await;
    let repo = SurrealMemberRepository::new(db);

    let err = repo.get_by_id(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, CollegiumError::NotFound { .. }));
}

#[tokio::test]
async fn update_fields_is_partial() {
    let db = setup().await;
    let repo = SurrealMemberRepository::new(db);

    let created = repo
        .create(student("Ada Obi", "ada@example.com"))
        .await
        .unwrap();

    let updated = repo
        .update_fields(
            created.id,
            UpdateMember {
                role: Some(Role::Doctor),
                region: Some("North Central".into()),
                specialty: Some(Some("Paediatrics".into())),
                license_number: Some(Some("MDCN/2019/44871".into())),
                // Some(None) clears the Student-only fields.
                admission_year: Some(None),
                year_of_study: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.role, Role::Doctor);
    assert_eq!(updated.region, "North Central");
    assert_eq!(updated.specialty.as_deref(), Some("Paediatrics"));
    assert_eq!(updated.license_number.as_deref(), Some("MDCN/2019/44871"));
    assert_eq!(updated.admission_year, None);
    assert_eq!(updated.year_of_study, None);
    // Untouched fields persist.
    assert_eq!(updated.full_name, "Ada Obi");
    assert_eq!(updated.email, "ada@example.com");
}
