//! SurrealDB implementation of [`MemberRepository`].

use chrono::{DateTime, Utc};
use collegium_core::error::CollegiumResult;
use collegium_core::models::member::{CreateMember, Member, Role, UpdateMember};
use collegium_core::repository::MemberRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct MemberRow {
    full_name: String,
    email: String,
    role: String,
    region: String,
    specialty: Option<String>,
    license_number: Option<String>,
    admission_year: Option<i32>,
    year_of_study: Option<u32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

pub(crate) fn parse_role(s: &str) -> Result<Role, DbError> {
    match s {
        "Student" => Ok(Role::Student),
        "Doctor" => Ok(Role::Doctor),
        "GlobalNetwork" => Ok(Role::GlobalNetwork),
        other => Err(DbError::Migration(format!("unknown member role: {other}"))),
    }
}

pub(crate) fn role_to_string(role: Role) -> &'static str {
    role.as_str()
}

impl MemberRow {
    fn into_member(self, id: Uuid) -> Result<Member, DbError> {
        Ok(Member {
            id,
            full_name: self.full_name,
            email: self.email,
            role: parse_role(&self.role)?,
            region: self.region,
            specialty: self.specialty,
            license_number: self.license_number,
            admission_year: self.admission_year,
            year_of_study: self.year_of_study,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Member repository.
#[derive(Clone)]
pub struct SurrealMemberRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMemberRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MemberRepository for SurrealMemberRepository<C> {
    async fn create(&self, input: CreateMember) -> CollegiumResult<Member> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('member', $id) SET \
                 full_name = $full_name, email = $email, \
                 role = $role, region = $region, \
                 specialty = $specialty, \
                 license_number = $license_number, \
                 admission_year = $admission_year, \
                 year_of_study = $year_of_study",
            )
            .bind(("id", id_str.clone()))
            .bind(("full_name", input.full_name))
            .bind(("email", input.email))
            .bind(("role", role_to_string(input.role).to_string()))
            .bind(("region", input.region))
            .bind(("specialty", input.specialty))
            .bind(("license_number", input.license_number))
            .bind(("admission_year", input.admission_year))
            .bind(("year_of_study", input.year_of_study))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        Ok(row.into_member(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CollegiumResult<Member> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('member', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        Ok(row.into_member(id)?)
    }

    async fn update_fields(&self, id: Uuid, input: UpdateMember) -> CollegiumResult<Member> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.full_name.is_some() {
            sets.push("full_name = $full_name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.region.is_some() {
            sets.push("region = $region");
        }
        if input.specialty.is_some() {
            sets.push("specialty = $specialty");
        }
        if input.license_number.is_some() {
            sets.push("license_number = $license_number");
        }
        if input.admission_year.is_some() {
            sets.push("admission_year = $admission_year");
        }
        if input.year_of_study.is_some() {
            sets.push("year_of_study = $year_of_study");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('member', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(full_name) = input.full_name {
            builder = builder.bind(("full_name", full_name));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role_to_string(role).to_string()));
        }
        if let Some(region) = input.region {
            builder = builder.bind(("region", region));
        }
        if let Some(specialty) = input.specialty {
            // Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("specialty", specialty));
        }
        if let Some(license_number) = input.license_number {
            builder = builder.bind(("license_number", license_number));
        }
        if let Some(admission_year) = input.admission_year {
            builder = builder.bind(("admission_year", admission_year));
        }
        if let Some(year_of_study) = input.year_of_study {
            builder = builder.bind(("year_of_study", year_of_study));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MemberRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: id_str,
        })?;

        Ok(row.into_member(id)?)
    }
}
