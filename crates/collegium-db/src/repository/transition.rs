//! SurrealDB implementation of [`TransitionRequestRepository`].
//!
//! The `member` field is a union of the native record link and a
//! legacy plain string. Queries normalize both forms through a
//! projection (`member_ref` + `member_is_record`) so rows decode into
//! [`MemberRef`] without a second round trip.

use chrono::{DateTime, Utc};
use collegium_core::error::CollegiumResult;
use collegium_core::models::member::{Member, TransitionFields};
use collegium_core::models::transition::{
    CreateTransitionRequest, MemberRef, RequestStatus, TransitionRequest,
};
use collegium_core::repository::TransitionRequestRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::member::{parse_role, role_to_string};

/// Shared projection normalizing the dual-form member reference.
const REQUEST_PROJECTION: &str = "\
meta::id(id) AS record_id, \
(IF type::is_record(member) { meta::id(member) } ELSE { member }) AS member_ref, \
type::is_record(member) AS member_is_record, \
region, specialty, license_number, status, created_at";

#[derive(Debug, SurrealValue)]
struct RequestRow {
    record_id: String,
    member_ref: String,
    member_is_record: bool,
    region: String,
    specialty: String,
    license_number: String,
    status: String,
    created_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<RequestStatus, DbError> {
    match s {
        "Pending" => Ok(RequestStatus::Pending),
        "Completed" => Ok(RequestStatus::Completed),
        "Failed" => Ok(RequestStatus::Failed),
        other => Err(DbError::Migration(format!(
            "unknown request status: {other}"
        ))),
    }
}

impl RequestRow {
    fn try_into_request(self) -> Result<TransitionRequest, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid request UUID: {e}")))?;

        let member = if self.member_is_record {
            let key = Uuid::parse_str(&self.member_ref)
                .map_err(|e| DbError::Migration(format!("invalid member key: {e}")))?;
            MemberRef::Key(key)
        } else {
            MemberRef::Raw(self.member_ref)
        };

        Ok(TransitionRequest {
            id,
            member,
            region: self.region,
            specialty: self.specialty,
            license_number: self.license_number,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
        })
    }
}

/// Row struct for the member returned by the approve transaction.
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

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the TransitionRequest repository.
#[derive(Clone)]
pub struct SurrealTransitionRequestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTransitionRequestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn count_pending_for_member(&self, member_id: Uuid) -> Result<u64, DbError> {
        // A legacy row stores the member key as a plain string, so the
        // guard matches both encodings. Legacy strings that are not the
        // canonical lowercase hyphenated form are not recognized.
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM transition_request \
                 WHERE (member = type::record('member', $member_id) \
                 OR member = $member_id) \
                 AND status = 'Pending' GROUP ALL",
            )
            .bind(("member_id", member_id.to_string()))
            .await?;

        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> TransitionRequestRepository for SurrealTransitionRequestRepository<C> {
    async fn create(&self, input: CreateTransitionRequest) -> CollegiumResult<TransitionRequest> {
        // At most one pending request per member. Check-then-create is
        // two statements; the residual race is accepted (this subsystem
        // holds no locks).
        if self.count_pending_for_member(input.member_id).await? > 0 {
            return Err(DbError::Conflict {
                entity: "transition_request".into(),
                reason: format!("member {} already has a pending request", input.member_id),
            }
            .into());
        }

        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('transition_request', $id) SET \
                 member = type::record('member', $member_id), \
                 region = $region, specialty = $specialty, \
                 license_number = $license_number, \
                 status = 'Pending'",
            )
            .bind(("id", id.to_string()))
            .bind(("member_id", input.member_id.to_string()))
            .bind(("region", input.region))
            .bind(("specialty", input.specialty))
            .bind(("license_number", input.license_number))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        // Re-fetch through the normalizing projection.
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> CollegiumResult<TransitionRequest> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(format!(
                "SELECT {REQUEST_PROJECTION} \
                 FROM type::record('transition_request', $id)"
            ))
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "transition_request".into(),
            id: id_str,
        })?;

        Ok(row.try_into_request()?)
    }

    async fn find_by_status(
        &self,
        status: RequestStatus,
    ) -> CollegiumResult<Vec<TransitionRequest>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {REQUEST_PROJECTION} FROM transition_request \
                 WHERE status = $status \
                 ORDER BY created_at ASC"
            ))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequestRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(RequestRow::try_into_request)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn find_all(&self) -> CollegiumResult<Vec<TransitionRequest>> {
        let mut result = self
            .db
            .query(format!(
                "SELECT {REQUEST_PROJECTION} FROM transition_request \
                 ORDER BY created_at ASC"
            ))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RequestRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(RequestRow::try_into_request)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(items)
    }

    async fn delete(&self, id: Uuid) -> CollegiumResult<()> {
        self.db
            .query("DELETE type::record('transition_request', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn set_status(&self, id: Uuid, status: RequestStatus) -> CollegiumResult<()> {
        self.db
            .query(
                "UPDATE type::record('transition_request', $id) \
                 SET status = $status",
            )
            .bind(("id", id.to_string()))
            .bind(("status", status.as_str().to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn relink_member(&self, request_id: Uuid, member_id: Uuid) -> CollegiumResult<()> {
        self.db
            .query(
                "UPDATE type::record('transition_request', $id) \
                 SET member = type::record('member', $member_id)",
            )
            .bind(("id", request_id.to_string()))
            .bind(("member_id", member_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn approve(
        &self,
        request_id: Uuid,
        member_id: Uuid,
        fields: TransitionFields,
    ) -> CollegiumResult<Member> {
        // Member update and request deletion commit together or not at
        // all; the engine's atomicity contract rests on this statement.
        // The existence guard rolls the whole batch back when the member
        // row vanished after the caller resolved it, so the request is
        // never deleted without the transition applying.
        let clear_sql = if fields.clear_student_fields {
            ", admission_year = NONE, year_of_study = NONE"
        } else {
            ""
        };

        let query = format!(
            "BEGIN TRANSACTION; \
             IF !record::exists(type::record('member', $member_id)) \
             {{ THROW 'member vanished' }}; \
             UPDATE type::record('member', $member_id) SET \
             role = $role, region = $region, \
             specialty = $specialty, \
             license_number = $license_number, \
             updated_at = time::now(){clear_sql}; \
             DELETE type::record('transition_request', $request_id); \
             COMMIT TRANSACTION;"
        );

        let result = self
            .db
            .query(&query)
            .bind(("member_id", member_id.to_string()))
            .bind(("request_id", request_id.to_string()))
            .bind(("role", role_to_string(fields.role).to_string()))
            .bind(("region", fields.region))
            .bind(("specialty", fields.specialty))
            .bind(("license_number", fields.license_number))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(checked) => checked,
            Err(e) if e.to_string().contains("member vanished") => {
                return Err(DbError::NotFound {
                    entity: "member".into(),
                    id: member_id.to_string(),
                }
                .into());
            }
            Err(e) => return Err(DbError::Migration(e.to_string()).into()),
        };

        // Batch result slots: 0 = BEGIN, 1 = existence guard, 2 = UPDATE.
        let rows: Vec<MemberRow> = result.take(2).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "member".into(),
            id: member_id.to_string(),
        })?;

        Ok(Member {
            id: member_id,
            full_name: row.full_name,
            email: row.email,
            role: parse_role(&row.role)?,
            region: row.region,
            specialty: row.specialty,
            license_number: row.license_number,
            admission_year: row.admission_year,
            year_of_study: row.year_of_study,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
