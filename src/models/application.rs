use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::{constraint_violation, ConstraintViolation};
use crate::error::ApiError;

const APPLICATION_COLUMNS: &str = "username, job_id, applied_at";

/// One (username, job) pair; never mutated once created
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub username: String,
    pub job_id: i32,
    pub applied_at: DateTime<Utc>,
}

/// Body of `POST /applications`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewApplication {
    pub username: String,
    pub job_id: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    Applied(JobApplication),
    AlreadyApplied(JobApplication),
}

impl ApplyOutcome {
    pub fn application(&self) -> &JobApplication {
        match self {
            ApplyOutcome::Applied(app) | ApplyOutcome::AlreadyApplied(app) => app,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, ApplyOutcome::Applied(_))
    }

    pub fn into_application(self) -> JobApplication {
        match self {
            ApplyOutcome::Applied(app) | ApplyOutcome::AlreadyApplied(app) => app,
        }
    }
}

/// A job the user applied to, joined with its company
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AppliedJob {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
    pub company_name: String,
    pub company_location: Option<String>,
    pub applied_at: DateTime<Utc>,
}

impl JobApplication {
    /// Record that `username` applied to `job_id`. Applying twice is not an
    /// error; the second call returns the existing row.
    pub async fn apply(pool: &PgPool, username: &str, job_id: i32) -> Result<ApplyOutcome, ApiError> {
        let job_exists: Option<i32> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(pool)
            .await?;
        if job_exists.is_none() {
            return Err(ApiError::not_found(format!("No job: {}", job_id)));
        }

        let sql = format!(
            "INSERT INTO applications (username, job_id) VALUES ($1, $2) \
             ON CONFLICT (username, job_id) DO NOTHING RETURNING {}",
            APPLICATION_COLUMNS
        );
        let inserted = sqlx::query_as::<_, JobApplication>(&sql)
            .bind(username)
            .bind(job_id)
            .fetch_optional(pool)
            .await;

        let inserted = match inserted {
            Ok(row) => row,
            Err(e) => match constraint_violation(&e) {
                Some(ConstraintViolation::ForeignKey(constraint)) => {
                    return Err(missing_parent(constraint.as_deref(), username, job_id));
                }
                _ => return Err(e.into()),
            },
        };

        if let Some(application) = inserted {
            tracing::info!("{} applied to job {}", username, job_id);
            return Ok(ApplyOutcome::Applied(application));
        }

        let sql = format!(
            "SELECT {} FROM applications WHERE username = $1 AND job_id = $2",
            APPLICATION_COLUMNS
        );
        let existing = sqlx::query_as::<_, JobApplication>(&sql)
            .bind(username)
            .bind(job_id)
            .fetch_optional(pool)
            .await?
            // Conflicting row was removed by a cascade between the two statements
            .ok_or_else(|| ApiError::not_found(format!("No job: {}", job_id)))?;

        tracing::debug!("{} already applied to job {}", username, job_id);
        Ok(ApplyOutcome::AlreadyApplied(existing))
    }

    /// Jobs `username` applied to, with company name and location, by job id
    pub async fn get_all_for_user(pool: &PgPool, username: &str) -> Result<Vec<AppliedJob>, ApiError> {
        let jobs = sqlx::query_as::<_, AppliedJob>(
            "SELECT j.id, j.title, j.salary, j.equity::FLOAT8 AS equity, j.company_handle, \
                    c.name AS company_name, c.location AS company_location, a.applied_at \
             FROM applications a \
             JOIN jobs j ON j.id = a.job_id \
             JOIN companies c ON c.handle = j.company_handle \
             WHERE a.username = $1 \
             ORDER BY j.id",
        )
        .bind(username)
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    pub async fn job_ids_for_user(pool: &PgPool, username: &str) -> Result<Vec<i32>, ApiError> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id",
        )
        .bind(username)
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }
}

fn missing_parent(constraint: Option<&str>, username: &str, job_id: i32) -> ApiError {
    match constraint {
        Some(name) if name.contains("username") => ApiError::not_found(format!("No user: {}", username)),
        _ => ApiError::not_found(format!("No job: {}", job_id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn application() -> JobApplication {
        JobApplication {
            username: "u1".to_string(),
            job_id: 7,
            applied_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn outcome_accessors() {
        let applied = ApplyOutcome::Applied(application());
        let again = ApplyOutcome::AlreadyApplied(application());
        assert!(applied.is_new());
        assert!(!again.is_new());
        assert_eq!(applied.application(), again.application());
        assert_eq!(again.into_application().job_id, 7);
    }

    #[test]
    fn missing_parent_names_the_right_entity() {
        let err = missing_parent(Some("applications_username_fkey"), "ghost", 3);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.message(), "No user: ghost");

        let err = missing_parent(Some("applications_job_id_fkey"), "u1", 3);
        assert_eq!(err.message(), "No job: 3");

        assert_eq!(missing_parent(None, "u1", 3).message(), "No job: 3");
    }

    #[test]
    fn new_application_payload() {
        let body: NewApplication =
            serde_json::from_value(serde_json::json!({ "username": "u1", "jobId": 4 })).unwrap();
        assert_eq!(body.job_id, 4);
        assert!(serde_json::from_value::<NewApplication>(serde_json::json!({ "username": "u1" })).is_err());
    }

    #[test]
    fn serializes_camel_case() {
        let value = serde_json::to_value(application()).unwrap();
        assert_eq!(value["jobId"], 7);
        assert!(value["appliedAt"].as_str().unwrap().starts_with("2024-01-02T03:04:05"));
    }
}
