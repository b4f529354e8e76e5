use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::query_builder::query_as_with;
use crate::database::{constraint_violation, sql_for_partial_update, ConstraintViolation};
use crate::error::ApiError;
use crate::filter::{FilterWhere, QueryParams, SqlParam, SqlResult, SqlType};
use crate::models::{field_map, nullable, FieldErrors};

// NUMERIC equity is read back as a float
const JOB_COLUMNS: &str = "id, title, salary, equity::FLOAT8 AS equity, company_handle";

const JOB_TYPES: &[(&str, SqlType)] = &[
    ("title", SqlType::Text),
    ("salary", SqlType::Int),
    ("equity", SqlType::Float),
];

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<f64>,
    pub company_handle: String,
}

fn equity_in_range(equity: Option<f64>) -> bool {
    equity.map_or(true, |e| (0.0..=1.0).contains(&e))
}

impl NewJob {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .length("title", &self.title, 1, 200)
            .check(self.salary.map_or(true, |s| s >= 0), "salary", "must be >= 0")
            .check(equity_in_range(self.equity), "equity", "must be between 0 and 1")
            .length("companyHandle", &self.company_handle, 1, 25)
            .finish("Invalid job")
    }
}

/// PATCH body; id and company are fixed at creation. `null` clears salary
/// or equity.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub salary: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub equity: Option<Option<f64>>,
}

impl JobUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .check(self.title.as_deref().map_or(true, |t| !t.is_empty()), "title", "must not be empty")
            .check(self.salary.flatten().map_or(true, |s| s >= 0), "salary", "must be >= 0")
            .check(equity_in_range(self.equity.flatten()), "equity", "must be between 0 and 1")
            .finish("Invalid job update")
    }
}

/// `GET /jobs` filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobSearch {
    pub title: Option<String>,
    pub min_salary: Option<i32>,
}

impl JobSearch {
    pub fn from_query(params: &QueryParams) -> Result<Self, ApiError> {
        params.deny_unknown(&["title", "minSalary"])?;
        Ok(Self {
            title: params.text("title"),
            min_salary: params.non_negative_int("minSalary")?,
        })
    }

    pub fn to_filter(&self) -> SqlResult {
        FilterWhere::new(0)
            .contains("title", self.title.as_deref())
            .min("salary", SqlParam::Int(self.min_salary))
            .build()
    }
}

impl Job {
    /// Insert a job. The company must exist.
    pub async fn create(pool: &PgPool, data: &NewJob) -> Result<Job, ApiError> {
        let sql = format!(
            "INSERT INTO jobs (title, salary, equity, company_handle) VALUES ($1, $2, $3, $4) RETURNING {}",
            JOB_COLUMNS
        );

        let result = sqlx::query_as::<_, Job>(&sql)
            .bind(&data.title)
            .bind(data.salary)
            .bind(data.equity)
            .bind(&data.company_handle)
            .fetch_one(pool)
            .await;

        match result {
            Ok(job) => {
                tracing::info!("Created job {} for {}", job.id, job.company_handle);
                Ok(job)
            }
            Err(e) if matches!(constraint_violation(&e), Some(ConstraintViolation::ForeignKey(_))) => {
                Err(ApiError::bad_request(format!("No company: {}", data.company_handle)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_all(pool: &PgPool, search: &JobSearch) -> Result<Vec<Job>, ApiError> {
        let filter = search.to_filter();
        let sql = format!(
            "SELECT {} FROM jobs WHERE {} ORDER BY title, id",
            JOB_COLUMNS, filter.query
        );

        let jobs = query_as_with::<Job>(&sql, &filter.params)
            .fetch_all(pool)
            .await?;
        Ok(jobs)
    }

    pub async fn find_by_company(pool: &PgPool, handle: &str) -> Result<Vec<Job>, ApiError> {
        let sql = format!(
            "SELECT {} FROM jobs WHERE company_handle = $1 ORDER BY id",
            JOB_COLUMNS
        );
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(handle)
            .fetch_all(pool)
            .await?;
        Ok(jobs)
    }

    pub async fn get(pool: &PgPool, id: i32) -> Result<Job, ApiError> {
        let sql = format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS);
        sqlx::query_as::<_, Job>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No job: {}", id)))
    }

    pub async fn update(pool: &PgPool, id: i32, data: &JobUpdate) -> Result<Job, ApiError> {
        // Logical and physical names coincide for every updatable job field
        let update = sql_for_partial_update(&field_map(data)?, &[], JOB_TYPES)?;
        let sql = format!(
            "UPDATE jobs SET {} WHERE id = {} RETURNING {}",
            update.set_clause(),
            update.next_placeholder(),
            JOB_COLUMNS
        );

        let mut params = update.values;
        params.push(SqlParam::from(id));

        query_as_with::<Job>(&sql, &params)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No job: {}", id)))
    }

    pub async fn remove(pool: &PgPool, id: i32) -> Result<(), ApiError> {
        let deleted = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(ApiError::not_found(format!("No job: {}", id)));
        }
        tracing::info!("Deleted job {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn equity_bounds() {
        let job: NewJob = serde_json::from_value(json!({
            "title": "Engineer",
            "salary": 100000,
            "equity": 1.5,
            "companyHandle": "acme"
        }))
        .unwrap();
        assert_eq!(job.validate().unwrap_err().status_code(), 400);

        let update = JobUpdate { equity: Some(Some(0.25)), ..Default::default() };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn update_cannot_move_job_between_companies() {
        assert!(serde_json::from_value::<JobUpdate>(json!({ "companyHandle": "other" })).is_err());
        assert!(serde_json::from_value::<JobUpdate>(json!({ "id": 5 })).is_err());
    }

    #[test]
    fn update_uses_identity_columns() {
        let update = JobUpdate {
            title: Some("Lead".to_string()),
            salary: Some(Some(5)),
            ..Default::default()
        };
        let partial = sql_for_partial_update(&field_map(&update).unwrap(), &[], JOB_TYPES).unwrap();
        assert_eq!(partial.set_cols, vec!["\"salary\" = $1", "\"title\" = $2"]);
        assert_eq!(partial.values, vec![SqlParam::from(5), SqlParam::from("Lead")]);
    }

    #[test]
    fn null_salary_and_whole_equity_keep_column_types() {
        let update: JobUpdate = serde_json::from_value(json!({ "salary": null, "equity": 1 })).unwrap();
        assert!(update.validate().is_ok());

        let partial = sql_for_partial_update(&field_map(&update).unwrap(), &[], JOB_TYPES).unwrap();
        assert_eq!(partial.set_cols, vec!["\"equity\" = $1", "\"salary\" = $2"]);
        assert_eq!(partial.values, vec![SqlParam::Float(Some(1.0)), SqlParam::Int(None)]);
    }

    #[test]
    fn search_binds_title_then_salary() {
        let search = JobSearch {
            title: Some("eng".to_string()),
            min_salary: None,
        };
        let filter = search.to_filter();
        assert!(filter.query.contains("\"title\" ILIKE"));
        assert!(filter.query.contains("\"salary\" >= $2::INTEGER"));
        assert_eq!(filter.params, vec![SqlParam::from("eng"), SqlParam::Int(None)]);
    }
}
