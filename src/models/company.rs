use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::database::query_builder::query_as_with;
use crate::database::{constraint_violation, sql_for_partial_update, ConstraintViolation};
use crate::error::ApiError;
use crate::filter::{FilterWhere, QueryParams, SqlParam, SqlResult, SqlType};
use crate::models::job::Job;
use crate::models::{field_map, is_url, nullable, FieldErrors};

const COMPANY_COLUMNS: &str =
    "handle, name, description, num_employees, logo_url, location";

/// Logical update field to column, where they differ
const COMPANY_RENAMES: &[(&str, &str)] = &[("numEmployees", "num_employees"), ("logoUrl", "logo_url")];

const COMPANY_TYPES: &[(&str, SqlType)] = &[
    ("name", SqlType::Text),
    ("description", SqlType::Text),
    ("num_employees", SqlType::Int),
    ("logo_url", SqlType::Text),
    ("location", SqlType::Text),
];

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanyWithJobs {
    #[serde(flatten)]
    pub company: Company,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewCompany {
    pub handle: String,
    pub name: String,
    pub description: String,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
    pub location: Option<String>,
}

impl NewCompany {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .length("handle", &self.handle, 1, 25)
            .check(
                self.handle
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "handle",
                "may only contain lowercase letters, digits and '-'",
            )
            .length("name", &self.name, 1, 100)
            .check(self.num_employees.map_or(true, |n| n >= 0), "numEmployees", "must be >= 0")
            .check(self.logo_url.as_deref().map_or(true, is_url), "logoUrl", "must be an http(s) URL")
            .finish("Invalid company")
    }
}

/// PATCH body; every field optional, handle is not updatable. Nullable
/// columns take `Some(None)` for an explicit `null`, which clears them.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub num_employees: Option<Option<i32>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub location: Option<Option<String>>,
}

impl CompanyUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .check(self.name.as_deref().map_or(true, |n| (1..=100).contains(&n.chars().count())), "name", "must be between 1 and 100 characters")
            .check(self.num_employees.flatten().map_or(true, |n| n >= 0), "numEmployees", "must be >= 0")
            .check(
                self.logo_url.as_ref().and_then(|u| u.as_deref()).map_or(true, is_url),
                "logoUrl",
                "must be an http(s) URL",
            )
            .finish("Invalid company update")
    }
}

/// `GET /companies` filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanySearch {
    pub min_employees: Option<i32>,
    pub max_employees: Option<i32>,
    pub name_like: Option<String>,
}

impl CompanySearch {
    pub fn from_query(params: &QueryParams) -> Result<Self, ApiError> {
        params.deny_unknown(&["minEmployees", "maxEmployees", "nameLike"])?;
        let search = Self {
            min_employees: params.non_negative_int("minEmployees")?,
            max_employees: params.non_negative_int("maxEmployees")?,
            name_like: params.text("nameLike"),
        };

        // The filter composer does not order-check its bounds
        if let (Some(min), Some(max)) = (search.min_employees, search.max_employees) {
            if min > max {
                return Err(ApiError::bad_request(
                    "minEmployees cannot be greater than maxEmployees",
                ));
            }
        }
        Ok(search)
    }

    pub fn to_filter(&self) -> SqlResult {
        FilterWhere::new(0)
            .min("num_employees", SqlParam::Int(self.min_employees))
            .max("num_employees", SqlParam::Int(self.max_employees))
            .contains("name", self.name_like.as_deref())
            .build()
    }
}

impl Company {
    /// Insert a company. A duplicate handle or name is a `BadRequest`.
    pub async fn create(pool: &PgPool, data: &NewCompany) -> Result<Company, ApiError> {
        let sql = format!(
            "INSERT INTO companies ({cols}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {cols}",
            cols = COMPANY_COLUMNS
        );

        let result = sqlx::query_as::<_, Company>(&sql)
            .bind(&data.handle)
            .bind(&data.name)
            .bind(&data.description)
            .bind(data.num_employees)
            .bind(&data.logo_url)
            .bind(&data.location)
            .fetch_one(pool)
            .await;

        match result {
            Ok(company) => {
                tracing::info!("Created company {}", company.handle);
                Ok(company)
            }
            Err(e) if matches!(constraint_violation(&e), Some(ConstraintViolation::Unique(_))) => {
                Err(ApiError::bad_request(format!("Duplicate company: {}", data.handle)))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All companies matching `search`, ordered by name
    pub async fn find_all(pool: &PgPool, search: &CompanySearch) -> Result<Vec<Company>, ApiError> {
        let filter = search.to_filter();
        let sql = format!(
            "SELECT {} FROM companies WHERE {} ORDER BY name",
            COMPANY_COLUMNS, filter.query
        );

        let companies = query_as_with::<Company>(&sql, &filter.params)
            .fetch_all(pool)
            .await?;
        Ok(companies)
    }

    /// One company with its jobs
    pub async fn get(pool: &PgPool, handle: &str) -> Result<CompanyWithJobs, ApiError> {
        let sql = format!("SELECT {} FROM companies WHERE handle = $1", COMPANY_COLUMNS);
        let company = sqlx::query_as::<_, Company>(&sql)
            .bind(handle)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No company: {}", handle)))?;

        let jobs = Job::find_by_company(pool, handle).await?;
        Ok(CompanyWithJobs { company, jobs })
    }

    pub async fn update(pool: &PgPool, handle: &str, data: &CompanyUpdate) -> Result<Company, ApiError> {
        let update = sql_for_partial_update(&field_map(data)?, COMPANY_RENAMES, COMPANY_TYPES)?;
        let sql = format!(
            "UPDATE companies SET {} WHERE handle = {} RETURNING {}",
            update.set_clause(),
            update.next_placeholder(),
            COMPANY_COLUMNS
        );

        let mut params = update.values;
        params.push(SqlParam::from(handle));

        let result = query_as_with::<Company>(&sql, &params)
            .fetch_optional(pool)
            .await;

        match result {
            Ok(Some(company)) => Ok(company),
            Ok(None) => Err(ApiError::not_found(format!("No company: {}", handle))),
            Err(e) if matches!(constraint_violation(&e), Some(ConstraintViolation::Unique(_))) => {
                Err(ApiError::bad_request("Another company already uses that name"))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a company; its jobs and their applications cascade
    pub async fn remove(pool: &PgPool, handle: &str) -> Result<(), ApiError> {
        let deleted = sqlx::query("DELETE FROM companies WHERE handle = $1")
            .bind(handle)
            .execute(pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(ApiError::not_found(format!("No company: {}", handle)));
        }
        tracing::info!("Deleted company {}", handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn query(pairs: &[(&str, &str)]) -> QueryParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>()
            .into()
    }

    fn new_company() -> NewCompany {
        NewCompany {
            handle: "acme".to_string(),
            name: "Acme".to_string(),
            description: "Anvils".to_string(),
            num_employees: Some(10),
            logo_url: None,
            location: None,
        }
    }

    #[test]
    fn search_from_query() {
        let search = CompanySearch::from_query(&query(&[
            ("minEmployees", "10"),
            ("maxEmployees", "20"),
        ]))
        .unwrap();
        assert_eq!(search.min_employees, Some(10));
        assert_eq!(search.max_employees, Some(20));
        assert_eq!(search.name_like, None);

        let filter = search.to_filter();
        assert_eq!(
            filter.params,
            vec![SqlParam::from(10), SqlParam::from(20), SqlParam::Text(None)]
        );
    }

    #[test]
    fn min_above_max_is_bad_request() {
        let err = CompanySearch::from_query(&query(&[("minEmployees", "30"), ("maxEmployees", "20")]))
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn unknown_filter_is_bad_request() {
        assert!(CompanySearch::from_query(&query(&[("handle", "acme")])).is_err());
    }

    #[test]
    fn update_serializes_only_present_fields() {
        let update: CompanyUpdate = serde_json::from_value(json!({ "numEmployees": 50 })).unwrap();
        let map = field_map(&update).unwrap();
        assert_eq!(map.len(), 1);

        let partial = sql_for_partial_update(&map, COMPANY_RENAMES, COMPANY_TYPES).unwrap();
        assert_eq!(partial.set_cols, vec!["\"num_employees\" = $1"]);
        assert_eq!(partial.values, vec![SqlParam::from(50)]);
        assert_eq!(partial.next_placeholder(), "$2");
    }

    #[test]
    fn explicit_null_clears_nullable_fields() {
        let update: CompanyUpdate = serde_json::from_value(json!({ "logoUrl": null })).unwrap();
        assert_eq!(update.logo_url, Some(None));
        assert!(update.validate().is_ok());

        let partial =
            sql_for_partial_update(&field_map(&update).unwrap(), COMPANY_RENAMES, COMPANY_TYPES).unwrap();
        assert_eq!(partial.set_cols, vec!["\"logo_url\" = $1"]);
        assert_eq!(partial.values, vec![SqlParam::Text(None)]);
    }

    #[test]
    fn update_validation_checks_set_values() {
        let update: CompanyUpdate =
            serde_json::from_value(json!({ "numEmployees": -1, "logoUrl": "nope" })).unwrap();
        assert_eq!(update.validate().unwrap_err().status_code(), 400);
    }

    #[test]
    fn update_rejects_handle_and_unknown_fields() {
        assert!(serde_json::from_value::<CompanyUpdate>(json!({ "handle": "new" })).is_err());
        assert!(serde_json::from_value::<CompanyUpdate>(json!({ "bogus": 1 })).is_err());
    }

    #[test]
    fn new_company_validation() {
        assert!(new_company().validate().is_ok());

        let mut bad = new_company();
        bad.handle = "Not Valid!".to_string();
        bad.num_employees = Some(-1);
        let err = bad.validate().unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(fields), .. } => {
                assert!(fields.contains_key("handle"));
                assert!(fields.contains_key("numEmployees"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn serializes_camel_case() {
        let company = Company {
            handle: "acme".to_string(),
            name: "Acme".to_string(),
            description: "Anvils".to_string(),
            num_employees: Some(50),
            logo_url: Some("http://acme.img".to_string()),
            location: None,
        };
        let value = serde_json::to_value(&company).unwrap();
        assert_eq!(value["numEmployees"], 50);
        assert_eq!(value["logoUrl"], "http://acme.img");
    }
}
