use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use crate::auth::password;
use crate::database::query_builder::query_as_with;
use crate::database::{constraint_violation, sql_for_partial_update, ConstraintViolation};
use crate::error::ApiError;
use crate::filter::{SqlParam, SqlType};
use crate::models::application::JobApplication;
use crate::models::{field_map, is_email, FieldErrors};

const USER_COLUMNS: &str = "username, first_name, last_name, email, is_admin";

const USER_RENAMES: &[(&str, &str)] = &[("firstName", "first_name"), ("lastName", "last_name")];

const USER_TYPES: &[(&str, SqlType)] = &[
    ("first_name", SqlType::Text),
    ("last_name", SqlType::Text),
    ("email", SqlType::Text),
    ("password", SqlType::Text),
];

/// Public view of a user; the password hash never leaves the model
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(FromRow)]
struct UserWithPassword {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    is_admin: bool,
    password: String,
}

impl From<UserWithPassword> for User {
    fn from(row: UserWithPassword) -> Self {
        Self {
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            is_admin: row.is_admin,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    /// Ids of jobs applied to
    pub applications: Vec<i32>,
}

/// Self-registration; always creates a non-admin
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Admin-created user
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

impl From<Registration> for NewUser {
    fn from(reg: Registration) -> Self {
        Self {
            username: reg.username,
            password: reg.password,
            first_name: reg.first_name,
            last_name: reg.last_name,
            email: reg.email,
            is_admin: false,
        }
    }
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ApiError> {
        FieldErrors::default()
            .length("username", &self.username, 1, 25)
            .length("password", &self.password, 5, 20)
            .length("firstName", &self.first_name, 1, 30)
            .length("lastName", &self.last_name, 1, 30)
            .length("email", &self.email, 6, 60)
            .check(is_email(&self.email), "email", "must be an email address")
            .finish("Invalid user")
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let len_ok = |v: &Option<String>, min: usize, max: usize| {
            v.as_deref().map_or(true, |s| (min..=max).contains(&s.chars().count()))
        };
        FieldErrors::default()
            .check(len_ok(&self.first_name, 1, 30), "firstName", "must be between 1 and 30 characters")
            .check(len_ok(&self.last_name, 1, 30), "lastName", "must be between 1 and 30 characters")
            .check(len_ok(&self.password, 5, 20), "password", "must be between 5 and 20 characters")
            .check(self.email.as_deref().map_or(true, is_email), "email", "must be an email address")
            .finish("Invalid user update")
    }
}

impl User {
    /// Check credentials; any failure is the same `Unauthorized`
    pub async fn authenticate(pool: &PgPool, username: &str, password: &str) -> Result<User, ApiError> {
        let sql = format!("SELECT {}, password FROM users WHERE username = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserWithPassword>(&sql)
            .bind(username)
            .fetch_optional(pool)
            .await?;

        if let Some(row) = row {
            let hash = row.password.clone();
            if password::verify_password_blocking(password.to_string(), hash).await? {
                return Ok(row.into());
            }
        }

        tracing::warn!("Failed login for '{}'", username);
        Err(ApiError::unauthorized("Invalid username/password"))
    }

    /// Create a user with a freshly hashed password
    pub async fn register(pool: &PgPool, data: &NewUser) -> Result<User, ApiError> {
        let hashed = password::hash_password_blocking(data.password.clone()).await?;
        let sql = format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        );

        let result = sqlx::query_as::<_, User>(&sql)
            .bind(&data.username)
            .bind(&hashed)
            .bind(&data.first_name)
            .bind(&data.last_name)
            .bind(&data.email)
            .bind(data.is_admin)
            .fetch_one(pool)
            .await;

        match result {
            Ok(user) => {
                tracing::info!("Registered user {} (admin: {})", user.username, user.is_admin);
                Ok(user)
            }
            Err(e) if matches!(constraint_violation(&e), Some(ConstraintViolation::Unique(_))) => {
                Err(ApiError::bad_request(format!("Duplicate username: {}", data.username)))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<User>, ApiError> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(pool).await?)
    }

    /// A user plus the ids of the jobs they applied to
    pub async fn get(pool: &PgPool, username: &str) -> Result<UserDetail, ApiError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No user: {}", username)))?;

        let applications = JobApplication::job_ids_for_user(pool, username).await?;
        Ok(UserDetail { user, applications })
    }

    /// Partial update. A new password is hashed before it is stored.
    pub async fn update(pool: &PgPool, username: &str, data: &UserUpdate) -> Result<User, ApiError> {
        let mut fields = field_map(data)?;
        if let Some(plain) = data.password.as_ref() {
            let hashed = password::hash_password_blocking(plain.clone()).await?;
            fields.insert("password".to_string(), Value::String(hashed));
        }

        let update = sql_for_partial_update(&fields, USER_RENAMES, USER_TYPES)?;
        let sql = format!(
            "UPDATE users SET {} WHERE username = {} RETURNING {}",
            update.set_clause(),
            update.next_placeholder(),
            USER_COLUMNS
        );

        let mut params = update.values;
        params.push(SqlParam::from(username));

        query_as_with::<User>(&sql, &params)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("No user: {}", username)))
    }

    /// Delete a user; their applications cascade
    pub async fn remove(pool: &PgPool, username: &str) -> Result<(), ApiError> {
        let deleted = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(pool)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(ApiError::not_found(format!("No user: {}", username)));
        }
        tracing::info!("Deleted user {}", username);
        Ok(())
    }
}
