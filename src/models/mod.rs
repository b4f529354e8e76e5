pub mod application;
pub mod company;
pub mod job;
pub mod user;

pub use application::{AppliedJob, ApplyOutcome, JobApplication, NewApplication};
pub use company::{Company, CompanySearch, CompanyUpdate, CompanyWithJobs, NewCompany};
pub use job::{Job, JobSearch, JobUpdate, NewJob};
pub use user::{NewUser, Registration, User, UserDetail, UserUpdate};

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Collects per-field validation failures for one payload
#[derive(Debug, Default)]
pub(crate) struct FieldErrors(HashMap<String, String>);

impl FieldErrors {
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.0.entry(field.to_string()).or_insert_with(|| message.to_string());
        }
        self
    }

    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.chars().count();
        self.check(
            (min..=max).contains(&len),
            field,
            &format!("must be between {} and {} characters", min, max),
        )
    }

    pub fn finish(&mut self, message: &str) -> Result<(), ApiError> {
        if self.0.is_empty() {
            return Ok(());
        }
        Err(ApiError::validation_error(message, Some(std::mem::take(&mut self.0))))
    }
}

/// Serialize an update payload into the sparse field map the partial-update
/// composer consumes; unset fields are skipped by the payload's serde attrs.
pub(crate) fn field_map<T: Serialize>(payload: &T) -> Result<Map<String, Value>, ApiError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::bad_request("Update payload must be an object")),
        Err(e) => Err(ApiError::internal_with_detail("Failed to read update payload", e)),
    }
}

/// For `Option<Option<T>>` update fields: an absent key stays `None` (via
/// `#[serde(default)]`) while an explicit `null` becomes `Some(None)`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) fn is_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

pub(crate) fn is_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}
