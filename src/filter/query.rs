use std::collections::HashMap;

use crate::error::ApiError;

/// Raw query-string parameters of a list endpoint, coerced on demand.
/// Empty values count as absent.
#[derive(Debug, Default, Clone)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }

    /// Reject any key outside `allowed`
    pub fn deny_unknown(&self, allowed: &[&str]) -> Result<(), ApiError> {
        let mut unknown: Vec<&str> = self
            .0
            .keys()
            .map(String::as_str)
            .filter(|k| !allowed.contains(k))
            .collect();
        if unknown.is_empty() {
            return Ok(());
        }
        unknown.sort_unstable();
        Err(ApiError::bad_request(format!(
            "Unknown filter(s): {}",
            unknown.join(", ")
        )))
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Non-negative integer, or `BadRequest`
    pub fn non_negative_int(&self, key: &str) -> Result<Option<i32>, ApiError> {
        let Some(raw) = self.text(key) else {
            return Ok(None);
        };
        match raw.parse::<i32>() {
            Ok(n) if n >= 0 => Ok(Some(n)),
            _ => Err(ApiError::bad_request(format!(
                "{} must be a non-negative integer",
                key
            ))),
        }
    }
}

impl From<HashMap<String, String>> for QueryParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self::new(params)
    }
}
