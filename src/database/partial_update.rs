//! Partial-update SQL composition shared by every entity.
//!
//! An entity supplies its sparse field map, a rename table (logical field
//! name to physical column) and the Postgres type of each column; the composer
//! returns `SET` fragments with positional placeholders plus typed values in
//! the same order. Field names are
//! never taken from the request unchecked: each entity deserializes its update
//! payload into a closed struct first, and the composer refuses anything that
//! is not a plain identifier.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::filter::{SqlParam, SqlType};

#[derive(Debug, Clone, PartialEq)]
pub struct PartialUpdate {
    /// `"column" = $n` fragments, in input order
    pub set_cols: Vec<String>,
    pub values: Vec<SqlParam>,
}

impl PartialUpdate {
    /// Fragments joined for a `SET` clause
    pub fn set_clause(&self) -> String {
        self.set_cols.join(", ")
    }

    /// Placeholder for the caller's trailing key (e.g. `WHERE handle = $3`)
    pub fn next_placeholder(&self) -> String {
        format!("${}", self.values.len() + 1)
    }
}

/// Compose `SET` fragments for the fields present in `data`.
///
/// `renames` maps logical names to physical columns; names missing from it are
/// used as-is. `types` gives the bind type per physical column so a NULL is
/// sent with the column's type; undeclared columns take the type of their
/// value. An empty `data` map is a caller error.
pub fn sql_for_partial_update(
    data: &Map<String, Value>,
    renames: &[(&str, &str)],
    types: &[(&str, SqlType)],
) -> Result<PartialUpdate, ApiError> {
    if data.is_empty() {
        return Err(ApiError::bad_request("No data"));
    }

    let mut set_cols = Vec::with_capacity(data.len());
    let mut values = Vec::with_capacity(data.len());

    for (idx, (field, value)) in data.iter().enumerate() {
        let column = renames
            .iter()
            .find(|(logical, _)| *logical == field.as_str())
            .map(|(_, physical)| *physical)
            .unwrap_or(field.as_str());

        if !is_identifier(column) {
            return Err(ApiError::bad_request(format!("Invalid field: {}", field)));
        }

        let declared = types
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, sql_type)| *sql_type);
        let param = match declared {
            Some(sql_type) => SqlParam::from_json(value, sql_type),
            None if value.is_null() => Some(SqlParam::null(SqlType::Text)),
            None => SqlParam::infer(value),
        }
        .ok_or_else(|| ApiError::bad_request(format!("Invalid value for field: {}", field)))?;

        set_cols.push(format!("\"{}\" = ${}", column, idx + 1));
        values.push(param);
    }

    Ok(PartialUpdate { set_cols, values })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
