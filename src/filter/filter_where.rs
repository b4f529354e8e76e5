use super::types::{SqlParam, SqlResult};

/// Builds a null-safe WHERE clause for list endpoints.
///
/// Each predicate always emits `($n::TYPE IS NULL OR <comparison>)` and always
/// binds a parameter, NULL when the caller left the filter unset, so the SQL
/// text and the bound parameter types are the same for every combination of
/// present and absent filters.
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    /// Inclusive lower bound: `column >= value`
    pub fn min(self, column: &str, value: SqlParam) -> Self {
        self.compare(column, ">=", value)
    }

    /// Inclusive upper bound: `column <= value`
    pub fn max(self, column: &str, value: SqlParam) -> Self {
        self.compare(column, "<=", value)
    }

    /// Case-insensitive, unanchored substring match
    pub fn contains(mut self, column: &str, pattern: Option<&str>) -> Self {
        let cast = self.param(SqlParam::Text(pattern.map(escape_like)));
        self.conditions.push(format!(
            "({cast} IS NULL OR \"{column}\" ILIKE '%' || {cast} || '%')"
        ));
        self
    }

    fn compare(mut self, column: &str, op: &str, value: SqlParam) -> Self {
        let cast = self.param(value);
        self.conditions
            .push(format!("({cast} IS NULL OR \"{column}\" {op} {cast})"));
        self
    }

    /// Conditions joined with AND; `TRUE` when nothing was added
    pub fn build(self) -> SqlResult {
        let query = if self.conditions.is_empty() {
            "TRUE".to_string()
        } else {
            self.conditions.join(" AND ")
        };
        SqlResult { query, params: self.param_values }
    }

    /// Push the parameter and return its placeholder cast to the parameter's type
    fn param(&mut self, value: SqlParam) -> String {
        let sql_type = value.sql_type();
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}::{}", self.param_index, sql_type.to_sql())
    }
}

/// Escape LIKE metacharacters so the pattern matches literally
fn escape_like(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
