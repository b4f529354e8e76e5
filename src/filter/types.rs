use serde_json::Value;

/// Postgres type of a bound parameter. Filters also cast every occurrence of
/// a parameter to it, so an unset (NULL) value still type-checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Int,
    Float,
    Text,
    Bool,
}

impl SqlType {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SqlType::Int => "INTEGER",
            SqlType::Float => "FLOAT8",
            SqlType::Text => "TEXT",
            SqlType::Bool => "BOOLEAN",
        }
    }
}

/// A positional parameter whose wire type is fixed by its variant, set or not.
///
/// sqlx prepares a statement once per connection and SQL text, so the same
/// text must always be bound with the same parameter types.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(Option<i32>),
    Float(Option<f64>),
    Text(Option<String>),
    Bool(Option<bool>),
}

impl SqlParam {
    pub fn null(sql_type: SqlType) -> Self {
        match sql_type {
            SqlType::Int => SqlParam::Int(None),
            SqlType::Float => SqlParam::Float(None),
            SqlType::Text => SqlParam::Text(None),
            SqlType::Bool => SqlParam::Bool(None),
        }
    }

    pub fn sql_type(&self) -> SqlType {
        match self {
            SqlParam::Int(_) => SqlType::Int,
            SqlParam::Float(_) => SqlType::Float,
            SqlParam::Text(_) => SqlType::Text,
            SqlParam::Bool(_) => SqlType::Bool,
        }
    }

    /// Convert a JSON value to a parameter of type `sql_type`; `None` when the
    /// value does not fit that type.
    pub fn from_json(value: &Value, sql_type: SqlType) -> Option<Self> {
        if value.is_null() {
            return Some(Self::null(sql_type));
        }
        match sql_type {
            SqlType::Int => value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(|n| SqlParam::Int(Some(n))),
            SqlType::Float => value.as_f64().map(|f| SqlParam::Float(Some(f))),
            SqlType::Text => value.as_str().map(|s| SqlParam::Text(Some(s.to_string()))),
            SqlType::Bool => value.as_bool().map(|b| SqlParam::Bool(Some(b))),
        }
    }

    /// Best type for an untyped JSON scalar; NULL and containers have none
    pub fn infer(value: &Value) -> Option<Self> {
        let sql_type = match value {
            Value::Bool(_) => SqlType::Bool,
            Value::String(_) => SqlType::Text,
            Value::Number(n) if n.as_i64().map_or(false, |i| i32::try_from(i).is_ok()) => SqlType::Int,
            Value::Number(_) => SqlType::Float,
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        Self::from_json(value, sql_type)
    }
}

impl From<i32> for SqlParam {
    fn from(n: i32) -> Self {
        SqlParam::Int(Some(n))
    }
}

impl From<&str> for SqlParam {
    fn from(s: &str) -> Self {
        SqlParam::Text(Some(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}
