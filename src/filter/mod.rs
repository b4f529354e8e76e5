pub mod filter_where;
pub mod query;
pub mod types;

pub use filter_where::FilterWhere;
pub use query::QueryParams;
pub use types::{SqlParam, SqlResult, SqlType};
