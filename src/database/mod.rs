pub mod manager;
pub mod partial_update;
pub mod query_builder;

pub use manager::{constraint_violation, ConstraintViolation, DatabaseError, DatabaseManager};
pub use partial_update::{sql_for_partial_update, PartialUpdate};
