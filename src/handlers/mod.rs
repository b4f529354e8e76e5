// handlers/mod.rs - HTTP glue between routes and models
//
// Handlers validate the payload shape, call into `models`, and wrap the result
// in a keyed JSON body. Route guards are attached in `server`, not here.

pub mod applications;
pub mod auth;
pub mod companies;
pub mod jobs;
pub mod root;
pub mod users;

use std::collections::HashMap;

use axum::extract::Query;

use crate::filter::QueryParams;

/// Raw list-endpoint query string
pub(crate) type RawQuery = Query<HashMap<String, String>>;

pub(crate) fn query_params(Query(raw): RawQuery) -> QueryParams {
    QueryParams::new(raw)
}
