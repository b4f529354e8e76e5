use sqlx::{self, postgres::PgArguments, FromRow};

use crate::filter::SqlParam;

fn bind_param<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    param: &SqlParam,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    // Option<T> binds with T's type even when None
    match param {
        SqlParam::Int(v) => q.bind(*v),
        SqlParam::Float(v) => q.bind(*v),
        SqlParam::Text(v) => q.bind(v.clone()),
        SqlParam::Bool(v) => q.bind(*v),
    }
}

/// Build a typed query and bind positional parameters in order
pub fn query_as_with<'q, O>(
    sql: &'q str,
    params: &[SqlParam],
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    params
        .iter()
        .fold(sqlx::query_as::<_, O>(sql), |q, p| bind_param(q, p))
}
