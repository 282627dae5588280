//! Generic reader/writer over any `Entity`. Every call is its own atomic unit.

mod entity;

pub use entity::{Entity, WithRelations};

use crate::error::AppError;
use crate::sql::{self, QueryBuf, SqlValue};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::{Query, QueryAs, QueryScalar};
use sqlx::{FromRow, PgPool, Postgres, Row};
use std::marker::PhantomData;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

pub struct Repository<'a, E> {
    pool: &'a PgPool,
    _entity: PhantomData<fn() -> E>,
}

impl<'a, E: Entity> Repository<'a, E> {
    pub fn new(pool: &'a PgPool) -> Self {
        Repository {
            pool,
            _entity: PhantomData,
        }
    }

    pub async fn get_by_id(&self, id: i32) -> Result<Option<E>, AppError> {
        let q = sql::select_by_id(&E::META, id);
        Ok(query_as::<E>(&q).fetch_optional(self.pool).await?)
    }

    /// Page through all rows in insertion (pk) order. Limit defaults to 100 and is capped at 1000; offset defaults to 0.
    pub async fn get_all(&self, limit: Option<u32>, offset: Option<u32>) -> Result<Vec<E>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);
        let q = sql::select_list(&E::META, &[], limit, offset);
        Ok(query_as::<E>(&q).fetch_all(self.pool).await?)
    }

    /// Equality filter. Unknown field names are ignored.
    pub async fn get_by_filter(&self, filters: &[(String, Value)]) -> Result<Vec<E>, AppError> {
        let q = sql::select_filtered(&E::META, filters);
        Ok(query_as::<E>(&q).fetch_all(self.pool).await?)
    }

    /// Case-insensitive substring match on a text column.
    pub async fn search_by_text(&self, field: &str, term: &str) -> Result<Vec<E>, AppError> {
        let column = E::META
            .column(field)
            .filter(|c| c.is_text())
            .ok_or_else(|| AppError::BadRequest(format!("{} is not a searchable text field of {}", field, E::META.table)))?;
        let q = sql::select_ilike(&E::META, column, term);
        Ok(query_as::<E>(&q).fetch_all(self.pool).await?)
    }

    /// Fetch one row with the named relations loaded in the same statement.
    pub async fn get_with_relations(&self, id: i32, relations: &[&str]) -> Result<Option<WithRelations<E>>, AppError> {
        let includes = relations
            .iter()
            .map(|name| {
                E::relation(name)
                    .ok_or_else(|| AppError::BadRequest(format!("unknown relation for {}: {}", E::META.table, name)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let q = sql::select_by_id_with_includes(&E::META, id, &includes);
        let Some(row) = query(&q).fetch_optional(self.pool).await? else {
            return Ok(None);
        };
        let entity = E::from_row(&row)?;
        let mut loaded = serde_json::Map::new();
        for inc in &includes {
            let v: Option<Value> = row.try_get(inc.name)?;
            loaded.insert(inc.name.to_string(), v.unwrap_or(Value::Null));
        }
        Ok(Some(WithRelations {
            entity,
            relations: loaded,
        }))
    }

    pub async fn count(&self, filters: &[(String, Value)]) -> Result<i64, AppError> {
        let q = sql::select_count(&E::META, filters);
        Ok(query_scalar::<i64>(&q).fetch_one(self.pool).await?)
    }

    pub async fn exists(&self, id: i32) -> Result<bool, AppError> {
        let q = sql::select_exists(&E::META, id);
        Ok(query_scalar::<bool>(&q).fetch_one(self.pool).await?)
    }

    /// Insert and commit in one transaction; returns the row with its assigned id and timestamps.
    pub async fn create(&self, new: &E::New) -> Result<E, AppError> {
        let q = sql::insert(&E::META, E::insert_values(new));
        let mut tx = self.pool.begin().await?;
        let row = query_as::<E>(&q).fetch_one(&mut *tx).await?;
        tx.commit().await?;
        tracing::info!(table = E::META.table, id = row.id(), "created");
        Ok(row)
    }

    /// Whole-row replace of writable columns. Returns None when the id does not exist.
    pub async fn update(&self, entity: &E) -> Result<Option<E>, AppError> {
        entity.validate()?;
        let q = sql::update(&E::META, entity.id(), entity.update_values());
        let mut tx = self.pool.begin().await?;
        let row = query_as::<E>(&q).fetch_optional(&mut *tx).await?;
        tx.commit().await?;
        if row.is_some() {
            tracing::info!(table = E::META.table, id = entity.id(), "updated");
        }
        Ok(row)
    }

    /// Returns true if a row was removed; a missing id is not an error.
    pub async fn delete(&self, id: i32) -> Result<bool, AppError> {
        let q = sql::delete(&E::META, id);
        let mut tx = self.pool.begin().await?;
        let result = query(&q).execute(&mut *tx).await?;
        tx.commit().await?;
        let removed = result.rows_affected() > 0;
        if removed {
            tracing::info!(table = E::META.table, id, "deleted");
        }
        Ok(removed)
    }
}

fn log_query(q: &QueryBuf) {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
}

fn bind_params(q: &QueryBuf) -> impl Iterator<Item = SqlValue> + '_ {
    q.params.iter().cloned()
}

fn query(q: &QueryBuf) -> Query<'_, Postgres, PgArguments> {
    log_query(q);
    bind_params(q).fold(sqlx::query(&q.sql), |query, p| query.bind(p))
}

fn query_as<E>(q: &QueryBuf) -> QueryAs<'_, Postgres, E, PgArguments>
where
    E: for<'r> FromRow<'r, PgRow>,
{
    log_query(q);
    bind_params(q).fold(sqlx::query_as::<_, E>(&q.sql), |query, p| query.bind(p))
}

fn query_scalar<T>(q: &QueryBuf) -> QueryScalar<'_, Postgres, T, PgArguments>
where
    (T,): for<'r> FromRow<'r, PgRow>,
{
    log_query(q);
    bind_params(q).fold(sqlx::query_scalar::<_, T>(&q.sql), |query, p| query.bind(p))
}
