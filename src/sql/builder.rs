//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from static entity metadata.

use crate::sql::SqlValue;
use serde_json::Value;

/// One table column: name, PostgreSQL type used for placeholder casts, and whether callers may write it.
#[derive(Clone, Copy, Debug)]
pub struct Column {
    pub name: &'static str,
    pub pg_type: &'static str,
    /// False for server-assigned columns (id, timestamps).
    pub writable: bool,
}

impl Column {
    pub const fn data(name: &'static str, pg_type: &'static str) -> Self {
        Column {
            name,
            pg_type,
            writable: true,
        }
    }

    pub const fn generated(name: &'static str, pg_type: &'static str) -> Self {
        Column {
            name,
            pg_type,
            writable: false,
        }
    }

    pub fn is_text(&self) -> bool {
        self.pg_type == "text"
    }
}

/// Direction of a relation: to_one (we hold the FK) or to_many (they hold the FK to us).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncludeDirection {
    ToOne,
    ToMany,
}

/// A named relation that can be eager-loaded next to its owner.
#[derive(Clone, Copy, Debug)]
pub struct Relation {
    pub name: &'static str,
    pub direction: IncludeDirection,
    pub table: &'static str,
    pub columns: &'static [Column],
    /// Our column used in the join (our FK for to_one; our PK for to_many).
    pub our_key: &'static str,
    /// Their column used in the join (their PK for to_one; their FK for to_many).
    pub their_key: &'static str,
}

/// Table-level metadata the builder needs.
#[derive(Clone, Copy, Debug)]
pub struct TableMeta {
    pub table: &'static str,
    pub pk: &'static str,
    pub columns: &'static [Column],
    /// Column refreshed with NOW() on every update, when the table has one.
    pub updated_at: Option<&'static str>,
}

impl TableMeta {
    pub fn column(&self, name: &str) -> Option<&'static Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Quote identifier for PostgreSQL (safe: only from static metadata).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a value and return its placeholder cast to the column type (`$n::type`).
    fn push_param(&mut self, v: SqlValue, pg_type: &str) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), pg_type)
    }
}

fn select_column_list(columns: &[Column], alias: Option<&str>) -> String {
    columns
        .iter()
        .map(|c| match alias {
            Some(a) => format!("{}.{}", a, quoted(c.name)),
            None => quoted(c.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Equality filters on known columns, ANDed. Unknown column names are skipped.
/// A null value matches rows where the column IS NULL.
fn where_filters(q: &mut QueryBuf, meta: &TableMeta, filters: &[(String, Value)]) -> String {
    let mut parts = Vec::new();
    for (col, val) in filters {
        let Some(c) = meta.column(col) else { continue };
        if val.is_null() {
            parts.push(format!("{} IS NULL", quoted(c.name)));
            continue;
        }
        let ph = q.push_param(SqlValue::from_json(val), c.pg_type);
        parts.push(format!("{} = {}", quoted(c.name), ph));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

fn page_clause(limit: u32, offset: u32) -> String {
    format!(" LIMIT {} OFFSET {}", limit, offset)
}

/// SELECT by primary key.
pub fn select_by_id(meta: &TableMeta, id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(SqlValue::I32(id), "int4");
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        select_column_list(meta.columns, None),
        quoted(meta.table),
        quoted(meta.pk),
        ph
    );
    q
}

/// SELECT list with equality filters, ORDER BY pk, LIMIT/OFFSET.
pub fn select_list(meta: &TableMeta, filters: &[(String, Value)], limit: u32, offset: u32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_filters(&mut q, meta, filters);
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}{}",
        select_column_list(meta.columns, None),
        quoted(meta.table),
        where_clause,
        quoted(meta.pk),
        page_clause(limit, offset)
    );
    q
}

/// SELECT with equality filters and no paging, ORDER BY pk.
pub fn select_filtered(meta: &TableMeta, filters: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_filters(&mut q, meta, filters);
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        select_column_list(meta.columns, None),
        quoted(meta.table),
        where_clause,
        quoted(meta.pk)
    );
    q
}

/// Escape LIKE wildcards so the term matches literally as a substring.
fn like_substring(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('%');
    out
}

/// Case-insensitive substring search on one text column. Caller checks the column exists and is text.
pub fn select_ilike(meta: &TableMeta, column: &Column, term: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(SqlValue::Text(like_substring(term)), "text");
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} ILIKE {} ORDER BY {}",
        select_column_list(meta.columns, None),
        quoted(meta.table),
        quoted(column.name),
        ph,
        quoted(meta.pk)
    );
    q
}

/// SELECT one row by pk with each relation as a scalar subquery (json_agg for to_many, row_to_json for to_one).
pub fn select_by_id_with_includes(meta: &TableMeta, id: i32, includes: &[&Relation]) -> QueryBuf {
    const MAIN_ALIAS: &str = "main";
    let mut q = QueryBuf::new();
    let mut select_parts = vec![select_column_list(meta.columns, Some(MAIN_ALIAS))];
    for inc in includes {
        let sub_from = format!(
            "{} WHERE {} = {}.{}",
            quoted(inc.table),
            quoted(inc.their_key),
            MAIN_ALIAS,
            quoted(inc.our_key)
        );
        let rel_cols = select_column_list(inc.columns, None);
        let subquery = match inc.direction {
            IncludeDirection::ToOne => format!(
                "(SELECT row_to_json(sub) FROM (SELECT {} FROM {}) sub)",
                rel_cols, sub_from
            ),
            IncludeDirection::ToMany => format!(
                "(SELECT COALESCE(json_agg(row_to_json(sub) ORDER BY sub.\"id\"), '[]'::json) FROM (SELECT {} FROM {}) sub)",
                rel_cols, sub_from
            ),
        };
        select_parts.push(format!("{} AS {}", subquery, quoted(inc.name)));
    }
    let ph = q.push_param(SqlValue::I32(id), "int4");
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {}.{} = {}",
        select_parts.join(", "),
        quoted(meta.table),
        MAIN_ALIAS,
        MAIN_ALIAS,
        quoted(meta.pk),
        ph
    );
    q
}

/// SELECT COUNT(*) with equality filters.
pub fn select_count(meta: &TableMeta, filters: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_clause = where_filters(&mut q, meta, filters);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(meta.table), where_clause);
    q
}

/// SELECT EXISTS for one pk.
pub fn select_exists(meta: &TableMeta, id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(SqlValue::I32(id), "int4");
    q.sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {} WHERE {} = {})",
        quoted(meta.table),
        quoted(meta.pk),
        ph
    );
    q
}

/// INSERT writable columns from `values`; server-assigned columns fall back to their DB defaults.
pub fn insert(meta: &TableMeta, values: Vec<(&'static str, SqlValue)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for (name, val) in values {
        let Some(c) = meta.column(name).filter(|c| c.writable) else { continue };
        placeholders.push(q.push_param(val, c.pg_type));
        cols.push(quoted(c.name));
    }
    let returning = select_column_list(meta.columns, None);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", quoted(meta.table), returning)
    } else {
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            quoted(meta.table),
            cols.join(", "),
            placeholders.join(", "),
            returning
        )
    };
    q
}

/// UPDATE by pk: SET every writable column given, plus `updated_at = NOW()` when the table has it.
pub fn update(meta: &TableMeta, id: i32, values: Vec<(&'static str, SqlValue)>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for (name, val) in values {
        let Some(c) = meta.column(name).filter(|c| c.writable) else { continue };
        let ph = q.push_param(val, c.pg_type);
        sets.push(format!("{} = {}", quoted(c.name), ph));
    }
    if let Some(ts) = meta.updated_at {
        sets.push(format!("{} = NOW()", quoted(ts)));
    }
    let returning = select_column_list(meta.columns, None);
    let id_ph = q.push_param(SqlValue::I32(id), "int4");
    if sets.is_empty() {
        q.sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            returning,
            quoted(meta.table),
            quoted(meta.pk),
            id_ph
        );
        return q;
    }
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        quoted(meta.table),
        sets.join(", "),
        quoted(meta.pk),
        id_ph,
        returning
    );
    q
}

/// DELETE by pk.
pub fn delete(meta: &TableMeta, id: i32) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(SqlValue::I32(id), "int4");
    q.sql = format!("DELETE FROM {} WHERE {} = {}", quoted(meta.table), quoted(meta.pk), ph);
    q
}
