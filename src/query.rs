/*!
 * Query builder module
 *
 * Builds the small set of parameterized SQL statements the object store
 * needs (projection, equality filter, prefix filter, upsert, delete)
 * without ever interpolating caller input into the statement text.
 */

use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

use crate::error::{QueryBuilderError, QueryResult};

/// A single WHERE clause condition.
#[derive(Debug, Clone)]
pub enum QueryCondition {
    /// Exact match on a column.
    Eq(String, Value),
    /// Start-anchored match on a text column. The stored prefix is the
    /// caller's literal text; LIKE wildcards are escaped at build time.
    Prefix(String, String),
}

impl QueryCondition {
    pub fn eq(field: &str, value: Value) -> Self {
        QueryCondition::Eq(field.to_string(), value)
    }

    pub fn prefix(field: &str, prefix: &str) -> Self {
        QueryCondition::Prefix(field.to_string(), prefix.to_string())
    }

    fn render(&self) -> (String, Value) {
        match self {
            QueryCondition::Eq(field, value) => (format!("{} = ?", field), value.clone()),
            QueryCondition::Prefix(field, prefix) => (
                format!("{} LIKE ? ESCAPE '\\'", field),
                Value::String(format!("{}%", escape_like(prefix))),
            ),
        }
    }
}

/// Escape LIKE wildcards so a caller-supplied prefix matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// SELECT statement builder with column projection and AND-combined conditions.
#[derive(Debug)]
pub struct SelectBuilder {
    table: String,
    select_fields: Vec<String>,
    conditions: Vec<QueryCondition>,
}

impl SelectBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            select_fields: vec!["*".to_string()],
            conditions: Vec::new(),
        }
    }

    pub fn select(mut self, fields: &[&str]) -> Self {
        self.select_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn where_condition(mut self, condition: QueryCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn build(self) -> QueryResult<(String, Vec<Value>)> {
        let mut sql = format!(
            "SELECT {} FROM {}",
            self.select_fields.join(", "),
            self.table
        );

        let mut params = Vec::new();
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            let mut clauses = Vec::with_capacity(self.conditions.len());
            for condition in &self.conditions {
                let (clause, param) = condition.render();
                clauses.push(clause);
                params.push(param);
            }
            sql.push_str(&clauses.join(" AND "));
        }

        Ok((sql, params))
    }
}

/// INSERT builder with upsert-by-conflict-target semantics.
///
/// With a conflict target set, the generated statement is
/// `INSERT ... ON CONFLICT(cols) DO UPDATE SET f = excluded.f` for every
/// non-target field, which is what gives `set` its replace-in-place
/// behavior while leaving `id` and `created_at` untouched.
#[derive(Debug)]
pub struct UpsertBuilder {
    table: String,
    fields: Vec<(String, Value)>,
    conflict_target: Vec<String>,
}

impl UpsertBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            fields: Vec::new(),
            conflict_target: Vec::new(),
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: Value) -> Self {
        self.fields.push((field.into(), value));
        self
    }

    pub fn on_conflict(mut self, columns: &[&str]) -> Self {
        self.conflict_target = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn build(self) -> QueryResult<(String, Vec<Value>)> {
        if self.fields.is_empty() {
            return Err(QueryBuilderError::UpsertFieldsEmpty);
        }

        let columns: Vec<&str> = self.fields.iter().map(|(f, _)| f.as_str()).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let params: Vec<Value> = self.fields.iter().map(|(_, v)| v.clone()).collect();

        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders
        );

        if !self.conflict_target.is_empty() {
            let updates: Vec<String> = columns
                .iter()
                .filter(|c| !self.conflict_target.iter().any(|t| t == *c))
                .map(|c| format!("{} = excluded.{}", c, c))
                .collect();

            if updates.is_empty() {
                sql.push_str(&format!(
                    " ON CONFLICT({}) DO NOTHING",
                    self.conflict_target.join(", ")
                ));
            } else {
                sql.push_str(&format!(
                    " ON CONFLICT({}) DO UPDATE SET {}",
                    self.conflict_target.join(", "),
                    updates.join(", ")
                ));
            }
        }

        Ok((sql, params))
    }
}

/// DELETE statement builder.
#[derive(Debug)]
pub struct DeleteBuilder {
    table: String,
    conditions: Vec<QueryCondition>,
}

impl DeleteBuilder {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            conditions: Vec::new(),
        }
    }

    pub fn where_condition(mut self, condition: QueryCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn build(self) -> QueryResult<(String, Vec<Value>)> {
        let mut sql = format!("DELETE FROM {}", self.table);

        let mut params = Vec::new();
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            let mut clauses = Vec::with_capacity(self.conditions.len());
            for condition in &self.conditions {
                let (clause, param) = condition.render();
                clauses.push(clause);
                params.push(param);
            }
            sql.push_str(&clauses.join(" AND "));
        }

        Ok((sql, params))
    }
}

/// Bind builder parameters onto a sqlx query in order.
pub fn bind_params<'q>(
    sql: &'q str,
    params: Vec<Value>,
) -> QueryResult<Query<'q, Sqlite, SqliteArguments<'q>>> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    query.bind(i)
                } else if let Some(f) = n.as_f64() {
                    query.bind(f)
                } else {
                    return Err(QueryBuilderError::unsupported_parameter("number"));
                }
            }
            Value::String(s) => query.bind(s),
            // Nested documents travel as their JSON text.
            other => query.bind(other.to_string()),
        };
    }
    Ok(query)
}
