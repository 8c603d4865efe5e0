use std::collections::HashMap;

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Id,
}

/// One searchable column: the API-facing parameter name and the SQL column
/// it maps to.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub const fn text(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            kind: ColumnKind::Text,
        }
    }

    pub const fn id(name: &'static str, column: &'static str) -> Self {
        Self {
            name,
            column,
            kind: ColumnKind::Id,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CondValue {
    Text(String),
    Id(Uuid),
    IdIn(Vec<Uuid>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: &'static str,
    pub value: CondValue,
}

/// Equality-only filter over an entity's allowlisted column set. Column
/// names come exclusively from static specs; caller input only ever lands
/// in bound parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    conditions: Vec<Condition>,
}

impl SearchFilter {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse caller query parameters against the entity's allowlist. At
    /// least one parameter is required; an unknown field or a malformed
    /// identifier is a caller error, never an empty success.
    pub fn from_query(
        params: &HashMap<String, String>,
        spec: &[ColumnSpec],
    ) -> Result<Self, FilterError> {
        if params.is_empty() {
            return Err(FilterError::EmptyQuery);
        }

        let mut conditions = Vec::with_capacity(params.len());
        for (name, raw) in params {
            let spec = spec
                .iter()
                .find(|s| s.name == name)
                .ok_or_else(|| FilterError::UnknownField(name.clone()))?;
            let value = match spec.kind {
                ColumnKind::Text => CondValue::Text(raw.clone()),
                ColumnKind::Id => CondValue::Id(raw.parse().map_err(|_| {
                    FilterError::InvalidValue {
                        field: name.clone(),
                        reason: "expected a UUID".to_string(),
                    }
                })?),
            };
            conditions.push(Condition {
                column: spec.column,
                value,
            });
        }

        // Deterministic clause order regardless of query-map iteration.
        conditions.sort_by_key(|c| c.column);
        Ok(Self { conditions })
    }

    /// Restrict to a set of identifiers (branch scoping on listings). An
    /// empty set matches nothing.
    pub fn and_id_in(&mut self, column: &'static str, ids: Vec<Uuid>) {
        self.conditions.push(Condition {
            column,
            value: CondValue::IdIn(ids),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Append a WHERE clause with bound parameters. `alias` qualifies the
    /// columns when the entity query joins populated references.
    pub fn apply(&self, qb: &mut QueryBuilder<'_, Postgres>, alias: Option<&str>) {
        let mut sep = " WHERE ";
        for cond in &self.conditions {
            qb.push(sep);
            sep = " AND ";
            if let Some(alias) = alias {
                qb.push(alias);
                qb.push(".");
            }
            qb.push(cond.column);
            match &cond.value {
                CondValue::Text(v) => {
                    qb.push(" = ");
                    qb.push_bind(v.clone());
                }
                CondValue::Id(v) => {
                    qb.push(" = ");
                    qb.push_bind(*v);
                }
                CondValue::IdIn(v) => {
                    qb.push(" = ANY(");
                    qb.push_bind(v.clone());
                    qb.push(")");
                }
            }
        }
    }
}
