// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Read-only `SELECT` statements with positional placeholders.
//!
//! Identifiers are sanitised when rendered; values never appear in the SQL
//! text and are carried alongside it as bound arguments.

use crate::catalog::{Dimension, FactTable, SelectionKey};
use crate::table::{Value, ValueKind};
use std::fmt;

pub fn sanitize_identifier(s: &str) -> String {
    let mut out = String::new();
    for (i, c) in s.chars().enumerate() {
        if (c.is_ascii_alphanumeric() || c == '_') && (i > 0 || c.is_ascii_alphabetic() || c == '_')
        {
            out.push(c);
        }
    }
    if out.is_empty() {
        "_".to_string()
    } else {
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlCast {
    BigInt,
    Double,
}

impl SqlCast {
    pub fn for_kind(kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::Integer => Some(SqlCast::BigInt),
            ValueKind::Float => Some(SqlCast::Double),
            ValueKind::Text => None,
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            SqlCast::BigInt => "BIGINT",
            SqlCast::Double => "DOUBLE PRECISION",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectField {
    Column { column: String, alias: String },
    Sum {
        column: String,
        alias: String,
        cast: Option<SqlCast>,
    },
}

impl fmt::Display for SelectField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectField::Column { column, alias } => write!(
                f,
                "{} AS {}",
                sanitize_identifier(column),
                sanitize_identifier(alias)
            ),
            SelectField::Sum {
                column,
                alias,
                cast: Some(cast),
            } => write!(
                f,
                "CAST(SUM({}) AS {}) AS {}",
                sanitize_identifier(column),
                cast.type_name(),
                sanitize_identifier(alias)
            ),
            SelectField::Sum {
                column,
                alias,
                cast: None,
            } => write!(
                f,
                "SUM({}) AS {}",
                sanitize_identifier(column),
                sanitize_identifier(alias)
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderClause {
    pub field: String,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitClause {
    Fixed(u64),
    /// Bound at the placeholder with this 1-based index.
    Placeholder(usize),
}

#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    distinct: bool,
    fields: Vec<SelectField>,
    from: String,
    /// Equality filters, each bound to a 1-based placeholder.
    conditions: Vec<(String, usize)>,
    group_by: Vec<String>,
    order_by: Vec<OrderClause>,
    limit: Option<LimitClause>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn field(mut self, field: SelectField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn from(mut self, table: &str) -> Self {
        self.from = table.to_string();
        self
    }

    pub fn where_eq(mut self, column: &str, placeholder: usize) -> Self {
        self.conditions.push((column.to_string(), placeholder));
        self
    }

    pub fn group_by(mut self, column: &str) -> Self {
        self.group_by.push(column.to_string());
        self
    }

    pub fn order_by(mut self, field: &str, direction: OrderDirection) -> Self {
        self.order_by.push(OrderClause {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: LimitClause) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for SelectQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut query = String::from("SELECT ");
        if self.distinct {
            query.push_str("DISTINCT ");
        }
        if self.fields.is_empty() {
            query.push('*');
        } else {
            let fields: Vec<String> = self.fields.iter().map(ToString::to_string).collect();
            query.push_str(&fields.join(", "));
        }
        query.push_str(" FROM ");
        query.push_str(&sanitize_identifier(&self.from));
        if !self.conditions.is_empty() {
            query.push_str(" WHERE ");
            let conditions: Vec<String> = self
                .conditions
                .iter()
                .map(|(column, n)| format!("{} = ${n}", sanitize_identifier(column)))
                .collect();
            query.push_str(&conditions.join(" AND "));
        }
        if !self.group_by.is_empty() {
            query.push_str(" GROUP BY ");
            let groups: Vec<String> = self.group_by.iter().map(|s| sanitize_identifier(s)).collect();
            query.push_str(&groups.join(", "));
        }
        if !self.order_by.is_empty() {
            query.push_str(" ORDER BY ");
            let orders: Vec<String> = self
                .order_by
                .iter()
                .map(|o| {
                    let dir = match o.direction {
                        OrderDirection::Asc => "ASC",
                        OrderDirection::Desc => "DESC",
                    };
                    format!("{} {dir}", sanitize_identifier(&o.field))
                })
                .collect();
            query.push_str(&orders.join(", "));
        }
        match self.limit {
            Some(LimitClause::Fixed(n)) => query.push_str(&format!(" LIMIT {n}")),
            Some(LimitClause::Placeholder(n)) => query.push_str(&format!(" LIMIT ${n}")),
            None => {}
        }
        write!(f, "{query}")
    }
}

/// A statement ready for execution: SQL text, its arguments in placeholder
/// order, and the typed schema of the rows it returns.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub key: Option<SelectionKey>,
    pub table: FactTable,
    pub sql: String,
    pub args: Vec<Value>,
    pub schema: Vec<(String, ValueKind)>,
}

impl BoundQuery {
    /// `SELECT DISTINCT` over one dimension, ordered ascending.
    pub fn distinct(table: FactTable, dimension: Dimension) -> Self {
        let alias = dimension.alias();
        let sql = SelectQuery::new()
            .distinct()
            .field(SelectField::Column {
                column: dimension.column().to_string(),
                alias: alias.to_string(),
            })
            .from(table.name())
            .order_by(alias, OrderDirection::Asc)
            .to_string();
        Self {
            key: None,
            table,
            sql,
            args: Vec::new(),
            schema: vec![(alias.to_string(), dimension.kind())],
        }
    }

    pub fn schema_refs(&self) -> impl Iterator<Item = (&str, ValueKind)> {
        self.schema.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}
