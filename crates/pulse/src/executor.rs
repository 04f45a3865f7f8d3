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

use crate::catalog::{Dimension, FactTable};
use crate::error::DataSourceError;
use crate::query::BoundQuery;
use crate::table::{ResultTable, Value, ValueKind};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use sqlx::any::{AnyArguments, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyConnection, Connection, Row};
use tracing::{debug, warn};
use url::Url;

static DRIVERS: Lazy<()> = Lazy::new(sqlx::any::install_default_drivers);

/// Anything that can run a bound read-only statement.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn execute(&self, query: &BoundQuery) -> Result<ResultTable, DataSourceError>;

    /// Distinct values of `dimension` in `table`, ascending.
    async fn distinct(
        &self,
        table: FactTable,
        dimension: Dimension,
    ) -> Result<Vec<Value>, DataSourceError> {
        let rows = self.execute(&BoundQuery::distinct(table, dimension)).await?;
        rows.distinct_values(dimension.alias())
            .map_err(|e| DataSourceError::Decode {
                column: dimension.alias().to_string(),
                reason: e.to_string(),
            })
    }
}

/// Executes through the sqlx `Any` driver, one connection per statement.
#[derive(Debug, Clone)]
pub struct SqlxSource {
    url: String,
}

impl SqlxSource {
    pub fn new(url: impl Into<String>) -> Self {
        Lazy::force(&DRIVERS);
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// The URL without credentials, for messages. Falls back to the scheme
    /// alone when the URL does not parse.
    fn target(&self) -> String {
        let Ok(mut url) = Url::parse(&self.url) else {
            return match self.url.split_once(':') {
                Some((scheme, _)) => format!("{scheme}://"),
                None => "<unparsed url>".to_string(),
            };
        };
        // Not every URL can carry a password; nothing to clear then.
        let _ = url.set_password(None);
        let secret = |key: &str| key.eq_ignore_ascii_case("password");
        if url.query_pairs().any(|(key, _)| secret(&key)) {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| !secret(key))
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect();
            if kept.is_empty() {
                url.set_query(None);
            } else {
                url.query_pairs_mut().clear().extend_pairs(kept);
            }
        }
        url.to_string()
    }
}

#[async_trait]
impl DataSource for SqlxSource {
    async fn execute(&self, query: &BoundQuery) -> Result<ResultTable, DataSourceError> {
        debug!(sql = %query.sql, args = ?query.args, "executing statement");
        let mut conn = AnyConnection::connect(&self.url)
            .await
            .map_err(|source| DataSourceError::Connection {
                target: self.target(),
                source,
            })?;
        let statement = query
            .args
            .iter()
            .fold(sqlx::query(&query.sql), bind_value);
        let fetched = statement.fetch_all(&mut conn).await;
        if let Err(e) = conn.close().await {
            warn!(error = %e, "failed to close connection cleanly");
        }
        let rows = fetched.map_err(|source| DataSourceError::Query { source })?;
        debug!(rows = rows.len(), table = %query.table, "statement returned");
        materialise(&rows, query)
    }
}

fn bind_value<'q>(
    statement: Query<'q, Any, AnyArguments<'q>>,
    value: &Value,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        Value::Integer(v) => statement.bind(*v),
        Value::Float(v) => statement.bind(*v),
        Value::Text(v) => statement.bind(v.clone()),
        Value::Null => statement.bind(Option::<String>::None),
    }
}

fn materialise(rows: &[AnyRow], query: &BoundQuery) -> Result<ResultTable, DataSourceError> {
    let mut table = ResultTable::with_schema(query.schema_refs());
    for row in rows {
        let values = query
            .schema
            .iter()
            .map(|(name, kind)| decode_cell(row, name, *kind))
            .collect::<Result<Vec<_>, _>>()?;
        table
            .push_row(values)
            .map_err(|e| DataSourceError::Decode {
                column: String::new(),
                reason: e.to_string(),
            })?;
    }
    Ok(table)
}

/// Backends disagree on integer widths and on what `SUM` returns, so each
/// declared kind accepts a few physical encodings.
fn decode_cell(row: &AnyRow, column: &str, kind: ValueKind) -> Result<Value, DataSourceError> {
    let as_int = || {
        row.try_get::<Option<i64>, _>(column)
            .ok()
            .or_else(|| {
                row.try_get::<Option<i32>, _>(column)
                    .ok()
                    .map(|v| v.map(i64::from))
            })
    };
    let as_float = || {
        row.try_get::<Option<f64>, _>(column)
            .ok()
            .or_else(|| {
                row.try_get::<Option<f32>, _>(column)
                    .ok()
                    .map(|v| v.map(f64::from))
            })
    };
    let decoded = match kind {
        ValueKind::Integer => as_int().map(|v| v.map(Value::Integer)).or_else(|| {
            as_float().and_then(|v| match v {
                None => Some(None),
                Some(f) if f.fract() == 0.0 => Some(Some(Value::Integer(f as i64))),
                Some(_) => None,
            })
        }),
        ValueKind::Float => as_float()
            .map(|v| v.map(Value::Float))
            .or_else(|| as_int().map(|v| v.map(|n| Value::Float(n as f64)))),
        ValueKind::Text => row
            .try_get::<Option<String>, _>(column)
            .ok()
            .map(|v| v.map(Value::Text))
            .or_else(|| as_int().map(|v| v.map(|n| Value::Text(n.to_string())))),
    };
    decoded
        .map(|v| v.unwrap_or(Value::Null))
        .ok_or_else(|| DataSourceError::Decode {
            column: column.to_string(),
            reason: format!("no {kind} decoding matched the column type"),
        })
}
