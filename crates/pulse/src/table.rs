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

//! In-memory result tables.
//!
//! A [`ResultTable`] holds the rows returned by one aggregation query as named,
//! typed, nullable columns. Tables live for a single interaction and are
//! rebuilt by every shaping step rather than mutated in place.

use crate::error::{ShapeError, ShapeResult};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Integer,
    Float,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::Text => write!(f, "text"),
        }
    }
}

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(s) => s.parse().ok(),
            Value::Null => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Total order used for sorting: nulls compare greater than any value.
    fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                _ => a.to_string().cmp(&b.to_string()),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "snake_case")]
pub enum ColumnData {
    Integer(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn empty(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Integer => ColumnData::Integer(Vec::new()),
            ValueKind::Float => ColumnData::Float(Vec::new()),
            ValueKind::Text => ColumnData::Text(Vec::new()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            ColumnData::Integer(_) => ValueKind::Integer,
            ColumnData::Float(_) => ValueKind::Float,
            ColumnData::Text(_) => ValueKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Value {
        let value = match self {
            ColumnData::Integer(v) => v.get(index).copied().flatten().map(Value::Integer),
            ColumnData::Float(v) => v.get(index).copied().flatten().map(Value::Float),
            ColumnData::Text(v) => v.get(index).cloned().flatten().map(Value::Text),
        };
        value.unwrap_or(Value::Null)
    }

    pub fn to_f64(&self, index: usize) -> Option<f64> {
        self.get(index).as_f64()
    }

    /// Whether `value` can be stored here, allowing lossless numeric coercion.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnData::Integer(_), Value::Integer(_)) => true,
            (ColumnData::Integer(_), Value::Float(x)) => x.fract() == 0.0,
            (ColumnData::Float(_), Value::Integer(_) | Value::Float(_)) => true,
            (ColumnData::Text(_), Value::Text(_)) => true,
            _ => false,
        }
    }

    /// Appends a value, coercing between integer and float where lossless.
    pub fn push(&mut self, value: Value) -> std::result::Result<(), ValueKind> {
        match (self, value) {
            (ColumnData::Integer(v), Value::Integer(x)) => v.push(Some(x)),
            (ColumnData::Integer(v), Value::Float(x)) if x.fract() == 0.0 => v.push(Some(x as i64)),
            (ColumnData::Integer(v), Value::Null) => v.push(None),
            (ColumnData::Float(v), Value::Float(x)) => v.push(Some(x)),
            (ColumnData::Float(v), Value::Integer(x)) => v.push(Some(x as f64)),
            (ColumnData::Float(v), Value::Null) => v.push(None),
            (ColumnData::Text(v), Value::Text(x)) => v.push(Some(x)),
            (ColumnData::Text(v), Value::Null) => v.push(None),
            (column, _) => return Err(column.kind()),
        }
        Ok(())
    }

    /// Rows at `indices`; indices past the end are skipped.
    pub(crate) fn select_rows(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Integer(v) => {
                ColumnData::Integer(indices.iter().filter_map(|&i| v.get(i).copied()).collect())
            }
            ColumnData::Float(v) => {
                ColumnData::Float(indices.iter().filter_map(|&i| v.get(i).copied()).collect())
            }
            ColumnData::Text(v) => {
                ColumnData::Text(indices.iter().filter_map(|&i| v.get(i).cloned()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn kind(&self) -> ValueKind {
        self.data.kind()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    columns: Vec<Column>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty table with the given typed schema.
    pub fn with_schema<'a>(schema: impl IntoIterator<Item = (&'a str, ValueKind)>) -> Self {
        Self {
            columns: schema
                .into_iter()
                .map(|(name, kind)| Column::new(name, ColumnData::empty(kind)))
                .collect(),
        }
    }

    pub fn from_columns(columns: Vec<Column>) -> ShapeResult<Self> {
        let mut table = Self::new();
        for column in columns {
            table.add_column(column)?;
        }
        Ok(table)
    }

    pub fn add_column(&mut self, column: Column) -> ShapeResult<()> {
        if self.has_column(&column.name) {
            return Err(ShapeError::DuplicateColumn {
                column: column.name,
            });
        }
        if !self.columns.is_empty() && column.data.len() != self.row_count() {
            return Err(ShapeError::LengthMismatch {
                column: column.name,
                expected: self.row_count(),
                found: column.data.len(),
            });
        }
        self.columns.push(column);
        Ok(())
    }

    /// Appends one row, given in schema order.
    pub fn push_row(&mut self, row: Vec<Value>) -> ShapeResult<()> {
        if row.len() != self.columns.len() {
            return Err(ShapeError::LengthMismatch {
                column: "<row>".to_string(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        if let Some((column, value)) = self
            .columns
            .iter()
            .zip(&row)
            .find(|(column, value)| !column.data.accepts(value))
        {
            return Err(ShapeError::TypeMismatch {
                column: column.name.clone(),
                expected: column.kind().to_string(),
                found: match value {
                    Value::Integer(_) => ValueKind::Integer,
                    Value::Float(_) => ValueKind::Float,
                    _ => ValueKind::Text,
                }
                .to_string(),
            });
        }
        for (column, value) in self.columns.iter_mut().zip(row) {
            // Checked above.
            let _ = column.data.push(value);
        }
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> ShapeResult<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ShapeError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> ShapeResult<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| ShapeError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    pub fn value(&self, column: &str, row: usize) -> ShapeResult<Value> {
        Ok(self.column(column)?.data.get(row))
    }

    pub fn row(&self, index: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c.data.get(index)).collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<Value>> + '_ {
        (0..self.row_count()).map(|i| self.row(i))
    }

    /// Distinct non-null values of a column, sorted ascending.
    pub fn distinct_values(&self, column: &str) -> ShapeResult<Vec<Value>> {
        let data = &self.column(column)?.data;
        Ok((0..data.len())
            .map(|i| data.get(i))
            .filter(|v| !v.is_null())
            .sorted_by(|a, b| a.sort_cmp(b))
            .dedup()
            .collect())
    }

    pub(crate) fn take_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| Column::new(c.name.clone(), c.data.select_rows(indices)))
                .collect(),
        }
    }

    pub fn filter_rows<P>(&self, predicate: P) -> Self
    where
        P: Fn(usize) -> bool,
    {
        let indices: Vec<usize> = (0..self.row_count()).filter(|&i| predicate(i)).collect();
        self.take_rows(&indices)
    }

    /// Stable multi-key sort; each key is a column name and a descending flag.
    pub fn sorted_by_keys(&self, keys: &[(&str, bool)]) -> ShapeResult<Self> {
        let columns = keys
            .iter()
            .map(|(name, desc)| Ok((&self.column(name)?.data, *desc)))
            .collect::<ShapeResult<Vec<_>>>()?;
        let mut indices: Vec<usize> = (0..self.row_count()).collect();
        indices.sort_by(|&a, &b| {
            for (data, desc) in &columns {
                let (x, y) = (data.get(a), data.get(b));
                let ord = match (x.is_null(), y.is_null()) {
                    (false, false) if *desc => y.sort_cmp(&x),
                    _ => x.sort_cmp(&y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        Ok(self.take_rows(&indices))
    }

    /// Converts to a polars frame for tabular display.
    pub fn to_polars(&self) -> polars::prelude::PolarsResult<polars::prelude::DataFrame> {
        use polars::prelude::{Column as PlColumn, DataFrame, PlSmallStr};
        let columns = self
            .columns
            .iter()
            .map(|c| {
                let name = PlSmallStr::from(c.name.as_str());
                match &c.data {
                    ColumnData::Integer(v) => PlColumn::new(name, v.as_slice()),
                    ColumnData::Float(v) => PlColumn::new(name, v.as_slice()),
                    ColumnData::Text(v) => PlColumn::new(name, v.as_slice()),
                }
            })
            .collect();
        DataFrame::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResultTable {
        let mut table = ResultTable::with_schema([
            ("state", ValueKind::Text),
            ("total", ValueKind::Float),
        ]);
        table.push_row(vec!["Kerala".into(), 10.0.into()]).unwrap();
        table.push_row(vec!["Goa".into(), Value::Null]).unwrap();
        table.push_row(vec!["Assam".into(), 30.0.into()]).unwrap();
        table
    }

    #[test]
    fn push_row_rejects_wrong_kind_without_partial_writes() {
        let mut table = sample();
        let err = table.push_row(vec!["Bihar".into(), "lots".into()]).unwrap_err();
        assert!(matches!(err, ShapeError::TypeMismatch { ref column, .. } if column == "total"));
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column("state").unwrap().data.len(), 3);
    }

    #[test]
    fn take_rows_skips_indices_past_the_end() {
        let table = sample();
        let taken = table.take_rows(&[2, 7, 0]);
        assert_eq!(taken.row_count(), 2);
        assert_eq!(taken.value("state", 0).unwrap(), Value::from("Assam"));
        assert_eq!(taken.value("state", 1).unwrap(), Value::from("Kerala"));
    }

    #[test]
    fn integer_values_widen_into_float_columns() {
        let mut table = sample();
        table.push_row(vec!["Bihar".into(), 7i64.into()]).unwrap();
        assert_eq!(table.value("total", 3).unwrap(), Value::Float(7.0));
    }

    #[test]
    fn descending_sort_keeps_nulls_last() {
        let sorted = sample().sorted_by_keys(&[("total", true)]).unwrap();
        let states: Vec<Value> = sorted.rows().map(|r| r[0].clone()).collect();
        assert_eq!(states, vec!["Assam".into(), "Kerala".into(), "Goa".into()]);
    }

    #[test]
    fn distinct_values_are_sorted_and_skip_nulls() {
        let mut table = ResultTable::with_schema([("year", ValueKind::Integer)]);
        for y in [2021, 2019, 2021, 2020] {
            table.push_row(vec![Value::Integer(y)]).unwrap();
        }
        table.push_row(vec![Value::Null]).unwrap();
        assert_eq!(
            table.distinct_values("year").unwrap(),
            vec![2019i64.into(), 2020i64.into(), 2021i64.into()]
        );
    }

    #[test]
    fn add_column_checks_length() {
        let mut table = sample();
        let err = table
            .add_column(Column::new("extra", ColumnData::Integer(vec![Some(1)])))
            .unwrap_err();
        assert!(matches!(err, ShapeError::LengthMismatch { expected: 3, found: 1, .. }));
    }

    #[test]
    fn polars_frame_keeps_shape() {
        let frame = sample().to_polars().unwrap();
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.width(), 2);
    }
}
