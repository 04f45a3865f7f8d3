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

//! Pure post-processing of result tables.
//!
//! Every function here takes a table by reference and returns a new one; none
//! of them touch the database.

use crate::error::{ShapeError, ShapeResult};
use crate::table::{Column, ColumnData, ResultTable, Value, ValueKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeStep {
    /// Adds `"<year> Q<quarter>"` as `into` and sorts rows chronologically.
    PeriodLabel {
        year: String,
        quarter: String,
        into: String,
    },
    /// Running total of `column` over rows in (year, quarter) order.
    CumulativeSum {
        column: String,
        year: String,
        quarter: String,
        into: String,
    },
    /// `opens / users`, null where users is zero or null.
    EngagementRate {
        opens: String,
        users: String,
        into: String,
    },
    TitleCase { column: String },
    Sort { column: String, descending: bool },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeOptions {
    pub steps: Vec<ShapeStep>,
    /// In-memory equality filters applied before any step.
    pub filters: Vec<(String, Value)>,
}

pub fn shape(table: &ResultTable, options: &ShapeOptions) -> ShapeResult<ResultTable> {
    let mut out = table.clone();
    for (column, value) in &options.filters {
        out = filter_eq(&out, column, value)?;
    }
    for step in &options.steps {
        out = match step {
            ShapeStep::PeriodLabel {
                year,
                quarter,
                into,
            } => period_label(&out, year, quarter, into)?,
            ShapeStep::CumulativeSum {
                column,
                year,
                quarter,
                into,
            } => cumulative_sum(&out, column, year, quarter, into)?,
            ShapeStep::EngagementRate { opens, users, into } => {
                engagement_rate(&out, opens, users, into)?
            }
            ShapeStep::TitleCase { column } => title_case_column(&out, column)?,
            ShapeStep::Sort { column, descending } => {
                out.sorted_by_keys(&[(column.as_str(), *descending)])?
            }
        };
    }
    Ok(out)
}

fn require_kind(table: &ResultTable, column: &str, kinds: &[ValueKind]) -> ShapeResult<()> {
    let found = table.column(column)?.kind();
    if kinds.contains(&found) {
        Ok(())
    } else {
        Err(ShapeError::TypeMismatch {
            column: column.to_string(),
            expected: kinds
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or "),
            found: found.to_string(),
        })
    }
}

/// Sorts by the numeric (year, quarter) key, never by a label string.
pub fn sort_chronologically(
    table: &ResultTable,
    year: &str,
    quarter: &str,
) -> ShapeResult<ResultTable> {
    require_kind(table, year, &[ValueKind::Integer, ValueKind::Float])?;
    require_kind(table, quarter, &[ValueKind::Integer, ValueKind::Float])?;
    table.sorted_by_keys(&[(year, false), (quarter, false)])
}

pub fn period_label(
    table: &ResultTable,
    year: &str,
    quarter: &str,
    into: &str,
) -> ShapeResult<ResultTable> {
    let mut sorted = sort_chronologically(table, year, quarter)?;
    let labels = (0..sorted.row_count())
        .map(|i| {
            let y = sorted.value(year, i)?.as_i64();
            let q = sorted.value(quarter, i)?.as_i64();
            Ok(match (y, q) {
                (Some(y), Some(q)) => Some(format!("{y} Q{q}")),
                _ => None,
            })
        })
        .collect::<ShapeResult<Vec<_>>>()?;
    sorted.add_column(Column::new(into, ColumnData::Text(labels)))?;
    Ok(sorted)
}

pub fn cumulative_sum(
    table: &ResultTable,
    column: &str,
    year: &str,
    quarter: &str,
    into: &str,
) -> ShapeResult<ResultTable> {
    require_kind(table, column, &[ValueKind::Integer, ValueKind::Float])?;
    let mut sorted = sort_chronologically(table, year, quarter)?;
    let data = &sorted.column(column)?.data;
    let running = match data {
        ColumnData::Integer(values) => {
            let mut acc = 0i64;
            ColumnData::Integer(
                values
                    .iter()
                    .map(|v| {
                        acc = acc.saturating_add(v.unwrap_or(0));
                        Some(acc)
                    })
                    .collect(),
            )
        }
        _ => {
            let mut acc = 0.0f64;
            ColumnData::Float(
                (0..data.len())
                    .map(|i| {
                        acc += data.to_f64(i).unwrap_or(0.0);
                        Some(acc)
                    })
                    .collect(),
            )
        }
    };
    sorted.add_column(Column::new(into, running))?;
    Ok(sorted)
}

pub fn engagement_rate(
    table: &ResultTable,
    opens: &str,
    users: &str,
    into: &str,
) -> ShapeResult<ResultTable> {
    require_kind(table, opens, &[ValueKind::Integer, ValueKind::Float])?;
    require_kind(table, users, &[ValueKind::Integer, ValueKind::Float])?;
    let opens_data = &table.column(opens)?.data;
    let users_data = &table.column(users)?.data;
    let rates = (0..table.row_count())
        .map(|i| match (opens_data.to_f64(i), users_data.to_f64(i)) {
            (Some(o), Some(u)) if u != 0.0 => Some(o / u),
            _ => None,
        })
        .collect();
    let mut out = table.clone();
    out.add_column(Column::new(into, ColumnData::Float(rates)))?;
    Ok(out)
}

/// Upper-cases the first letter of each run of letters and lower-cases the
/// rest, so `"JAMMU & KASHMIR"` and `"jammu & kashmir"` both become
/// `"Jammu & Kashmir"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

pub fn title_case_column(table: &ResultTable, column: &str) -> ShapeResult<ResultTable> {
    require_kind(table, column, &[ValueKind::Text])?;
    let mut out = table.clone();
    if let ColumnData::Text(values) = &mut out.column_mut(column)?.data {
        for v in values.iter_mut().flatten() {
            *v = title_case(v);
        }
    }
    Ok(out)
}

pub fn filter_eq(table: &ResultTable, column: &str, value: &Value) -> ShapeResult<ResultTable> {
    let data = &table.column(column)?.data;
    Ok(table.filter_rows(|i| {
        let cell = data.get(i);
        match (&cell, value) {
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => match (cell.as_f64(), value.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn periods(rows: &[(i64, i64, i64)]) -> ResultTable {
        let mut t = ResultTable::with_schema([
            ("year", ValueKind::Integer),
            ("quarter", ValueKind::Integer),
            ("new_users", ValueKind::Integer),
        ]);
        for &(y, q, n) in rows {
            t.push_row(vec![y.into(), q.into(), n.into()]).unwrap();
        }
        t
    }

    fn labels(t: &ResultTable) -> Vec<String> {
        t.rows()
            .map(|r| r.last().map(ToString::to_string).unwrap_or_default())
            .collect()
    }

    #[test]
    fn period_labels_follow_numeric_order_not_string_order() {
        let t = periods(&[(10, 1, 1), (9, 2, 1), (9, 1, 1), (10, 2, 1)]);
        let shaped = period_label(&t, "year", "quarter", "period").unwrap();
        assert_eq!(labels(&shaped), vec!["9 Q1", "9 Q2", "10 Q1", "10 Q2"]);
    }

    #[test]
    fn cumulative_sum_runs_over_chronological_rows() {
        let t = periods(&[(2021, 1, 30), (2020, 2, 20), (2020, 1, 10)]);
        let shaped = cumulative_sum(&t, "new_users", "year", "quarter", "total").unwrap();
        let totals: Vec<Value> = (0..3).map(|i| shaped.value("total", i).unwrap()).collect();
        assert_eq!(totals, vec![10i64.into(), 30i64.into(), 60i64.into()]);
    }

    #[test]
    fn engagement_rate_is_null_for_zero_users() {
        let mut t = ResultTable::with_schema([
            ("state", ValueKind::Text),
            ("users", ValueKind::Integer),
            ("opens", ValueKind::Integer),
        ]);
        t.push_row(vec!["Goa".into(), 0i64.into(), 5i64.into()]).unwrap();
        t.push_row(vec!["Kerala".into(), 4i64.into(), 10i64.into()]).unwrap();
        let shaped = engagement_rate(&t, "opens", "users", "rate").unwrap();
        assert_eq!(shaped.value("rate", 0).unwrap(), Value::Null);
        assert_eq!(shaped.value("rate", 1).unwrap(), Value::Float(2.5));
    }

    #[test]
    fn title_case_handles_arbitrary_input_case() {
        assert_eq!(title_case("ANDHRA PRADESH"), "Andhra Pradesh");
        assert_eq!(title_case("andhra pradesh"), "Andhra Pradesh");
        assert_eq!(
            title_case("andaman-&-nicobar-islands"),
            "Andaman-&-Nicobar-Islands"
        );
    }

    #[test]
    fn filters_apply_before_steps() {
        let t = periods(&[(2020, 1, 1), (2021, 1, 2), (2021, 2, 3)]);
        let options = ShapeOptions {
            filters: vec![("year".into(), 2021i64.into())],
            steps: vec![ShapeStep::Sort {
                column: "new_users".into(),
                descending: true,
            }],
        };
        let shaped = shape(&t, &options).unwrap();
        assert_eq!(shaped.row_count(), 2);
        assert_eq!(shaped.value("new_users", 0).unwrap(), 3i64.into());
    }

    #[test]
    fn period_label_rejects_text_years() {
        let t = ResultTable::with_schema([("year", ValueKind::Text), ("quarter", ValueKind::Integer)]);
        assert!(matches!(
            period_label(&t, "year", "quarter", "p"),
            Err(ShapeError::TypeMismatch { .. })
        ));
    }

    proptest! {
        #[test]
        fn title_case_ignores_input_case(s in "[a-zA-Z &-]{0,40}") {
            prop_assert_eq!(title_case(&s.to_uppercase()), title_case(&s.to_lowercase()));
        }

        #[test]
        fn period_order_is_chronological(rows in proptest::collection::vec((1i64..3000, 1i64..=4), 0..30)) {
            let data: Vec<(i64, i64, i64)> = rows.iter().map(|&(y, q)| (y, q, 1)).collect();
            let shaped = period_label(&periods(&data), "year", "quarter", "period").unwrap();
            let keys: Vec<(i64, i64)> = (0..shaped.row_count())
                .map(|i| (
                    shaped.value("year", i).unwrap().as_i64().unwrap(),
                    shaped.value("quarter", i).unwrap().as_i64().unwrap(),
                ))
                .collect();
            prop_assert!(keys.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}
