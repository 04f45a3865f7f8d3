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

use crate::chart::ViewSpec;
use crate::error::CatalogError;
use crate::query::{LimitClause, OrderDirection, SelectField, SelectQuery, SqlCast};
use crate::shaper::ShapeStep;
use crate::table::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactTable {
    AggregatedTransaction,
    MapTransaction,
    TopTransaction,
    AggregatedUser,
    MapUser,
    TopUser,
    AggregatedInsurance,
    MapInsurance,
    TopInsurance,
}

impl FactTable {
    pub const ALL: [FactTable; 9] = [
        FactTable::AggregatedTransaction,
        FactTable::MapTransaction,
        FactTable::TopTransaction,
        FactTable::AggregatedUser,
        FactTable::MapUser,
        FactTable::TopUser,
        FactTable::AggregatedInsurance,
        FactTable::MapInsurance,
        FactTable::TopInsurance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FactTable::AggregatedTransaction => "aggregated_transaction",
            FactTable::MapTransaction => "map_transaction",
            FactTable::TopTransaction => "top_transaction",
            FactTable::AggregatedUser => "aggregated_user",
            FactTable::MapUser => "map_user",
            FactTable::TopUser => "top_user",
            FactTable::AggregatedInsurance => "aggregated_insurance",
            FactTable::MapInsurance => "map_insurance",
            FactTable::TopInsurance => "top_insurance",
        }
    }
}

impl fmt::Display for FactTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FactTable {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FactTable::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| CatalogError::UnknownTable {
                name: s.to_string(),
            })
    }
}

/// Grouping dimensions. Each maps a physical column to the alias used in
/// result tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    State,
    District,
    Year,
    Quarter,
    TransactionType,
    Brand,
}

impl Dimension {
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::State => "states",
            Dimension::District => "districts",
            Dimension::Year => "years",
            Dimension::Quarter => "quarter",
            Dimension::TransactionType => "transaction_type",
            Dimension::Brand => "brands",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Dimension::State => "state",
            Dimension::District => "district",
            Dimension::Year => "year",
            Dimension::Quarter => "quarter",
            Dimension::TransactionType => "transaction_type",
            Dimension::Brand => "brand",
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Dimension::Year | Dimension::Quarter => ValueKind::Integer,
            _ => ValueKind::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    TransactionCount,
    TransactionAmount,
    RegisteredUsers,
    AppOpens,
}

impl Measure {
    pub fn column(&self) -> &'static str {
        match self {
            Measure::TransactionCount => "transaction_count",
            Measure::TransactionAmount => "transaction_amount",
            Measure::RegisteredUsers => "registeredusers",
            Measure::AppOpens => "appopens",
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Measure::TransactionAmount => ValueKind::Float,
            _ => ValueKind::Integer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub measure: Measure,
    pub alias: String,
}

/// User-selectable parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Param {
    Year,
    Quarter,
    State,
    TopN,
}

impl Param {
    pub fn name(&self) -> &'static str {
        match self {
            Param::Year => "year",
            Param::Quarter => "quarter",
            Param::State => "state",
            Param::TopN => "top_n",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Param::Year => "Select a Year",
            Param::Quarter => "Select a Quarter",
            Param::State => "Select a State",
            Param::TopN => "Select number of top entries",
        }
    }

    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            Param::Year => Some(Dimension::Year),
            Param::Quarter => Some(Dimension::Quarter),
            Param::State => Some(Dimension::State),
            Param::TopN => None,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Domain {
    /// Distinct values of a dimension in the template's table.
    Distinct(Dimension),
    /// Fixed choices with a default.
    Choices { values: Vec<i64>, default: i64 },
}

/// A query parameter: an equality filter in `WHERE` or the `LIMIT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSlot {
    pub param: Param,
    pub domain: Domain,
}

/// A selection applied to the fetched table instead of the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryFilter {
    pub param: Param,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Limit {
    None,
    Fixed(u64),
    TopN,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SelectionKey {
    pub case: u8,
    pub question: u8,
}

impl SelectionKey {
    pub fn new(case: u8, question: u8) -> Self {
        Self { case, question }
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "case {}.{}", self.case, self.question)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryTemplate {
    pub key: SelectionKey,
    pub title: String,
    pub table: FactTable,
    pub group_by: Vec<Dimension>,
    pub aggregates: Vec<Aggregate>,
    pub filters: Vec<ParamSlot>,
    pub order_by: Vec<(String, OrderDirection)>,
    pub limit: Limit,
    pub top_n: Option<ParamSlot>,
    pub secondary: Vec<SecondaryFilter>,
    pub steps: Vec<ShapeStep>,
    pub views: Vec<ViewSpec>,
    pub show_table: bool,
}

impl QueryTemplate {
    pub fn new(key: SelectionKey, title: &str, table: FactTable) -> Self {
        Self {
            key,
            title: title.to_string(),
            table,
            group_by: Vec::new(),
            aggregates: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: Limit::None,
            top_n: None,
            secondary: Vec::new(),
            steps: Vec::new(),
            views: Vec::new(),
            show_table: false,
        }
    }

    pub fn group_by(mut self, dimensions: &[Dimension]) -> Self {
        self.group_by.extend_from_slice(dimensions);
        self
    }

    pub fn sum(mut self, measure: Measure, alias: &str) -> Self {
        self.aggregates.push(Aggregate {
            measure,
            alias: alias.to_string(),
        });
        self
    }

    /// `WHERE dimension = <selected value>`, with the domain taken from the
    /// distinct values in the table.
    pub fn filter_by(mut self, param: Param) -> Self {
        if let Some(dimension) = param.dimension() {
            self.filters.push(ParamSlot {
                param,
                domain: Domain::Distinct(dimension),
            });
        }
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Asc));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order_by.push((column.to_string(), OrderDirection::Desc));
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Limit::Fixed(n);
        self
    }

    pub fn limit_top_n(mut self, values: &[i64], default: i64) -> Self {
        self.limit = Limit::TopN;
        self.top_n = Some(ParamSlot {
            param: Param::TopN,
            domain: Domain::Choices {
                values: values.to_vec(),
                default,
            },
        });
        self
    }

    pub fn then_filter(mut self, param: Param, column: &str) -> Self {
        self.secondary.push(SecondaryFilter {
            param,
            column: column.to_string(),
        });
        self
    }

    pub fn step(mut self, step: ShapeStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn view(mut self, view: ViewSpec) -> Self {
        self.views.push(view);
        self
    }

    pub fn with_table(mut self) -> Self {
        self.show_table = true;
        self
    }

    /// Parameters bound into the statement, in placeholder order.
    pub fn slots(&self) -> Vec<&ParamSlot> {
        self.filters.iter().chain(self.top_n.as_ref()).collect()
    }

    pub fn result_schema(&self) -> Vec<(String, ValueKind)> {
        self.group_by
            .iter()
            .map(|d| (d.alias().to_string(), d.kind()))
            .chain(
                self.aggregates
                    .iter()
                    .map(|a| (a.alias.clone(), a.measure.kind())),
            )
            .collect()
    }

    /// Renders the statement. Group columns are appended to the ordering so
    /// ties always break the same way.
    pub fn select_query(&self) -> SelectQuery {
        let mut query = SelectQuery::new();
        for d in &self.group_by {
            query = query.field(SelectField::Column {
                column: d.column().to_string(),
                alias: d.alias().to_string(),
            });
        }
        for a in &self.aggregates {
            query = query.field(SelectField::Sum {
                column: a.measure.column().to_string(),
                alias: a.alias.clone(),
                cast: SqlCast::for_kind(a.measure.kind()),
            });
        }
        query = query.from(self.table.name());
        let mut placeholder = 0;
        for slot in &self.filters {
            if let Domain::Distinct(dimension) = slot.domain {
                placeholder += 1;
                query = query.where_eq(dimension.column(), placeholder);
            }
        }
        for d in &self.group_by {
            query = query.group_by(d.column());
        }
        let mut ordered: Vec<&str> = Vec::new();
        for (column, direction) in &self.order_by {
            query = query.order_by(column, *direction);
            ordered.push(column);
        }
        for d in &self.group_by {
            if !ordered.contains(&d.alias()) {
                query = query.order_by(d.alias(), OrderDirection::Asc);
            }
        }
        match self.limit {
            Limit::None => query,
            Limit::Fixed(n) => query.limit(LimitClause::Fixed(n)),
            Limit::TopN => query.limit(LimitClause::Placeholder(placeholder + 1)),
        }
    }
}
