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

//! Binds user selections to a template's parameter slots.

use crate::catalog::{Domain, Param, ParamSlot, QueryTemplate};
use crate::error::{DataSourceError, ParameterError};
use crate::executor::DataSource;
use crate::query::BoundQuery;
use crate::table::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Values chosen by the user, keyed by parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selections {
    values: BTreeMap<Param, Value>,
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, param: Param, value: impl Into<Value>) {
        self.values.insert(param, value.into());
    }

    pub fn with(mut self, param: Param, value: impl Into<Value>) -> Self {
        self.set(param, value);
        self
    }

    pub fn year(self, year: i64) -> Self {
        self.with(Param::Year, year)
    }

    pub fn quarter(self, quarter: i64) -> Self {
        self.with(Param::Quarter, quarter)
    }

    pub fn state(self, state: &str) -> Self {
        self.with(Param::State, state)
    }

    pub fn top_n(self, n: i64) -> Self {
        self.with(Param::TopN, n)
    }

    pub fn get(&self, param: Param) -> Option<&Value> {
        self.values.get(&param)
    }

    pub fn contains(&self, param: Param) -> bool {
        self.values.contains_key(&param)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Param, &Value)> {
        self.values.iter().map(|(p, v)| (*p, v))
    }

    /// Replaces `{year}`, `{quarter}`, `{state}` and `{top_n}` in a title.
    pub fn interpolate(&self, title: &str) -> String {
        self.values.iter().fold(title.to_string(), |acc, (param, value)| {
            acc.replace(&format!("{{{}}}", param.name()), &value.to_string())
        })
    }
}

/// Valid values per parameter for one template.
pub type Domains = BTreeMap<Param, Vec<Value>>;

/// The selectable values of a slot. Data-driven domains must already be in
/// `fetched`; missing ones are treated as empty.
pub fn slot_domain(slot: &ParamSlot, fetched: &Domains) -> Vec<Value> {
    match &slot.domain {
        Domain::Distinct(_) => fetched.get(&slot.param).cloned().unwrap_or_default(),
        Domain::Choices { values, .. } => values.iter().copied().map(Value::Integer).collect(),
    }
}

fn describe(domain: &[Value]) -> String {
    let values: Vec<String> = domain.iter().map(ToString::to_string).collect();
    format!("[{}]", values.join(", "))
}

fn expected_kind(slot: &ParamSlot) -> ValueKind {
    match &slot.domain {
        Domain::Distinct(dimension) => dimension.kind(),
        Domain::Choices { .. } => ValueKind::Integer,
    }
}

fn value_kind(value: &Value) -> Option<ValueKind> {
    match value {
        Value::Integer(_) => Some(ValueKind::Integer),
        Value::Float(_) => Some(ValueKind::Float),
        Value::Text(_) => Some(ValueKind::Text),
        Value::Null => None,
    }
}

/// Validates `value` against the slot's kind and domain.
pub fn validate(slot: &ParamSlot, value: &Value, domain: &[Value]) -> Result<(), ParameterError> {
    let expected = expected_kind(slot);
    if value_kind(value) != Some(expected) {
        return Err(ParameterError::WrongKind {
            param: slot.param.name().to_string(),
            expected: expected.to_string(),
            found: value_kind(value).map_or_else(|| "null".to_string(), |k| k.to_string()),
        });
    }
    if domain.contains(value) {
        Ok(())
    } else {
        Err(ParameterError::InvalidParameter {
            param: slot.param.name().to_string(),
            value: value.to_string(),
            domain: describe(domain),
        })
    }
}

/// Fills every slot of `template` from `selections`. Pure: data-driven
/// domains are passed in.
pub fn bind(
    template: &QueryTemplate,
    selections: &Selections,
    domains: &Domains,
) -> Result<BoundQuery, ParameterError> {
    let mut args = Vec::new();
    for slot in template.slots() {
        let value = match (selections.get(slot.param), &slot.domain) {
            (Some(value), _) => value.clone(),
            (None, Domain::Choices { default, .. }) => Value::Integer(*default),
            (None, Domain::Distinct(_)) => {
                return Err(ParameterError::MissingParameter {
                    param: slot.param.name().to_string(),
                })
            }
        };
        validate(slot, &value, &slot_domain(slot, domains))?;
        args.push(value);
    }
    let sql = template.select_query().to_string();
    debug!(key = %template.key, %sql, "bound template");
    Ok(BoundQuery {
        key: Some(template.key),
        table: template.table,
        sql,
        args,
        schema: template.result_schema(),
    })
}

/// Fetches the data-driven domains of every slot that has one.
pub async fn fetch_domains<S>(
    template: &QueryTemplate,
    source: &S,
) -> Result<Domains, DataSourceError>
where
    S: DataSource + ?Sized,
{
    let mut domains = Domains::new();
    for slot in template.slots() {
        if let Domain::Distinct(dimension) = slot.domain {
            let values = source.distinct(template.table, dimension).await?;
            domains.insert(slot.param, values);
        }
    }
    Ok(domains)
}

pub async fn resolve<S>(
    template: &QueryTemplate,
    selections: &Selections,
    source: &S,
) -> crate::Result<BoundQuery>
where
    S: DataSource + ?Sized,
{
    let domains = fetch_domains(template, source).await?;
    Ok(bind(template, selections, &domains)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn year_quarter_domains() -> Domains {
        Domains::from([
            (Param::Year, vec![Value::Integer(2018), Value::Integer(2019)]),
            (Param::Quarter, (1..=4).map(Value::Integer).collect()),
        ])
    }

    #[test]
    fn binds_filters_in_placeholder_order() {
        let catalog = Catalog::standard();
        let t = catalog.lookup(1, 5).unwrap();
        let bound = bind(
            t,
            &Selections::new().quarter(2).year(2019),
            &year_quarter_domains(),
        )
        .unwrap();
        assert_eq!(bound.args, vec![Value::Integer(2019), Value::Integer(2)]);
        assert!(bound.sql.contains("WHERE years = $1 AND quarter = $2"));
    }

    #[test]
    fn year_outside_domain_is_rejected() {
        let catalog = Catalog::standard();
        let err = bind(
            catalog.lookup(1, 5).unwrap(),
            &Selections::new().year(2030).quarter(1),
            &year_quarter_domains(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ParameterError::InvalidParameter {
                param: "year".into(),
                value: "2030".into(),
                domain: "[2018, 2019]".into(),
            }
        );
    }

    #[test]
    fn unfilled_slot_is_missing() {
        let catalog = Catalog::standard();
        let err = bind(
            catalog.lookup(1, 5).unwrap(),
            &Selections::new().year(2018),
            &year_quarter_domains(),
        )
        .unwrap_err();
        assert!(matches!(err, ParameterError::MissingParameter { param } if param == "quarter"));
    }

    #[test]
    fn top_n_defaults_and_validates() {
        let catalog = Catalog::standard();
        let t = catalog.lookup(3, 4).unwrap();
        let bound = bind(t, &Selections::new(), &Domains::new()).unwrap();
        assert_eq!(bound.args, vec![Value::Integer(10)]);
        assert!(bound.sql.ends_with("LIMIT $1"));
        assert!(matches!(
            bind(t, &Selections::new().top_n(7), &Domains::new()),
            Err(ParameterError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn text_year_is_the_wrong_kind() {
        let catalog = Catalog::standard();
        let err = bind(
            catalog.lookup(1, 5).unwrap(),
            &Selections::new().with(Param::Year, "2019").quarter(1),
            &year_quarter_domains(),
        )
        .unwrap_err();
        assert!(matches!(err, ParameterError::WrongKind { .. }));
    }

    #[test]
    fn titles_interpolate_selected_values() {
        let s = Selections::new().year(2021).quarter(3);
        assert_eq!(
            s.interpolate("Total Transaction Value by State - Q{quarter}, {year}"),
            "Total Transaction Value by State - Q3, 2021"
        );
        assert_eq!(s.interpolate("Top {top_n}"), "Top {top_n}");
    }
}
