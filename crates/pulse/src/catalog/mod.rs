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

//! The static dispatch table from (case, sub-question) to query template.

mod entries;
pub mod template;

pub use template::{
    Aggregate, Dimension, Domain, FactTable, Limit, Measure, Param, ParamSlot, QueryTemplate,
    SecondaryFilter, SelectionKey,
};

use crate::error::CatalogError;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::error;

pub const DEFAULT_TOP_N_CHOICES: [i64; 3] = [5, 10, 15];
pub const DEFAULT_TOP_N: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuQuestion {
    pub question: u8,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuCase {
    pub case: u8,
    pub title: String,
    pub questions: Vec<MenuQuestion>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cases: BTreeMap<u8, String>,
    templates: BTreeMap<SelectionKey, QueryTemplate>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The five business cases of the payments dashboard.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for (case, title) in entries::CASES {
            catalog.add_case(case, title);
        }
        for template in entries::templates() {
            if let Err(e) = catalog.register(template) {
                error!(error = %e, "standard catalog entry skipped");
            }
        }
        catalog
    }

    pub fn add_case(&mut self, case: u8, title: &str) {
        self.cases.insert(case, title.to_string());
    }

    pub fn register(&mut self, template: QueryTemplate) -> Result<(), CatalogError> {
        if self.templates.contains_key(&template.key) {
            return Err(CatalogError::DuplicateSelection {
                case: template.key.case,
                question: template.key.question,
            });
        }
        self.cases
            .entry(template.key.case)
            .or_insert_with(|| format!("Case {}", template.key.case));
        self.templates.insert(template.key, template);
        Ok(())
    }

    pub fn lookup(&self, case: u8, question: u8) -> Result<&QueryTemplate, CatalogError> {
        self.templates
            .get(&SelectionKey::new(case, question))
            .ok_or_else(|| {
                error!(case, question, "selection is not in the catalog");
                CatalogError::UnknownSelection { case, question }
            })
    }

    pub fn menu(&self) -> Vec<MenuCase> {
        self.cases
            .iter()
            .map(|(&case, title)| MenuCase {
                case,
                title: title.clone(),
                questions: self
                    .templates
                    .range(SelectionKey::new(case, 0)..=SelectionKey::new(case, u8::MAX))
                    .map(|(key, t)| MenuQuestion {
                        question: key.question,
                        title: t.title.clone(),
                    })
                    .collect(),
            })
            .collect()
    }

    pub fn templates(&self) -> impl Iterator<Item = &QueryTemplate> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Replaces the top-N domain of every template that has one.
    pub fn with_top_n(mut self, choices: &[i64], default: i64) -> Self {
        for template in self.templates.values_mut() {
            if let Some(slot) = template.top_n.as_mut() {
                slot.domain = Domain::Choices {
                    values: choices.to_vec(),
                    default,
                };
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_covers_every_case() {
        let catalog = Catalog::standard();
        let sizes: Vec<(u8, usize)> = catalog
            .menu()
            .iter()
            .map(|c| (c.case, c.questions.len()))
            .collect();
        assert_eq!(sizes, vec![(1, 5), (2, 6), (3, 5), (4, 4), (5, 4)]);
        assert_eq!(catalog.len(), 24);
    }

    #[test]
    fn unknown_selection_is_an_error() {
        let catalog = Catalog::standard();
        assert_eq!(
            catalog.lookup(6, 1).unwrap_err(),
            CatalogError::UnknownSelection {
                case: 6,
                question: 1
            }
        );
        assert!(catalog.lookup(2, 7).is_err());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut catalog = Catalog::standard();
        let again = catalog.lookup(1, 1).unwrap().clone();
        assert!(matches!(
            catalog.register(again),
            Err(CatalogError::DuplicateSelection { case: 1, question: 1 })
        ));
    }

    #[test]
    fn every_view_binds_columns_of_the_shaped_schema() {
        // Steps add columns; collect what each one contributes.
        use crate::shaper::ShapeStep;
        for t in Catalog::standard().templates() {
            let mut columns: Vec<String> =
                t.result_schema().into_iter().map(|(name, _)| name).collect();
            for step in &t.steps {
                match step {
                    ShapeStep::PeriodLabel { into, .. }
                    | ShapeStep::CumulativeSum { into, .. }
                    | ShapeStep::EngagementRate { into, .. } => columns.push(into.clone()),
                    ShapeStep::TitleCase { .. } | ShapeStep::Sort { .. } => {}
                }
            }
            assert!(!t.views.is_empty(), "{} has no views", t.key);
            for view in &t.views {
                let bound = [
                    view.bindings.x.as_ref(),
                    view.bindings.colour.as_ref(),
                    view.bindings.size.as_ref(),
                    view.bindings.text.as_ref(),
                    view.bindings.hover.as_ref(),
                    view.bindings.location.as_ref(),
                ];
                for column in bound.into_iter().flatten().chain(view.bindings.y.iter()) {
                    assert!(columns.contains(column), "{}: unbound {column}", t.key);
                }
            }
            for filter in &t.secondary {
                assert!(columns.contains(&filter.column), "{}", t.key);
            }
        }
    }

    #[test]
    fn top_n_override_reaches_templates() {
        let catalog = Catalog::standard().with_top_n(&[3, 6], 3);
        let t = catalog.lookup(3, 4).unwrap();
        assert_eq!(
            t.top_n.as_ref().map(|s| s.domain.clone()),
            Some(Domain::Choices {
                values: vec![3, 6],
                default: 3
            })
        );
    }
}
