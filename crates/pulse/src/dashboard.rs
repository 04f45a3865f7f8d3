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

//! One query-then-render round trip per interaction.
//!
//! Catalog lookup, parameter resolution, execution, shaping and chart
//! building run strictly in sequence. Nothing is kept between interactions.

use crate::catalog::{Catalog, Domain, ParamSlot, QueryTemplate, SecondaryFilter, SelectionKey};
use crate::chart::{ChartBuilder, ChartDescriptor};
use crate::config::DashboardConfig;
use crate::error::{DashboardError, ParameterError, Result};
use crate::executor::{DataSource, SqlxSource};
use crate::presentation::PresentationAdapter;
use crate::resolver::{self, Domains, Selections};
use crate::shaper::{self, ShapeOptions};
use crate::table::{ResultTable, Value};
use serde::Serialize;
use tracing::{error, info, warn};

/// Everything one interaction produced, ready for a front end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rendering {
    pub key: SelectionKey,
    pub title: String,
    /// Selections in effect, including defaults and secondary filters.
    pub selections: Selections,
    pub table: ResultTable,
    pub show_table: bool,
    pub charts: Vec<ChartDescriptor>,
}

impl Rendering {
    pub fn is_no_data(&self) -> bool {
        self.charts.iter().all(ChartDescriptor::is_empty)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Hands the table (when the selection shows one) and every chart to
    /// `adapter`.
    pub fn present_to<P>(&self, adapter: &mut P) -> Result<()>
    where
        P: PresentationAdapter + ?Sized,
    {
        if self.show_table {
            adapter.render_table(&self.table)?;
        }
        for chart in &self.charts {
            adapter.render_chart(chart)?;
        }
        Ok(())
    }
}

pub struct Dashboard<S> {
    catalog: Catalog,
    source: S,
    charts: ChartBuilder,
}

impl Dashboard<SqlxSource> {
    pub fn from_config(config: &DashboardConfig) -> Result<Self> {
        config.validate()?;
        let catalog =
            Catalog::standard().with_top_n(&config.top_n.choices, config.top_n.default);
        let source = SqlxSource::new(config.connection_url()?);
        Ok(Self::new(
            catalog,
            source,
            ChartBuilder::new(config.geometry.clone()),
        ))
    }
}

impl<S: DataSource> Dashboard<S> {
    pub fn new(catalog: Catalog, source: S, charts: ChartBuilder) -> Self {
        Self {
            catalog,
            source,
            charts,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Selectable values for each query parameter of a selection.
    pub async fn domains(&self, case: u8, question: u8) -> Result<Domains> {
        let template = self.catalog.lookup(case, question)?;
        let mut domains = resolver::fetch_domains(template, &self.source).await?;
        for slot in template.slots() {
            domains.insert(slot.param, resolver::slot_domain(slot, &domains));
        }
        Ok(domains)
    }

    /// Runs one interaction without prompting.
    pub async fn run(&self, case: u8, question: u8, selections: &Selections) -> Result<Rendering> {
        let template = self.catalog.lookup(case, question)?;
        info!(key = %template.key, "running selection");
        let domains = resolver::fetch_domains(template, &self.source).await?;
        if let Some(param) = empty_domain(template, &domains) {
            warn!(key = %template.key, %param, "no selectable values; table has no rows");
            return self.finish(template, empty_table(template), selections.clone());
        }
        let bound = resolver::bind(template, selections, &domains)?;
        let table = self.source.execute(&bound).await?;
        let mut effective = selections.clone();
        for filter in &template.secondary {
            let domain = filter_domain(&table, filter)?;
            let chosen = match selections.get(filter.param) {
                Some(value) => {
                    if let Some(slot) = secondary_slot(filter) {
                        resolver::validate(&slot, value, &domain)?;
                    }
                    Some(value.clone())
                }
                None => domain.first().cloned(),
            };
            if let Some(value) = chosen {
                effective.set(filter.param, value);
            }
        }
        self.finish(template, table, effective)
    }

    /// Menu-driven session. Returns when the adapter stops answering.
    pub async fn interact<P>(&self, adapter: &mut P) -> Result<()>
    where
        P: PresentationAdapter + ?Sized,
    {
        loop {
            let menu = self.catalog.menu();
            let cases: Vec<String> = menu
                .iter()
                .map(|c| format!("{}. {}", c.case, c.title))
                .collect();
            let Some(index) = adapter.present_menu("Select a Business Case", &cases)? else {
                return Ok(());
            };
            let Some(case) = menu.get(index) else {
                adapter.render_error(&format!("No business case at position {}", index + 1))?;
                continue;
            };
            let questions: Vec<String> = case
                .questions
                .iter()
                .map(|q| format!("{}. {}", q.question, q.title))
                .collect();
            let Some(index) = adapter.present_menu("Select a Sub-Question", &questions)? else {
                return Ok(());
            };
            let Some(question) = case.questions.get(index) else {
                adapter.render_error(&format!("No sub-question at position {}", index + 1))?;
                continue;
            };
            match self.interact_once(adapter, case.case, question.question).await {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(e) => {
                    match &e {
                        DashboardError::DataSource(inner) => {
                            error!(error = %inner, "query failed");
                        }
                        DashboardError::Catalog(inner) => {
                            error!(error = %inner, "catalog mismatch");
                        }
                        other => warn!(error = %other, "interaction failed"),
                    }
                    adapter.render_error(&e.to_string())?;
                    if !e.is_recoverable() {
                        return Err(e);
                    }
                }
            }
        }
    }

    /// Returns `false` when the adapter ended the session mid-prompt.
    async fn interact_once<P>(&self, adapter: &mut P, case: u8, question: u8) -> Result<bool>
    where
        P: PresentationAdapter + ?Sized,
    {
        let template = self.catalog.lookup(case, question)?;
        adapter.render_heading(&template.title)?;
        let domains = resolver::fetch_domains(template, &self.source).await?;
        if let Some(param) = empty_domain(template, &domains) {
            warn!(key = %template.key, %param, "no selectable values; table has no rows");
            let rendering = self.finish(template, empty_table(template), Selections::new())?;
            rendering.present_to(adapter)?;
            return Ok(true);
        }
        let mut selections = Selections::new();
        for slot in template.slots() {
            let domain = resolver::slot_domain(slot, &domains);
            match prompt_value(adapter, slot, &domain)? {
                Some(value) => selections.set(slot.param, value),
                None => return Ok(false),
            }
        }
        let bound = resolver::bind(template, &selections, &domains)?;
        let table = self.source.execute(&bound).await?;
        for filter in &template.secondary {
            let domain = filter_domain(&table, filter)?;
            if domain.is_empty() {
                continue;
            }
            let value = match secondary_slot(filter) {
                Some(slot) => prompt_value(adapter, &slot, &domain)?,
                None => adapter.present_range(filter.param.prompt(), &domain)?,
            };
            match value {
                Some(value) => selections.set(filter.param, value),
                None => return Ok(false),
            }
        }
        let rendering = self.finish(template, table, selections)?;
        rendering.present_to(adapter)?;
        Ok(true)
    }

    /// Applies secondary filters and shaping steps, then builds every view.
    fn finish(
        &self,
        template: &QueryTemplate,
        table: ResultTable,
        mut selections: Selections,
    ) -> Result<Rendering> {
        if let Some(slot) = &template.top_n {
            if let (None, Domain::Choices { default, .. }) =
                (selections.get(slot.param), &slot.domain)
            {
                selections.set(slot.param, *default);
            }
        }
        let filters = template
            .secondary
            .iter()
            .filter_map(|f| selections.get(f.param).map(|v| (f.column.clone(), v.clone())))
            .collect();
        let options = ShapeOptions {
            steps: template.steps.clone(),
            filters,
        };
        let shaped = shaper::shape(&table, &options)?;
        if shaped.is_empty() {
            warn!(key = %template.key, "selection returned no rows");
        }
        let charts = template
            .views
            .iter()
            .map(|view| {
                let title = view
                    .options
                    .title
                    .as_deref()
                    .map(|t| selections.interpolate(t));
                view.render(&shaped, &self.charts, title)
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Rendering {
            key: template.key,
            title: selections.interpolate(&template.title),
            selections,
            table: shaped,
            show_table: template.show_table,
            charts,
        })
    }
}

fn empty_table(template: &QueryTemplate) -> ResultTable {
    let schema = template.result_schema();
    ResultTable::with_schema(schema.iter().map(|(name, kind)| (name.as_str(), *kind)))
}

fn empty_domain(template: &QueryTemplate, domains: &Domains) -> Option<String> {
    template
        .slots()
        .into_iter()
        .filter(|slot| matches!(slot.domain, Domain::Distinct(_)))
        .find(|slot| domains.get(&slot.param).map_or(true, Vec::is_empty))
        .map(|slot| slot.param.name().to_string())
}

fn filter_domain(table: &ResultTable, filter: &SecondaryFilter) -> Result<Vec<Value>> {
    Ok(table.distinct_values(&filter.column)?)
}

fn secondary_slot(filter: &SecondaryFilter) -> Option<ParamSlot> {
    filter.param.dimension().map(|dimension| ParamSlot {
        param: filter.param,
        domain: Domain::Distinct(dimension),
    })
}

/// Prompts until the adapter returns a value inside `domain`.
fn prompt_value<P>(adapter: &mut P, slot: &ParamSlot, domain: &[Value]) -> Result<Option<Value>>
where
    P: PresentationAdapter + ?Sized,
{
    loop {
        let Some(value) = adapter.present_range(slot.param.prompt(), domain)? else {
            return Ok(None);
        };
        match resolver::validate(slot, &value, domain) {
            Ok(()) => return Ok(Some(value)),
            Err(e @ (ParameterError::InvalidParameter { .. } | ParameterError::WrongKind { .. })) => {
                warn!(error = %e, "re-prompting");
                adapter.render_error(&e.to_string())?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
