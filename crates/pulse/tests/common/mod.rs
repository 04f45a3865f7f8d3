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

#![allow(dead_code)]

use pulse::{
    Catalog, ChartBuilder, ChartDescriptor, Dashboard, DashboardError, PresentationAdapter,
    ResultTable, SqlxSource, Value,
};
use sqlx::{AnyConnection, Connection};
use std::collections::VecDeque;
use tempfile::TempDir;

const SCHEMA: &[&str] = &[
    "CREATE TABLE aggregated_transaction (states TEXT, years INTEGER, quarter INTEGER, \
     transaction_type TEXT, transaction_count INTEGER, transaction_amount REAL)",
    "CREATE TABLE map_transaction (states TEXT, years INTEGER, quarter INTEGER, \
     districts TEXT, transaction_count INTEGER, transaction_amount REAL)",
    "CREATE TABLE top_transaction (states TEXT, years INTEGER, quarter INTEGER, \
     pincodes TEXT, transaction_count INTEGER, transaction_amount REAL)",
    "CREATE TABLE aggregated_user (states TEXT, years INTEGER, quarter INTEGER, \
     brands TEXT, transaction_count INTEGER, percentage REAL, \
     registeredusers INTEGER, appopens INTEGER)",
    "CREATE TABLE map_user (states TEXT, years INTEGER, quarter INTEGER, \
     districts TEXT, registeredusers INTEGER, appopens INTEGER)",
    "CREATE TABLE top_user (states TEXT, years INTEGER, quarter INTEGER, \
     pincodes TEXT, registeredusers INTEGER)",
    "CREATE TABLE aggregated_insurance (states TEXT, years INTEGER, quarter INTEGER, \
     transaction_type TEXT, transaction_count INTEGER, transaction_amount REAL)",
    "CREATE TABLE map_insurance (states TEXT, years INTEGER, quarter INTEGER, \
     districts TEXT, transaction_count INTEGER, transaction_amount REAL)",
    "CREATE TABLE top_insurance (states TEXT, years INTEGER, quarter INTEGER, \
     pincodes TEXT, transaction_count INTEGER, transaction_amount REAL)",
];

/// A populated dataset covering every fact table.
pub const SAMPLE: &[&str] = &[
    "INSERT INTO aggregated_transaction VALUES \
     ('maharashtra', 2020, 1, 'Peer-to-peer payments', 40, 400.0), \
     ('maharashtra', 2021, 2, 'Merchant payments', 10, 100.0), \
     ('kerala', 2020, 1, 'Peer-to-peer payments', 15, 150.0), \
     ('kerala', 2021, 1, 'Recharge & bill payments', 5, 50.0)",
    "INSERT INTO map_transaction VALUES \
     ('maharashtra', 2021, 1, 'pune district', 7, 700.0), \
     ('kerala', 2021, 1, 'ernakulam district', 3, 300.0), \
     ('kerala', 2022, 2, 'kochi district', 2, 200.0)",
    "INSERT INTO top_transaction VALUES ('kerala', 2021, 1, '682001', 3, 30.0)",
    "INSERT INTO aggregated_user VALUES \
     ('goa', 2020, 1, 'Xiaomi', 12, 0.5, 0, 5), \
     ('kerala', 2020, 1, 'Apple', 8, 0.3, 4, 10), \
     ('kerala', 2020, 2, 'Xiaomi', 6, 0.2, 6, 20)",
    "INSERT INTO map_user VALUES \
     ('maharashtra', 2020, 1, 'pune district', 100, 1000), \
     ('kerala', 2021, 1, 'kochi district', 50, 700)",
    "INSERT INTO top_user VALUES \
     ('kerala', 10, 1, '682001', 30), \
     ('kerala', 9, 2, '682001', 20), \
     ('kerala', 9, 1, '682001', 10)",
    "INSERT INTO aggregated_insurance VALUES \
     ('kerala', 2021, 1, 'Insurance', 4, 40.0), \
     ('goa', 2021, 2, 'Insurance', 1, 10.0)",
    "INSERT INTO map_insurance VALUES ('kerala', 2021, 1, 'kochi district', 4, 40.0)",
    "INSERT INTO top_insurance VALUES ('kerala', 2021, 1, '682001', 4, 40.0)",
];

/// A SQLite database in a temporary directory, removed on drop.
pub struct Fixture {
    _dir: TempDir,
    pub url: String,
}

impl Fixture {
    pub async fn with_rows(inserts: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("pulse.db").display());
        // Registers the Any drivers.
        let _ = SqlxSource::new(url.clone());
        let mut conn = AnyConnection::connect(&url).await.unwrap();
        for statement in SCHEMA.iter().chain(inserts) {
            sqlx::query(statement).execute(&mut conn).await.unwrap();
        }
        conn.close().await.unwrap();
        Self { _dir: dir, url }
    }

    pub async fn sample() -> Self {
        Self::with_rows(SAMPLE).await
    }

    pub fn dashboard(&self) -> Dashboard<SqlxSource> {
        self.dashboard_with(Catalog::standard())
    }

    pub fn dashboard_with(&self, catalog: Catalog) -> Dashboard<SqlxSource> {
        Dashboard::new(catalog, SqlxSource::new(self.url.clone()), ChartBuilder::default())
    }
}

/// Answers prompts from queues and records everything rendered.
#[derive(Default)]
pub struct ScriptedAdapter {
    pub menu_answers: VecDeque<usize>,
    pub range_answers: VecDeque<Value>,
    pub prompts: Vec<(String, Vec<Value>)>,
    pub headings: Vec<String>,
    pub charts: Vec<ChartDescriptor>,
    pub tables: Vec<ResultTable>,
    pub errors: Vec<String>,
}

impl ScriptedAdapter {
    pub fn new(menus: &[usize], ranges: Vec<Value>) -> Self {
        Self {
            menu_answers: menus.iter().copied().collect(),
            range_answers: ranges.into(),
            ..Default::default()
        }
    }
}

impl PresentationAdapter for ScriptedAdapter {
    fn present_menu(
        &mut self,
        _prompt: &str,
        _options: &[String],
    ) -> Result<Option<usize>, DashboardError> {
        Ok(self.menu_answers.pop_front())
    }

    fn present_range(
        &mut self,
        prompt: &str,
        values: &[Value],
    ) -> Result<Option<Value>, DashboardError> {
        self.prompts.push((prompt.to_string(), values.to_vec()));
        Ok(self.range_answers.pop_front())
    }

    fn render_heading(&mut self, title: &str) -> Result<(), DashboardError> {
        self.headings.push(title.to_string());
        Ok(())
    }

    fn render_chart(&mut self, chart: &ChartDescriptor) -> Result<(), DashboardError> {
        self.charts.push(chart.clone());
        Ok(())
    }

    fn render_table(&mut self, table: &ResultTable) -> Result<(), DashboardError> {
        self.tables.push(table.clone());
        Ok(())
    }

    fn render_error(&mut self, message: &str) -> Result<(), DashboardError> {
        self.errors.push(message.to_string());
        Ok(())
    }
}
