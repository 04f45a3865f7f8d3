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

//! Payments analytics dashboard core: a catalog of fixed aggregation queries
//! over the PhonePe Pulse fact tables, resolved against user selections,
//! executed through sqlx and turned into declarative chart descriptors.

pub mod catalog;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod executor;
pub mod presentation;
pub mod query;
pub mod resolver;
pub mod shaper;
pub mod table;

pub use catalog::{Catalog, FactTable, Param, QueryTemplate, SelectionKey};
pub use chart::{ChartBindings, ChartBuilder, ChartDescriptor, ChartKind, ChartOptions, GeoSource};
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, Rendering};
pub use error::{
    CatalogError, ChartError, ConfigError, DashboardError, DataSourceError, ParameterError,
    Result, ShapeError,
};
pub use executor::{DataSource, SqlxSource};
pub use presentation::PresentationAdapter;
pub use query::BoundQuery;
pub use resolver::Selections;
pub use table::{ResultTable, Value, ValueKind};
