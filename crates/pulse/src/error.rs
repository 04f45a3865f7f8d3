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

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),
    #[error("Shaping error: {0}")]
    Shape(#[from] ShapeError),
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),
    #[error("Presentation error: {0}")]
    Presentation(String),
}

impl DashboardError {
    /// Whether the session may continue after this error was shown.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DashboardError::Catalog(_) | DashboardError::Config(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("No query registered for case {case}, sub-question {question}")]
    UnknownSelection { case: u8, question: u8 },
    #[error("Duplicate registration for case {case}, sub-question {question}")]
    DuplicateSelection { case: u8, question: u8 },
    #[error("Unknown fact table '{name}'")]
    UnknownTable { name: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    #[error("Value {value} for '{param}' is outside its domain {domain}")]
    InvalidParameter {
        param: String,
        value: String,
        domain: String,
    },
    #[error("Required parameter '{param}' was not provided")]
    MissingParameter { param: String },
    #[error("Parameter '{param}' expects {expected}, got {found}")]
    WrongKind {
        param: String,
        expected: String,
        found: String,
    },
}

#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("Failed to connect to '{target}': {source}")]
    Connection {
        target: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Query failed: {source}")]
    Query {
        #[source]
        source: sqlx::Error,
    },
    #[error("Column '{column}' could not be decoded: {reason}")]
    Decode { column: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("Column '{column}' not found in result table")]
    ColumnNotFound { column: String },
    #[error("Column '{column}' has type {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },
    #[error("Column '{column}' already exists")]
    DuplicateColumn { column: String },
    #[error("Column '{column}' has {found} rows, table has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChartError {
    #[error("Column '{column}' bound to channel '{channel}' does not exist")]
    InvalidBinding { channel: String, column: String },
    #[error("Required channel '{channel}' is not bound for a {kind} chart")]
    MissingChannel { kind: String, channel: String },
    #[error("Stacked bars need a colour column distinct from x ('{column}')")]
    ColourMatchesX { column: String },
    #[error("Choropleth needs a geometry source")]
    MissingGeometry,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    FileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[from]
        source: toml::de::Error,
    },
    #[error("Missing required configuration: {field}")]
    MissingRequiredConfig { field: String },
    #[error("Invalid configuration: {field} = {value}")]
    InvalidValue { field: String, value: String },
}

pub type Result<T> = std::result::Result<T, DashboardError>;
pub type ShapeResult<T> = std::result::Result<T, ShapeError>;
pub type ChartResult<T> = std::result::Result<T, ChartError>;
