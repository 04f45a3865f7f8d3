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

use crate::error::{ChartError, ChartResult};
use crate::shaper;
use crate::table::ResultTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const INDIA_STATES_GEOJSON: &str = "https://gist.githubusercontent.com/jbrobst/56c13bbbf9d97d187fea01ca62ea5112/raw/e388c4cae20aa53cb5090210a42ebb9b765c0a36/india_states.geojson";
pub const STATE_NAME_FEATURE_KEY: &str = "properties.ST_NM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    StackedBar,
    Line,
    Pie,
    Choropleth,
    NoData,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChartKind::Bar => "bar",
            ChartKind::StackedBar => "stacked_bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Choropleth => "choropleth",
            ChartKind::NoData => "no_data",
        };
        write!(f, "{name}")
    }
}

/// Column names bound to each visual channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartBindings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub y: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl ChartBindings {
    pub fn xy(x: &str, y: &str) -> Self {
        Self {
            x: Some(x.to_string()),
            y: vec![y.to_string()],
            ..Default::default()
        }
    }

    /// Pie slices: `names` picks the slice labels, `values` their sizes.
    pub fn slices(names: &str, values: &str) -> Self {
        Self::xy(names, values)
    }

    /// Choropleth: regions named by `location`, coloured by `value`.
    pub fn regions(location: &str, value: &str) -> Self {
        Self {
            location: Some(location.to_string()),
            colour: Some(value.to_string()),
            hover: Some(location.to_string()),
            ..Default::default()
        }
    }

    pub fn also_y(mut self, y: &str) -> Self {
        self.y.push(y.to_string());
        self
    }

    pub fn colour(mut self, column: &str) -> Self {
        self.colour = Some(column.to_string());
        self
    }

    pub fn size(mut self, column: &str) -> Self {
        self.size = Some(column.to_string());
        self
    }

    pub fn text(mut self, column: &str) -> Self {
        self.text = Some(column.to_string());
        self
    }

    pub fn hover(mut self, column: &str) -> Self {
        self.hover = Some(column.to_string());
        self
    }

    fn channels(&self) -> Vec<(&'static str, &str)> {
        let mut out = Vec::new();
        if let Some(x) = &self.x {
            out.push(("x", x.as_str()));
        }
        out.extend(self.y.iter().map(|y| ("y", y.as_str())));
        for (name, column) in [
            ("colour", &self.colour),
            ("size", &self.size),
            ("text", &self.text),
            ("hover", &self.hover),
            ("location", &self.location),
        ] {
            if let Some(c) = column {
                out.push((name, c.as_str()));
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum ColourScheme {
    /// Named continuous scale, e.g. `Blues`.
    Continuous(String),
    /// Named qualitative palette, e.g. `Set2`.
    Palette(String),
    Fixed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPosition {
    Inside,
    Outside,
    Auto,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour_scheme: Option<ColourScheme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hole: Option<f64>,
    #[serde(default)]
    pub markers: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_position: Option<TextPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_angle: Option<i32>,
    /// d3-style number format for hover values, e.g. `,.0f`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ChartOptions {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    pub fn label(mut self, column: &str, label: &str) -> Self {
        self.labels.insert(column.to_string(), label.to_string());
        self
    }

    pub fn horizontal(mut self) -> Self {
        self.orientation = Orientation::Horizontal;
        self
    }

    pub fn continuous(mut self, scale: &str) -> Self {
        self.colour_scheme = Some(ColourScheme::Continuous(scale.to_string()));
        self
    }

    pub fn palette(mut self, palette: &str) -> Self {
        self.colour_scheme = Some(ColourScheme::Palette(palette.to_string()));
        self
    }

    pub fn fixed_colour(mut self, colour: &str) -> Self {
        self.colour_scheme = Some(ColourScheme::Fixed(colour.to_string()));
        self
    }

    pub fn hole(mut self, hole: f64) -> Self {
        self.hole = Some(hole);
        self
    }

    pub fn markers(mut self) -> Self {
        self.markers = true;
        self
    }

    pub fn text_outside(mut self) -> Self {
        self.text_position = Some(TextPosition::Outside);
        self
    }

    pub fn tick_angle(mut self, angle: i32) -> Self {
        self.tick_angle = Some(angle);
        self
    }

    pub fn hover_format(mut self, format: &str) -> Self {
        self.hover_format = Some(format.to_string());
        self
    }

    pub fn size_hint(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSource {
    pub url: String,
    pub feature_id_key: String,
}

impl Default for GeoSource {
    fn default() -> Self {
        Self {
            url: INDIA_STATES_GEOJSON.to_string(),
            feature_id_key: STATE_NAME_FEATURE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoJoin {
    pub geometry_url: String,
    pub feature_id_key: String,
    pub location_column: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDescriptor {
    pub kind: ChartKind,
    pub encoding: ChartBindings,
    pub options: ChartOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoJoin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: ResultTable,
}

impl ChartDescriptor {
    pub fn no_data(title: Option<String>) -> Self {
        Self {
            kind: ChartKind::NoData,
            encoding: ChartBindings::default(),
            options: ChartOptions {
                title,
                ..Default::default()
            },
            geo: None,
            message: Some("No data found for the current selection".to_string()),
            data: ResultTable::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kind == ChartKind::NoData
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChartBuilder {
    geometry: GeoSource,
}

impl ChartBuilder {
    pub fn new(geometry: GeoSource) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &GeoSource {
        &self.geometry
    }

    pub fn build(
        &self,
        table: &ResultTable,
        kind: ChartKind,
        bindings: &ChartBindings,
        options: &ChartOptions,
    ) -> ChartResult<ChartDescriptor> {
        if table.is_empty() || kind == ChartKind::NoData {
            return Ok(ChartDescriptor::no_data(options.title.clone()));
        }
        for (channel, column) in bindings.channels() {
            if !table.has_column(column) {
                return Err(ChartError::InvalidBinding {
                    channel: channel.to_string(),
                    column: column.to_string(),
                });
            }
        }
        let require = |channel: &str, present: bool| {
            if present {
                Ok(())
            } else {
                Err(ChartError::MissingChannel {
                    kind: kind.to_string(),
                    channel: channel.to_string(),
                })
            }
        };
        let mut geo = None;
        match kind {
            ChartKind::Bar | ChartKind::Line | ChartKind::Pie => {
                require("x", bindings.x.is_some())?;
                require("y", !bindings.y.is_empty())?;
            }
            ChartKind::StackedBar => {
                require("x", bindings.x.is_some())?;
                require("y", !bindings.y.is_empty())?;
                require("colour", bindings.colour.is_some())?;
                if bindings.colour == bindings.x {
                    return Err(ChartError::ColourMatchesX {
                        column: bindings.x.clone().unwrap_or_default(),
                    });
                }
            }
            ChartKind::Choropleth => {
                require("location", bindings.location.is_some())?;
                require("colour", bindings.colour.is_some())?;
                if self.geometry.url.is_empty() {
                    return Err(ChartError::MissingGeometry);
                }
                geo = bindings.location.as_ref().map(|location| GeoJoin {
                    geometry_url: self.geometry.url.clone(),
                    feature_id_key: self.geometry.feature_id_key.clone(),
                    location_column: location.clone(),
                });
            }
            ChartKind::NoData => {}
        }
        let data = match &geo {
            Some(join) => shaper::title_case_column(table, &join.location_column).map_err(|_| {
                ChartError::InvalidBinding {
                    channel: "location".to_string(),
                    column: join.location_column.clone(),
                }
            })?,
            None => table.clone(),
        };
        Ok(ChartDescriptor {
            kind,
            encoding: bindings.clone(),
            options: options.clone(),
            geo,
            message: None,
            data,
        })
    }
}

/// Builds a descriptor with default options and geometry.
pub fn build(
    table: &ResultTable,
    kind: ChartKind,
    bindings: &ChartBindings,
) -> ChartResult<ChartDescriptor> {
    ChartBuilder::default().build(table, kind, bindings, &ChartOptions::default())
}

/// One chart of a catalogued view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSpec {
    pub kind: ChartKind,
    pub bindings: ChartBindings,
    pub options: ChartOptions,
    /// Sort applied to this view's data only: column and descending flag.
    pub sort: Option<(String, bool)>,
}

impl ViewSpec {
    pub fn new(kind: ChartKind, bindings: ChartBindings, options: ChartOptions) -> Self {
        Self {
            kind,
            bindings,
            options,
            sort: None,
        }
    }

    pub fn sorted_desc(mut self, column: &str) -> Self {
        self.sort = Some((column.to_string(), true));
        self
    }

    pub fn render(
        &self,
        table: &ResultTable,
        builder: &ChartBuilder,
        title: Option<String>,
    ) -> ChartResult<ChartDescriptor> {
        let options = ChartOptions {
            title: title.or_else(|| self.options.title.clone()),
            ..self.options.clone()
        };
        let data = match &self.sort {
            Some((column, desc)) if table.has_column(column) => table
                .sorted_by_keys(&[(column.as_str(), *desc)])
                .map_err(|_| ChartError::InvalidBinding {
                    channel: "sort".to_string(),
                    column: column.clone(),
                })?,
            Some((column, _)) if !table.is_empty() => {
                return Err(ChartError::InvalidBinding {
                    channel: "sort".to_string(),
                    column: column.clone(),
                })
            }
            _ => table.clone(),
        };
        builder.build(&data, self.kind, &self.bindings, &options)
    }
}
