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

use crate::chart::ChartDescriptor;
use crate::error::DashboardError;
use crate::table::{ResultTable, Value};

/// The widgets a dashboard session needs from its front end.
///
/// Returning `Ok(None)` from a prompt ends the session.
pub trait PresentationAdapter {
    /// Picks one of `options`, returning its index.
    fn present_menu(
        &mut self,
        prompt: &str,
        options: &[String],
    ) -> Result<Option<usize>, DashboardError>;

    /// Picks one value from an ordered, bounded set.
    fn present_range(
        &mut self,
        prompt: &str,
        values: &[Value],
    ) -> Result<Option<Value>, DashboardError>;

    fn render_heading(&mut self, _title: &str) -> Result<(), DashboardError> {
        Ok(())
    }

    fn render_chart(&mut self, chart: &ChartDescriptor) -> Result<(), DashboardError>;

    fn render_table(&mut self, table: &ResultTable) -> Result<(), DashboardError>;

    fn render_error(&mut self, message: &str) -> Result<(), DashboardError>;
}
