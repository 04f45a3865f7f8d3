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

use crate::cli::OutputFormat;
use pulse::{ChartDescriptor, DashboardError, PresentationAdapter, ResultTable, Value};
use std::io::{BufRead, Write};

/// Line-oriented adapter over any reader and writer. `q` or end of input
/// ends the session; an empty answer to a range prompt picks its first value.
pub struct TerminalAdapter<R, W> {
    input: R,
    output: W,
    format: OutputFormat,
}

fn io_error(e: std::io::Error) -> DashboardError {
    DashboardError::Presentation(e.to_string())
}

impl<R: BufRead, W: Write> TerminalAdapter<R, W> {
    pub fn new(input: R, output: W, format: OutputFormat) -> Self {
        Self {
            input,
            output,
            format,
        }
    }

    /// `None` on end of input or `q`.
    fn read_answer(&mut self) -> Result<Option<String>, DashboardError> {
        write!(self.output, "> ").map_err(io_error)?;
        self.output.flush().map_err(io_error)?;
        let mut line = String::new();
        if self.input.read_line(&mut line).map_err(io_error)? == 0 {
            return Ok(None);
        }
        let answer = line.trim();
        if answer.eq_ignore_ascii_case("q") {
            Ok(None)
        } else {
            Ok(Some(answer.to_string()))
        }
    }

    fn print_table(&mut self, table: &ResultTable) -> Result<(), DashboardError> {
        let frame = table
            .to_polars()
            .map_err(|e| DashboardError::Presentation(e.to_string()))?;
        writeln!(self.output, "{frame}").map_err(io_error)
    }
}

impl<R: BufRead, W: Write> PresentationAdapter for TerminalAdapter<R, W> {
    fn present_menu(
        &mut self,
        prompt: &str,
        options: &[String],
    ) -> Result<Option<usize>, DashboardError> {
        writeln!(self.output, "\n{prompt}").map_err(io_error)?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  [{}] {option}", i + 1).map_err(io_error)?;
        }
        loop {
            let Some(answer) = self.read_answer()? else {
                return Ok(None);
            };
            match answer.parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => writeln!(
                    self.output,
                    "Enter a number between 1 and {}, or q to quit",
                    options.len()
                )
                .map_err(io_error)?,
            }
        }
    }

    fn present_range(
        &mut self,
        prompt: &str,
        values: &[Value],
    ) -> Result<Option<Value>, DashboardError> {
        let listed: Vec<String> = values.iter().map(ToString::to_string).collect();
        writeln!(self.output, "\n{prompt} ({})", listed.join(", ")).map_err(io_error)?;
        let Some(answer) = self.read_answer()? else {
            return Ok(None);
        };
        if answer.is_empty() {
            return Ok(values.first().cloned());
        }
        let numeric = values.iter().all(|v| matches!(v, Value::Integer(_)));
        Ok(Some(match answer.parse::<i64>() {
            Ok(n) if numeric => Value::Integer(n),
            _ => Value::Text(answer),
        }))
    }

    fn render_heading(&mut self, title: &str) -> Result<(), DashboardError> {
        writeln!(self.output, "\n== {title} ==").map_err(io_error)
    }

    fn render_chart(&mut self, chart: &ChartDescriptor) -> Result<(), DashboardError> {
        match self.format {
            OutputFormat::Json => {
                let json = chart.to_json()?;
                writeln!(self.output, "{json}").map_err(io_error)
            }
            OutputFormat::Table => {
                let title = chart.options.title.as_deref().unwrap_or_default();
                writeln!(self.output, "\n[{}] {title}", chart.kind).map_err(io_error)?;
                match &chart.message {
                    Some(message) => writeln!(self.output, "{message}").map_err(io_error),
                    None => self.print_table(&chart.data),
                }
            }
        }
    }

    fn render_table(&mut self, table: &ResultTable) -> Result<(), DashboardError> {
        self.print_table(table)
    }

    fn render_error(&mut self, message: &str) -> Result<(), DashboardError> {
        writeln!(self.output, "error: {message}").map_err(io_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn adapter(input: &str) -> TerminalAdapter<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalAdapter::new(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            OutputFormat::Table,
        )
    }

    #[test]
    fn menu_retries_until_a_valid_number() {
        let mut a = adapter("0\nfoo\n2\n");
        let options = vec!["one".to_string(), "two".to_string()];
        assert_eq!(a.present_menu("Pick", &options).unwrap(), Some(1));
        let printed = String::from_utf8(a.output).unwrap();
        assert_eq!(printed.matches("Enter a number").count(), 2);
    }

    #[test]
    fn range_parses_numbers_only_for_numeric_domains() {
        let years = [Value::Integer(2020), Value::Integer(2021)];
        assert_eq!(
            adapter("2021\n").present_range("Year", &years).unwrap(),
            Some(Value::Integer(2021))
        );
        assert_eq!(
            adapter("\n").present_range("Year", &years).unwrap(),
            Some(Value::Integer(2020))
        );
        let states = [Value::from("kerala")];
        assert_eq!(
            adapter("2021\n").present_range("State", &states).unwrap(),
            Some(Value::from("2021"))
        );
    }

    #[test]
    fn quit_and_end_of_input_end_the_session() {
        assert_eq!(adapter("q\n").present_menu("Pick", &["a".into()]).unwrap(), None);
        assert_eq!(adapter("").present_range("Year", &[]).unwrap(), None);
    }
}
