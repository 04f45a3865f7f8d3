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

mod cli;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Args, Command, OutputFormat};
use pulse::{Catalog, Dashboard, DashboardConfig, PresentationAdapter, Selections};
use std::io;
use terminal::TerminalAdapter;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Before the log filter reads RUST_LOG and the config reads PULSE_*.
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let level = args.log_level.as_ref().map_or("warn", |l| l.as_str());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if let Some(Command::Menu) = args.command {
        print_menu(&Catalog::standard());
        return Ok(());
    }

    let config = DashboardConfig::load(args.config.as_deref()).context("loading configuration")?;
    let dashboard = Dashboard::from_config(&config)?;
    info!("dashboard ready");

    match args.command {
        Some(Command::Show {
            case,
            question,
            year,
            quarter,
            state,
            top_n,
        }) => {
            let mut selections = Selections::new();
            if let Some(year) = year {
                selections = selections.year(year);
            }
            if let Some(quarter) = quarter {
                selections = selections.quarter(quarter);
            }
            if let Some(state) = state.as_deref() {
                selections = selections.state(state);
            }
            if let Some(n) = top_n {
                selections = selections.top_n(n);
            }
            let rendering = dashboard
                .run(case, question, &selections)
                .await
                .with_context(|| format!("running case {case}, sub-question {question}"))?;
            match args.format {
                OutputFormat::Json => println!("{}", rendering.to_json()?),
                OutputFormat::Table => {
                    let mut adapter =
                        TerminalAdapter::new(io::stdin().lock(), io::stdout(), args.format);
                    adapter.render_heading(&rendering.title)?;
                    rendering.present_to(&mut adapter)?;
                }
            }
        }
        Some(Command::Menu) | None => {
            let mut adapter = TerminalAdapter::new(io::stdin().lock(), io::stdout(), args.format);
            dashboard.interact(&mut adapter).await?;
        }
    }
    Ok(())
}

fn print_menu(catalog: &Catalog) {
    for case in catalog.menu() {
        println!("{}. {}", case.case, case.title);
        for question in &case.questions {
            println!("   {}.{} {}", case.case, question.question, question.title);
        }
    }
}
