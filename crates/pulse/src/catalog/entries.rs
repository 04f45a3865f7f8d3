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

use super::template::{Dimension, FactTable, Measure, Param, QueryTemplate, SelectionKey};
use super::{DEFAULT_TOP_N, DEFAULT_TOP_N_CHOICES};
use crate::chart::{ChartBindings, ChartKind, ChartOptions, ViewSpec};
use crate::shaper::ShapeStep;

use Dimension::{Brand, District, Quarter, State, TransactionType, Year};
use FactTable::*;
use Measure::{AppOpens, RegisteredUsers, TransactionAmount, TransactionCount};

pub(super) const CASES: [(u8, &str); 5] = [
    (1, "Decoding Transaction Dynamics on PhonePe"),
    (2, "Device Dominance and User Engagement Analysis"),
    (3, "Transaction Analysis for Market Expansion"),
    (4, "User Engagement and Growth Strategy"),
    (5, "Insurance Engagement Analysis"),
];

const TICK: i32 = -45;
const AMOUNT_FORMAT: &str = ",.0f";

fn q(case: u8, question: u8, title: &str, table: FactTable) -> QueryTemplate {
    QueryTemplate::new(SelectionKey::new(case, question), title, table)
}

fn bar(x: &str, y: &str, options: ChartOptions) -> ViewSpec {
    ViewSpec::new(ChartKind::Bar, ChartBindings::xy(x, y), options)
}

fn line(x: &str, y: &str, options: ChartOptions) -> ViewSpec {
    ViewSpec::new(ChartKind::Line, ChartBindings::xy(x, y), options)
}

fn period(year: &str, quarter: &str) -> ShapeStep {
    ShapeStep::PeriodLabel {
        year: year.into(),
        quarter: quarter.into(),
        into: "year_quarter".into(),
    }
}

pub(super) fn templates() -> Vec<QueryTemplate> {
    vec![
        // Case 1: transaction dynamics
        q(1, 1, "Overall transaction volume by states and type", AggregatedTransaction)
            .group_by(&[State])
            .sum(TransactionCount, "total_count")
            .sum(TransactionAmount, "total_amount")
            .order_asc("state")
            .view(
                ViewSpec::new(
                    ChartKind::Bar,
                    ChartBindings::xy("state", "total_amount").colour("total_amount"),
                    ChartOptions::titled("Total Transaction Amount by State")
                        .label("state", "State")
                        .label("total_amount", "Transaction Amount")
                        .continuous("Blues")
                        .tick_angle(TICK)
                        .hover_format(AMOUNT_FORMAT),
                ),
            )
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("state", "total_count").colour("total_count"),
                ChartOptions::titled("Total Transaction Count by State")
                    .label("state", "State")
                    .label("total_count", "Transaction Count")
                    .continuous("Greens")
                    .tick_angle(TICK)
                    .hover_format(AMOUNT_FORMAT),
            )),
        q(1, 2, "Transaction trends across states over time", AggregatedTransaction)
            .group_by(&[Year, Quarter])
            .sum(TransactionCount, "total_transaction_count")
            .sum(TransactionAmount, "total_transaction_amount")
            .order_asc("year")
            .order_asc("quarter")
            .then_filter(Param::Year, "year")
            .step(period("year", "quarter"))
            .view(line(
                "year_quarter",
                "total_transaction_amount",
                ChartOptions::titled("Transaction Amount Trend Across Quarters").markers(),
            ))
            .view(line(
                "year_quarter",
                "total_transaction_count",
                ChartOptions::titled("Transaction Count Trend Across Quarters").markers(),
            ))
            .view(bar(
                "quarter",
                "total_transaction_amount",
                ChartOptions::titled("Transactions for year {year}")
                    .label("quarter", "Quarter")
                    .label("total_transaction_amount", "Total Transaction Amount")
                    .fixed_colour("skyblue"),
            )),
        q(1, 3, "Top growing payment categories by states and year", AggregatedTransaction)
            .group_by(&[State, TransactionType, Year])
            .sum(TransactionCount, "total_count")
            .sum(TransactionAmount, "total_amount")
            .order_asc("state")
            .order_asc("year")
            .order_desc("total_amount")
            .then_filter(Param::State, "state")
            .then_filter(Param::Year, "year")
            .with_table()
            .view(ViewSpec::new(
                ChartKind::Pie,
                ChartBindings::slices("transaction_type", "total_amount"),
                ChartOptions::titled(
                    "Transaction Amount Distribution by Payment Type in {state} ({year})",
                )
                .hole(0.4),
            )),
        q(1, 4, "Top 10 State-wise Total Transaction Amount", AggregatedTransaction)
            .group_by(&[State])
            .sum(TransactionAmount, "total_transaction_amount")
            .order_desc("total_transaction_amount")
            .limit(10)
            .view(
                ViewSpec::new(
                    ChartKind::Bar,
                    ChartBindings::xy("state", "total_transaction_amount")
                        .colour("total_transaction_amount")
                        .text("total_transaction_amount"),
                    ChartOptions::titled("Total Transaction Amount By State")
                        .label("state", "State")
                        .label("total_transaction_amount", "Total Transaction Amount")
                        .continuous("Viridis")
                        .text_outside()
                        .tick_angle(TICK)
                        .hover_format(AMOUNT_FORMAT),
                ),
            ),
        q(1, 5, "Total Transaction Amount Analysis", MapTransaction)
            .group_by(&[State])
            .sum(TransactionAmount, "total_transaction_value")
            .filter_by(Param::Year)
            .filter_by(Param::Quarter)
            .order_asc("state")
            .step(ShapeStep::TitleCase {
                column: "state".into(),
            })
            .view(ViewSpec::new(
                ChartKind::Choropleth,
                ChartBindings::regions("state", "total_transaction_value"),
                ChartOptions::titled("Total Transaction Value by State - Q{quarter}, {year}")
                    .continuous("Rainbow")
                    .hover_format(AMOUNT_FORMAT),
            ))
            .view(
                ViewSpec::new(
                    ChartKind::Bar,
                    ChartBindings::xy("state", "total_transaction_value")
                        .colour("total_transaction_value"),
                    ChartOptions::titled("Total Transaction Value by State - Q{quarter}, {year}")
                        .label("total_transaction_value", "Transaction Value")
                        .continuous("Rainbow")
                        .tick_angle(TICK),
                )
                .sorted_desc("total_transaction_value"),
            ),
        // Case 2: devices and engagement
        q(2, 1, "Top 10 Districts with Most Users", MapUser)
            .group_by(&[District])
            .sum(RegisteredUsers, "total_users")
            .order_desc("total_users")
            .limit(10)
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("district", "total_users")
                    .colour("district")
                    .text("total_users"),
                ChartOptions::titled("Top 10 Districts with Most Registered Users")
                    .label("district", "District")
                    .label("total_users", "Registered Users")
                    .text_outside()
                    .tick_angle(TICK),
            )),
        q(2, 2, "Registered Users vs App Opens Trend", MapUser)
            .group_by(&[Year])
            .sum(RegisteredUsers, "total_registered_users")
            .sum(AppOpens, "total_app_opens")
            .order_asc("year")
            .view(ViewSpec::new(
                ChartKind::Line,
                ChartBindings::xy("year", "total_registered_users").also_y("total_app_opens"),
                ChartOptions::titled("Registered Users vs App Opens Trend")
                    .label("year", "Year")
                    .label("total_registered_users", "Registered Users")
                    .label("total_app_opens", "App Opens")
                    .markers(),
            )),
        q(2, 3, "Yearly Growth of Registered Users", MapUser)
            .group_by(&[Year])
            .sum(RegisteredUsers, "total_users")
            .order_asc("year")
            .view(line(
                "year",
                "total_users",
                ChartOptions::titled("Yearly Growth of Registered Users")
                    .label("year", "Year")
                    .label("total_users", "Registered Users")
                    .markers(),
            )),
        q(2, 4, "Device Brand Usage Share", AggregatedUser)
            .group_by(&[Brand])
            .sum(TransactionCount, "total_users")
            .order_desc("total_users")
            .limit(10)
            .view(ViewSpec::new(
                ChartKind::Pie,
                ChartBindings::slices("brand", "total_users"),
                ChartOptions::titled("Device Brand Usage Share"),
            )),
        q(2, 5, "User Engagement Rate by State", AggregatedUser)
            .group_by(&[State])
            .sum(RegisteredUsers, "total_registered_users")
            .sum(AppOpens, "total_app_opens")
            .order_asc("state")
            .step(ShapeStep::EngagementRate {
                opens: "total_app_opens".into(),
                users: "total_registered_users".into(),
                into: "engagement_rate".into(),
            })
            .step(ShapeStep::Sort {
                column: "engagement_rate".into(),
                descending: true,
            })
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("state", "engagement_rate").colour("state"),
                ChartOptions::titled("User Engagement Rate by State")
                    .label("state", "State")
                    .label("engagement_rate", "Engagement Rate")
                    .tick_angle(TICK),
            )),
        q(2, 6, "Device Preference by State", AggregatedUser)
            .group_by(&[State, Brand])
            .sum(RegisteredUsers, "num_users")
            .order_asc("state")
            .order_desc("num_users")
            .view(ViewSpec::new(
                ChartKind::StackedBar,
                ChartBindings::xy("state", "num_users").colour("brand"),
                ChartOptions::titled("Device Preference by Region/State")
                    .label("state", "State")
                    .label("num_users", "Number of Registered Users")
                    .tick_angle(TICK),
            )),
        // Case 3: market expansion
        q(3, 1, "Top 10 States by Total Transaction Amount", AggregatedTransaction)
            .group_by(&[State])
            .sum(TransactionAmount, "total_amount")
            .order_desc("total_amount")
            .limit(10)
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("state", "total_amount")
                    .colour("state")
                    .text("total_amount"),
                ChartOptions::titled("Top 10 States by Total Transaction Amount")
                    .label("state", "State")
                    .label("total_amount", "Transaction Amount")
                    .palette("Safe")
                    .text_outside()
                    .tick_angle(TICK)
                    .hover_format(AMOUNT_FORMAT),
            )),
        q(3, 2, "State-wise Transaction Growth Over Time", AggregatedTransaction)
            .group_by(&[Year, State])
            .sum(TransactionAmount, "total_amount")
            .order_asc("year")
            .order_desc("total_amount")
            .view(ViewSpec::new(
                ChartKind::Line,
                ChartBindings::xy("year", "total_amount").colour("state"),
                ChartOptions::titled("Yearly Transaction Growth by State")
                    .label("year", "Year")
                    .label("total_amount", "Transaction Amount")
                    .label("state", "State")
                    .palette("Set2")
                    .markers(),
            )),
        q(3, 3, "Transaction Type Usage by State", AggregatedTransaction)
            .group_by(&[State, TransactionType])
            .sum(TransactionAmount, "total_amount")
            .order_asc("state")
            .order_desc("total_amount")
            .view(ViewSpec::new(
                ChartKind::StackedBar,
                ChartBindings::xy("state", "total_amount").colour("transaction_type"),
                ChartOptions::titled("Transaction Amount by Type and State")
                    .label("state", "State")
                    .label("total_amount", "Transaction Amount")
                    .label("transaction_type", "Type")
                    .tick_angle(TICK),
            )),
        q(3, 4, "Top Districts by Transaction Volume", MapTransaction)
            .group_by(&[District])
            .sum(TransactionAmount, "total_amount")
            .order_desc("total_amount")
            .limit_top_n(&DEFAULT_TOP_N_CHOICES, DEFAULT_TOP_N)
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("district", "total_amount").text("total_amount"),
                ChartOptions::titled("Top {top_n} Districts by Transaction Volume")
                    .label("district", "District")
                    .label("total_amount", "Transaction Volume")
                    .palette("Plotly")
                    .text_outside()
                    .tick_angle(TICK)
                    .hover_format(AMOUNT_FORMAT),
            )),
        q(3, 5, "Top Transaction Types by Amount", AggregatedTransaction)
            .group_by(&[TransactionType])
            .sum(TransactionAmount, "total_amount")
            .order_desc("total_amount")
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("transaction_type", "total_amount").text("total_amount"),
                ChartOptions::titled("Top Transaction Types by Amount")
                    .label("transaction_type", "Transaction Type")
                    .label("total_amount", "Transaction Amount")
                    .horizontal()
                    .fixed_colour("indianred")
                    .text_outside(),
            )),
        // Case 4: user growth
        q(4, 1, "Total Registered Users by State", AggregatedUser)
            .group_by(&[State])
            .sum(RegisteredUsers, "total_users")
            .order_desc("total_users")
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("state", "total_users").colour("total_users"),
                ChartOptions::titled("Total Registered Users by State")
                    .label("total_users", "Registered Users")
                    .continuous("Blues")
                    .tick_angle(TICK),
            )),
        q(4, 2, "User Growth Over Time", TopUser)
            .group_by(&[Year, Quarter])
            .sum(RegisteredUsers, "new_users")
            .order_asc("year")
            .order_asc("quarter")
            .step(period("year", "quarter"))
            .step(ShapeStep::CumulativeSum {
                column: "new_users".into(),
                year: "year".into(),
                quarter: "quarter".into(),
                into: "total_users".into(),
            })
            .view(line(
                "year_quarter",
                "total_users",
                ChartOptions::titled("Cumulative User Growth Over Time")
                    .label("year_quarter", "Quarter")
                    .label("total_users", "Total Registered Users")
                    .tick_angle(TICK)
                    .size_hint(Some(800), Some(500)),
            )),
        q(4, 3, "App Open Frequency by State", MapUser)
            .group_by(&[State])
            .sum(AppOpens, "total_app_opens")
            .order_desc("total_app_opens")
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("state", "total_app_opens").colour("total_app_opens"),
                ChartOptions::titled("App Open Frequency by State")
                    .label("total_app_opens", "Total App Opens")
                    .continuous("Blues")
                    .tick_angle(TICK),
            )),
        q(4, 4, "Top Districts by User Count", MapUser)
            .group_by(&[District])
            .sum(RegisteredUsers, "total_users")
            .order_desc("total_users")
            .limit(10)
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("district", "total_users").colour("total_users"),
                ChartOptions::titled("Top 10 Districts by Registered Users")
                    .label("total_users", "Registered Users")
                    .continuous("Teal")
                    .tick_angle(TICK),
            )),
        // Case 5: insurance
        q(5, 1, "Total Insurance Transaction Value by State", AggregatedInsurance)
            .group_by(&[State])
            .sum(TransactionAmount, "total_insurance_value")
            .order_desc("total_insurance_value")
            .view(bar(
                "state",
                "total_insurance_value",
                ChartOptions::titled("Total Insurance Transaction Value by State")
                    .label("state", "States")
                    .label("total_insurance_value", "Total Insurance Transaction Value")
                    .fixed_colour("skyblue")
                    .tick_angle(TICK)
                    .size_hint(Some(1000), Some(600)),
            )),
        q(5, 2, "Insurance Growth Over Time by Year and Quarter", AggregatedInsurance)
            .group_by(&[Year, Quarter])
            .sum(TransactionAmount, "total_insurance_value")
            .order_asc("year")
            .order_asc("quarter")
            .step(period("year", "quarter"))
            .view(line(
                "year_quarter",
                "total_insurance_value",
                ChartOptions::titled("Insurance Growth Over Time")
                    .label("year_quarter", "Quarter")
                    .label("total_insurance_value", "Total Insurance Value"),
            )),
        q(5, 3, "Top 10 States with Highest Insurance Transactions", TopInsurance)
            .group_by(&[State])
            .sum(TransactionCount, "total_insurance_count")
            .order_desc("total_insurance_count")
            .limit(10)
            .view(bar(
                "state",
                "total_insurance_count",
                ChartOptions::titled("Top 10 States with Highest Insurance Transactions")
                    .label("state", "States")
                    .label("total_insurance_count", "Total Insurance Transactions")
                    .fixed_colour("orange")
                    .tick_angle(TICK)
                    .size_hint(Some(1000), Some(600)),
            )),
        q(5, 4, "Insurance Transactions at District Level", MapInsurance)
            .group_by(&[District])
            .sum(TransactionCount, "insurance_count")
            .order_desc("insurance_count")
            .limit(10)
            .view(ViewSpec::new(
                ChartKind::Bar,
                ChartBindings::xy("district", "insurance_count").colour("insurance_count"),
                ChartOptions::titled("Top 10 Districts by Insurance Transactions")
                    .label("district", "District")
                    .label("insurance_count", "Insurance Transactions")
                    .continuous("Blues")
                    .tick_angle(TICK),
            )),
    ]
}
