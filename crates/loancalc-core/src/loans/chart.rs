//! Plain `{x, y}` series for chart front ends.

use serde::{Deserialize, Serialize};

use crate::frequency::Frequency;
use crate::loans::aggregate::{aggregate, AggregatedPeriod, Granularity};
use crate::loans::engine::{LoanSummary, PaymentRow};
use crate::types::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub x: String,
    pub y: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

/// Balance, cumulative principal and cumulative interest over time.
pub fn schedule_series(rows: &[PaymentRow], frequency: Frequency, granularity: Granularity) -> Vec<ChartSeries> {
    let groups = aggregate(rows, frequency, granularity);

    let series = |label: &str, pick: fn(&AggregatedPeriod) -> Money| ChartSeries {
        label: label.to_string(),
        points: groups
            .iter()
            .map(|g| SeriesPoint {
                x: g.label.clone(),
                y: pick(g),
            })
            .collect(),
    };

    vec![
        series("Remaining Balance", |g| g.ending_balance),
        series("Principal Paid", |g| g.cumulative_principal),
        series("Interest Paid", |g| g.cumulative_interest),
    ]
}

/// Principal vs. interest split of everything paid, for a pie or donut chart.
pub fn cost_breakdown(summary: &LoanSummary) -> ChartSeries {
    ChartSeries {
        label: "Total Cost".to_string(),
        points: vec![
            SeriesPoint {
                x: "Principal".to_string(),
                y: summary.total_principal,
            },
            SeriesPoint {
                x: "Interest".to_string(),
                y: summary.total_interest,
            },
        ],
    }
}
