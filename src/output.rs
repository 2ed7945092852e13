use crate::drivers::StateMargin;
use crate::error::AnalysisError;
use crate::stats::format_number;
use crate::types::{
    CorrelationRow, FleetSummary, FleetSummaryRow, LocationAggregate, LocationMarginRow,
    StateMarginRow,
};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &str, rows: &[T]) -> Result<(), AnalysisError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &str, value: &T) -> Result<(), AnalysisError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn location_rows(aggregates: &[LocationAggregate]) -> Vec<LocationMarginRow> {
    aggregates
        .iter()
        .map(|l| LocationMarginRow {
            location: l.location_id,
            gross_revenue: format_number(l.gross_revenue, 2),
            fixed_cost: format_number(l.fixed_cost, 2),
            variable_cost: format_number(l.variable_cost, 2),
            profit: format_number(l.monthly_profit, 2),
            margin_mean: format_number(l.margin_mean, 2),
            margin_median: format_number(l.margin_median, 2),
            yearly_margin: format_number(l.yearly_margin, 2),
        })
        .collect()
}

pub fn fleet_rows(summary: &FleetSummary) -> Vec<FleetSummaryRow> {
    let row = |statistic: &str, pick: fn(&crate::types::StatLine) -> f64| FleetSummaryRow {
        statistic: statistic.to_string(),
        margin_mean: format_number(pick(&summary.margin_mean), 2),
        margin_median: format_number(pick(&summary.margin_median), 2),
        yearly_margin: format_number(pick(&summary.yearly_margin), 2),
    };
    vec![
        row("mean", |s| s.mean),
        row("median", |s| s.median),
        row("std", |s| s.std),
    ]
}

pub fn correlation_rows(signal: &[(String, f64)]) -> Vec<CorrelationRow> {
    signal
        .iter()
        .map(|(metric, r)| CorrelationRow {
            metric: metric.clone(),
            correlation: format_number(*r, 4),
        })
        .collect()
}

pub fn state_rows(states: &[StateMargin]) -> Vec<StateMarginRow> {
    states
        .iter()
        .map(|s| StateMarginRow {
            state: s.state.clone(),
            margin_mean: format_number(s.margin_mean, 2),
            margin_std: format_number(s.margin_std, 2),
        })
        .collect()
}
