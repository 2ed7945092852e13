use crate::stats::{nan_mean, nan_std, percentile, CorrelationMatrix};
use crate::types::{DerivedRecord, LocationAggregate, MonthlyAverages};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;

/// Months included in the time-level correlation. A fixed partial-year
/// window; making it configurable is future work, and it must never be
/// silently widened to the full year.
pub const TIME_WINDOW: RangeInclusive<u32> = 1..=5;

/// A named subset of locations plus their matching monthly records, joined
/// on location id.
#[derive(Debug, Clone)]
pub struct Cohort {
    pub label: String,
    pub by_location: Vec<LocationAggregate>,
    pub records: Vec<DerivedRecord>,
}

/// Structured output of one decomposition pass. The correlation matrices are
/// the computational content; the signals are the margin rows pulled out of
/// them for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct DriverReport {
    pub label: String,
    pub location_correlations: CorrelationMatrix,
    pub location_signal: Vec<(String, f64)>,
    pub monthly: Vec<MonthlyAverages>,
    pub time_correlations: CorrelationMatrix,
    pub time_signal: Vec<(String, f64)>,
}

/// Mean and spread of the monthly margin for one state.
#[derive(Debug, Clone, Serialize)]
pub struct StateMargin {
    pub state: String,
    pub margin_mean: f64,
    pub margin_std: f64,
}

/// Build the three standard cohorts: every location, locations at or above
/// the 75th percentile of Method-1 mean margin, and locations at or below
/// the 25th. Percentiles interpolate linearly, so for small fleets the top
/// and bottom cohorts may overlap.
pub fn build_cohorts(
    by_location: &[LocationAggregate],
    derived: &[DerivedRecord],
) -> Vec<Cohort> {
    let margins: Vec<f64> = by_location.iter().map(|l| l.margin_mean).collect();
    let upper = percentile(&margins, 75.0);
    let lower = percentile(&margins, 25.0);
    vec![
        cohort("all locations", by_location, derived, |_| true),
        cohort("outperforming locations", by_location, derived, |l| {
            l.margin_mean >= upper
        }),
        cohort("underperforming locations", by_location, derived, |l| {
            l.margin_mean <= lower
        }),
    ]
}

fn cohort(
    label: &str,
    by_location: &[LocationAggregate],
    derived: &[DerivedRecord],
    keep: impl Fn(&LocationAggregate) -> bool,
) -> Cohort {
    let selected: Vec<LocationAggregate> =
        by_location.iter().filter(|l| keep(l)).cloned().collect();
    let ids: HashSet<u32> = selected.iter().map(|l| l.location_id).collect();
    let records: Vec<DerivedRecord> = derived
        .iter()
        .filter(|d| ids.contains(&d.record.location_id))
        .cloned()
        .collect();
    Cohort {
        label: label.to_string(),
        by_location: selected,
        records,
    }
}

/// Correlate margin against the other metrics for one cohort, location-wise
/// and month-wise. An empty cohort yields NaN-filled matrices and empty
/// monthly series rather than failing.
pub fn decompose(cohort: &Cohort) -> DriverReport {
    let locs = &cohort.by_location;
    let location_correlations = CorrelationMatrix::compute(&[
        ("location_id", locs.iter().map(|l| l.location_id as f64).collect()),
        ("gross_revenue", locs.iter().map(|l| l.gross_revenue).collect()),
        ("fixed_cost", locs.iter().map(|l| l.fixed_cost).collect()),
        ("variable_cost", locs.iter().map(|l| l.variable_cost).collect()),
        ("monthly_profit", locs.iter().map(|l| l.monthly_profit).collect()),
        ("margin_mean", locs.iter().map(|l| l.margin_mean).collect()),
        ("margin_median", locs.iter().map(|l| l.margin_median).collect()),
        ("yearly_margin", locs.iter().map(|l| l.yearly_margin).collect()),
    ]);
    let location_signal = location_correlations.signal("margin_mean");

    let monthly = monthly_averages(&cohort.records);
    let window: Vec<&MonthlyAverages> = monthly
        .iter()
        .filter(|m| TIME_WINDOW.contains(&m.month))
        .collect();
    let time_correlations = CorrelationMatrix::compute(&[
        ("month", window.iter().map(|m| m.month as f64).collect()),
        ("gross_revenue", window.iter().map(|m| m.gross_revenue).collect()),
        ("fixed_cost", window.iter().map(|m| m.fixed_cost).collect()),
        ("variable_cost", window.iter().map(|m| m.variable_cost).collect()),
        (
            "monthly_net_profit_margin",
            window.iter().map(|m| m.monthly_net_profit_margin).collect(),
        ),
    ]);
    let time_signal = time_correlations.signal("monthly_net_profit_margin");

    DriverReport {
        label: cohort.label.clone(),
        location_correlations,
        location_signal,
        monthly,
        time_correlations,
        time_signal,
    }
}

/// Average the financial metrics across a cohort's locations for each month,
/// producing a twelve-row (or shorter) time series.
pub fn monthly_averages(records: &[DerivedRecord]) -> Vec<MonthlyAverages> {
    let mut groups: BTreeMap<u32, Vec<&DerivedRecord>> = BTreeMap::new();
    for d in records {
        groups.entry(d.record.month).or_default().push(d);
    }
    groups
        .into_iter()
        .map(|(month, rows)| MonthlyAverages {
            month,
            gross_revenue: nan_mean(&rows.iter().map(|d| d.record.gross_revenue).collect::<Vec<_>>()),
            fixed_cost: nan_mean(&rows.iter().map(|d| d.record.fixed_cost).collect::<Vec<_>>()),
            variable_cost: nan_mean(&rows.iter().map(|d| d.record.variable_cost).collect::<Vec<_>>()),
            monthly_net_profit_margin: nan_mean(
                &rows.iter().map(|d| d.monthly_net_profit_margin).collect::<Vec<_>>(),
            ),
        })
        .collect()
}

/// Mean and sample standard deviation of the monthly margin per state,
/// sorted ascending by the mean (NaN entries last).
pub fn state_breakdown(records: &[DerivedRecord]) -> Vec<StateMargin> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for d in records {
        groups
            .entry(d.record.state.clone())
            .or_default()
            .push(d.monthly_net_profit_margin);
    }
    let mut rows: Vec<StateMargin> = groups
        .into_iter()
        .map(|(state, margins)| StateMargin {
            state,
            margin_mean: nan_mean(&margins),
            margin_std: nan_std(&margins),
        })
        .collect();
    rows.sort_by(|a, b| {
        a.margin_mean
            .partial_cmp(&b.margin_mean)
            .unwrap_or(std::cmp::Ordering::Greater)
    });
    rows
}
