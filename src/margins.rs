use crate::stats::{nan_mean, nan_median, nan_std, nan_sum, ratio};
use crate::types::{DerivedRecord, FleetSummary, LocationAggregate, StatLine, StoreRecord};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

/// Named aggregation functions the per-location grouping may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Agg {
    Sum,
    Mean,
    Median,
}

impl Agg {
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Agg::Sum => nan_sum(values),
            Agg::Mean => nan_mean(values),
            Agg::Median => nan_median(values),
        }
    }
}

/// The fixed per-location aggregation plan: which statistics apply to which
/// derived column. Fixed at definition time; nothing builds this dynamically.
pub static LOCATION_AGG_PLAN: Lazy<Vec<(&'static str, Vec<Agg>)>> = Lazy::new(|| {
    vec![
        ("gross_revenue", vec![Agg::Sum]),
        ("fixed_cost", vec![Agg::Sum]),
        ("variable_cost", vec![Agg::Sum]),
        ("monthly_profit", vec![Agg::Sum]),
        ("monthly_net_profit_margin", vec![Agg::Mean, Agg::Median]),
    ]
});

/// Output of one margin-calculation pass: the per-location aggregates, the
/// input table augmented with the derived fields, and the fleet summary.
#[derive(Debug, Clone)]
pub struct MarginOutput {
    pub by_location: Vec<LocationAggregate>,
    pub derived: Vec<DerivedRecord>,
    pub fleet: FleetSummary,
}

/// Compute the four derived fields for one record. A NaN rental cost (owned
/// property before imputation) or a zero denominator flows through as NaN.
pub fn derive(record: &StoreRecord) -> DerivedRecord {
    let monthly_profit = record.gross_revenue
        - (record.fixed_cost + record.variable_cost + record.rental_cost);
    let products = record.num_products as f64;
    DerivedRecord {
        monthly_profit,
        profit_per_product: ratio(monthly_profit, products),
        revenue_per_product: ratio(record.gross_revenue, products),
        monthly_net_profit_margin: 100.0 * ratio(monthly_profit, record.gross_revenue),
        record: record.clone(),
    }
}

/// Run the full margin pass: derive per-record fields, group per location
/// under `LOCATION_AGG_PLAN`, and summarize the fleet.
///
/// Two margin methods are kept side by side and must never be conflated:
/// Method 1 (`margin_mean`/`margin_median`) averages the twelve per-month
/// ratios and describes the typical month; Method 2 (`yearly_margin`) takes
/// the ratio of the yearly sums and describes aggregate yearly economics,
/// implicitly revenue-weighted.
pub fn calculate(records: &[StoreRecord]) -> MarginOutput {
    let derived: Vec<DerivedRecord> = records.iter().map(derive).collect();

    let mut groups: BTreeMap<u32, Vec<&DerivedRecord>> = BTreeMap::new();
    for d in &derived {
        groups.entry(d.record.location_id).or_default().push(d);
    }

    let by_location: Vec<LocationAggregate> = groups
        .into_iter()
        .map(|(location_id, rows)| {
            let mut agg: BTreeMap<(&'static str, Agg), f64> = BTreeMap::new();
            for (column, fns) in LOCATION_AGG_PLAN.iter() {
                let values = column_values(&rows, column);
                for f in fns {
                    agg.insert((*column, *f), f.apply(&values));
                }
            }
            let gross_revenue = agg[&("gross_revenue", Agg::Sum)];
            let monthly_profit = agg[&("monthly_profit", Agg::Sum)];
            LocationAggregate {
                location_id,
                gross_revenue,
                fixed_cost: agg[&("fixed_cost", Agg::Sum)],
                variable_cost: agg[&("variable_cost", Agg::Sum)],
                monthly_profit,
                margin_mean: agg[&("monthly_net_profit_margin", Agg::Mean)],
                margin_median: agg[&("monthly_net_profit_margin", Agg::Median)],
                yearly_margin: 100.0 * ratio(monthly_profit, gross_revenue),
            }
        })
        .collect();

    let fleet = fleet_summary(&by_location);
    MarginOutput {
        by_location,
        derived,
        fleet,
    }
}

fn column_values(rows: &[&DerivedRecord], column: &str) -> Vec<f64> {
    rows.iter()
        .map(|d| match column {
            "gross_revenue" => d.record.gross_revenue,
            "fixed_cost" => d.record.fixed_cost,
            "variable_cost" => d.record.variable_cost,
            "monthly_profit" => d.monthly_profit,
            "monthly_net_profit_margin" => d.monthly_net_profit_margin,
            other => unreachable!("column '{other}' not in aggregation plan"),
        })
        .collect()
}

/// Mean, median, and sample standard deviation of each margin figure across
/// all locations, skipping NaN entries.
pub fn fleet_summary(by_location: &[LocationAggregate]) -> FleetSummary {
    let stat_line = |values: Vec<f64>| StatLine {
        mean: nan_mean(&values),
        median: nan_median(&values),
        std: nan_std(&values),
    };
    FleetSummary {
        margin_mean: stat_line(by_location.iter().map(|l| l.margin_mean).collect()),
        margin_median: stat_line(by_location.iter().map(|l| l.margin_median).collect()),
        yearly_margin: stat_line(by_location.iter().map(|l| l.yearly_margin).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location_id: u32, month: u32, revenue: f64, fixed: f64, variable: f64, rent: f64) -> StoreRecord {
        StoreRecord {
            location_id,
            state: "NY".to_string(),
            owned: false,
            month,
            gross_revenue: revenue,
            fixed_cost: fixed,
            variable_cost: variable,
            rental_cost: rent,
            num_products: 10,
        }
    }

    #[test]
    fn derived_fields_match_formulas() {
        let d = derive(&record(1, 1, 1000.0, 100.0, 200.0, 50.0));
        assert_eq!(d.monthly_profit, 1000.0 - (100.0 + 200.0 + 50.0));
        assert_eq!(d.profit_per_product, 650.0 / 10.0);
        assert_eq!(d.revenue_per_product, 1000.0 / 10.0);
        assert!((d.monthly_net_profit_margin - 65.0).abs() < 1e-12);
    }

    #[test]
    fn zero_revenue_propagates_nan_margin() {
        let d = derive(&record(1, 1, 0.0, 10.0, 10.0, 10.0));
        assert!(d.monthly_net_profit_margin.is_nan());
        assert_eq!(d.monthly_profit, -30.0);
    }

    #[test]
    fn zero_products_propagates_nan_per_product() {
        let mut r = record(1, 1, 100.0, 10.0, 10.0, 10.0);
        r.num_products = 0;
        let d = derive(&r);
        assert!(d.profit_per_product.is_nan());
        assert!(d.revenue_per_product.is_nan());
    }

    #[test]
    fn missing_rental_propagates_nan_but_aggregates_survive() {
        // Owned record before imputation: profit and margin are NaN, but the
        // location aggregate skips them rather than turning NaN itself.
        let out = calculate(&[
            record(1, 1, 1000.0, 100.0, 200.0, 50.0),
            record(1, 2, 1000.0, 100.0, 200.0, f64::NAN),
        ]);
        assert!(out.derived[1].monthly_profit.is_nan());
        let agg = &out.by_location[0];
        assert_eq!(agg.monthly_profit, 650.0);
        assert!((agg.margin_mean - 65.0).abs() < 1e-12);
    }

    #[test]
    fn yearly_margin_is_ratio_of_sums() {
        let out = calculate(&[
            record(3, 1, 1000.0, 100.0, 200.0, 50.0),
            record(3, 2, 2000.0, 300.0, 400.0, 100.0),
        ]);
        let agg = &out.by_location[0];
        let expected = 100.0 * (650.0 + 1200.0) / 3000.0;
        assert!((agg.yearly_margin - expected).abs() < 1e-12);
    }

    #[test]
    fn methods_are_allowed_to_diverge() {
        // Month A: revenue 100, profit 50 (margin 50%); month B: revenue
        // 1000, profit 100 (margin 10%). Method 1 averages the ratios to
        // 30%; Method 2 takes the ratio of sums, 150/1100 = ~13.6%.
        let out = calculate(&[
            record(9, 1, 100.0, 20.0, 20.0, 10.0),
            record(9, 2, 1000.0, 300.0, 300.0, 300.0),
        ]);
        let agg = &out.by_location[0];
        assert!((agg.margin_mean - 30.0).abs() < 1e-12);
        assert!((agg.yearly_margin - 100.0 * 150.0 / 1100.0).abs() < 1e-12);
        assert!((agg.margin_mean - agg.yearly_margin).abs() > 10.0);
    }

    #[test]
    fn fleet_summary_across_locations() {
        let out = calculate(&[
            record(1, 1, 1000.0, 100.0, 200.0, 100.0), // margin 60%
            record(2, 1, 1000.0, 300.0, 300.0, 200.0), // margin 20%
        ]);
        assert!((out.fleet.margin_mean.mean - 40.0).abs() < 1e-12);
        assert!((out.fleet.margin_mean.median - 40.0).abs() < 1e-12);
        // Sample std of {60, 20}.
        assert!((out.fleet.margin_mean.std - (800.0f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn locations_come_out_sorted() {
        let out = calculate(&[
            record(5, 1, 100.0, 10.0, 10.0, 10.0),
            record(2, 1, 100.0, 10.0, 10.0, 10.0),
            record(9, 1, 100.0, 10.0, 10.0, 10.0),
        ]);
        let ids: Vec<u32> = out.by_location.iter().map(|l| l.location_id).collect();
        assert_eq!(ids, vec![2, 5, 9]);
    }
}
