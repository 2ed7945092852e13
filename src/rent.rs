use crate::error::AnalysisError;
use crate::stats::{nan_mean, pearson, ratio};
use crate::types::StoreRecord;
use std::collections::BTreeMap;

/// Per-(location, state) averages over the non-owned records, used to learn
/// the rent ratio and to feed the revenue/rent scatter plot.
#[derive(Debug, Clone)]
pub struct LocationAverages {
    pub location_id: u32,
    pub state: String,
    pub gross_revenue: f64,
    pub fixed_cost: f64,
    pub variable_cost: f64,
    pub rental_cost: f64,
}

/// Scatter-plot input: one group of (revenue, rental cost) points per state.
#[derive(Debug, Clone)]
pub struct ScatterGroup {
    pub state: String,
    pub points: Vec<(f64, f64)>,
}

/// Everything the imputation pass learned along the way, for reporting.
#[derive(Debug, Clone)]
pub struct RentDiagnostics {
    pub rent_cost_ratio: f64,
    pub comparable_locations: usize,
    pub comparable_records: usize,
    /// Correlation of each numeric field with rental cost across the
    /// non-owned records.
    pub rental_correlations: Vec<(String, f64)>,
    pub scatter: Vec<ScatterGroup>,
}

/// Impute a rental cost for every owned record as `gross_revenue / ratio`,
/// where the ratio is learned from the non-owned records. Non-owned records
/// pass through untouched.
///
/// The ratio averages `avg_fixed_cost_of_location / rental_cost_of_record`
/// pairs: the numerator is a per-location average (locations ordered by
/// `(location_id, state)`), the denominator is a single non-owned record's
/// rental cost in input order, zipped positionally over the shorter side.
/// The granularities intentionally differ; see DESIGN.md before changing
/// this formula.
pub fn impute(
    records: &[StoreRecord],
) -> Result<(Vec<StoreRecord>, RentDiagnostics), AnalysisError> {
    let rented: Vec<&StoreRecord> = records.iter().filter(|r| !r.owned).collect();
    if rented.is_empty() {
        return Err(AnalysisError::NoRentComparables);
    }

    // Diagnostic only; not used by the imputation itself.
    let total_costs: Vec<f64> = rented.iter().map(|r| r.fixed_cost + r.variable_cost).collect();

    let averages = location_averages(&rented);

    let ratios: Vec<f64> = averages
        .iter()
        .zip(rented.iter())
        .map(|(avg, rec)| ratio(avg.fixed_cost, rec.rental_cost))
        .collect();
    let rent_cost_ratio = nan_mean(&ratios);
    if !rent_cost_ratio.is_finite() || rent_cost_ratio == 0.0 {
        return Err(AnalysisError::DegenerateRentRatio);
    }

    let adjusted: Vec<StoreRecord> = records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            if r.owned {
                r.rental_cost = r.gross_revenue / rent_cost_ratio;
            }
            r
        })
        .collect();

    let diagnostics = RentDiagnostics {
        rent_cost_ratio,
        comparable_locations: averages.len(),
        comparable_records: rented.len(),
        rental_correlations: rental_correlations(&rented, &total_costs),
        scatter: scatter_by_state(&averages),
    };
    Ok((adjusted, diagnostics))
}

fn location_averages(rented: &[&StoreRecord]) -> Vec<LocationAverages> {
    let mut groups: BTreeMap<(u32, String), Vec<&StoreRecord>> = BTreeMap::new();
    for &r in rented {
        groups
            .entry((r.location_id, r.state.clone()))
            .or_default()
            .push(r);
    }
    groups
        .into_iter()
        .map(|((location_id, state), rows)| {
            let mean_of = |f: fn(&StoreRecord) -> f64| {
                nan_mean(&rows.iter().map(|r| f(r)).collect::<Vec<_>>())
            };
            LocationAverages {
                location_id,
                state,
                gross_revenue: mean_of(|r| r.gross_revenue),
                fixed_cost: mean_of(|r| r.fixed_cost),
                variable_cost: mean_of(|r| r.variable_cost),
                rental_cost: mean_of(|r| r.rental_cost),
            }
        })
        .collect()
}

fn rental_correlations(rented: &[&StoreRecord], total_costs: &[f64]) -> Vec<(String, f64)> {
    let rental: Vec<f64> = rented.iter().map(|r| r.rental_cost).collect();
    let mut out: Vec<(String, f64)> = vec![
        (
            "Gross revenue".to_string(),
            pearson(&rented.iter().map(|r| r.gross_revenue).collect::<Vec<_>>(), &rental),
        ),
        (
            "Fixed cost".to_string(),
            pearson(&rented.iter().map(|r| r.fixed_cost).collect::<Vec<_>>(), &rental),
        ),
        (
            "Variable cost".to_string(),
            pearson(&rented.iter().map(|r| r.variable_cost).collect::<Vec<_>>(), &rental),
        ),
        (
            "Number of products".to_string(),
            pearson(
                &rented.iter().map(|r| r.num_products as f64).collect::<Vec<_>>(),
                &rental,
            ),
        ),
        ("Total costs".to_string(), pearson(total_costs, &rental)),
    ];
    out.push(("Rental cost".to_string(), pearson(&rental, &rental)));
    out
}

fn scatter_by_state(averages: &[LocationAverages]) -> Vec<ScatterGroup> {
    let mut groups: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
    for avg in averages {
        groups
            .entry(avg.state.clone())
            .or_default()
            .push((avg.gross_revenue, avg.rental_cost));
    }
    groups
        .into_iter()
        .map(|(state, points)| ScatterGroup { state, points })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location_id: u32, owned: bool, revenue: f64, fixed: f64, rent: f64) -> StoreRecord {
        StoreRecord {
            location_id,
            state: "NY".to_string(),
            owned,
            month: 1,
            gross_revenue: revenue,
            fixed_cost: fixed,
            variable_cost: 0.0,
            rental_cost: rent,
            num_products: 10,
        }
    }

    #[test]
    fn rented_rows_pass_through_unchanged() {
        let records = vec![
            record(1, false, 1000.0, 100.0, 50.0),
            record(2, false, 2000.0, 200.0, 80.0),
        ];
        let (adjusted, _) = impute(&records).unwrap();
        assert_eq!(adjusted[0].rental_cost, 50.0);
        assert_eq!(adjusted[1].rental_cost, 80.0);
    }

    #[test]
    fn owned_rows_get_revenue_over_ratio() {
        let records = vec![
            record(1, false, 1000.0, 100.0, 50.0),
            record(2, false, 2000.0, 200.0, 100.0),
            record(3, true, 3000.0, 300.0, f64::NAN),
        ];
        let (adjusted, diag) = impute(&records).unwrap();
        // Location averages (single record each): fixed 100 and 200;
        // paired with rented rental costs 50 and 100 in input order.
        let expected_ratio = (100.0 / 50.0 + 200.0 / 100.0) / 2.0;
        assert!((diag.rent_cost_ratio - expected_ratio).abs() < 1e-12);
        assert!((adjusted[2].rental_cost - 3000.0 / expected_ratio).abs() < 1e-12);
    }

    #[test]
    fn ratio_mixes_location_average_with_record_rent() {
        // Location 1 has two months (fixed 100 and 300, avg 200); location 2
        // has one month (fixed 400). Positional pairing divides the location
        // averages by the first two rented records' rental costs.
        let records = vec![
            record(1, false, 1000.0, 100.0, 50.0),
            record(1, false, 1000.0, 300.0, 100.0),
            record(2, false, 2000.0, 400.0, 200.0),
        ];
        let (_, diag) = impute(&records).unwrap();
        let expected = (200.0 / 50.0 + 400.0 / 100.0) / 2.0;
        assert!((diag.rent_cost_ratio - expected).abs() < 1e-12);
        assert_eq!(diag.comparable_locations, 2);
        assert_eq!(diag.comparable_records, 3);
    }

    #[test]
    fn fails_without_comparables() {
        let records = vec![record(1, true, 1000.0, 100.0, f64::NAN)];
        assert!(matches!(
            impute(&records).unwrap_err(),
            AnalysisError::NoRentComparables
        ));
    }

    #[test]
    fn fails_on_zero_ratio() {
        // All-zero fixed costs learn a zero ratio, which cannot divide.
        let records = vec![
            record(1, false, 1000.0, 0.0, 50.0),
            record(2, true, 2000.0, 100.0, f64::NAN),
        ];
        assert!(matches!(
            impute(&records).unwrap_err(),
            AnalysisError::DegenerateRentRatio
        ));
    }

    #[test]
    fn scatter_groups_by_state() {
        let mut r1 = record(1, false, 1000.0, 100.0, 50.0);
        r1.state = "CA".to_string();
        let r2 = record(2, false, 2000.0, 200.0, 100.0);
        let (_, diag) = impute(&[r1, r2]).unwrap();
        let states: Vec<&str> = diag.scatter.iter().map(|g| g.state.as_str()).collect();
        assert_eq!(states, vec!["CA", "NY"]);
        assert_eq!(diag.scatter[0].points, vec![(1000.0, 50.0)]);
    }
}
