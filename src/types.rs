use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One CSV row exactly as it appears in the input file. All fields come in as
/// strings so the loader can report which column failed to parse.
#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Location number")]
    pub location_number: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Owned")]
    pub owned: Option<String>,
    #[serde(rename = "Gross revenue")]
    pub gross_revenue: Option<String>,
    #[serde(rename = "Fixed cost")]
    pub fixed_cost: Option<String>,
    #[serde(rename = "Variable cost")]
    pub variable_cost: Option<String>,
    #[serde(rename = "Rental cost")]
    pub rental_cost: Option<String>,
    #[serde(rename = "Number of products")]
    pub number_of_products: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
}

/// A typed store-month record. `rental_cost` is NaN for owned properties
/// until the rent imputer fills it in.
#[derive(Debug, Clone)]
pub struct StoreRecord {
    pub location_id: u32,
    pub state: String,
    pub owned: bool,
    pub month: u32,
    pub gross_revenue: f64,
    pub fixed_cost: f64,
    pub variable_cost: f64,
    pub rental_cost: f64,
    pub num_products: u32,
}

/// A store-month record plus the four computed fields. Built once per
/// pipeline pass and never mutated afterward.
#[derive(Debug, Clone)]
pub struct DerivedRecord {
    pub record: StoreRecord,
    pub monthly_profit: f64,
    pub profit_per_product: f64,
    pub revenue_per_product: f64,
    pub monthly_net_profit_margin: f64,
}

/// Per-location yearly aggregate. Sums skip NaN. `yearly_margin` is the
/// ratio of the sums (summation strictly before the ratio), while
/// `margin_mean`/`margin_median` average the twelve per-month ratios.
#[derive(Debug, Clone, Serialize)]
pub struct LocationAggregate {
    pub location_id: u32,
    pub gross_revenue: f64,
    pub fixed_cost: f64,
    pub variable_cost: f64,
    pub monthly_profit: f64,
    pub margin_mean: f64,
    pub margin_median: f64,
    pub yearly_margin: f64,
}

/// Mean / median / sample standard deviation of one metric across locations.
#[derive(Debug, Clone, Serialize)]
pub struct StatLine {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

/// Fleet-wide summary: each margin figure described by a `StatLine` across
/// all locations.
#[derive(Debug, Clone, Serialize)]
pub struct FleetSummary {
    pub margin_mean: StatLine,
    pub margin_median: StatLine,
    pub yearly_margin: StatLine,
}

/// Per-month averages across the locations of a cohort.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyAverages {
    pub month: u32,
    pub gross_revenue: f64,
    pub fixed_cost: f64,
    pub variable_cost: f64,
    pub monthly_net_profit_margin: f64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LocationMarginRow {
    #[serde(rename = "Location")]
    #[tabled(rename = "Location")]
    pub location: u32,
    #[serde(rename = "GrossRevenue")]
    #[tabled(rename = "GrossRevenue")]
    pub gross_revenue: String,
    #[serde(rename = "FixedCost")]
    #[tabled(rename = "FixedCost")]
    pub fixed_cost: String,
    #[serde(rename = "VariableCost")]
    #[tabled(rename = "VariableCost")]
    pub variable_cost: String,
    #[serde(rename = "Profit")]
    #[tabled(rename = "Profit")]
    pub profit: String,
    #[serde(rename = "MarginMean")]
    #[tabled(rename = "MarginMean")]
    pub margin_mean: String,
    #[serde(rename = "MarginMedian")]
    #[tabled(rename = "MarginMedian")]
    pub margin_median: String,
    #[serde(rename = "YearlyMargin")]
    #[tabled(rename = "YearlyMargin")]
    pub yearly_margin: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FleetSummaryRow {
    #[serde(rename = "Statistic")]
    #[tabled(rename = "Statistic")]
    pub statistic: String,
    #[serde(rename = "MarginMean")]
    #[tabled(rename = "MarginMean")]
    pub margin_mean: String,
    #[serde(rename = "MarginMedian")]
    #[tabled(rename = "MarginMedian")]
    pub margin_median: String,
    #[serde(rename = "YearlyMargin")]
    #[tabled(rename = "YearlyMargin")]
    pub yearly_margin: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CorrelationRow {
    #[serde(rename = "Metric")]
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[serde(rename = "Correlation")]
    #[tabled(rename = "Correlation")]
    pub correlation: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StateMarginRow {
    #[serde(rename = "State")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "MarginMean")]
    #[tabled(rename = "MarginMean")]
    pub margin_mean: String,
    #[serde(rename = "MarginStd")]
    #[tabled(rename = "MarginStd")]
    pub margin_std: String,
}
