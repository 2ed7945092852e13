use thiserror::Error;

/// Fatal pipeline errors. Division by zero inside the computations is not an
/// error; it propagates as NaN and is skipped by the aggregate statistics.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("input file is missing required column '{0}'")]
    MissingColumn(String),

    #[error("row {row}: column '{column}' has unparseable value '{value}'")]
    InvalidField {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: month {month} is outside 1..=12")]
    MonthOutOfRange { row: usize, month: i64 },

    #[error("rent imputation needs at least one non-owned record")]
    NoRentComparables,

    #[error("rent cost ratio is zero or non-finite; cannot impute")]
    DegenerateRentRatio,

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
