use crate::error::AnalysisError;
use crate::stats::{parse_bool_safe, parse_f64_safe, parse_u32_safe};
use crate::types::{RawRow, StoreRecord};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::io::Read;

/// Header columns the input file must carry, in its declared schema.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "Location number",
    "State",
    "Owned",
    "Gross revenue",
    "Fixed cost",
    "Variable cost",
    "Rental cost",
    "Number of products",
    "Month",
];

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub locations: usize,
    pub owned_rows: usize,
    pub missing_rental: usize,
}

pub fn load(path: &str) -> Result<(Vec<StoreRecord>, LoadReport), AnalysisError> {
    let file = std::fs::File::open(path)?;
    load_from_reader(file)
}

/// Read and validate the whole dataset. Schema problems (missing columns,
/// unparseable fields, out-of-range months) are fatal; a missing rental cost
/// on an owned row is expected and carried as NaN for the imputer.
pub fn load_from_reader<R: Read>(
    reader: R,
) -> Result<(Vec<StoreRecord>, LoadReport), AnalysisError> {
    let mut rdr = ReaderBuilder::new().from_reader(reader);

    let headers = rdr.headers()?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == col) {
            return Err(AnalysisError::MissingColumn(col.to_string()));
        }
    }

    let mut records: Vec<StoreRecord> = Vec::new();
    for (idx, result) in rdr.deserialize::<RawRow>().enumerate() {
        let row_no = idx + 2; // 1-based, counting the header line
        let row = result?;

        let location_id = parse_u32_safe(row.location_number.as_deref())
            .ok_or_else(|| invalid(row_no, "Location number", &row.location_number))?;
        let state = match row.state.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => return Err(invalid(row_no, "State", &row.state)),
        };
        let owned = parse_bool_safe(row.owned.as_deref())
            .ok_or_else(|| invalid(row_no, "Owned", &row.owned))?;
        let gross_revenue = parse_f64_safe(row.gross_revenue.as_deref())
            .ok_or_else(|| invalid(row_no, "Gross revenue", &row.gross_revenue))?;
        let fixed_cost = parse_f64_safe(row.fixed_cost.as_deref())
            .ok_or_else(|| invalid(row_no, "Fixed cost", &row.fixed_cost))?;
        let variable_cost = parse_f64_safe(row.variable_cost.as_deref())
            .ok_or_else(|| invalid(row_no, "Variable cost", &row.variable_cost))?;
        let num_products = parse_u32_safe(row.number_of_products.as_deref())
            .ok_or_else(|| invalid(row_no, "Number of products", &row.number_of_products))?;
        let month = parse_u32_safe(row.month.as_deref())
            .ok_or_else(|| invalid(row_no, "Month", &row.month))?;
        if !(1..=12).contains(&month) {
            return Err(AnalysisError::MonthOutOfRange {
                row: row_no,
                month: month as i64,
            });
        }

        // Owned properties carry no rental cost in the source; an empty cell
        // there is data, not a schema violation.
        let rental_cell = row.rental_cost.as_deref().map(str::trim).unwrap_or("");
        let rental_cost = if rental_cell.is_empty() {
            f64::NAN
        } else {
            parse_f64_safe(Some(rental_cell))
                .ok_or_else(|| invalid(row_no, "Rental cost", &row.rental_cost))?
        };

        records.push(StoreRecord {
            location_id,
            state,
            owned,
            month,
            gross_revenue,
            fixed_cost,
            variable_cost,
            rental_cost,
            num_products,
        });
    }

    let locations: HashSet<u32> = records.iter().map(|r| r.location_id).collect();
    let report = LoadReport {
        total_rows: records.len(),
        locations: locations.len(),
        owned_rows: records.iter().filter(|r| r.owned).count(),
        missing_rental: records.iter().filter(|r| r.rental_cost.is_nan()).count(),
    };
    Ok((records, report))
}

fn invalid(row: usize, column: &'static str, value: &Option<String>) -> AnalysisError {
    AnalysisError::InvalidField {
        row,
        column,
        value: value.clone().unwrap_or_default(),
    }
}
