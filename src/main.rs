// Entry point and report flow.
//
// One sequential batch run over the input file:
// - load and validate the dataset,
// - margin pass on the raw table (plus distribution histograms),
// - rent imputation for owned properties, then a second margin pass,
// - driver decomposition for the all/top-quartile/bottom-quartile cohorts,
// - state-level margin breakdown.
// Tables are previewed to the console; full outputs land in CSV/JSON files.
use margin_report::error::AnalysisError;
use margin_report::margins::MarginOutput;
use margin_report::stats::{format_int, format_number};
use margin_report::{charts, drivers, loader, margins, output, rent};

const DATA_PATH: &str = "data/store_financials.csv";
const HISTOGRAM_BINS: usize = 20;
const PREVIEW_ROWS: usize = 5;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AnalysisError> {
    let (records, load_report) = loader::load(DATA_PATH)?;
    println!(
        "Processing dataset... ({} rows across {} locations)",
        format_int(load_report.total_rows as i64),
        format_int(load_report.locations as i64)
    );
    println!(
        "Note: {} owned rows, {} without a rental cost (imputed below).\n",
        format_int(load_report.owned_rows as i64),
        format_int(load_report.missing_rental as i64)
    );

    let raw = margins::calculate(&records);
    print_margin_pass("Margins (raw data)", &raw);
    let file1 = "margin_by_location.csv";
    output::write_csv(file1, &output::location_rows(&raw.by_location))?;
    println!("(Full table exported to {file1})\n");

    let (adjusted_records, rent_diag) = rent::impute(&records)?;
    println!(
        "Rent cost ratio: {} (learned from {} non-owned records, {} locations)\n",
        format_number(rent_diag.rent_cost_ratio, 4),
        format_int(rent_diag.comparable_records as i64),
        format_int(rent_diag.comparable_locations as i64)
    );
    println!("Correlation of each metric with rental cost (non-owned records):");
    output::preview_table_rows(
        &output::correlation_rows(&rent_diag.rental_correlations),
        rent_diag.rental_correlations.len(),
    );
    charts::scatter(
        "Revenue vs rental cost of non-owned locations, by state",
        "gross revenue",
        "rental cost",
        &rent_diag.scatter,
    );

    let adjusted = margins::calculate(&adjusted_records);
    print_margin_pass("Margins (rent-adjusted)", &adjusted);
    let file2 = "rent_adjusted_margin_by_location.csv";
    output::write_csv(file2, &output::location_rows(&adjusted.by_location))?;
    println!("(Full table exported to {file2})\n");
    output::write_json("fleet_summary.json", &adjusted.fleet)?;

    let cohorts = drivers::build_cohorts(&adjusted.by_location, &adjusted.derived);
    let mut reports = Vec::new();
    for cohort in &cohorts {
        let report = drivers::decompose(cohort);
        println!("Decomposing {}\n", report.label);
        println!("Correlation between each location's profit margin and the metric below:");
        output::preview_table_rows(
            &output::correlation_rows(&report.location_signal),
            report.location_signal.len(),
        );
        charts::dual_axis_line(
            &format!("Margin and financials of {}", report.label),
            &report.monthly,
        );
        println!(
            "Correlation between the average profit margin over months {}-{} and the metric below:",
            drivers::TIME_WINDOW.start(),
            drivers::TIME_WINDOW.end()
        );
        output::preview_table_rows(
            &output::correlation_rows(&report.time_signal),
            report.time_signal.len(),
        );
        println!("________________________________________________\n");
        reports.push(report);
    }
    output::write_json("driver_reports.json", &reports)?;

    let states = drivers::state_breakdown(&adjusted.derived);
    println!("Average monthly margin by state (ascending):");
    output::preview_table_rows(&output::state_rows(&states), states.len());

    Ok(())
}

fn print_margin_pass(title: &str, pass: &MarginOutput) {
    println!("{title}\n");
    println!("Fleet summary (statistics across locations):");
    output::preview_table_rows(&output::fleet_rows(&pass.fleet), 3);

    charts::histogram(
        "Distribution of mean monthly margin per location",
        &pass.by_location.iter().map(|l| l.margin_mean).collect::<Vec<_>>(),
        HISTOGRAM_BINS,
    );
    charts::histogram(
        "Distribution of median monthly margin per location",
        &pass.by_location.iter().map(|l| l.margin_median).collect::<Vec<_>>(),
        HISTOGRAM_BINS,
    );
    charts::histogram(
        "Distribution of yearly margin per location",
        &pass.by_location.iter().map(|l| l.yearly_margin).collect::<Vec<_>>(),
        HISTOGRAM_BINS,
    );

    println!("Per-location aggregates (first {PREVIEW_ROWS} rows):");
    output::preview_table_rows(&output::location_rows(&pass.by_location), PREVIEW_ROWS);
}
