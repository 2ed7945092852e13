// Console chart rendering. The pipeline hands these functions plain numeric
// series and treats the rendering as a black box; nothing downstream reads
// chart output.
use crate::rent::ScatterGroup;
use crate::stats::format_number;
use crate::types::MonthlyAverages;

const BAR_WIDTH: usize = 40;
const SCATTER_COLS: usize = 60;
const SCATTER_ROWS: usize = 16;

/// Render a histogram of a numeric column as horizontal `#` bars.
pub fn histogram(title: &str, values: &[f64], bins: usize) {
    println!("{title}");
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        println!("  (no data)\n");
        return;
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut counts = vec![0usize; bins];
    for v in &finite {
        let mut idx = ((v - min) / width) as usize;
        if idx >= bins {
            idx = bins - 1; // max value lands in the last bin
        }
        counts[idx] += 1;
    }
    let peak = counts.iter().copied().max().unwrap_or(1).max(1);
    for (i, count) in counts.iter().enumerate() {
        let lo = min + i as f64 * width;
        let hi = lo + width;
        let bar = "#".repeat(count * BAR_WIDTH / peak);
        println!(
            "  [{:>10} .. {:>10}) {:>5} |{}",
            format_number(lo, 1),
            format_number(hi, 1),
            count,
            bar
        );
    }
    println!();
}

/// Render the monthly time series with the financial metrics as columns and
/// the margin on its own right-hand scale as a `*` bar.
pub fn dual_axis_line(title: &str, monthly: &[MonthlyAverages]) {
    println!("{title}");
    if monthly.is_empty() {
        println!("  (no data)\n");
        return;
    }
    let margins: Vec<f64> = monthly
        .iter()
        .map(|m| m.monthly_net_profit_margin)
        .filter(|v| v.is_finite())
        .collect();
    let (lo, hi) = margins.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(*v), hi.max(*v))
    });
    println!(
        "  {:>5} {:>14} {:>14} {:>14} {:>8}  margin (scale {} .. {})",
        "Month",
        "Revenue",
        "FixedCost",
        "VariableCost",
        "Margin",
        format_number(lo, 1),
        format_number(hi, 1)
    );
    for m in monthly {
        let bar = if m.monthly_net_profit_margin.is_finite() && hi > lo {
            let frac = (m.monthly_net_profit_margin - lo) / (hi - lo);
            "*".repeat(1 + (frac * (BAR_WIDTH - 1) as f64) as usize)
        } else {
            String::new()
        };
        println!(
            "  {:>5} {:>14} {:>14} {:>14} {:>8}  |{}",
            m.month,
            format_number(m.gross_revenue, 1),
            format_number(m.fixed_cost, 1),
            format_number(m.variable_cost, 1),
            format_number(m.monthly_net_profit_margin, 2),
            bar
        );
    }
    println!();
}

/// Render grouped (x, y) points on a character grid, one marker letter per
/// state (first letter, `+` where groups collide).
pub fn scatter(title: &str, x_label: &str, y_label: &str, groups: &[ScatterGroup]) {
    println!("{title}");
    let points: Vec<(char, f64, f64)> = groups
        .iter()
        .flat_map(|g| {
            let marker = g.state.chars().next().unwrap_or('?');
            g.points
                .iter()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .map(move |(x, y)| (marker, *x, *y))
        })
        .collect();
    if points.is_empty() {
        println!("  (no data)\n");
        return;
    }
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for (_, x, y) in &points {
        min_x = min_x.min(*x);
        max_x = max_x.max(*x);
        min_y = min_y.min(*y);
        max_y = max_y.max(*y);
    }
    let span_x = if max_x > min_x { max_x - min_x } else { 1.0 };
    let span_y = if max_y > min_y { max_y - min_y } else { 1.0 };

    let mut grid = vec![vec![' '; SCATTER_COLS]; SCATTER_ROWS];
    for (marker, x, y) in &points {
        let col = (((x - min_x) / span_x) * (SCATTER_COLS - 1) as f64) as usize;
        let row = (((y - min_y) / span_y) * (SCATTER_ROWS - 1) as f64) as usize;
        let row = SCATTER_ROWS - 1 - row; // y grows upward
        let cell = &mut grid[row][col];
        *cell = if *cell == ' ' || *cell == *marker { *marker } else { '+' };
    }
    println!("  {} ({} .. {})", y_label, format_number(min_y, 1), format_number(max_y, 1));
    for row in grid {
        println!("  |{}", row.into_iter().collect::<String>());
    }
    println!("  +{}", "-".repeat(SCATTER_COLS));
    println!(
        "   {} ({} .. {})",
        x_label,
        format_number(min_x, 1),
        format_number(max_x, 1)
    );
    let legend: Vec<String> = groups
        .iter()
        .map(|g| format!("{}={}", g.state.chars().next().unwrap_or('?'), g.state))
        .collect();
    println!("   legend: {}\n", legend.join(", "));
}
