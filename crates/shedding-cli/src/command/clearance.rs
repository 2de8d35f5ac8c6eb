//! Clearance command
//!
//! Prints the Kaplan-Meier clearance analysis of one dataset and optionally
//! exports the survival steps as CSV for plotting.

use std::{
    fmt::Write as _,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Args;
use shedding_analysis::clearance::{ClearanceSummary, DEFAULT_TIME_POINTS};

use super::{FilterArg, GlobalArg, table};
use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct ClearanceArg {
    /// Dataset identifier
    pub dataset: String,

    #[command(flatten)]
    pub filter: FilterArg,

    /// Days at which to report the proportion cleared (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_TIME_POINTS)]
    pub time_points: Vec<f64>,

    /// Write the survival curve to this CSV file
    #[arg(long)]
    pub km_csv: Option<PathBuf>,
}

pub(crate) fn run(global: &GlobalArg, arg: &ClearanceArg) -> anyhow::Result<()> {
    let dataset = util::load_dataset(&global.data_dir, &arg.dataset)?;
    let filter = arg.filter.to_filter()?;
    let summary = ClearanceSummary::from_dataset(&dataset, &filter, &arg.time_points)?;

    if let Some(path) = &arg.km_csv {
        save_km_curve(path, &summary)?;
    }

    Output::emit(global.output.as_deref(), global.format, &summary, |out| {
        print_summary(out, &summary)
    })
}

fn km_curve_csv(summary: &ClearanceSummary) -> anyhow::Result<String> {
    let mut csv = String::from("time,n_at_risk,n_events,n_censored,survival,ci_lower,ci_upper\n");
    for row in &summary.survival_table {
        writeln!(
            &mut csv,
            "{},{},{},{},{},{},{}",
            row.time, row.n_at_risk, row.n_events, row.n_censored, row.survival, row.ci_lower, row.ci_upper
        )
        .with_context(|| format!("Failed to write CSV row for time {}", row.time))?;
    }
    Ok(csv)
}

fn save_km_curve(path: &Path, summary: &ClearanceSummary) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    fs::write(path, km_curve_csv(summary)?)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    tracing::info!(path = %path.display(), "KM curve saved");
    Ok(())
}

#[expect(clippy::cast_precision_loss)]
fn print_summary(out: &mut Output, summary: &ClearanceSummary) -> io::Result<()> {
    table::title(out, &format!("Clearance Analysis: {}", summary.dataset_id))?;

    let n = summary.n_participants;
    writeln!(out, "  Participants with a positive sample: {n}")?;
    writeln!(
        out,
        "  Cleared: {} ({:.1}%), still shedding at last sample: {} ({:.1}%)",
        summary.n_cleared,
        100.0 * summary.n_cleared as f64 / n as f64,
        summary.n_censored,
        100.0 * summary.n_censored as f64 / n as f64,
    )?;
    let median = match summary.median_clearance_time {
        Some(time) => format!(
            "{time:.1} days (survival CI {}-{})",
            table::opt(summary.median_ci_lower, 3),
            table::opt(summary.median_ci_upper, 3)
        ),
        None => "not reached".to_string(),
    };
    writeln!(out, "  Median clearance time: {median}")?;
    writeln!(out)?;

    writeln!(out, "Proportion Cleared")?;
    table::header(
        out,
        &format!(
            "{:>8} {:>9} {:>9} {:>9} {:>9} {:>8}",
            "Day", "Shedding", "Cleared", "CI low", "CI high", "At risk",
        ),
    )?;
    for tp in &summary.time_points {
        writeln!(
            out,
            "  {:>8.1} {:>9.3} {:>9.3} {:>9.3} {:>9.3} {:>8}",
            tp.time, tp.proportion_shedding, tp.proportion_cleared, tp.ci_lower, tp.ci_upper, tp.n_at_risk,
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Survival Table")?;
    table::header(
        out,
        &format!(
            "{:>8} {:>8} {:>7} {:>9} {:>9} {:>9} {:>9}",
            "Time", "At risk", "Events", "Censored", "Survival", "CI low", "CI high",
        ),
    )?;
    for row in &summary.survival_table {
        writeln!(
            out,
            "  {:>8.1} {:>8} {:>7} {:>9} {:>9.3} {:>9.3} {:>9.3}",
            row.time, row.n_at_risk, row.n_events, row.n_censored, row.survival, row.ci_lower, row.ci_upper,
        )?;
    }
    Ok(())
}
